use std::env;
use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:data/eloleague.db";
pub const DEFAULT_PORT: u16 = 8080;

/// Runtime settings, read from the environment after `.env` has been loaded.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub port: u16,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub upload_dir: PathBuf,
    pub web_dir: PathBuf,
}

impl Settings {
    pub fn from_env() -> Self {
        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("Ignoring invalid PORT value '{}', using {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            Err(_) => DEFAULT_PORT,
        };

        Self {
            database_url: env_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            port,
            admin_username: non_empty_env("ADMIN_USERNAME"),
            admin_password: non_empty_env("ADMIN_PASSWORD"),
            upload_dir: PathBuf::from(env_or("UPLOAD_DIR", "./uploads")),
            web_dir: PathBuf::from(env_or("WEB_DIR", "./web")),
        }
    }

    /// Admin credentials, if both halves are configured.
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (&self.admin_username, &self.admin_password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            port: DEFAULT_PORT,
            admin_username: None,
            admin_password: None,
            upload_dir: PathBuf::from("./uploads"),
            web_dir: PathBuf::from("./web"),
        }
    }
}

fn env_or(key: &str, fallback: &str) -> String {
    non_empty_env(key).unwrap_or_else(|| fallback.to_string())
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}
