use std::path::Path;

use crate::error::{LeagueError, Result};

/// Validate a display name (league or team).
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() || name.len() > 100 {
        return Err(LeagueError::InvalidRequest(
            "name must be between 1 and 100 characters".to_string(),
        ));
    }
    Ok(())
}

/// Use the client-supplied id when present, otherwise a fresh UUID.
pub fn resolve_id(requested: Option<String>) -> Result<String> {
    match requested {
        None => Ok(uuid::Uuid::new_v4().to_string()),
        Some(id) if is_safe_id(&id) => Ok(id),
        Some(id) => Err(LeagueError::InvalidRequest(format!("invalid id '{}'", id))),
    }
}

/// Ids end up in file names and URLs, so keep them to a conservative charset.
pub fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// File name for an uploaded team logo: `<team_id><.ext>`, keeping the
/// original extension when it is plain alphanumeric.
pub fn logo_file_name(team_id: &str, original_name: Option<&str>) -> String {
    let ext = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();

    format!("{}{}", team_id, ext)
}
