/// Points exchanged per decisive match. Fixed for every team.
pub const ELO_K_FACTOR: f64 = 32.0;

/// Rating assigned to newly created teams.
pub const DEFAULT_RATING: f64 = 1500.0;

/// Actual score credited to the winner of a match.
pub const WIN: f64 = 1.0;
/// Actual score credited to the loser of a match.
pub const LOSS: f64 = 0.0;

#[derive(Debug, Clone, Copy)]
pub struct EloCalculator {
    k_factor: f64,
}

impl Default for EloCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl EloCalculator {
    pub fn new() -> Self {
        Self {
            k_factor: ELO_K_FACTOR,
        }
    }

    /// Calculate expected score based on ELO ratings
    pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
        1.0 / (1.0 + 10f64.powf((rating_b - rating_a) / 400.0))
    }

    /// Rating after a single match with the given actual score (1.0 win, 0.0 loss).
    pub fn new_rating(&self, rating: f64, opponent_rating: f64, actual_score: f64) -> f64 {
        rating + self.k_factor * (actual_score - Self::expected_score(rating, opponent_rating))
    }

    /// New (winner, loser) ratings after a decisive match.
    ///
    /// Both sides are computed from the pre-match ratings. The loser's delta is
    /// the negation of the winner's, so the pair always sums to zero.
    pub fn rate_decisive(&self, winner_rating: f64, loser_rating: f64) -> (f64, f64) {
        let delta = self.new_rating(winner_rating, loser_rating, WIN) - winner_rating;
        (winner_rating + delta, loser_rating - delta)
    }
}
