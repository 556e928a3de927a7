//! Criterion ratings and the weighted criteria score.
//!
//! Each of the four evaluation criteria carries an ordinal rating code:
//!
//!   "1" → Fully Met      (1.0 point)
//!   "2" → Partially Met  (0.5 points)
//!   any other value → Not Met (0.0 points)
//!
//! The helpers here operate on raw codes and are total: they never reject
//! input. Defaulting of missing ratings happens in `report::model`.

use serde::{Deserialize, Serialize};

/// Maximum achievable criteria score (four criteria, one point each).
pub const MAX_SCORE: f64 = 4.0;

/// Normalized rating of a single criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    FullyMet,
    PartiallyMet,
    NotMet,
}

impl Rating {
    /// Map a raw rating code. Codes are matched exactly; anything else, including "3",
    /// "" and padded codes such as " 1 ", is Not Met.
    pub fn from_code(code: &str) -> Self {
        match code {
            "1" => Rating::FullyMet,
            "2" => Rating::PartiallyMet,
            _ => Rating::NotMet,
        }
    }

    pub fn points(self) -> f64 {
        match self {
            Rating::FullyMet => 1.0,
            Rating::PartiallyMet => 0.5,
            Rating::NotMet => 0.0,
        }
    }

    pub fn color(self) -> RatingColor {
        match self {
            Rating::FullyMet => RatingColor::Success,
            Rating::PartiallyMet => RatingColor::Warning,
            Rating::NotMet => RatingColor::Danger,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Rating::FullyMet => "Fully Met",
            Rating::PartiallyMet => "Partially Met",
            Rating::NotMet => "Not Met",
        }
    }
}

/// Color token used for rating badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RatingColor {
    Success,
    Warning,
    Danger,
}

impl RatingColor {
    pub fn hex(self) -> &'static str {
        match self {
            RatingColor::Success => "#16a34a",
            RatingColor::Warning => "#d97706",
            RatingColor::Danger => "#dc2626",
        }
    }
}

impl std::fmt::Display for RatingColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.hex())
    }
}

pub fn color_for_rating(code: &str) -> RatingColor {
    Rating::from_code(code).color()
}

pub fn points_for(code: &str) -> f64 {
    Rating::from_code(code).points()
}

/// Sum of `points_for` over the four criterion codes.
pub fn criteria_score(codes: [&str; 4]) -> f64 {
    codes.iter().map(|c| points_for(c)).sum()
}

/// Render a score as `N/4`, with one decimal only when it is not integral.
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{}/4", score as i64)
    } else {
        format!("{:.1}/4", score)
    }
}
