use std::fmt;
use std::str::FromStr;

pub const DEFAULT_K_FACTOR: f64 = 32.0;
pub const DEFAULT_BASELINE: i32 = 1000;

/// How a fractional post-match rating is turned back into an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundingPolicy {
    /// Drop the fraction (toward zero). Matches historical output.
    #[default]
    Truncate,
    /// Round half away from zero.
    Nearest,
}

impl RoundingPolicy {
    pub fn apply(self, value: f64) -> i32 {
        match self {
            Self::Truncate => value.trunc() as i32,
            Self::Nearest => value.round() as i32,
        }
    }
}

impl FromStr for RoundingPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "truncate" | "trunc" => Ok(Self::Truncate),
            "nearest" | "round" => Ok(Self::Nearest),
            other => Err(format!("unknown rounding policy '{other}'")),
        }
    }
}

impl fmt::Display for RoundingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncate => f.write_str("truncate"),
            Self::Nearest => f.write_str("nearest"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EloConfig {
    pub k: f64,
    pub baseline: i32,
    pub rounding: RoundingPolicy,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_K_FACTOR,
            baseline: DEFAULT_BASELINE,
            rounding: RoundingPolicy::Truncate,
        }
    }
}

/// Scores of both sides of one match; always sums to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultPair {
    pub first: f64,
    pub second: f64,
}

impl ResultPair {
    pub const FIRST_WINS: Self = Self {
        first: 1.0,
        second: 0.0,
    };
    pub const DRAW: Self = Self {
        first: 0.5,
        second: 0.5,
    };
    pub const SECOND_WINS: Self = Self {
        first: 0.0,
        second: 1.0,
    };

    pub fn from_goals(goals_first: u16, goals_second: u16) -> Self {
        if goals_first > goals_second {
            Self::FIRST_WINS
        } else if goals_first < goals_second {
            Self::SECOND_WINS
        } else {
            Self::DRAW
        }
    }
}

pub fn expected_score(team_rating: i32, opponent_rating: i32) -> f64 {
    let gap = f64::from(opponent_rating - team_rating);
    1.0 / (1.0 + 10.0_f64.powf(gap / 400.0))
}

pub fn calculate_elo_update(
    team_rating: i32,
    opponent_rating: i32,
    result: f64,
    cfg: &EloConfig,
) -> i32 {
    let expected = expected_score(team_rating, opponent_rating);
    let new_rating = f64::from(team_rating) + cfg.k * (result - expected);
    cfg.rounding.apply(new_rating)
}
