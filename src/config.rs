use std::env;

use crate::elo::{DEFAULT_BASELINE, DEFAULT_K_FACTOR, EloConfig, RoundingPolicy};
use crate::error::Result;
use crate::model::SeasonRange;
use crate::openliga::{DEFAULT_LEAGUE, OPENLIGADB_API_BASE};

pub const DEFAULT_START_SEASON: u16 = 2002;
pub const DEFAULT_END_SEASON: u16 = 2022;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Run settings. Built from `LIGA_ELO_*` environment variables; the binary
/// applies command line overrides on top.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub league: String,
    pub api_base: String,
    pub start_season: u16,
    pub end_season: u16,
    pub elo: EloConfig,
    pub http_cache: bool,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            league: DEFAULT_LEAGUE.to_string(),
            api_base: OPENLIGADB_API_BASE.to_string(),
            start_season: DEFAULT_START_SEASON,
            end_season: DEFAULT_END_SEASON,
            elo: EloConfig::default(),
            http_cache: true,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Unset, blank or unparseable values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let d = Self::default();
        Self {
            league: get("LIGA_ELO_LEAGUE")
                .map(|v| v.trim().to_string())
                .unwrap_or(d.league),
            api_base: get("LIGA_ELO_API_BASE")
                .map(|v| v.trim().to_string())
                .unwrap_or(d.api_base),
            start_season: get("LIGA_ELO_START_SEASON")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(d.start_season),
            end_season: get("LIGA_ELO_END_SEASON")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(d.end_season),
            elo: EloConfig {
                k: get("LIGA_ELO_K_FACTOR")
                    .and_then(|v| parse_k_factor(&v).ok())
                    .unwrap_or(DEFAULT_K_FACTOR),
                baseline: get("LIGA_ELO_BASELINE")
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(DEFAULT_BASELINE),
                rounding: get("LIGA_ELO_ROUNDING")
                    .and_then(|v| v.parse::<RoundingPolicy>().ok())
                    .unwrap_or_default(),
            },
            http_cache: get("LIGA_ELO_HTTP_CACHE")
                .map(|v| parse_flag(&v))
                .unwrap_or(d.http_cache),
            log_level: get("LIGA_ELO_LOG")
                .map(|v| v.trim().to_string())
                .unwrap_or(d.log_level),
        }
    }

    pub fn seasons(&self) -> Result<SeasonRange> {
        SeasonRange::new(self.start_season, self.end_season)
    }
}

/// K factor must be a positive finite number.
pub fn parse_k_factor(raw: &str) -> std::result::Result<f64, String> {
    let k = raw
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("invalid K factor '{}': {err}", raw.trim()))?;
    if !k.is_finite() || k <= 0.0 {
        return Err(format!("K factor must be positive and finite, got {k}"));
    }
    Ok(k)
}

fn parse_flag(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
