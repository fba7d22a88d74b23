pub mod chart;
pub mod config;
pub mod elo;
pub mod engine;
pub mod error;
pub mod export;
pub mod http_cache;
pub mod http_client;
pub mod model;
pub mod openliga;
pub mod provider;
pub mod team;

pub use elo::{EloConfig, ResultPair, RoundingPolicy};
pub use engine::{RatingEngine, SummaryRow};
pub use error::EloError;
pub use model::{MatchOutcome, SeasonRange, TeamInfo};
pub use provider::MatchDataProvider;
pub use team::{RatingPoint, Team};
