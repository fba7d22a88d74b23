use anyhow::Result;
use tracing::info;

use crate::elo::EloConfig;
use crate::engine::RatingEngine;
use crate::model::{MatchOutcome, SeasonRange, TeamInfo};

/// Source of rosters and settled results for a league.
pub trait MatchDataProvider {
    /// Teams seen in any season of the range, one entry per id.
    fn list_teams(&self, seasons: SeasonRange) -> Result<Vec<TeamInfo>>;

    /// Settled matches of the range, ascending by date.
    fn list_matches(&self, seasons: SeasonRange) -> Result<Vec<MatchOutcome>>;
}

/// Loads rosters, then replays every settled match of the range.
pub fn rate_seasons(
    provider: &dyn MatchDataProvider,
    seasons: SeasonRange,
    cfg: EloConfig,
) -> Result<RatingEngine> {
    let teams = provider.list_teams(seasons)?;
    let matches = provider.list_matches(seasons)?;

    let mut engine = RatingEngine::new(cfg);
    engine.create_teams(&teams);
    let processed = engine.process_outcomes(&matches)?;
    info!(
        seasons = %format!("{}-{}", seasons.start(), seasons.end()),
        processed,
        "season range rated"
    );
    Ok(engine)
}
