use chrono::NaiveDateTime;

use crate::elo::ResultPair;
use crate::error::{EloError, Result};

/// Roster entry as delivered by a data provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamInfo {
    pub id: u32,
    pub name: String,
    pub short_name: String,
}

/// One settled fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub match_id: u64,
    pub date: NaiveDateTime,
    pub team1_id: u32,
    pub team2_id: u32,
    pub score1: u16,
    pub score2: u16,
}

impl MatchOutcome {
    pub fn result_pair(&self) -> ResultPair {
        ResultPair::from_goals(self.score1, self.score2)
    }

    pub fn involves(&self, team_id: u32) -> bool {
        self.team1_id == team_id || self.team2_id == team_id
    }
}

/// Inclusive range of season start years, e.g. 2002..=2022.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonRange {
    start: u16,
    end: u16,
}

impl SeasonRange {
    pub fn new(start: u16, end: u16) -> Result<Self> {
        if start > end {
            return Err(EloError::InvalidSeasonRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single(season: u16) -> Self {
        Self {
            start: season,
            end: season,
        }
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn end(&self) -> u16 {
        self.end
    }

    pub fn seasons(&self) -> impl Iterator<Item = u16> {
        self.start..=self.end
    }

    pub fn season_count(&self) -> usize {
        usize::from(self.end - self.start) + 1
    }
}
