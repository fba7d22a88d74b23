use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::elo::{EloConfig, ResultPair, calculate_elo_update};
use crate::error::{EloError, Result};
use crate::model::{MatchOutcome, TeamInfo};
use crate::team::{RatingPoint, Team};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub team_id: u32,
    pub name: String,
    pub short_name: String,
    pub elo: i32,
    pub highest_elo: i32,
}

/// Per-team rating state. Teams are keyed and iterated by id.
#[derive(Debug, Clone, Default)]
pub struct RatingEngine {
    cfg: EloConfig,
    teams: BTreeMap<u32, Team>,
}

impl RatingEngine {
    pub fn new(cfg: EloConfig) -> Self {
        Self {
            cfg,
            teams: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &EloConfig {
        &self.cfg
    }

    /// Inserts a team at the baseline rating, replacing any team with the same id.
    pub fn create_team(&mut self, id: u32, name: &str, short_name: &str) {
        let team = Team::new(id, name, short_name, self.cfg.baseline);
        self.teams.insert(id, team);
    }

    pub fn create_teams<'a>(&mut self, roster: impl IntoIterator<Item = &'a TeamInfo>) {
        for info in roster {
            self.create_team(info.id, &info.name, &info.short_name);
        }
        debug!(teams = self.teams.len(), "roster loaded");
    }

    pub fn team(&self, team_id: u32) -> Result<&Team> {
        self.teams
            .get(&team_id)
            .ok_or(EloError::UnknownTeam { team_id })
    }

    pub fn teams(&self) -> impl Iterator<Item = &Team> {
        self.teams.values()
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// Applies one match to both teams. Both new ratings are computed from the
    /// ratings held before either team is touched.
    ///
    /// `date` may repeat a team's latest date but never precede it.
    pub fn update_pair(
        &mut self,
        team_a: u32,
        team_b: u32,
        result: ResultPair,
        date: NaiveDateTime,
    ) -> Result<()> {
        if team_a == team_b {
            return Err(EloError::data_format(format!(
                "team {team_a} cannot play itself"
            )));
        }
        let elo_a = self.checked_rating(team_a, date)?;
        let elo_b = self.checked_rating(team_b, date)?;

        let new_a = calculate_elo_update(elo_a, elo_b, result.first, &self.cfg);
        let new_b = calculate_elo_update(elo_b, elo_a, result.second, &self.cfg);

        self.team_mut(team_a)?.update_elo(new_a, date);
        self.team_mut(team_b)?.update_elo(new_b, date);
        Ok(())
    }

    /// Processes outcomes in date order and returns how many were applied.
    ///
    /// Every referenced team is checked before the first update, so an
    /// `UnknownTeam` error leaves all ratings as they were.
    pub fn process_outcomes(&mut self, outcomes: &[MatchOutcome]) -> Result<usize> {
        let mut ordered = outcomes.iter().collect::<Vec<_>>();
        ordered.sort_by_key(|m| m.date);

        for m in &ordered {
            self.checked_rating(m.team1_id, m.date)?;
            self.checked_rating(m.team2_id, m.date)?;
            if m.team1_id == m.team2_id {
                return Err(EloError::data_format(format!(
                    "match {} pairs team {} with itself",
                    m.match_id, m.team1_id
                )));
            }
        }

        for m in &ordered {
            self.update_pair(m.team1_id, m.team2_id, m.result_pair(), m.date)?;
        }

        info!(matches = ordered.len(), teams = self.teams.len(), "ratings updated");
        Ok(ordered.len())
    }

    pub fn summary(&self) -> Vec<SummaryRow> {
        self.teams
            .values()
            .map(|team| SummaryRow {
                team_id: team.id,
                name: team.name.clone(),
                short_name: team.short_name.clone(),
                elo: team.elo(),
                highest_elo: team.highest_elo(),
            })
            .collect()
    }

    /// Summary ordered by current rating, best first.
    pub fn ranked_summary(&self) -> Vec<SummaryRow> {
        let mut rows = self.summary();
        rows.sort_by(|a, b| b.elo.cmp(&a.elo).then(a.team_id.cmp(&b.team_id)));
        rows
    }

    pub fn history(&self, team_id: u32) -> Result<&[RatingPoint]> {
        self.team(team_id).map(Team::history)
    }

    /// Current rating of `team_id`, provided `date` does not precede its
    /// latest recorded match.
    fn checked_rating(&self, team_id: u32, date: NaiveDateTime) -> Result<i32> {
        let team = self.team(team_id)?;
        match team.last_played() {
            Some(last) if date < last => Err(EloError::data_format(format!(
                "match on {date} for team {team_id} precedes its last match on {last}"
            ))),
            _ => Ok(team.elo()),
        }
    }

    fn team_mut(&mut self, team_id: u32) -> Result<&mut Team> {
        self.teams
            .get_mut(&team_id)
            .ok_or(EloError::UnknownTeam { team_id })
    }
}
