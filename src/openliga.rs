//! OpenLigaDB client and JSON parsing.
//!
//! The API serves one JSON array per season for rosters
//! (`/getavailableteams/{league}/{season}`) and fixtures
//! (`/getmatchdata/{league}/{season}[/{matchday}]`).

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::EloError;
use crate::http_cache::HttpCache;
use crate::http_client::{fetch_text, http_client};
use crate::model::{MatchOutcome, SeasonRange, TeamInfo};
use crate::provider::MatchDataProvider;

pub const OPENLIGADB_API_BASE: &str = "https://api.openligadb.de";
pub const DEFAULT_LEAGUE: &str = "bl1";

pub const MATCH_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const FINAL_RESULT_TYPE_ID: u32 = 2;
/// Month after which a season's results no longer change.
const SEASON_CLOSE_MONTH: u32 = 7;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTeam {
    team_id: u32,
    #[serde(default)]
    team_name: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiMatch {
    #[serde(rename = "matchID")]
    match_id: u64,
    #[serde(default)]
    match_date_time: Option<String>,
    team1: ApiMatchTeam,
    team2: ApiMatchTeam,
    #[serde(default)]
    match_is_finished: bool,
    #[serde(default)]
    match_results: Option<Vec<ApiResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiMatchTeam {
    team_id: u32,
}

#[derive(Debug, Deserialize)]
struct ApiResult {
    #[serde(rename = "resultTypeID", default)]
    result_type_id: u32,
    #[serde(rename = "pointsTeam1")]
    points_team1: Option<i64>,
    #[serde(rename = "pointsTeam2")]
    points_team2: Option<i64>,
}

pub fn parse_teams_json(raw: &str) -> Result<Vec<TeamInfo>, EloError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let teams: Vec<ApiTeam> = serde_json::from_str(trimmed)
        .map_err(|err| EloError::data_format(format!("invalid teams json: {err}")))?;
    Ok(teams
        .into_iter()
        .map(|t| TeamInfo {
            id: t.team_id,
            name: t.team_name.unwrap_or_default(),
            short_name: t.short_name.unwrap_or_default(),
        })
        .collect())
}

/// Parses a fixture list, keeping only settled matches.
///
/// Unfinished fixtures are skipped. A finished fixture without a usable score
/// or with an unreadable kickoff time is an error.
pub fn parse_matches_json(raw: &str) -> Result<Vec<MatchOutcome>, EloError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let matches: Vec<ApiMatch> = serde_json::from_str(trimmed)
        .map_err(|err| EloError::data_format(format!("invalid match json: {err}")))?;

    let mut out = Vec::with_capacity(matches.len());
    for m in matches {
        if !m.match_is_finished {
            continue;
        }
        out.push(settled_outcome(m)?);
    }
    Ok(out)
}

fn settled_outcome(m: ApiMatch) -> Result<MatchOutcome, EloError> {
    let raw_date = m.match_date_time.as_deref().unwrap_or_default();
    let date = NaiveDateTime::parse_from_str(raw_date, MATCH_DATE_FORMAT).map_err(|err| {
        EloError::data_format(format!(
            "match {}: bad matchDateTime '{raw_date}': {err}",
            m.match_id
        ))
    })?;

    let results = m.match_results.unwrap_or_default();
    let final_result = results
        .iter()
        .find(|r| r.result_type_id == FINAL_RESULT_TYPE_ID)
        .or_else(|| results.first())
        .ok_or_else(|| {
            EloError::data_format(format!("match {} is finished but has no result", m.match_id))
        })?;

    let score1 = goals(m.match_id, final_result.points_team1)?;
    let score2 = goals(m.match_id, final_result.points_team2)?;

    Ok(MatchOutcome {
        match_id: m.match_id,
        date,
        team1_id: m.team1.team_id,
        team2_id: m.team2.team_id,
        score1,
        score2,
    })
}

fn goals(match_id: u64, points: Option<i64>) -> Result<u16, EloError> {
    points
        .and_then(|p| u16::try_from(p).ok())
        .ok_or_else(|| EloError::data_format(format!("match {match_id}: missing or invalid score")))
}

/// Merges per-season rosters. The first season a team appears in fixes its
/// position; later seasons update its names.
pub fn merge_rosters(seasons: impl IntoIterator<Item = Vec<TeamInfo>>) -> Vec<TeamInfo> {
    let mut out: Vec<TeamInfo> = Vec::new();
    for roster in seasons {
        for team in roster {
            match out.iter_mut().find(|t| t.id == team.id) {
                Some(existing) => *existing = team,
                None => out.push(team),
            }
        }
    }
    out
}

/// Unix time from which data for `season` (start year) is final: July 1st
/// of the following year.
pub fn season_closes_at(season: u16) -> Option<i64> {
    NaiveDate::from_ymd_opt(i32::from(season) + 1, SEASON_CLOSE_MONTH, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

#[derive(Debug, Clone)]
pub struct OpenLigaDb {
    base_url: String,
    league: String,
    cache: Option<HttpCache>,
}

impl Default for OpenLigaDb {
    fn default() -> Self {
        Self::new(OPENLIGADB_API_BASE, DEFAULT_LEAGUE)
    }
}

impl OpenLigaDb {
    pub fn new(base_url: impl Into<String>, league: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            league: league.into(),
            cache: HttpCache::in_app_dir(),
        }
    }

    /// Turns the per-user response cache on or off.
    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.cache = if use_cache {
            HttpCache::in_app_dir()
        } else {
            None
        };
        self
    }

    pub fn with_cache_dir(mut self, root: impl Into<std::path::PathBuf>) -> Self {
        self.cache = Some(HttpCache::new(root));
        self
    }

    pub fn cache(&self) -> Option<&HttpCache> {
        self.cache.as_ref()
    }

    pub fn league(&self) -> &str {
        &self.league
    }

    pub fn season_teams_url(&self, season: u16) -> String {
        format!("{}/getavailableteams/{}/{season}", self.base_url, self.league)
    }

    pub fn season_matches_url(&self, season: u16) -> String {
        format!("{}/getmatchdata/{}/{season}", self.base_url, self.league)
    }

    pub fn matchday_url(&self, season: u16, matchday: u16) -> String {
        format!(
            "{}/getmatchdata/{}/{season}/{matchday}",
            self.base_url, self.league
        )
    }

    pub fn season_teams(&self, season: u16) -> Result<Vec<TeamInfo>> {
        let body = self
            .get(&self.season_teams_url(season), season)
            .with_context(|| format!("teams request failed for season {season}"))?;
        let teams = parse_teams_json(&body)?;
        debug!(season, teams = teams.len(), "season roster fetched");
        Ok(teams)
    }

    pub fn season_matches(&self, season: u16) -> Result<Vec<MatchOutcome>> {
        let body = self
            .get(&self.season_matches_url(season), season)
            .with_context(|| format!("match request failed for season {season}"))?;
        let matches = parse_matches_json(&body)
            .with_context(|| format!("season {season} match data"))?;
        debug!(season, matches = matches.len(), "season matches fetched");
        Ok(matches)
    }

    pub fn matchday_matches(&self, season: u16, matchday: u16) -> Result<Vec<MatchOutcome>> {
        let body = self
            .get(&self.matchday_url(season, matchday), season)
            .with_context(|| format!("match request failed for {season} matchday {matchday}"))?;
        let mut matches = parse_matches_json(&body)
            .with_context(|| format!("season {season} matchday {matchday} match data"))?;
        matches.sort_by_key(|m| m.date);
        Ok(matches)
    }

    fn get(&self, url: &str, season: u16) -> Result<String> {
        let client = http_client()?;
        match &self.cache {
            Some(cache) => cache.fetch(client, url, season_closes_at(season)),
            None => fetch_text(client, url),
        }
    }
}

impl MatchDataProvider for OpenLigaDb {
    fn list_teams(&self, seasons: SeasonRange) -> Result<Vec<TeamInfo>> {
        let mut per_season = Vec::with_capacity(seasons.season_count());
        for season in seasons.seasons() {
            per_season.push(self.season_teams(season)?);
        }
        let teams = merge_rosters(per_season);
        info!(league = %self.league, teams = teams.len(), "rosters loaded");
        Ok(teams)
    }

    fn list_matches(&self, seasons: SeasonRange) -> Result<Vec<MatchOutcome>> {
        let mut out = Vec::new();
        for season in seasons.seasons() {
            out.extend(self.season_matches(season)?);
        }
        out.sort_by_key(|m| m.date);
        info!(league = %self.league, matches = out.len(), "match results loaded");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(id: u32, name: &str, short: &str) -> TeamInfo {
        TeamInfo {
            id,
            name: name.to_string(),
            short_name: short.to_string(),
        }
    }

    #[test]
    fn merge_rosters_keeps_first_position_and_latest_name() {
        let merged = merge_rosters(vec![
            vec![info(6, "Bayer Leverkusen", "B04"), info(7, "BVB", "BVB")],
            vec![info(7, "Borussia Dortmund", "BVB"), info(91, "Eintracht Frankfurt", "SGE")],
        ]);
        let ids = merged.iter().map(|t| t.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![6, 7, 91]);
        assert_eq!(merged[1].name, "Borussia Dortmund");
    }

    #[test]
    fn urls_follow_api_layout() {
        let api = OpenLigaDb::new("https://example.test/", "bl2");
        assert_eq!(
            api.season_teams_url(2010),
            "https://example.test/getavailableteams/bl2/2010"
        );
        assert_eq!(
            api.season_matches_url(2010),
            "https://example.test/getmatchdata/bl2/2010"
        );
        assert_eq!(
            api.matchday_url(2010, 34),
            "https://example.test/getmatchdata/bl2/2010/34"
        );
    }

    #[test]
    fn final_result_preferred_over_half_time() {
        let raw = r#"[{
            "matchID": 1,
            "matchDateTime": "2020-01-01T15:30:00",
            "team1": {"teamId": 1},
            "team2": {"teamId": 2},
            "matchIsFinished": true,
            "matchResults": [
                {"resultTypeID": 1, "pointsTeam1": 0, "pointsTeam2": 1},
                {"resultTypeID": 2, "pointsTeam1": 3, "pointsTeam2": 1}
            ]
        }]"#;
        let matches = parse_matches_json(raw).unwrap();
        assert_eq!((matches[0].score1, matches[0].score2), (3, 1));
    }

    #[test]
    fn negative_score_is_rejected() {
        let raw = r#"[{
            "matchID": 9,
            "matchDateTime": "2020-01-01T15:30:00",
            "team1": {"teamId": 1},
            "team2": {"teamId": 2},
            "matchIsFinished": true,
            "matchResults": [{"resultTypeID": 2, "pointsTeam1": -1, "pointsTeam2": 0}]
        }]"#;
        assert!(matches!(
            parse_matches_json(raw),
            Err(EloError::DataFormat { .. })
        ));
    }

    #[test]
    fn season_closes_in_july_of_following_year() {
        // 2005-07-01T00:00:00Z
        assert_eq!(season_closes_at(2004), Some(1_120_176_000));
        assert!(season_closes_at(2004) < season_closes_at(2005));
    }

    #[test]
    fn settled_season_roster_comes_from_cache_file() {
        let mut root = std::env::temp_dir();
        root.push(format!("liga_elo_openliga_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        // Nothing listens on the discard port; only the cache can answer.
        let api = OpenLigaDb::new("http://127.0.0.1:9", "bl1").with_cache_dir(&root);
        let url = api.season_teams_url(2004);
        let path = api.cache().and_then(|c| c.entry_path(&url)).unwrap();
        assert_eq!(path, root.join("127.0.0.1_9/getavailableteams/bl1/2004.json"));

        let entry = serde_json::json!({
            "version": 2,
            "url": url,
            "body": r#"[{"teamId": 40, "teamName": "FC Bayern", "shortName": "FCB"}]"#,
            "etag": null,
            "last_modified": null,
            "fetched_at": 1_200_000_000_i64,
        });
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, entry.to_string()).unwrap();

        let teams = api.season_teams(2004).unwrap();
        assert_eq!(teams, vec![info(40, "FC Bayern", "FCB")]);
        assert!(OpenLigaDb::default().with_cache(false).cache().is_none());
        let _ = std::fs::remove_dir_all(root);
    }
}
