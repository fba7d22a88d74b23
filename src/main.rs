use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use liga_elo::config::{Config, parse_k_factor};
use liga_elo::export::{HISTORY_DATE_FORMAT, export_workbook};
use liga_elo::openliga::OpenLigaDb;
use liga_elo::provider::rate_seasons;
use liga_elo::{RatingEngine, RoundingPolicy, chart};

/// Elo ratings for football clubs from OpenLigaDB results.
#[derive(Parser)]
#[command(name = "liga_elo", version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// League shortcut as used by OpenLigaDB (bl1, bl2, ...)
    #[arg(long, global = true)]
    league: Option<String>,

    /// First season (start year) to include
    #[arg(long, global = true, value_name = "YEAR")]
    start_season: Option<u16>,

    /// Last season (start year) to include
    #[arg(long, global = true, value_name = "YEAR")]
    end_season: Option<u16>,

    /// Elo K factor (positive)
    #[arg(long, global = true, value_parser = parse_k_factor)]
    k_factor: Option<f64>,

    /// truncate or nearest
    #[arg(long, global = true)]
    rounding: Option<RoundingPolicy>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Skip the on-disk HTTP cache
    #[arg(long, global = true)]
    no_cache: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print current and peak rating of every team, best first
    Table,
    /// Print the rating after each match of one team
    History {
        #[arg(long)]
        team: u32,
    },
    /// Write an xlsx workbook with the table and per-team history charts
    Export {
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
        /// Teams to chart; repeat for several, omit for all
        #[arg(long = "team", value_name = "ID")]
        teams: Vec<u32>,
    },
    /// Browse rating histories in the terminal
    View,
    /// Print the settled results of one matchday
    Matchday {
        #[arg(long)]
        season: u16,
        #[arg(long)]
        matchday: u16,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let args = Args::parse();
    let cfg = apply_overrides(Config::from_env(), &args);
    init_logging(&cfg.log_level)?;

    let api = OpenLigaDb::new(&cfg.api_base, &cfg.league).with_cache(cfg.http_cache);

    match args.command.unwrap_or(Command::Table) {
        Command::Table => print_table(&rate(&api, &cfg)?),
        Command::History { team } => print_history(&rate(&api, &cfg)?, team)?,
        Command::Export { out, teams } => {
            let report = export_workbook(&out, &rate(&api, &cfg)?, &teams)?;
            println!(
                "Wrote {} ({} teams, {} charts)",
                out.display(),
                report.teams,
                report.charts
            );
        }
        Command::View => chart::run_viewer(&rate(&api, &cfg)?)?,
        Command::Matchday { season, matchday } => print_matchday(&api, season, matchday)?,
    }
    Ok(())
}

fn rate(api: &OpenLigaDb, cfg: &Config) -> Result<RatingEngine> {
    let seasons = cfg.seasons()?;
    info!(
        league = %cfg.league,
        start = seasons.start(),
        end = seasons.end(),
        k = cfg.elo.k,
        rounding = %cfg.elo.rounding,
        "rating seasons"
    );
    rate_seasons(api, seasons, cfg.elo)
}

fn apply_overrides(mut cfg: Config, args: &Args) -> Config {
    if let Some(league) = &args.league {
        cfg.league = league.clone();
    }
    if let Some(start) = args.start_season {
        cfg.start_season = start;
    }
    if let Some(end) = args.end_season {
        cfg.end_season = end;
    }
    if let Some(k) = args.k_factor {
        cfg.elo.k = k;
    }
    if let Some(rounding) = args.rounding {
        cfg.elo.rounding = rounding;
    }
    if let Some(level) = &args.log_level {
        cfg.log_level = level.clone();
    }
    if args.no_cache {
        cfg.http_cache = false;
    }
    cfg
}

fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    Ok(())
}

fn print_table(engine: &RatingEngine) {
    println!("{:>4}  {:<32} {:>6} {:>6}", "#", "Team", "Elo", "Peak");
    for (idx, row) in engine.ranked_summary().iter().enumerate() {
        println!(
            "{:>4}  {:<32} {:>6} {:>6}",
            idx + 1,
            row.name,
            row.elo,
            row.highest_elo
        );
    }
}

fn print_history(engine: &RatingEngine, team_id: u32) -> Result<()> {
    let team = engine.team(team_id)?;
    println!("{} ({})", team.name, team.short_name);
    for point in team.history() {
        println!("{}  {:>6}", point.date.format(HISTORY_DATE_FORMAT), point.rating);
    }
    println!(
        "matches: {}  current: {}  peak: {}",
        team.matches_played(),
        team.elo(),
        team.highest_elo()
    );
    Ok(())
}

fn print_matchday(api: &OpenLigaDb, season: u16, matchday: u16) -> Result<()> {
    let names = api
        .season_teams(season)
        .context("matchday team names")?
        .into_iter()
        .map(|t| (t.id, t.name))
        .collect::<HashMap<_, _>>();
    let name = |id: u32| names.get(&id).cloned().unwrap_or_else(|| id.to_string());

    for m in api.matchday_matches(season, matchday)? {
        println!(
            "{}  {:<28} {:>2}:{:<2} {}",
            m.date.format(HISTORY_DATE_FORMAT),
            name(m.team1_id),
            m.score1,
            m.score2,
            name(m.team2_id)
        );
    }
    Ok(())
}
