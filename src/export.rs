use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Chart, ChartType, Workbook, Worksheet};
use tracing::info;

use crate::engine::{RatingEngine, SummaryRow};
use crate::team::Team;

const SHEET_NAME_MAX: usize = 31;
pub const HISTORY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug)]
pub struct ExportReport {
    pub teams: usize,
    pub charts: usize,
}

/// Writes a `Summary` sheet plus one history sheet with a line chart for each
/// selected team. An empty selection exports every team that played; a team
/// listed twice gets one sheet.
pub fn export_workbook(
    path: &Path,
    engine: &RatingEngine,
    team_ids: &[u32],
) -> Result<ExportReport> {
    let selected: Vec<&Team> = if team_ids.is_empty() {
        engine.teams().filter(|t| t.matches_played() > 0).collect()
    } else {
        let mut seen = HashSet::new();
        team_ids
            .iter()
            .filter(|id| seen.insert(**id))
            .map(|id| engine.team(*id))
            .collect::<Result<_, _>>()?
    };

    let summary = engine.ranked_summary();
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        write_summary(sheet, &summary)?;
    }

    let mut charts = 0usize;
    for team in &selected {
        let sheet = workbook.add_worksheet();
        let name = sheet_name(team);
        sheet
            .set_name(&name)
            .with_context(|| format!("sheet name '{name}'"))?;
        if write_history(sheet, &name, team)? {
            charts += 1;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    info!(path = %path.display(), teams = summary.len(), charts, "workbook exported");

    Ok(ExportReport {
        teams: summary.len(),
        charts,
    })
}

fn write_summary(sheet: &mut Worksheet, rows: &[SummaryRow]) -> Result<()> {
    let header = ["Team ID", "Team", "Short", "Current Elo", "Highest Elo"];
    for (col, title) in header.iter().enumerate() {
        sheet.write_string(0, col as u16, *title)?;
    }
    for (idx, row) in rows.iter().enumerate() {
        let r = idx as u32 + 1;
        sheet
            .write_number(r, 0, row.team_id)
            .and_then(|s| s.write_string(r, 1, &row.name))
            .and_then(|s| s.write_string(r, 2, &row.short_name))
            .and_then(|s| s.write_number(r, 3, row.elo))
            .and_then(|s| s.write_number(r, 4, row.highest_elo))
            .with_context(|| format!("write summary row {r}"))?;
    }
    sheet.set_column_width(1, 32)?;
    Ok(())
}

/// Returns whether a chart was inserted; teams without matches get none.
fn write_history(sheet: &mut Worksheet, sheet_name: &str, team: &Team) -> Result<bool> {
    sheet.write_string(0, 0, "Match date")?;
    sheet.write_string(0, 1, "Elo")?;
    for (idx, point) in team.history().iter().enumerate() {
        let r = idx as u32 + 1;
        sheet
            .write_string(r, 0, point.date.format(HISTORY_DATE_FORMAT).to_string())
            .and_then(|s| s.write_number(r, 1, point.rating))
            .with_context(|| format!("write history row {r} for {}", team.name))?;
    }
    sheet.set_column_width(0, 18)?;

    let points = team.history().len() as u32;
    if points == 0 {
        return Ok(false);
    }

    let mut chart = Chart::new(ChartType::Line);
    chart
        .add_series()
        .set_categories((sheet_name, 1, 0, points, 0))
        .set_values((sheet_name, 1, 1, points, 1))
        .set_name(team.name.as_str());
    let title = format!("Elo history for {}", team.name);
    chart.title().set_name(title.as_str());
    chart.x_axis().set_name("Match date");
    chart.y_axis().set_name("Elo rating");
    chart.legend().set_hidden();
    sheet.insert_chart(1, 3, &chart)?;
    Ok(true)
}

pub fn sheet_name(team: &Team) -> String {
    let label = if team.short_name.trim().is_empty() {
        team.name.as_str()
    } else {
        team.short_name.as_str()
    };
    let mut cleaned: String = label
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let suffix = format!("_{}", team.id);
    let room = SHEET_NAME_MAX.saturating_sub(suffix.len());
    if cleaned.chars().count() > room {
        cleaned = cleaned.chars().take(room).collect();
    }
    if cleaned.is_empty() {
        cleaned.push_str("Team");
    }
    cleaned.push_str(&suffix);
    cleaned
}
