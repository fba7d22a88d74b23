use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use liga_elo::export::export_workbook;
use liga_elo::{EloConfig, EloError, RatingEngine, ResultPair};

fn temp_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("liga_elo_{}_{name}", std::process::id()));
    path
}

fn played_engine() -> RatingEngine {
    let mut engine = RatingEngine::new(EloConfig::default());
    engine.create_team(1, "Hertha BSC", "Hertha");
    engine.create_team(2, "VfB Stuttgart", "VfB");
    engine.create_team(3, "Arminia Bielefeld", "DSC");
    let date = NaiveDate::from_ymd_opt(2005, 1, 22)
        .and_then(|d| d.and_hms_opt(15, 30, 0))
        .unwrap();
    engine
        .update_pair(1, 2, ResultPair::SECOND_WINS, date)
        .unwrap();
    engine
}

#[test]
fn exports_charts_for_teams_that_played() {
    let path = temp_path("all.xlsx");
    let report = export_workbook(&path, &played_engine(), &[]).expect("export should succeed");
    assert_eq!(report.teams, 3);
    assert_eq!(report.charts, 2);
    let size = fs::metadata(&path).expect("workbook written").len();
    assert!(size > 0);
    let _ = fs::remove_file(path);
}

#[test]
fn selected_team_without_matches_gets_no_chart() {
    let path = temp_path("selected.xlsx");
    let report = export_workbook(&path, &played_engine(), &[2, 3]).expect("export should succeed");
    assert_eq!(report.charts, 1);
    let _ = fs::remove_file(path);
}

#[test]
fn unknown_selected_team_fails() {
    let path = temp_path("unknown.xlsx");
    let err = export_workbook(&path, &played_engine(), &[77]).unwrap_err();
    assert_eq!(
        err.downcast_ref::<EloError>(),
        Some(&EloError::UnknownTeam { team_id: 77 })
    );
    assert!(!path.exists());
}

#[test]
fn repeated_team_selection_writes_one_sheet() {
    let path = temp_path("repeated.xlsx");
    let report = export_workbook(&path, &played_engine(), &[2, 2]).expect("export should succeed");
    assert_eq!(report.charts, 1);
    assert!(path.exists());
    let _ = fs::remove_file(path);
}
