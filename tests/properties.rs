use chrono::{Duration, NaiveDate, NaiveDateTime};
use liga_elo::elo::calculate_elo_update;
use liga_elo::{EloConfig, MatchOutcome, RatingEngine};
use proptest::prelude::*;

const TEAMS: u32 = 6;

fn kickoff(day: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2002, 8, 1)
        .and_then(|d| d.and_hms_opt(15, 30, 0))
        .unwrap()
        + Duration::days(day)
}

fn fixtures() -> impl Strategy<Value = Vec<MatchOutcome>> {
    prop::collection::vec((1..=TEAMS, 1..TEAMS, 0u16..6, 0u16..6), 1..80).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(idx, (home, offset, s1, s2))| {
                let away = (home - 1 + offset) % TEAMS + 1;
                MatchOutcome {
                    match_id: idx as u64,
                    date: kickoff(idx as i64),
                    team1_id: home,
                    team2_id: away,
                    score1: s1,
                    score2: s2,
                }
            })
            .collect()
    })
}

fn rated(outcomes: &[MatchOutcome]) -> RatingEngine {
    let mut engine = RatingEngine::new(EloConfig::default());
    for id in 1..=TEAMS {
        engine.create_team(id, &format!("Team {id}"), &format!("T{id}"));
    }
    engine.process_outcomes(outcomes).unwrap();
    engine
}

proptest! {
    #[test]
    fn draw_never_favours_the_stronger_side(high in 800i32..1600, gap in 0i32..600) {
        let cfg = EloConfig::default();
        let low = high - gap;
        prop_assert!(calculate_elo_update(high, low, 0.5, &cfg) <= high);
        prop_assert!(calculate_elo_update(low, high, 0.5, &cfg) >= low);
    }

    #[test]
    fn equal_ratings_move_by_sixteen(rating in 500i32..2000) {
        let cfg = EloConfig::default();
        prop_assert_eq!(calculate_elo_update(rating, rating, 1.0, &cfg) - rating, 16);
        prop_assert_eq!(calculate_elo_update(rating, rating, 0.0, &cfg) - rating, -16);
    }

    #[test]
    fn peak_bounds_every_recorded_rating(outcomes in fixtures()) {
        let engine = rated(&outcomes);
        for team in engine.teams() {
            prop_assert!(team.highest_elo() >= team.elo());
            let mut running_peak = EloConfig::default().baseline;
            for point in team.history() {
                running_peak = running_peak.max(point.rating);
                prop_assert!(team.highest_elo() >= point.rating);
            }
            prop_assert_eq!(running_peak, team.highest_elo());
        }
    }

    #[test]
    fn history_has_one_entry_per_match_played(outcomes in fixtures()) {
        let engine = rated(&outcomes);
        for team in engine.teams() {
            let played = outcomes.iter().filter(|m| m.involves(team.id)).collect::<Vec<_>>();
            prop_assert_eq!(team.history().len(), played.len());
            let dates = team.history().iter().map(|p| p.date).collect::<Vec<_>>();
            let expected = played.iter().map(|m| m.date).collect::<Vec<_>>();
            prop_assert_eq!(dates, expected);
        }
    }

    #[test]
    fn input_order_does_not_matter(outcomes in fixtures()) {
        let mut reversed = outcomes.clone();
        reversed.reverse();
        prop_assert_eq!(rated(&outcomes).summary(), rated(&reversed).summary());
    }
}
