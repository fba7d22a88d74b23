use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingPoint {
    pub date: NaiveDateTime,
    pub rating: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: u32,
    pub name: String,
    pub short_name: String,
    elo: i32,
    highest_elo: i32,
    history: Vec<RatingPoint>,
}

impl Team {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        short_name: impl Into<String>,
        baseline: i32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            short_name: short_name.into(),
            elo: baseline,
            highest_elo: baseline,
            history: Vec::new(),
        }
    }

    /// Records the rating after a match played at `date`.
    ///
    /// History is keyed by date: a date already present has its rating
    /// replaced in place, a new date is inserted in chronological position.
    pub(crate) fn update_elo(&mut self, new_elo: i32, date: NaiveDateTime) {
        if new_elo > self.highest_elo {
            self.highest_elo = new_elo;
        }
        self.elo = new_elo;
        match self.history.binary_search_by_key(&date, |p| p.date) {
            Ok(idx) => self.history[idx].rating = new_elo,
            Err(idx) => self.history.insert(
                idx,
                RatingPoint {
                    date,
                    rating: new_elo,
                },
            ),
        }
    }

    pub fn elo(&self) -> i32 {
        self.elo
    }

    /// Peak rating, never below the current rating or any recorded one.
    pub fn highest_elo(&self) -> i32 {
        self.highest_elo
    }

    pub fn last_played(&self) -> Option<NaiveDateTime> {
        self.history.last().map(|p| p.date)
    }

    pub fn history(&self) -> &[RatingPoint] {
        &self.history
    }

    pub fn matches_played(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 8, d)
            .and_then(|date| date.and_hms_opt(15, 30, 0))
            .unwrap()
    }

    #[test]
    fn highest_elo_tracks_peak() {
        let mut team = Team::new(7, "Borussia Dortmund", "BVB", 1000);
        team.update_elo(1016, day(1));
        team.update_elo(1001, day(8));
        assert_eq!(team.elo(), 1001);
        assert_eq!(team.highest_elo(), 1016);
        assert_eq!(team.matches_played(), 2);
    }

    #[test]
    fn highest_elo_stays_at_baseline_after_losses() {
        let mut team = Team::new(7, "Borussia Dortmund", "BVB", 1000);
        team.update_elo(984, day(1));
        assert_eq!(team.highest_elo(), 1000);
    }

    #[test]
    fn same_date_overwrites_latest_entry() {
        let mut team = Team::new(1, "A", "A", 1000);
        team.update_elo(1016, day(1));
        team.update_elo(1020, day(1));
        assert_eq!(team.history().len(), 1);
        assert_eq!(team.history()[0].rating, 1020);
    }

    #[test]
    fn repeated_earlier_date_replaces_existing_point() {
        let mut team = Team::new(1, "A", "A", 1000);
        team.update_elo(1016, day(1));
        team.update_elo(1030, day(8));
        team.update_elo(1005, day(1));
        let dates = team.history().iter().map(|p| p.date).collect::<Vec<_>>();
        assert_eq!(dates, vec![day(1), day(8)]);
        assert_eq!(team.history()[0].rating, 1005);
        assert_eq!(team.highest_elo(), 1030);
    }

    #[test]
    fn earlier_new_date_is_inserted_in_order() {
        let mut team = Team::new(1, "A", "A", 1000);
        team.update_elo(1016, day(8));
        team.update_elo(990, day(1));
        let dates = team.history().iter().map(|p| p.date).collect::<Vec<_>>();
        assert_eq!(dates, vec![day(1), day(8)]);
        assert_eq!(team.last_played(), Some(day(8)));
    }
}
