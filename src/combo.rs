//! Combo streaks, score and run statistics.

use serde::Serialize;
use tracing::debug;

use crate::error::SessionError;

/// Streak and score counters for one run.
#[derive(Clone, Debug)]
pub struct ComboTracker {
    levels: Vec<u32>,
    bonuses: Vec<i64>,
    repeat_period: u32,
    pub combo: u32,
    pub max_combo: u32,
    pub score: u32,
    pub num_right: u32,
    pub num_wrong: u32,
}

impl ComboTracker {
    /// `levels` must be positive, strictly ascending and as long as `bonuses`;
    /// `repeat_period` must be positive.
    pub fn new(
        levels: Vec<u32>,
        bonuses: Vec<i64>,
        repeat_period: u32,
    ) -> Result<Self, SessionError> {
        check_levels(&levels, &bonuses, repeat_period)?;
        Ok(Self {
            levels,
            bonuses,
            repeat_period,
            combo: 0,
            max_combo: 0,
            score: 0,
            num_right: 0,
            num_wrong: 0,
        })
    }

    /// Count a correct move. Returns the bonus seconds earned, if any.
    pub fn on_correct_move(&mut self) -> Option<i64> {
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        self.num_right += 1;

        let bonus = if let Some(i) = self.levels.iter().position(|&l| l == self.combo) {
            Some(self.bonuses[i])
        } else {
            let last = *self.levels.last()?;
            (self.combo > last && self.combo % self.repeat_period == 0)
                .then(|| self.bonuses.last().copied())
                .flatten()
        };
        if let Some(seconds) = bonus {
            debug!(combo = self.combo, seconds, "combo bonus");
        }
        bonus
    }

    /// Break the streak. The caller applies the clock malus.
    pub fn on_wrong_move(&mut self) {
        self.combo = 0;
        self.num_wrong += 1;
    }

    /// Break the streak without counting a wrong move (time out, engine refusal).
    pub fn reset_combo(&mut self) {
        self.combo = 0;
    }

    pub fn on_puzzle_passed(&mut self) {
        self.score += 1;
    }

    /// Progress towards the next bonus as `(value, max)`.
    pub fn progress(&self) -> (u32, u32) {
        match self.levels.iter().position(|&l| l > self.combo) {
            Some(level) => {
                let prev = if level == 0 { 0 } else { self.levels[level - 1] };
                (self.combo - prev, self.levels[level] - prev)
            }
            None => (self.combo % self.repeat_period, self.repeat_period),
        }
    }

    /// Number of levels reached so far.
    pub fn levels_reached(&self) -> usize {
        self.levels.iter().filter(|&&l| self.combo >= l).count()
    }

    pub fn moves(&self) -> u32 {
        self.num_right + self.num_wrong
    }

    /// Share of correct moves; 1.0 before any move.
    pub fn accuracy(&self) -> f64 {
        match self.moves() {
            0 => 1.0,
            n => self.num_right as f64 / n as f64,
        }
    }
}

/// Reject combo tables that would make [`ComboTracker`] index past its
/// bonuses or divide by zero.
pub fn check_levels(
    levels: &[u32],
    bonuses: &[i64],
    repeat_period: u32,
) -> Result<(), SessionError> {
    let invalid = |msg: &str| Err(SessionError::InvalidConfig(msg.to_string()));
    if levels.is_empty() || levels.len() != bonuses.len() {
        return invalid("combo levels and bonuses must be non-empty and of equal length");
    }
    if levels.windows(2).any(|w| w[0] >= w[1]) || levels[0] == 0 {
        return invalid("combo levels must be positive and strictly ascending");
    }
    if repeat_period == 0 {
        return invalid("combo repeat period must be positive");
    }
    Ok(())
}

/// End-of-run statistics.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    pub score: u32,
    pub moves: u32,
    pub accuracy: f64,
    pub max_combo: u32,
    pub total_seconds: f64,
    pub seconds_per_move: Option<f64>,
    pub highest_solved_rank: String,
}

impl RunSummary {
    pub fn new(
        tracker: &ComboTracker,
        total_seconds: f64,
        highest_solved_rank: Option<&str>,
    ) -> Self {
        let moves = tracker.moves();
        Self {
            score: tracker.score,
            moves,
            accuracy: tracker.accuracy(),
            max_combo: tracker.max_combo,
            total_seconds,
            seconds_per_move: (moves > 0).then(|| total_seconds / moves as f64),
            highest_solved_rank: highest_solved_rank.unwrap_or("-").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{COMBO_BONUS_SECS, COMBO_LEVELS, COMBO_REPEAT_PERIOD};

    fn tracker() -> ComboTracker {
        ComboTracker::new(
            COMBO_LEVELS.to_vec(),
            COMBO_BONUS_SECS.to_vec(),
            COMBO_REPEAT_PERIOD,
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_bad_tables() {
        assert!(ComboTracker::new(vec![5, 12], vec![3], 10).is_err());
        assert!(ComboTracker::new(vec![5], vec![3], 0).is_err());
        assert!(ComboTracker::new(vec![12, 5], vec![3, 5], 10).is_err());
        assert!(ComboTracker::new(vec![], vec![], 10).is_err());
        assert!(ComboTracker::new(vec![0, 5], vec![1, 3], 10).is_err());
        assert!(ComboTracker::new(vec![5], vec![3], 10).is_ok());
    }

    #[test]
    fn test_repeat_bonus_uses_last_bonus() {
        let mut t = ComboTracker::new(vec![2], vec![4], 3).unwrap();
        let bonuses: Vec<Option<i64>> = (0..6).map(|_| t.on_correct_move()).collect();
        assert_eq!(bonuses, vec![None, Some(4), Some(4), None, None, Some(4)]);
    }

    #[test]
    fn test_bonus_fires_once_per_level() {
        let mut t = tracker();
        let bonuses: Vec<(u32, i64)> = (0..60)
            .filter_map(|_| t.on_correct_move().map(|b| (t.combo, b)))
            .collect();
        assert_eq!(
            bonuses,
            vec![(5, 3), (12, 5), (20, 7), (30, 10), (40, 10), (50, 10), (60, 10)]
        );
    }

    #[test]
    fn test_no_bonus_between_levels() {
        let mut t = tracker();
        for _ in 0..5 {
            t.on_correct_move();
        }
        for _ in 6..=11 {
            assert_eq!(t.on_correct_move(), None);
        }
    }

    #[test]
    fn test_wrong_move_resets_combo_only() {
        let mut t = tracker();
        let mut last_max = 0;
        for i in 0..30 {
            if i % 7 == 6 {
                t.on_wrong_move();
                assert_eq!(t.combo, 0);
            } else {
                t.on_correct_move();
            }
            assert!(t.max_combo >= last_max);
            last_max = t.max_combo;
        }
        assert_eq!(t.max_combo, 6);
        assert_eq!(t.num_wrong, 4);
        assert_eq!(t.num_right, 26);
    }

    #[test]
    fn test_progress() {
        let mut t = tracker();
        assert_eq!(t.progress(), (0, 5));
        for _ in 0..7 {
            t.on_correct_move();
        }
        assert_eq!(t.progress(), (2, 7));
        assert_eq!(t.levels_reached(), 1);
        for _ in 0..26 {
            t.on_correct_move();
        }
        assert_eq!(t.combo, 33);
        assert_eq!(t.progress(), (3, 10));
        assert_eq!(t.levels_reached(), 4);
    }

    #[test]
    fn test_summary() {
        let mut t = tracker();
        assert_eq!(t.accuracy(), 1.0);
        let empty = RunSummary::new(&t, 12.0, None);
        assert_eq!(empty.seconds_per_move, None);
        assert_eq!(empty.highest_solved_rank, "-");

        t.on_correct_move();
        t.on_correct_move();
        t.on_correct_move();
        t.on_wrong_move();
        t.on_puzzle_passed();
        let s = RunSummary::new(&t, 20.0, Some("3K"));
        assert_eq!(s.moves, 4);
        assert_eq!(s.accuracy, 0.75);
        assert_eq!(s.seconds_per_move, Some(5.0));
        assert_eq!(s.max_combo, 3);
        assert_eq!(s.score, 1);
        assert_eq!(s.highest_solved_rank, "3K");
    }
}
