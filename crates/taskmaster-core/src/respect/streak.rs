//! Daily completion streaks.
//!
//! A streak counts consecutive calendar days with at least one qualifying
//! completion. Nothing decays the streak in the background: whether it
//! continues or resets is decided lazily at the next completion, from the
//! date of the previous one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Snapshot of a user's streak fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    /// Current run of consecutive days
    pub streak: u32,
    /// Longest run ever reached
    pub best_streak: u32,
    /// Day of the completion that last advanced the streak
    pub last_completed_date: Option<NaiveDate>,
}

/// How a completion affected the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakChange {
    /// First completion ever recorded
    Started,
    /// Already counted today
    Unchanged,
    /// Previous completion was yesterday
    Extended,
    /// Gap of two or more days, or a last date after `today`
    Reset,
}

impl StreakState {
    /// Compute the state after one qualifying completion on `today`.
    ///
    /// `today` is supplied by the caller and never sampled here.
    pub fn record_completion(&self, today: NaiveDate) -> StreakState {
        self.advance(today).0
    }

    /// Like [`record_completion`](Self::record_completion), also reporting
    /// which rule applied.
    pub fn advance(&self, today: NaiveDate) -> (StreakState, StreakChange) {
        let Some(last) = self.last_completed_date else {
            return (
                StreakState {
                    streak: 1,
                    best_streak: self.best_streak.max(1),
                    last_completed_date: Some(today),
                },
                StreakChange::Started,
            );
        };

        if last == today {
            return (*self, StreakChange::Unchanged);
        }

        if Some(last) == today.pred_opt() {
            let streak = self.streak.saturating_add(1);
            return (
                StreakState {
                    streak,
                    best_streak: self.best_streak.max(streak),
                    last_completed_date: Some(today),
                },
                StreakChange::Extended,
            );
        }

        // best_streak is lifted to 1 only for snapshots that were already
        // inconsistent (a date with best_streak 0).
        (
            StreakState {
                streak: 1,
                best_streak: self.best_streak.max(1),
                last_completed_date: Some(today),
            },
            StreakChange::Reset,
        )
    }

    /// Whether a completion on `today` would extend or keep the streak.
    pub fn is_active(&self, today: NaiveDate) -> bool {
        match self.last_completed_date {
            Some(last) => last == today || Some(last) == today.pred_opt(),
            None => false,
        }
    }

    /// True when the last completion is dated after `today`.
    pub fn is_future_dated(&self, today: NaiveDate) -> bool {
        self.last_completed_date.is_some_and(|last| last > today)
    }
}
