//! Respect scoring rules.
//!
//! The AI persona keeps a respect level between 0 and 100 that moves with the
//! user's completion behavior. The three adjustments are not inverses of each
//! other (+5 completion, -3 uncompletion, -2 incomplete deletion).
//!
//! All functions here are pure and total over [`RespectLevel`]; out-of-range
//! numbers are rejected or clamped when the newtype is built, never later.

pub mod streak;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub use streak::StreakState;

/// Respect gained by completing a task.
pub const COMPLETION_REWARD: u8 = 5;
/// Respect lost by marking a completed task incomplete again.
pub const UNCOMPLETION_PENALTY: u8 = 3;
/// Respect lost by deleting a task that was never completed.
pub const INCOMPLETE_DELETION_PENALTY: u8 = 2;

/// Lower bound (inclusive) of the high tier.
pub const HIGH_TIER_MIN: u8 = 70;
/// Lower bound (inclusive) of the medium tier.
pub const MEDIUM_TIER_MIN: u8 = 30;

/// Respect level in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct RespectLevel(u8);

impl RespectLevel {
    pub const MIN: RespectLevel = RespectLevel(0);
    pub const MAX: RespectLevel = RespectLevel(100);
    /// Level given to freshly created users.
    pub const DEFAULT: RespectLevel = RespectLevel(50);

    /// Build a level, rejecting anything outside `0..=100`.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if (0..=100).contains(&value) {
            Ok(RespectLevel(value as u8))
        } else {
            Err(ValidationError::OutOfRange {
                field: "respect_level".to_string(),
                value,
                min: 0,
                max: 100,
            })
        }
    }

    /// Build a level, clamping into `0..=100`.
    pub fn saturating(value: i64) -> Self {
        RespectLevel(value.clamp(0, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn tier(self) -> Tier {
        classify_tier(self)
    }
}

impl Default for RespectLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for RespectLevel {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        RespectLevel::new(value)
    }
}

impl From<RespectLevel> for u8 {
    fn from(level: RespectLevel) -> Self {
        level.0
    }
}

impl fmt::Display for RespectLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Respect band used to pick the AI's tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// 70 and above
    High,
    /// 30 to 69
    Medium,
    /// Below 30
    Low,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::High, Tier::Medium, Tier::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::High => "high",
            Tier::Medium => "medium",
            Tier::Low => "low",
        }
    }
}

impl From<RespectLevel> for Tier {
    fn from(level: RespectLevel) -> Self {
        classify_tier(level)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a level into its tier. Each band includes its lower bound.
pub fn classify_tier(level: RespectLevel) -> Tier {
    match level.value() {
        v if v >= HIGH_TIER_MIN => Tier::High,
        v if v >= MEDIUM_TIER_MIN => Tier::Medium,
        _ => Tier::Low,
    }
}

/// Respect after a task goes from incomplete to complete. Saturates at 100.
pub fn apply_completion(level: RespectLevel) -> RespectLevel {
    RespectLevel::saturating(i64::from(level.0) + i64::from(COMPLETION_REWARD))
}

/// Respect after a completed task is marked incomplete. Floors at 0.
pub fn apply_uncompletion(level: RespectLevel) -> RespectLevel {
    RespectLevel::saturating(i64::from(level.0) - i64::from(UNCOMPLETION_PENALTY))
}

/// Respect after an incomplete task is deleted. Floors at 0.
///
/// Deleting an already-completed task has no rule and leaves respect alone.
pub fn apply_incomplete_deletion(level: RespectLevel) -> RespectLevel {
    RespectLevel::saturating(i64::from(level.0) - i64::from(INCOMPLETE_DELETION_PENALTY))
}
