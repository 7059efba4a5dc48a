//! # Taskmaster Core Library
//!
//! This library provides the core business logic for Taskmaster, a to-do list
//! that keeps score. Completing tasks earns respect and builds a daily streak;
//! undoing or abandoning them costs respect. An AI companion comments on the
//! user's standing in one of three personalities.
//!
//! All operations are available through the standalone `taskmaster-cli`
//! binary, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Respect**: bounded 0..=100 score, tier classification and the daily
//!   streak tracker
//! - **Messages**: personality-specific message pools and a seedable selector
//! - **Service**: maps task changes to scoring events and persists the results
//! - **Storage**: SQLite persistence and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`TaskService`]: orchestrates users, tasks, scoring and messages
//! - [`RespectLevel`] and [`StreakState`]: the scoring state of a user
//! - [`MessageSelector`]: picks an AI message for a tier and personality
//! - [`SqliteStore`]: persistent [`Store`] implementation
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod messages;
pub mod model;
pub mod respect;
pub mod service;
pub mod storage;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::TaskEvent;
pub use messages::{select_message, MessageCatalog, MessageSelector, Personality};
pub use model::{
    sort_tasks, EventEffect, NewTask, NewUser, Priority, Task, TaskFilter, TaskId, TaskSort, User,
    UserId,
};
pub use respect::streak::StreakChange;
pub use respect::{
    apply_completion, apply_incomplete_deletion, apply_uncompletion, classify_tier, RespectLevel,
    StreakState, Tier,
};
pub use service::{ResetSummary, TaskOutcome, TaskService};
pub use storage::{Config, MemoryStore, SqliteStore, Store, TaskWrite, DEFAULT_RESET_BASELINE};
