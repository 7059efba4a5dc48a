//! Subcommand handlers.
//!
//! Every handler opens the default database and config, does one thing,
//! and prints the result as pretty JSON on stdout.

pub mod config;
pub mod task;
pub mod user;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use taskmaster_core::{Config, SqliteStore, TaskService, User};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// The scoring date: the `--today` override or the local calendar date.
pub fn today(override_date: Option<NaiveDate>) -> NaiveDate {
    override_date.unwrap_or_else(|| Local::now().date_naive())
}

pub fn open_service() -> Result<TaskService<SqliteStore>, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = SqliteStore::open()?;
    Ok(TaskService::from_config(store, &config)?)
}

pub fn find_user(
    service: &TaskService<SqliteStore>,
    username: &str,
) -> Result<User, Box<dyn std::error::Error>> {
    service
        .user_by_username(username.trim())?
        .ok_or_else(|| format!("User not found: {username}").into())
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
