//! User commands: registration, personality, progress reset and messages.

use chrono::NaiveDate;
use clap::Subcommand;
use serde_json::json;
use taskmaster_core::{Config, NewUser, Personality};

use super::{find_user, open_service, print_json, CliResult};

#[derive(Subcommand)]
pub enum UserAction {
    /// Register a new user
    Create {
        /// Username
        username: String,
        /// AI personality: supportive, balanced or savage
        /// (default: user.default_personality from config)
        #[arg(long)]
        personality: Option<Personality>,
    },
    /// Show a user's respect, tier and streak status
    Show {
        username: String,
    },
    /// Change the AI personality
    Personality {
        username: String,
        /// supportive, balanced or savage
        personality: Personality,
    },
    /// Reset respect to the configured baseline and delete all tasks
    Reset {
        username: String,
    },
    /// Print an AI message for the user's current standing
    Message {
        username: String,
    },
}

pub fn run(action: UserAction, today: NaiveDate) -> CliResult {
    let mut service = open_service()?;
    match action {
        UserAction::Create {
            username,
            personality,
        } => {
            let personality = match personality {
                Some(p) => p,
                None => Config::load()?.user.default_personality,
            };
            let user = service.register_user(&NewUser::new(username, personality))?;
            print_json(&user)?;
        }
        UserAction::Show { username } => {
            let user = find_user(&service, &username)?;
            print_json(&json!({
                "user": user,
                "tier": user.tier(),
                "streak_active": user.streak.is_active(today),
            }))?;
        }
        UserAction::Personality {
            username,
            personality,
        } => {
            let user = find_user(&service, &username)?;
            let user = service.set_personality(user.id, personality)?;
            print_json(&user)?;
        }
        UserAction::Reset { username } => {
            let user = find_user(&service, &username)?;
            let summary = service.reset_progress(user.id)?;
            print_json(&summary)?;
        }
        UserAction::Message { username } => {
            let user = find_user(&service, &username)?;
            println!("{}", service.message_for(user.id)?);
        }
    }
    Ok(())
}
