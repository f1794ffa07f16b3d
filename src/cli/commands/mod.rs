mod subcommands;

#[cfg(test)]
mod tests;

use crate::config::{Config, get_config_path, load_config, save_config};
use crate::message::{Message, MessageId};
use crate::personal::{GoalPeriod, Mood};
use crate::state::{AppState, ReactionKind};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "daily-start")]
#[command(about = "A daily inspirational message, with favorites, history and a journal")]
pub struct Cli {
    /// Config file (defaults to ~/.daily-start/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
    /// Show a message (the default command)
    Show {
        /// Only this category for this run
        #[arg(long, short = 'c')]
        category: Option<String>,
        /// Ask the backend first, if one is configured
        #[arg(long)]
        remote: bool,
    },
    /// List message categories with counts
    Categories,
    /// Manage favorite messages
    Favorites {
        #[command(subcommand)]
        cmd: FavoriteCommands,
    },
    /// Show or clear viewing history
    History {
        /// Most recent entries to show, in both layouts
        #[arg(long, short = 'n', default_value_t = 20)]
        limit: usize,
        /// Group entries by local date
        #[arg(long)]
        by_date: bool,
        #[arg(long)]
        clear: bool,
    },
    /// React to a message (like, heart, fire)
    React {
        kind: ReactionKind,
        /// Message id (defaults to the last shown message)
        #[arg(long)]
        id: Option<String>,
        /// Take the reaction back
        #[arg(long)]
        undo: bool,
    },
    /// Daily journal
    Journal {
        #[command(subcommand)]
        cmd: JournalCommands,
    },
    /// Weekly and monthly goals
    Goals {
        #[command(subcommand)]
        cmd: GoalCommands,
    },
    /// Habit check-ins
    Habits {
        #[command(subcommand)]
        cmd: HabitCommands,
    },
    /// Submit your own message for review
    Submit {
        text: String,
        #[arg(long, short = 'c')]
        category: String,
        #[arg(long, short = 'a')]
        author: Option<String>,
    },
    /// Review submitted messages
    Review {
        #[command(subcommand)]
        cmd: ReviewCommands,
    },
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        cmd: SettingsCommands,
    },
    /// Show the visit streak
    Streak,
    /// Usage statistics
    Stats,
    /// Write your saved data (favorites, settings, history, journal...) as JSON
    Export {
        /// Output file (defaults to stdout)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },
    /// Add messages from a JSON file to the community pool
    Import {
        /// A `{"messages": [...]}` document or a bare array of messages
        file: PathBuf,
    },
    /// Manage the quote cache
    Cache {
        #[command(subcommand)]
        cmd: CacheCommands,
    },
    /// Check config, storage and data sources
    Doctor,
}

#[derive(Subcommand)]
enum FavoriteCommands {
    /// List favorites
    List,
    /// Add a message (defaults to the last shown message)
    Add { id: Option<String> },
    /// Remove a favorite
    Remove { id: String },
}

#[derive(Subcommand)]
enum JournalCommands {
    /// Write today's entry (or the one for --date)
    Write {
        text: Option<String>,
        #[arg(long, short = 'm')]
        mood: Option<Mood>,
        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
    },
    /// Show recent entries
    List {
        #[arg(long, short = 'n', default_value_t = crate::personal::journal::RECENT_ENTRIES)]
        limit: usize,
    },
    /// Delete an entry
    Remove { date: String },
}

#[derive(Subcommand)]
enum GoalCommands {
    /// Add a goal
    Add {
        text: String,
        #[arg(long, short = 'p', default_value = "weekly")]
        period: GoalPeriod,
    },
    /// Mark a goal done or not done
    Toggle { id: String },
    /// Delete a goal
    Remove { id: String },
    /// List goals
    List {
        #[arg(long, short = 'p')]
        period: Option<GoalPeriod>,
    },
}

#[derive(Subcommand)]
enum HabitCommands {
    /// Check a habit off for today (or --date)
    Check {
        name: String,
        #[arg(long)]
        date: Option<String>,
    },
    /// List habits with their streaks
    List,
    /// Forget a habit
    Remove { name: String },
}

#[derive(Subcommand)]
enum ReviewCommands {
    /// Show pending submissions
    List,
    /// Approve a submission into the community pool
    Approve { id: String },
    /// Reject a submission
    Reject { id: String },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Print current settings
    Show,
    /// Change one setting, e.g. `set selectedCategory hope`
    Set { key: String, value: String },
    /// Restore the defaults
    Reset,
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Remove expired entries
    Clear {
        /// Remove every entry, not just expired ones
        #[arg(long)]
        all: bool,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command.unwrap_or(Commands::Show {
        category: None,
        remote: false,
    }) {
        Commands::Init { force } => {
            init(config_path, force)?;
        }
        Commands::Doctor => {
            crate::cli::doctor::doctor_command(config_path).await?;
        }
        Commands::Show { category, remote } => {
            let mut state = open_state(config_path, true).await?;
            subcommands::show_command(&mut state, category, remote).await?;
        }
        Commands::Categories => {
            let state = open_state(config_path, true).await?;
            subcommands::categories_command(&state).await;
        }
        Commands::Favorites { cmd } => {
            let mut state = open_state(config_path, true).await?;
            subcommands::favorites_command(&mut state, cmd)?;
        }
        Commands::History {
            limit,
            by_date,
            clear,
        } => {
            let mut state = open_state(config_path, false).await?;
            subcommands::history_command(&mut state, limit, by_date, clear);
        }
        Commands::React { kind, id, undo } => {
            let mut state = open_state(config_path, true).await?;
            subcommands::react_command(&mut state, kind, id.as_deref(), undo).await?;
        }
        Commands::Journal { cmd } => {
            let state = open_state(config_path, false).await?;
            subcommands::journal_command(&state, cmd)?;
        }
        Commands::Goals { cmd } => {
            let state = open_state(config_path, false).await?;
            subcommands::goals_command(&state, cmd)?;
        }
        Commands::Habits { cmd } => {
            let state = open_state(config_path, false).await?;
            subcommands::habits_command(&state, cmd)?;
        }
        Commands::Submit {
            text,
            category,
            author,
        } => {
            let mut state = open_state(config_path, false).await?;
            subcommands::submit_command(&mut state, &text, &category, author.as_deref())?;
        }
        Commands::Review { cmd } => {
            let mut state = open_state(config_path, false).await?;
            subcommands::review_command(&mut state, cmd)?;
        }
        Commands::Settings { cmd } => {
            let mut state = open_state(config_path, false).await?;
            subcommands::settings_command(&mut state, cmd)?;
        }
        Commands::Streak => {
            let state = open_state(config_path, false).await?;
            subcommands::streak_command(&state);
        }
        Commands::Stats => {
            let state = open_state(config_path, true).await?;
            subcommands::stats_command(&state).await;
        }
        Commands::Export { out } => {
            let state = open_state(config_path, false).await?;
            subcommands::export_command(&state, out.as_deref())?;
        }
        Commands::Import { file } => {
            let mut state = open_state(config_path, false).await?;
            subcommands::import_command(&mut state, &file)?;
        }
        Commands::Cache { cmd } => {
            let state = open_state(config_path, false).await?;
            subcommands::cache_command(&state, cmd);
        }
    }

    Ok(())
}

fn init(config_path: Option<&std::path::Path>, force: bool) -> Result<()> {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => get_config_path()?,
    };
    if path.exists() && !force {
        println!("Config already exists at {}", path.display());
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }
    let config = Config::default();
    save_config(&config, Some(&path))?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

/// Load config and persisted state. `with_pool` also loads the message pool,
/// which only the message-facing commands need.
async fn open_state(config_path: Option<&std::path::Path>, with_pool: bool) -> Result<AppState> {
    let config = load_config(config_path).context("Failed to load config")?;
    let mut state = AppState::open(config)?;
    debug!("session {}", state.session_id());
    if with_pool {
        let outcome = state.load_pool(today()).await;
        if outcome.used_fallback {
            warn!("messages could not be loaded, using defaults");
        } else {
            info!(
                "{} messages ready ({} from the secondary source)",
                state.messages.len(),
                outcome.secondary_count
            );
        }
    }
    Ok(state)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a `YYYY-MM-DD` argument, defaulting to today.
fn parse_date(arg: Option<&str>) -> Result<NaiveDate, crate::errors::DailyStartError> {
    match arg {
        None => Ok(today()),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            crate::errors::DailyStartError::Validation(format!(
                "'{}' is not a date (expected YYYY-MM-DD)",
                s
            ))
        }),
    }
}

/// The message a command without an explicit id acts on.
fn target_message(state: &AppState, id: Option<&str>) -> Result<Message> {
    match id {
        Some(raw) => {
            let id = MessageId::parse(raw);
            state
                .find_message(&id)
                .with_context(|| format!("no message with id {}", id))
        }
        None => state
            .current_or_last()
            .context("no message shown yet; run `daily-start show` first"),
    }
}

/// Multi-line rendering used by `show` and the list commands.
fn format_message(message: &Message) -> String {
    let mut out = format!("\"{}\"\n  - {}", message.text, message.author);
    let mut tags = vec![message.category.clone()];
    if let Some(tod) = message.time_of_day {
        tags.push(tod.to_string());
    }
    if let Some(season) = message.season {
        tags.push(season.to_string());
    }
    out.push_str(&format!("\n  [{}] id {}", tags.join(", "), message.id));
    out
}
