use super::{
    CacheCommands, FavoriteCommands, GoalCommands, HabitCommands, JournalCommands,
    ReviewCommands, SettingsCommands, format_message, parse_date, target_message, today,
};
use crate::message::{MessageId, TimeOfDay};
use crate::personal::{GoalPeriod, Goals, Habits, Journal};
use crate::selection::SelectionOrigin;
use crate::settings::Settings;
use crate::sources::hybrid::count_categories;
use crate::state::{AppState, ReactionKind};
use crate::storage::export_snapshot;
use crate::utils::atomic_write;
use anyhow::{Context, Result};
use chrono::{Local, Timelike, Utc};
use std::path::Path;
use tracing::debug;

pub(super) async fn show_command(
    state: &mut AppState,
    category: Option<String>,
    remote: bool,
) -> Result<()> {
    if let Some(category) = category {
        // this run only; not saved
        state.settings.selected_category = category;
    }
    let now = Local::now().naive_local();

    if remote && state.config.sources.backend.enabled {
        let manager = state.hybrid_manager();
        let time_of_day = state
            .settings
            .time_of_day_messages
            .then(|| TimeOfDay::from_hour(now.hour()));
        let category = state.settings.category_filter().map(str::to_string);
        let pick = manager
            .random_message(category.as_deref(), time_of_day, state.rng())
            .await;
        debug!("remote pick served by {}", pick.source);
        state.record_view(&pick.message, now.date());
        println!("{}", format_message(&pick.message));
        match manager.health_checked() {
            Some(false) => println!("  (backend unhealthy; picked from local messages)"),
            Some(true) if !manager.is_using_backend() => {
                println!("  (backend request failed; picked from local messages)");
            }
            _ => {}
        }
        return Ok(());
    }

    let selection = state.display_random_message(now);
    match selection.origin {
        SelectionOrigin::SpecialDay => println!("A message for a special day:"),
        SelectionOrigin::Event => println!("Something for right now:"),
        _ => {}
    }
    println!("{}", format_message(&selection.message));
    if state.favorites.contains(&selection.message.id) {
        println!("  (in your favorites)");
    }
    Ok(())
}

pub(super) async fn categories_command(state: &AppState) {
    let categories = if state.config.sources.backend.enabled {
        state.hybrid_manager().categories().await
    } else {
        count_categories(&state.messages)
    };
    if categories.is_empty() {
        println!("No categories.");
        return;
    }
    for c in categories {
        println!("  {:<20} {}", c.name, c.count);
    }
}

pub(super) fn favorites_command(state: &mut AppState, cmd: FavoriteCommands) -> Result<()> {
    match cmd {
        FavoriteCommands::List => {
            if state.favorites.is_empty() {
                println!("No favorites yet.");
            }
            for fav in state.favorites.list() {
                println!("{}", format_message(&fav.message));
                println!(
                    "  added {}",
                    fav.added_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
                );
            }
        }
        FavoriteCommands::Add { id } => {
            let message = target_message(state, id.as_deref())?;
            if state.favorites.add(&message) {
                println!("Added {} to favorites.", message.id);
            } else {
                println!("{} is already a favorite.", message.id);
            }
        }
        FavoriteCommands::Remove { id } => {
            let id = MessageId::parse(&id);
            if state.favorites.remove(&id) {
                println!("Removed {} from favorites.", id);
            } else {
                println!("{} was not a favorite.", id);
            }
        }
    }
    Ok(())
}

pub(super) fn history_command(state: &mut AppState, limit: usize, by_date: bool, clear: bool) {
    if clear {
        state.history.clear();
        println!("History cleared.");
        return;
    }
    if state.history.entries().is_empty() {
        println!("No history yet.");
        return;
    }
    if by_date {
        for (day, entries) in state.history.grouped_by_date(&Local, limit) {
            println!("{}", day.format("%Y-%m-%d"));
            for entry in entries {
                println!("  {}  {}", entry.message.id, entry.message.text);
            }
        }
        return;
    }
    for entry in state.history.recent(limit) {
        println!(
            "{}  {}  {}",
            entry.viewed_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            entry.message.id,
            entry.message.text
        );
    }
}

pub(super) async fn react_command(
    state: &mut AppState,
    kind: ReactionKind,
    id: Option<&str>,
    undo: bool,
) -> Result<()> {
    let message = target_message(state, id)?;
    if undo {
        if state.reactions.remove(&message.id, kind) {
            println!("Removed {} from {}.", kind, message.id);
        } else {
            println!("You had not reacted {} to {}.", kind, message.id);
        }
        return Ok(());
    }

    if state.reactions.has_reacted(&message.id, kind) {
        println!("Already reacted {} to {}.", kind, message.id);
    } else {
        let manager = state.hybrid_manager();
        let receipt = manager
            .add_reaction(&message.id, kind, &mut state.reactions)
            .await;
        if receipt.sent_to_backend {
            println!("Reacted {} to {} (also sent to the backend).", kind, message.id);
        } else {
            println!("Reacted {} to {}.", kind, message.id);
        }
    }
    let counts = state.reactions.counts(&message.id);
    println!(
        "  like {}  heart {}  fire {}",
        counts.like, counts.heart, counts.fire
    );
    Ok(())
}

pub(super) fn journal_command(state: &AppState, cmd: JournalCommands) -> Result<()> {
    let mut journal = Journal::load(state.storage.clone());
    match cmd {
        JournalCommands::Write { text, mood, date } => {
            let date = parse_date(date.as_deref())?;
            let entry = journal.save(date, text.as_deref().unwrap_or_default(), mood)?;
            println!(
                "Saved journal entry for {}{}.",
                date,
                entry.mood.map(|m| format!(" ({})", m)).unwrap_or_default()
            );
        }
        JournalCommands::List { limit } => {
            if journal.is_empty() {
                println!("No journal entries yet.");
            }
            for (date, entry) in journal.recent(limit) {
                match entry.mood {
                    Some(mood) => println!("{} [{}]", date, mood),
                    None => println!("{}", date),
                }
                if !entry.text.is_empty() {
                    println!("  {}", entry.text);
                }
            }
        }
        JournalCommands::Remove { date } => {
            let date = parse_date(Some(&date))?;
            if journal.remove(date) {
                println!("Removed the entry for {}.", date);
            } else {
                println!("No entry for {}.", date);
            }
        }
    }
    Ok(())
}

pub(super) fn goals_command(state: &AppState, cmd: GoalCommands) -> Result<()> {
    let mut goals = Goals::load(state.storage.clone());
    match cmd {
        GoalCommands::Add { text, period } => {
            let goal = goals.add(period, &text)?;
            println!("Added {} goal {}.", period, goal.id);
        }
        GoalCommands::Toggle { id } => {
            let done = goals.toggle(&id)?;
            println!("Goal {} is {}.", id, if done { "done" } else { "open" });
        }
        GoalCommands::Remove { id } => {
            if goals.remove(&id) {
                println!("Removed goal {}.", id);
            } else {
                println!("No goal {}.", id);
            }
        }
        GoalCommands::List { period } => {
            let periods = match period {
                Some(p) => vec![p],
                None => vec![GoalPeriod::Weekly, GoalPeriod::Monthly],
            };
            for period in periods {
                let (done, total) = goals.progress(period);
                println!("{} ({}/{})", period, done, total);
                for goal in goals.list(period) {
                    let mark = if goal.done { "x" } else { " " };
                    println!("  [{}] {}  {}", mark, goal.id, goal.text);
                }
            }
        }
    }
    Ok(())
}

pub(super) fn habits_command(state: &AppState, cmd: HabitCommands) -> Result<()> {
    let mut habits = Habits::load(state.storage.clone());
    match cmd {
        HabitCommands::Check { name, date } => {
            let date = parse_date(date.as_deref())?;
            if habits.check_in(&name, date)? {
                println!("Checked off {} for {}.", name.trim(), date);
            } else {
                println!("{} was already checked off for {}.", name.trim(), date);
            }
            println!("  streak: {} days", habits.streak(&name, today()));
        }
        HabitCommands::List => {
            let today = today();
            let names: Vec<String> = habits.names().map(str::to_string).collect();
            if names.is_empty() {
                println!("No habits yet.");
            }
            for name in names {
                let mark = if habits.is_done(&name, today) { "x" } else { " " };
                println!("  [{}] {:<20} {} days", mark, name, habits.streak(&name, today));
            }
        }
        HabitCommands::Remove { name } => {
            if habits.remove(&name) {
                println!("Removed habit {}.", name);
            } else {
                println!("No habit {}.", name);
            }
        }
    }
    Ok(())
}

pub(super) fn submit_command(
    state: &mut AppState,
    text: &str,
    category: &str,
    author: Option<&str>,
) -> Result<()> {
    let message = state.submissions.submit(text, author, category)?;
    println!("Submitted {} for review.", message.id);
    Ok(())
}

pub(super) fn review_command(state: &mut AppState, cmd: ReviewCommands) -> Result<()> {
    match cmd {
        ReviewCommands::List => {
            let pending: Vec<_> = state.submissions.pending().cloned().collect();
            if pending.is_empty() {
                println!(
                    "Nothing to review ({} submitted in total).",
                    state.submissions.submitted().len()
                );
            }
            for message in pending {
                println!("{}", format_message(&message));
            }
        }
        ReviewCommands::Approve { id } => {
            let message = state.submissions.approve(&MessageId::parse(&id))?;
            println!("Approved {}; it joins the message pool.", message.id);
        }
        ReviewCommands::Reject { id } => {
            let message = state.submissions.reject(&MessageId::parse(&id))?;
            println!("Rejected {}.", message.id);
        }
    }
    Ok(())
}

pub(super) fn settings_command(state: &mut AppState, cmd: SettingsCommands) -> Result<()> {
    match cmd {
        SettingsCommands::Show => {
            println!("{}", serde_json::to_string_pretty(&state.settings)?);
        }
        SettingsCommands::Set { key, value } => {
            state.settings.set_field(&key, &value)?;
            if !state.settings.save(&state.storage) {
                anyhow::bail!("settings could not be saved");
            }
            println!("{} updated.", key);
        }
        SettingsCommands::Reset => {
            state.settings = Settings::default();
            state.settings.save(&state.storage);
            println!("Settings reset to defaults.");
        }
    }
    Ok(())
}

pub(super) fn streak_command(state: &AppState) {
    let data = state.streak.data();
    match data.last_visit {
        Some(last) => {
            println!("Current streak: {} days", data.current);
            println!("Days visited:   {}", data.total);
            println!("Last visit:     {}", last);
        }
        None => println!("No visits yet. Run `daily-start show` to start a streak."),
    }
}

pub(super) async fn stats_command(state: &AppState) {
    println!("Messages:       {}", state.messages.len());
    println!("Favorites:      {}", state.favorites.len());
    println!("History:        {}", state.history.entries().len());
    println!(
        "Journal:        {}",
        Journal::load(state.storage.clone()).len()
    );
    println!("Streak:         {} days", state.streak.data().current);

    let top = state.reactions.top(3);
    if !top.is_empty() {
        println!("Most reacted:");
        for (id, counts) in top {
            println!("  {:<12} {}", id, counts.total());
        }
    }

    if state.config.sources.backend.enabled
        && let Some(remote) = state.hybrid_manager().stats().await
    {
        println!("Backend:");
        println!("  messages     {}", remote.total_messages);
        println!("  views        {}", remote.total_views);
        println!("  today        {}", remote.today_views);
        for c in remote.popular_categories {
            println!("  {:<12} {} views", c.category, c.views);
        }
    }
}

pub(super) fn export_command(state: &AppState, out: Option<&Path>) -> Result<()> {
    let snapshot = export_snapshot(&state.storage, Utc::now());
    let content = serde_json::to_string_pretty(&snapshot)?;
    match out {
        Some(path) => {
            atomic_write(path, &content)
                .with_context(|| format!("Failed to write export to {}", path.display()))?;
            println!("Exported to {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

pub(super) fn import_command(state: &mut AppState, file: &Path) -> Result<()> {
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let report = state.submissions.import_document(&bytes, today())?;
    println!(
        "Imported {} messages ({} already present, {} unusable).",
        report.imported, report.duplicates, report.invalid
    );
    Ok(())
}

pub(super) fn cache_command(state: &AppState, cmd: CacheCommands) {
    match cmd {
        CacheCommands::Clear { all } => {
            let removed = if all {
                state.cache.clear_all()
            } else {
                state.cache.clear_expired_cache()
            };
            println!("Removed {} cache entries.", removed);
        }
    }
}
