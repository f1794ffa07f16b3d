use super::*;
use crate::message::{Season, TimeOfDay};
use crate::storage::{MessageCache, Storage};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("daily-start").chain(args.iter().copied())).unwrap()
}

fn memory_state() -> AppState {
    let storage = Storage::in_memory();
    let cache = MessageCache::new(storage.clone(), None);
    AppState::new(Config::default(), storage, cache)
}

#[test]
fn test_no_subcommand_means_show() {
    let cli = parse(&[]);
    assert!(cli.command.is_none());
}

#[test]
fn test_react_parses_kind() {
    let cli = parse(&["react", "love", "--id", "42"]);
    match cli.command {
        Some(Commands::React { kind, id, undo }) => {
            assert_eq!(kind, ReactionKind::Heart);
            assert_eq!(id.as_deref(), Some("42"));
            assert!(!undo);
        }
        _ => panic!("expected react"),
    }
}

#[test]
fn test_react_rejects_unknown_kind() {
    assert!(Cli::try_parse_from(["daily-start", "react", "meh"]).is_err());
}

#[test]
fn test_goal_period_default_and_alias() {
    match parse(&["goals", "add", "Run 5k"]).command {
        Some(Commands::Goals {
            cmd: GoalCommands::Add { period, .. },
        }) => assert_eq!(period, GoalPeriod::Weekly),
        _ => panic!("expected goals add"),
    }
    match parse(&["goals", "list", "--period", "month"]).command {
        Some(Commands::Goals {
            cmd: GoalCommands::List { period },
        }) => assert_eq!(period, Some(GoalPeriod::Monthly)),
        _ => panic!("expected goals list"),
    }
}

#[test]
fn test_journal_mood_parses() {
    match parse(&["journal", "write", "Slept well", "--mood", "ok"]).command {
        Some(Commands::Journal {
            cmd: JournalCommands::Write { text, mood, date },
        }) => {
            assert_eq!(text.as_deref(), Some("Slept well"));
            assert_eq!(mood, Some(Mood::Okay));
            assert!(date.is_none());
        }
        _ => panic!("expected journal write"),
    }
}

#[test]
fn test_global_config_flag() {
    let cli = parse(&["streak", "--config", "/tmp/ds.json"]);
    assert_eq!(cli.config, Some(PathBuf::from("/tmp/ds.json")));
}

#[test]
fn test_parse_date() {
    assert_eq!(
        parse_date(Some("2024-02-29")).unwrap(),
        NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
    );
    assert_eq!(parse_date(None).unwrap(), today());
    let err = parse_date(Some("29/02/2024")).unwrap_err();
    assert!(err.is_user_facing());
}

#[test]
fn test_format_message() {
    let message = Message::new(7, "Keep going", "Someone", "grit")
        .with_time_of_day(TimeOfDay::Morning)
        .with_season(Season::All);
    assert_eq!(
        format_message(&message),
        "\"Keep going\"\n  - Someone\n  [grit, morning, all] id 7"
    );
}

#[test]
fn test_target_message_by_id_and_default() {
    let mut state = memory_state();
    assert!(target_message(&state, None).is_err());

    state.messages = vec![Message::new(3, "Three", "a", "hope")];
    assert_eq!(target_message(&state, Some("3")).unwrap().text, "Three");
    assert!(target_message(&state, Some("4")).is_err());

    let shown = state.messages[0].clone();
    state.record_view(&shown, today());
    assert_eq!(target_message(&state, None).unwrap().id, MessageId::from(3));
}

#[test]
fn test_init_writes_default_config_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    init(Some(&path), false).unwrap();
    assert!(path.exists());

    std::fs::write(&path, "{\"storage\": {\"historyLimit\": 5}}").unwrap();
    init(Some(&path), false).unwrap();
    assert!(std::fs::read_to_string(&path).unwrap().contains("historyLimit\": 5"));

    init(Some(&path), true).unwrap();
    assert_eq!(load_config(Some(&path)).unwrap().storage.history_limit, 100);
}

#[test]
fn test_export_and_import_parse() {
    match parse(&["export", "-o", "backup.json"]).command {
        Some(Commands::Export { out }) => assert_eq!(out, Some(PathBuf::from("backup.json"))),
        _ => panic!("expected export"),
    }
    match parse(&["import", "more.json"]).command {
        Some(Commands::Import { file }) => assert_eq!(file, PathBuf::from("more.json")),
        _ => panic!("expected import"),
    }
}

#[test]
fn test_export_writes_saved_data() {
    let mut state = memory_state();
    let shown = Message::new(3, "Three", "a", "hope");
    state.favorites.add(&shown);
    state.record_view(&shown, today());

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("backup.json");
    subcommands::export_command(&state, Some(&out)).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["stats"]["favorites"], 1);
    assert_eq!(written["stats"]["totalViewed"], 1);
    assert_eq!(written["data"]["favorites"][0]["message"]["text"], "Three");
    assert_eq!(written["version"], crate::VERSION);
}

#[test]
fn test_import_adds_community_messages() {
    let mut state = memory_state();
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("more.json");
    std::fs::write(
        &file,
        r#"[{"text": "Imported words.", "author": "Z", "category": "hope"}]"#,
    )
    .unwrap();

    subcommands::import_command(&mut state, &file).unwrap();
    assert_eq!(state.submissions.community().len(), 1);
    assert_eq!(state.submissions.community()[0].text, "Imported words.");

    assert!(subcommands::import_command(&mut state, &dir.path().join("missing.json")).is_err());
}

#[tokio::test]
async fn test_react_twice_counts_once() {
    let mut state = memory_state();
    state.messages = vec![Message::new(3, "Three", "a", "hope")];
    let id = MessageId::from(3);

    subcommands::react_command(&mut state, ReactionKind::Fire, Some("3"), false)
        .await
        .unwrap();
    assert!(state.reactions.has_reacted(&id, ReactionKind::Fire));
    subcommands::react_command(&mut state, ReactionKind::Fire, Some("3"), false)
        .await
        .unwrap();
    assert_eq!(state.reactions.counts(&id).fire, 1);

    subcommands::react_command(&mut state, ReactionKind::Fire, Some("3"), true)
        .await
        .unwrap();
    assert_eq!(state.reactions.counts(&id).fire, 0);
}
