// Shared test helpers; not all items used by every test binary.
#![allow(unused)]

use chrono::{NaiveDate, NaiveDateTime};
use daily_start::config::Config;
use daily_start::state::AppState;
use serde_json::{Value, json};
use std::path::Path;
use tempfile::TempDir;

/// A storage directory plus a `messages.json` inside it.
pub struct TestHome {
    pub dir: TempDir,
}

impl TestHome {
    pub fn new(messages: Value) -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("messages.json"),
            json!({ "messages": messages }).to_string(),
        )
        .unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.storage.dir = Some(self.path().to_string_lossy().into_owned());
        config.sources.messages_path = self
            .path()
            .join("messages.json")
            .to_string_lossy()
            .into_owned();
        config.sources.quotes_path = None;
        config
    }

    /// Open file-backed state, as the CLI does, with a fixed seed.
    pub async fn open_state(&self, today: NaiveDate) -> AppState {
        let mut state = AppState::open(self.config()).unwrap().with_seed(11);
        state.load_pool(today).await;
        state
    }
}

pub fn sample_messages() -> Value {
    json!([
        {"id": 1, "text": "Begin again today.", "author": "A", "category": "new-beginnings", "season": "all"},
        {"id": 2, "text": "Courage is a habit.", "author": "B", "category": "courage", "season": "spring"},
        {"id": 3, "text": "Rest is productive.", "author": "C", "category": "rest", "season": "winter"},
        {"id": 4, "text": "Happy new year!", "author": "D", "category": "celebration", "specialDay": "new-year"},
        {"id": 5, "text": "Friday, you made it.", "author": "E", "category": "weekend", "event": "friday"}
    ])
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}
