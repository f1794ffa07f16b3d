use crate::errors::{DailyStartError, DailyStartResult};
use crate::storage::{Storage, keys};
use crate::utils::sanitize::{MAX_TEXT_CHARS, sanitize_input};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalPeriod {
    Weekly,
    Monthly,
}

impl fmt::Display for GoalPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        })
    }
}

impl FromStr for GoalPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            other => Err(format!("unknown goal period '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub done: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalBook {
    #[serde(default)]
    pub weekly: Vec<Goal>,
    #[serde(default)]
    pub monthly: Vec<Goal>,
}

impl GoalBook {
    fn list_mut(&mut self, period: GoalPeriod) -> &mut Vec<Goal> {
        match period {
            GoalPeriod::Weekly => &mut self.weekly,
            GoalPeriod::Monthly => &mut self.monthly,
        }
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Goal> {
        self.weekly
            .iter_mut()
            .chain(self.monthly.iter_mut())
            .find(|g| g.id == id)
    }
}

/// Weekly and monthly goals, stored under `userGoals`.
pub struct Goals {
    storage: Storage,
    book: GoalBook,
}

impl Goals {
    pub fn load(storage: Storage) -> Self {
        let book = storage.get(keys::GOALS, GoalBook::default());
        Self { storage, book }
    }

    pub fn add(&mut self, period: GoalPeriod, text: &str) -> DailyStartResult<Goal> {
        let text = sanitize_input(text, MAX_TEXT_CHARS);
        if text.is_empty() {
            return Err(DailyStartError::Validation("goal text is empty".into()));
        }
        let goal = Goal {
            id: uuid::Uuid::new_v4().simple().to_string()[..8].to_string(),
            text,
            done: false,
            created_at: Utc::now(),
            completed_at: None,
        };
        self.book.list_mut(period).push(goal.clone());
        self.persist();
        Ok(goal)
    }

    /// Flip completion. Returns the new `done` state.
    pub fn toggle(&mut self, id: &str) -> DailyStartResult<bool> {
        let goal = self
            .book
            .find_mut(id)
            .ok_or_else(|| DailyStartError::Validation(format!("no goal with id '{}'", id)))?;
        goal.done = !goal.done;
        goal.completed_at = goal.done.then(Utc::now);
        let done = goal.done;
        self.persist();
        Ok(done)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.book.weekly.len() + self.book.monthly.len();
        self.book.weekly.retain(|g| g.id != id);
        self.book.monthly.retain(|g| g.id != id);
        if self.book.weekly.len() + self.book.monthly.len() == before {
            return false;
        }
        self.persist();
        true
    }

    pub fn list(&self, period: GoalPeriod) -> &[Goal] {
        match period {
            GoalPeriod::Weekly => &self.book.weekly,
            GoalPeriod::Monthly => &self.book.monthly,
        }
    }

    /// `(done, total)` for one period.
    pub fn progress(&self, period: GoalPeriod) -> (usize, usize) {
        let goals = self.list(period);
        (goals.iter().filter(|g| g.done).count(), goals.len())
    }

    fn persist(&self) {
        self.storage.set(keys::GOALS, &self.book);
    }
}
