use crate::errors::{DailyStartError, DailyStartResult};
use crate::storage::{Storage, keys};
use crate::utils::sanitize::{MAX_CATEGORY_CHARS, sanitize_input};
use chrono::{Days, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

/// Daily habit check-ins, stored under `habitTracker` as
/// `{habit: ["YYYY-MM-DD", ...]}`.
pub struct Habits {
    storage: Storage,
    days: BTreeMap<String, BTreeSet<NaiveDate>>,
}

impl Habits {
    pub fn load(storage: Storage) -> Self {
        let days = storage.get(keys::HABITS, BTreeMap::new());
        Self { storage, days }
    }

    /// Stored form of a habit name. Every accessor goes through this so a
    /// name finds the entry `check_in` created for it.
    pub fn normalize_name(habit: &str) -> String {
        sanitize_input(habit, MAX_CATEGORY_CHARS).trim().to_string()
    }

    /// Mark `habit` done on `date`. Returns false if it already was.
    pub fn check_in(&mut self, habit: &str, date: NaiveDate) -> DailyStartResult<bool> {
        let name = Self::normalize_name(habit);
        if name.is_empty() {
            return Err(DailyStartError::Validation("habit name is empty".into()));
        }
        let inserted = self.days.entry(name).or_default().insert(date);
        if inserted {
            self.storage.set(keys::HABITS, &self.days);
        }
        Ok(inserted)
    }

    pub fn is_done(&self, habit: &str, date: NaiveDate) -> bool {
        self.days
            .get(&Self::normalize_name(habit))
            .is_some_and(|d| d.contains(&date))
    }

    /// Consecutive checked-in days ending at `today`, or at yesterday when
    /// today has no check-in yet.
    pub fn streak(&self, habit: &str, today: NaiveDate) -> u32 {
        let Some(days) = self.days.get(&Self::normalize_name(habit)) else {
            return 0;
        };
        let mut cursor = if days.contains(&today) {
            today
        } else {
            match today.checked_sub_days(Days::new(1)) {
                Some(yesterday) => yesterday,
                None => return 0,
            }
        };
        let mut count = 0;
        while days.contains(&cursor) {
            count += 1;
            match cursor.checked_sub_days(Days::new(1)) {
                Some(prev) => cursor = prev,
                None => break,
            }
        }
        count
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.days.keys().map(String::as_str)
    }

    pub fn remove(&mut self, habit: &str) -> bool {
        if self.days.remove(&Self::normalize_name(habit)).is_none() {
            return false;
        }
        self.storage.set(keys::HABITS, &self.days);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn test_check_in_idempotent_per_day() {
        let mut habits = Habits::load(Storage::in_memory());
        assert!(habits.check_in("water", day(1)).unwrap());
        assert!(!habits.check_in("water", day(1)).unwrap());
        assert!(habits.check_in("water", day(2)).unwrap());
        assert!(habits.is_done("water", day(2)));
        assert!(!habits.is_done("water", day(3)));
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut habits = Habits::load(Storage::in_memory());
        assert!(habits.check_in("  ", day(1)).is_err());
    }

    #[test]
    fn test_streak() {
        let mut habits = Habits::load(Storage::in_memory());
        for d in [1, 3, 4, 5] {
            habits.check_in("walk", day(d)).unwrap();
        }
        assert_eq!(habits.streak("walk", day(5)), 3);
        // Not checked in yet today; yesterday's run still counts
        assert_eq!(habits.streak("walk", day(6)), 3);
        assert_eq!(habits.streak("walk", day(7)), 0);
        assert_eq!(habits.streak("walk", day(2)), 1);
        assert_eq!(habits.streak("unknown", day(5)), 0);
    }

    #[test]
    fn test_persisted_as_date_strings() {
        let storage = Storage::in_memory();
        let mut habits = Habits::load(storage.clone());
        habits.check_in("stretch", day(9)).unwrap();
        let raw: serde_json::Value = storage.get(keys::HABITS, serde_json::Value::Null);
        assert_eq!(raw["stretch"], serde_json::json!(["2026-10-09"]));

        let reloaded = Habits::load(storage);
        assert_eq!(reloaded.names().collect::<Vec<_>>(), vec!["stretch"]);
    }

    #[test]
    fn test_long_and_padded_names_stay_reachable() {
        let mut habits = Habits::load(Storage::in_memory());
        let long = "drink eight glasses of water";
        habits.check_in(long, day(1)).unwrap();
        habits.check_in(long, day(2)).unwrap();
        assert_eq!(
            habits.names().collect::<Vec<_>>(),
            vec!["drink eight glasses"]
        );
        assert!(habits.is_done(long, day(2)));
        assert_eq!(habits.streak(long, day(2)), 2);

        habits.check_in("  read  ", day(1)).unwrap();
        assert!(habits.is_done("read", day(1)));
        assert!(habits.is_done(" read ", day(1)));
        assert!(!habits.check_in("read", day(1)).unwrap());

        assert!(habits.remove(long));
        assert!(habits.remove("read "));
        assert_eq!(habits.names().count(), 0);
    }

    #[test]
    fn test_remove() {
        let mut habits = Habits::load(Storage::in_memory());
        habits.check_in("walk", day(1)).unwrap();
        assert!(habits.remove("walk"));
        assert!(!habits.remove("walk"));
    }
}
