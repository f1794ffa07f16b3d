use crate::storage::{Storage, keys};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakData {
    #[serde(default)]
    pub current: u32,
    #[serde(default)]
    pub last_visit: Option<NaiveDate>,
    /// Distinct days visited.
    #[serde(default)]
    pub total: u32,
}

impl StreakData {
    /// State after a visit on `today`.
    #[must_use]
    pub fn after_visit(self, today: NaiveDate) -> Self {
        match self.last_visit {
            Some(last) if last >= today => self,
            Some(last) if last.succ_opt() == Some(today) => Self {
                current: self.current.saturating_add(1),
                last_visit: Some(today),
                total: self.total.saturating_add(1),
            },
            _ => Self {
                current: 1,
                last_visit: Some(today),
                total: self.total.saturating_add(1),
            },
        }
    }
}

/// Consecutive-day visit streak, stored under `streakData`.
pub struct Streak {
    storage: Storage,
    data: StreakData,
}

impl Streak {
    pub fn load(storage: Storage) -> Self {
        let data = storage.get(keys::STREAK, StreakData::default());
        Self { storage, data }
    }

    pub fn visit(&mut self, today: NaiveDate) -> StreakData {
        let next = self.data.after_visit(today);
        if next != self.data {
            self.data = next;
            self.storage.set(keys::STREAK, &self.data);
        }
        self.data
    }

    pub fn data(&self) -> StreakData {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn test_first_visit() {
        let data = StreakData::default().after_visit(day(1));
        assert_eq!(data.current, 1);
        assert_eq!(data.total, 1);
        assert_eq!(data.last_visit, Some(day(1)));
    }

    #[test]
    fn test_same_day_is_noop() {
        let data = StreakData::default().after_visit(day(1));
        assert_eq!(data.after_visit(day(1)), data);
    }

    #[test]
    fn test_consecutive_days_extend() {
        let data = StreakData::default()
            .after_visit(day(1))
            .after_visit(day(2))
            .after_visit(day(3));
        assert_eq!(data.current, 3);
        assert_eq!(data.total, 3);
    }

    #[test]
    fn test_gap_resets_current_only() {
        let data = StreakData::default()
            .after_visit(day(1))
            .after_visit(day(2))
            .after_visit(day(5));
        assert_eq!(data.current, 1);
        assert_eq!(data.total, 3);
    }

    #[test]
    fn test_earlier_date_ignored() {
        let data = StreakData::default().after_visit(day(5));
        assert_eq!(data.after_visit(day(3)), data);
    }

    #[test]
    fn test_month_boundary() {
        let oct31 = NaiveDate::from_ymd_opt(2026, 10, 31).unwrap();
        let nov1 = NaiveDate::from_ymd_opt(2026, 11, 1).unwrap();
        let data = StreakData::default().after_visit(oct31).after_visit(nov1);
        assert_eq!(data.current, 2);
    }

    #[test]
    fn test_visit_persists() {
        let storage = Storage::in_memory();
        let mut streak = Streak::load(storage.clone());
        streak.visit(day(1));
        streak.visit(day(2));
        let reloaded = Streak::load(storage.clone());
        assert_eq!(reloaded.data().current, 2);

        let raw: serde_json::Value = storage.get(keys::STREAK, serde_json::Value::Null);
        assert_eq!(raw["lastVisit"], "2026-10-02");
    }
}
