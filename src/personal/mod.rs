//! Personal features layered on the message pool: journal, goals, habit
//! check-ins, visit streak and user-submitted messages.

pub mod goals;
pub mod habits;
pub mod journal;
pub mod streak;
pub mod submissions;

pub use goals::{Goal, GoalPeriod, Goals};
pub use habits::Habits;
pub use journal::{Journal, JournalEntry, Mood};
pub use streak::{Streak, StreakData};
pub use submissions::{ImportReport, Submissions};
