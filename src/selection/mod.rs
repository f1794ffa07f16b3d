//! Filtered random message selection.
//!
//! Stages run in fixed precedence: category, time of day, season, special
//! day, event. The category, time-of-day and season stages narrow the
//! candidate set; a special day over the full set wins outright, and an
//! active event wins with configured probability. The final pick never
//! repeats the previously shown message when an alternative exists.

pub mod calendar;

use crate::config::SelectionConfig;
use crate::message::{Message, Season, TimeOfDay};
use crate::settings::Settings;
use chrono::{Datelike, NaiveDateTime, Timelike};
use tracing::debug;

/// Which stage produced the pool a message was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOrigin {
    SpecialDay,
    Event,
    Filtered,
    Unfiltered,
    Placeholder,
}

impl SelectionOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SpecialDay => "special-day",
            Self::Event => "event",
            Self::Filtered => "filtered",
            Self::Unfiltered => "unfiltered",
            Self::Placeholder => "placeholder",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub message: Message,
    pub origin: SelectionOrigin,
    /// Size of the pool the message was drawn from, before excluding the
    /// previous message.
    pub pool_size: usize,
}

pub struct Selector<'a> {
    probabilities: SelectionConfig,
    settings: &'a Settings,
}

impl<'a> Selector<'a> {
    pub fn new(settings: &'a Settings, probabilities: SelectionConfig) -> Self {
        Self {
            probabilities,
            settings,
        }
    }

    /// Candidate pool for `now`, with the stage that produced it.
    pub fn candidates<'m>(
        &self,
        messages: &'m [Message],
        now: NaiveDateTime,
        rng: &mut fastrand::Rng,
    ) -> (Vec<&'m Message>, SelectionOrigin) {
        let mut pool: Vec<&Message> = match self.settings.category_filter() {
            Some(category) => messages.iter().filter(|m| m.category == category).collect(),
            None => messages.iter().collect(),
        };

        if self.settings.time_of_day_messages {
            let period = TimeOfDay::from_hour(now.hour());
            let timed: Vec<&Message> = pool
                .iter()
                .copied()
                .filter(|m| m.time_of_day == Some(period))
                .collect();
            if !timed.is_empty() && rng.f64() < self.probabilities.time_of_day_probability {
                pool = timed;
            }
        }

        if self.settings.seasonal_messages {
            let season = Season::from_month(now.month());
            let seasonal: Vec<&Message> = pool
                .iter()
                .copied()
                .filter(|m| matches!(m.season, Some(s) if s == season || s == Season::All))
                .collect();
            if !seasonal.is_empty() && rng.f64() < self.probabilities.seasonal_probability {
                pool = seasonal;
            }
        }

        if self.settings.special_day_messages {
            let today = calendar::special_days_on(now.date());
            if !today.is_empty() {
                let special: Vec<&Message> = messages
                    .iter()
                    .filter(|m| m.special_day.as_deref().is_some_and(|d| today.contains(&d)))
                    .collect();
                if !special.is_empty() {
                    return (special, SelectionOrigin::SpecialDay);
                }
            }
        }

        if self.settings.event_messages {
            let events = calendar::active_events(now);
            let matching: Vec<&Message> = messages
                .iter()
                .filter(|m| m.event.as_deref().is_some_and(|e| events.contains(&e)))
                .collect();
            if !matching.is_empty() && rng.f64() < self.probabilities.event_probability {
                return (matching, SelectionOrigin::Event);
            }
        }

        if pool.is_empty() {
            (messages.iter().collect(), SelectionOrigin::Unfiltered)
        } else {
            (pool, SelectionOrigin::Filtered)
        }
    }

    /// Pick one message. Always returns something: the placeholder when
    /// `messages` is empty.
    pub fn select(
        &self,
        messages: &[Message],
        now: NaiveDateTime,
        previous: Option<&Message>,
        rng: &mut fastrand::Rng,
    ) -> Selection {
        let (pool, origin) = self.candidates(messages, now, rng);
        if pool.is_empty() {
            return Selection {
                message: Message::placeholder(),
                origin: SelectionOrigin::Placeholder,
                pool_size: 0,
            };
        }

        let pool_size = pool.len();
        let message = pick_avoiding(&pool, previous, rng).clone();
        debug!(
            "selected message {} from {} candidates ({})",
            message.id,
            pool_size,
            origin.as_str()
        );
        Selection {
            message,
            origin,
            pool_size,
        }
    }
}

/// Uniform pick from `pool`, skipping `previous` whenever any other
/// candidate exists. `pool` must be non-empty.
fn pick_avoiding<'m>(
    pool: &[&'m Message],
    previous: Option<&Message>,
    rng: &mut fastrand::Rng,
) -> &'m Message {
    if let Some(prev) = previous {
        let others: Vec<&Message> = pool.iter().copied().filter(|m| !m.same_as(prev)).collect();
        if !others.is_empty() {
            return others[rng.usize(..others.len())];
        }
    }
    pool[rng.usize(..pool.len())]
}

#[cfg(test)]
mod tests;
