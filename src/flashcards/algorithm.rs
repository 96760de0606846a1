//! Status schemes
//!
//! A status scheme decides how a card's status moves after an answer and
//! when a card with a given status is due again.
//!
//! - No-op: status never changes, always due (simple reviews)
//! - Leitner: +1 on success, -1 on failure, never below 1
//! - Streak: +1 on success, back to 1 on failure
//! - Custom: caller-supplied transition and due rule
//!
//! Leitner and streak cards are due `status * days_per_status` days after
//! their last update.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{FlashcardError, Result};
use super::models::Status;

/// Lowest status any built-in scheme produces
pub const MIN_STATUS: Status = 1;

/// Tunables for Leitner and streak reviews
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewSettings {
    pub days_per_status: u32,
    pub new_cards_per_session: usize,
    /// Hard ceiling for the status, if any
    pub max_status: Option<Status>,
    pub max_cards_per_session: usize,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            days_per_status: 1,
            new_cards_per_session: 5,
            max_status: None,
            max_cards_per_session: 20,
        }
    }
}

pub type TransformFn = Arc<dyn Fn(Status, bool) -> Status + Send + Sync>;
pub type DueFn = Arc<dyn Fn(Status, DateTime<Utc>, DateTime<Utc>) -> bool + Send + Sync>;

/// Caller-defined scheme
#[derive(Clone)]
pub struct CustomScheme {
    name: String,
    default_status: Status,
    transform: TransformFn,
    is_due: DueFn,
}

impl CustomScheme {
    /// `is_due` receives (status, last update, now)
    pub fn new<T, D>(name: impl Into<String>, default_status: Status, transform: T, is_due: D) -> Self
    where
        T: Fn(Status, bool) -> Status + Send + Sync + 'static,
        D: Fn(Status, DateTime<Utc>, DateTime<Utc>) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            default_status,
            transform: Arc::new(transform),
            is_due: Arc::new(is_due),
        }
    }
}

impl fmt::Debug for CustomScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomScheme")
            .field("name", &self.name)
            .field("default_status", &self.default_status)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum StatusScheme {
    NoOp,
    Leitner(ReviewSettings),
    Streak(ReviewSettings),
    Custom(CustomScheme),
}

impl StatusScheme {
    /// Resolve a persisted scheme name
    pub fn from_name(name: &str, settings: ReviewSettings) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "default" | "noop" => Ok(StatusScheme::NoOp),
            "leitner" => Ok(StatusScheme::Leitner(settings)),
            "streak" => Ok(StatusScheme::Streak(settings)),
            other => Err(FlashcardError::UnrecognizedScheme(other.to_string())),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            StatusScheme::NoOp => "default",
            StatusScheme::Leitner(_) => "leitner",
            StatusScheme::Streak(_) => "streak",
            StatusScheme::Custom(custom) => &custom.name,
        }
    }

    /// Status given to a card the first time it is reviewed
    pub fn default_status(&self) -> Status {
        match self {
            StatusScheme::Custom(custom) => custom.default_status,
            _ => MIN_STATUS,
        }
    }

    pub fn settings(&self) -> Option<&ReviewSettings> {
        match self {
            StatusScheme::Leitner(settings) | StatusScheme::Streak(settings) => Some(settings),
            _ => None,
        }
    }

    /// Next status after an answer
    pub fn transform(&self, current: Status, success: bool) -> Status {
        match self {
            StatusScheme::NoOp => current,
            StatusScheme::Leitner(settings) => leitner_transform(current, success, settings.max_status),
            StatusScheme::Streak(settings) => streak_transform(current, success, settings.max_status),
            StatusScheme::Custom(custom) => (custom.transform)(current, success),
        }
    }

    /// Whether a card last updated at `last_update` is due at `now`
    pub fn is_due_at(&self, status: Status, last_update: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            StatusScheme::NoOp => true,
            StatusScheme::Leitner(settings) | StatusScheme::Streak(settings) => {
                match next_review(status, last_update, settings.days_per_status) {
                    Some(due) => now >= due,
                    None => false,
                }
            }
            StatusScheme::Custom(custom) => (custom.is_due)(status, last_update, now),
        }
    }

    /// Review interval in days for a status, where the scheme has one
    pub fn interval_days(&self, status: Status) -> Option<i64> {
        self.settings()
            .map(|s| i64::from(status) * i64::from(s.days_per_status))
    }
}

fn leitner_transform(current: Status, success: bool, max_status: Option<Status>) -> Status {
    let current = current.max(MIN_STATUS);
    if let Some(max) = max_status {
        if current >= max {
            return max;
        }
    }
    if success {
        current.saturating_add(1)
    } else {
        (current - 1).max(MIN_STATUS)
    }
}

fn streak_transform(current: Status, success: bool, max_status: Option<Status>) -> Status {
    if !success {
        return MIN_STATUS;
    }
    let next = current.max(MIN_STATUS).saturating_add(1);
    match max_status {
        Some(max) => next.min(max),
        None => next,
    }
}

fn next_review(status: Status, last_update: DateTime<Utc>, days_per_status: u32) -> Option<DateTime<Utc>> {
    let days = i64::from(status) * i64::from(days_per_status);
    last_update.checked_add_signed(Duration::try_days(days)?)
}

/// Format an interval in days to a human-readable string
pub fn format_interval(days: i64) -> String {
    if days <= 0 {
        "now".to_string()
    } else if days < 7 {
        format!("{}d", days)
    } else if days < 30 {
        format!("{}w", days / 7)
    } else if days < 365 {
        format!("{}mo", days / 30)
    } else {
        format!("{}y", days / 365)
    }
}
