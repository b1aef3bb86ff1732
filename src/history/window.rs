//! Lookback windows for query-history retrieval.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Query history cannot be fetched further back than this.
pub const RETRIEVAL_HORIZON_HOURS: u32 = 72;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("invalid time window {0:?}: expected e.g. \"6h\" or \"2d\"")]
    Unparseable(String),

    #[error("time window must be at least one hour")]
    Empty,

    #[error(
        "time window of {hours}h exceeds the {horizon}h retrieval horizon",
        horizon = RETRIEVAL_HORIZON_HOURS
    )]
    BeyondHorizon { hours: u32 },
}

/// A bounded lookback, in whole hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeWindow {
    hours: u32,
}

impl TimeWindow {
    /// The windows offered for selection, with display labels.
    pub const OPTIONS: [(TimeWindow, &'static str); 7] = [
        (TimeWindow { hours: 1 }, "Last 1 hour"),
        (TimeWindow { hours: 2 }, "Last 2 hours"),
        (TimeWindow { hours: 6 }, "Last 6 hours"),
        (TimeWindow { hours: 12 }, "Last 12 hours"),
        (TimeWindow { hours: 24 }, "Last 1 day"),
        (TimeWindow { hours: 48 }, "Last 2 days"),
        (TimeWindow { hours: 72 }, "Last 3 days"),
    ];

    /// Build a window, rejecting zero and anything past the retrieval horizon.
    pub fn within_horizon(hours: u32) -> Result<Self, WindowError> {
        if hours == 0 {
            return Err(WindowError::Empty);
        }
        if hours > RETRIEVAL_HORIZON_HOURS {
            return Err(WindowError::BeyondHorizon { hours });
        }
        Ok(Self { hours })
    }

    /// Parse `"6h"`, `"2d"` or a bare hour count such as `"12"`.
    pub fn parse(label: &str) -> Result<Self, WindowError> {
        let s = label.trim().to_ascii_lowercase();
        let bad = || WindowError::Unparseable(label.to_string());
        let (digits, multiplier) = if let Some(d) = s.strip_suffix('d') {
            (d, 24)
        } else if let Some(h) = s.strip_suffix('h') {
            (h, 1)
        } else {
            (s.as_str(), 1)
        };
        let n: u32 = digits.trim().parse().map_err(|_| bad())?;
        let hours = n.checked_mul(multiplier).ok_or_else(bad)?;
        Self::within_horizon(hours)
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn as_duration(&self) -> Duration {
        Duration::hours(i64::from(self.hours))
    }

    /// Lower bound of the window ending at `now`.
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.as_duration()
    }

    /// Display label, e.g. "Last 6 hours".
    pub fn label(&self) -> String {
        Self::OPTIONS
            .iter()
            .find(|(w, _)| w == self)
            .map(|(_, l)| l.to_string())
            .unwrap_or_else(|| format!("Last {} hours", self.hours))
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self { hours: 24 }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hours % 24 == 0 {
            write!(f, "{}d", self.hours / 24)
        } else {
            write!(f, "{}h", self.hours)
        }
    }
}

impl FromStr for TimeWindow {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TimeWindow {
    type Error = WindowError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<TimeWindow> for String {
    fn from(w: TimeWindow) -> Self {
        w.to_string()
    }
}
