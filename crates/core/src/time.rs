use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    /// Whole seconds elapsed since `start`, never negative.
    #[must_use]
    pub fn elapsed_since(&self, start: DateTime<Utc>) -> ElapsedTime {
        ElapsedTime::between(start, self.now())
    }
}

//
// ─── ELAPSED TIME ──────────────────────────────────────────────────────────────
//

/// Whole seconds spent on a quiz attempt.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElapsedTime(u64);

impl ElapsedTime {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Seconds between two instants, floored; zero when `end` precedes `start`.
    #[must_use]
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let secs = (end - start).num_seconds();
        Self(u64::try_from(secs).unwrap_or(0))
    }

    #[must_use]
    pub fn as_secs(self) -> u64 {
        self.0
    }

    /// One second later, saturating.
    #[must_use]
    pub fn tick(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Minutes rounded half up (90s → 2, 89s → 1).
    #[must_use]
    pub fn rounded_minutes(self) -> u32 {
        let minutes = self.0.saturating_add(30) / 60;
        u32::try_from(minutes).unwrap_or(u32::MAX)
    }
}

impl fmt::Debug for ElapsedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElapsedTime({}s)", self.0)
    }
}

/// Renders as `m:ss`, e.g. `4:07`.
impl fmt::Display for ElapsedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
