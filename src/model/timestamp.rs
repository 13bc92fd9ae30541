//! Absolute time with an explicit naive variant.
//!
//! ISO-8601 strings without an offset stay timezone-naive instead of being
//! forced to UTC. For ordering and trace bounds a naive value is read as
//! UTC, so a trace mixing both kinds still sorts deterministically.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// A point in time taken from a trace document
#[derive(Debug, Clone, Copy)]
pub enum Timestamp {
    /// Carries an explicit offset (`Z`, `+02:00`, or epoch nanoseconds)
    Aware(DateTime<FixedOffset>),

    /// No offset was present in the source string
    Naive(NaiveDateTime),
}

impl Timestamp {
    /// Wrap a UTC instant
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self::Aware(dt.fixed_offset())
    }

    /// Current wall-clock time
    pub fn now() -> Self {
        Self::from_utc(Utc::now())
    }

    /// The instant used for ordering. Naive values are read as UTC.
    pub fn instant(&self) -> DateTime<Utc> {
        match self {
            Self::Aware(dt) => dt.with_timezone(&Utc),
            Self::Naive(naive) => naive.and_utc(),
        }
    }

    pub fn is_naive(&self) -> bool {
        matches!(self, Self::Naive(_))
    }

    /// Elapsed time from `earlier` to `self`
    pub fn duration_since(&self, earlier: &Timestamp) -> Duration {
        self.instant().signed_duration_since(earlier.instant())
    }

    /// ISO-8601 rendering; naive values are printed without an offset
    pub fn to_iso(&self) -> String {
        match self {
            Self::Aware(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Self::Naive(naive) => naive.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        }
    }

    fn sort_key(&self) -> (DateTime<Utc>, bool) {
        (self.instant(), self.is_naive())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_utc(dt)
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso())
    }
}
