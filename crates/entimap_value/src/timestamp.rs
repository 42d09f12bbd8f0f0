//! Microsecond-resolution timestamps.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A point in time stored as microseconds since the Unix epoch.
///
/// This is the resolution the document store keeps on the wire. Codecs that
/// expose timestamps as plain integers convert through [`Timestamp::as_millis`]
/// and [`Timestamp::from_millis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The Unix epoch.
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Creates a timestamp from microseconds since the epoch.
    #[must_use]
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Creates a timestamp from milliseconds since the epoch.
    ///
    /// Saturates instead of overflowing for values outside the representable range.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis.saturating_mul(1_000))
    }

    /// Returns microseconds since the epoch.
    #[must_use]
    pub const fn as_micros(&self) -> i64 {
        self.0
    }

    /// Returns milliseconds since the epoch, truncating sub-millisecond precision.
    #[must_use]
    pub const fn as_millis(&self) -> i64 {
        self.0.div_euclid(1_000)
    }

    /// Returns the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        let micros = match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => i64::try_from(elapsed.as_micros()).unwrap_or(i64::MAX),
            Err(before) => i64::try_from(before.duration().as_micros())
                .map(|m| -m)
                .unwrap_or(i64::MIN),
        };
        Self(micros)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_roundtrip_through_micros() {
        let ts = Timestamp::from_millis(1_700_000_000_123);
        assert_eq!(ts.as_micros(), 1_700_000_000_123_000);
        assert_eq!(ts.as_millis(), 1_700_000_000_123);
    }

    #[test]
    fn as_millis_truncates_toward_negative_infinity() {
        assert_eq!(Timestamp::from_micros(1_999).as_millis(), 1);
        assert_eq!(Timestamp::from_micros(-1).as_millis(), -1);
    }

    #[test]
    fn from_millis_saturates() {
        assert_eq!(Timestamp::from_millis(i64::MAX).as_micros(), i64::MAX);
    }

    #[test]
    fn now_is_after_epoch() {
        assert!(Timestamp::now() > Timestamp::EPOCH);
    }
}
