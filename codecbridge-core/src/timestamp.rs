//! Timestamps, durations and the time bases that scale them.
//!
//! Every input unit and output buffer in the contract carries timing in
//! these units; the display-date channel translates between them and the
//! host's wall clock.

use crate::rational::Rational;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

/// A time base: the unit in which raw timestamp values are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeBase(pub Rational);

impl TimeBase {
    /// Create a time base from numerator and denominator.
    pub fn new(num: i64, den: i64) -> Self {
        Self(Rational::new(num, den))
    }

    /// MPEG 90kHz clock (1/90000).
    pub const MPEG: Self = Self(Rational { num: 1, den: 90000 });

    /// Milliseconds (1/1000).
    pub const MILLISECONDS: Self = Self(Rational { num: 1, den: 1000 });

    /// Microseconds (1/1000000), the host wall-clock unit.
    pub const MICROSECONDS: Self = Self(Rational {
        num: 1,
        den: 1_000_000,
    });

    /// Whole seconds (1/1).
    pub const SECONDS: Self = Self(Rational { num: 1, den: 1 });

    /// Convert a raw value counted in this base into `target` units.
    pub fn convert(&self, value: i64, target: TimeBase) -> i64 {
        self.0.rescale(value, target.0)
    }

    /// Express a raw value as seconds.
    pub fn to_seconds(&self, value: i64) -> f64 {
        value as f64 * self.0.to_f64()
    }

    /// Get the underlying rational.
    pub fn as_rational(&self) -> Rational {
        self.0
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        Self::MPEG
    }
}

impl From<Rational> for TimeBase {
    fn from(r: Rational) -> Self {
        Self(r)
    }
}

/// A point in stream time: a raw value plus the base it is counted in.
///
/// Timestamps may be unknown (a demuxer that has not yet seen timing for a
/// stream); [`Timestamp::none`] is the sentinel for that state and compares
/// before every valid timestamp.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp {
    /// Raw tick count.
    pub value: i64,
    /// Unit of the tick count.
    pub time_base: TimeBase,
}

impl Timestamp {
    /// Raw value marking an unknown timestamp.
    pub const NONE: i64 = i64::MIN;

    /// Create a timestamp.
    pub fn new(value: i64, time_base: TimeBase) -> Self {
        Self { value, time_base }
    }

    /// Create an unknown timestamp.
    pub fn none() -> Self {
        Self {
            value: Self::NONE,
            time_base: TimeBase::default(),
        }
    }

    /// Check whether the timestamp is known.
    pub fn is_valid(&self) -> bool {
        self.value != Self::NONE
    }

    /// Re-express in another time base. Unknown stays unknown.
    pub fn rescale(&self, target: TimeBase) -> Self {
        if !self.is_valid() {
            return Self::none();
        }
        Self {
            value: self.time_base.convert(self.value, target),
            time_base: target,
        }
    }

    /// Express as seconds, if known.
    pub fn to_seconds(&self) -> Option<f64> {
        self.is_valid().then(|| self.time_base.to_seconds(self.value))
    }

    /// Create from a microsecond count (wall-clock domain).
    pub fn from_micros(micros: i64) -> Self {
        Self {
            value: micros,
            time_base: TimeBase::MICROSECONDS,
        }
    }

    /// Express as microseconds, if known.
    pub fn to_micros(&self) -> Option<i64> {
        self.is_valid()
            .then(|| self.time_base.convert(self.value, TimeBase::MICROSECONDS))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::none()
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
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
        match (self.is_valid(), other.is_valid()) {
            (false, false) => Ordering::Equal,
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            (true, true) => {
                // Compare in the finer of the two bases to stay exact.
                let tb = if self.time_base.0.den > other.time_base.0.den {
                    self.time_base
                } else {
                    other.time_base
                };
                self.rescale(tb).value.cmp(&other.rescale(tb).value)
            }
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_seconds() {
            Some(secs) => {
                let hours = (secs / 3600.0) as u32;
                let mins = ((secs % 3600.0) / 60.0) as u32;
                write!(f, "{:02}:{:02}:{:06.3}", hours, mins, secs % 60.0)
            }
            None => write!(f, "NONE"),
        }
    }
}

/// A span of stream time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration {
    /// Raw tick count.
    pub value: i64,
    /// Unit of the tick count.
    pub time_base: TimeBase,
}

impl Duration {
    /// Create a duration.
    pub fn new(value: i64, time_base: TimeBase) -> Self {
        Self { value, time_base }
    }

    /// A zero-length duration.
    pub fn zero() -> Self {
        Self {
            value: 0,
            time_base: TimeBase::default(),
        }
    }

    /// Check if this duration is zero.
    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Re-express in another time base.
    pub fn rescale(&self, target: TimeBase) -> Self {
        Self {
            value: self.time_base.convert(self.value, target),
            time_base: target,
        }
    }

    /// Express as seconds.
    pub fn to_seconds(&self) -> f64 {
        self.time_base.to_seconds(self.value)
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::zero()
    }
}

impl Add for Duration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        let rhs = rhs.rescale(self.time_base);
        Self {
            value: self.value + rhs.value,
            time_base: self.time_base,
        }
    }
}

impl Sub for Duration {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        let rhs = rhs.rescale(self.time_base);
        Self {
            value: self.value - rhs.value,
            time_base: self.time_base,
        }
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Self::Output {
        if !self.is_valid() {
            return self;
        }
        let rhs = rhs.rescale(self.time_base);
        Timestamp {
            value: self.value + rhs.value,
            time_base: self.time_base,
        }
    }
}

impl Sub for Timestamp {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        if !self.is_valid() || !rhs.is_valid() {
            return Duration::zero();
        }
        let rhs = rhs.rescale(self.time_base);
        Duration {
            value: self.value - rhs.value,
            time_base: self.time_base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_ms_to_mpeg() {
        assert_eq!(
            TimeBase::MILLISECONDS.convert(1000, TimeBase::MPEG),
            90000
        );
    }

    #[test]
    fn test_cross_base_equality() {
        let a = Timestamp::new(90000, TimeBase::MPEG);
        let b = Timestamp::new(1000, TimeBase::MILLISECONDS);
        assert_eq!(a, b);
    }

    #[test]
    fn test_none_sorts_first() {
        let none = Timestamp::none();
        let zero = Timestamp::new(0, TimeBase::MPEG);
        assert!(none < zero);
        assert_eq!(none, Timestamp::none());
    }

    #[test]
    fn test_timestamp_plus_duration() {
        let ts = Timestamp::new(0, TimeBase::MPEG) + Duration::new(500, TimeBase::MILLISECONDS);
        assert_eq!(ts.value, 45000);
    }

    #[test]
    fn test_display() {
        let ts = Timestamp::new(3_723_500, TimeBase::MILLISECONDS);
        assert_eq!(format!("{}", ts), "01:02:03.500");
        assert_eq!(format!("{}", Timestamp::none()), "NONE");
    }
}
