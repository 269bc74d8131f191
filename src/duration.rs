//! Duration quantities and their InfluxQL-style string form.
//!
//! The wire format never carries raw nanosecond integers; every duration is
//! encoded as a short unit-suffixed literal such as `"1h"`, `"1m30s"`,
//! `"500ms"`, or `"0s"`. Internally durations are a dedicated signed
//! nanosecond quantity ([`Duration`]) -- signed because the shift node
//! accepts negative offsets.
//!
//! Formatting is deterministic and lossless: the value is decomposed
//! greedily from the largest unit (weeks) down to nanoseconds, emitting one
//! term per non-zero remainder, with `"0s"` for zero and a leading `-` for
//! negative values. The parser accepts any concatenation of `<int><unit>`
//! terms with units `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`, `d`, `w`, so
//! `parse(format(d)) == d` holds for every representable value.
//!
//! Serde integration: [`Duration`] serializes as its string form. The
//! deserializer additionally accepts a bare integer nanosecond count, which
//! some historical payloads used.

use regex::Regex;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::Error;

/// Nanoseconds per unit, largest first, with the suffix used when formatting.
const UNITS: [(i128, &str); 8] = [
    (604_800_000_000_000, "w"),
    (86_400_000_000_000, "d"),
    (3_600_000_000_000, "h"),
    (60_000_000_000, "m"),
    (1_000_000_000, "s"),
    (1_000_000, "ms"),
    (1_000, "us"),
    (1, "ns"),
];

fn term_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Multi-character suffixes must precede their prefixes so "ms" does not
    // tokenize as "m" + stray "s".
    PATTERN.get_or_init(|| Regex::new(r"(\d+)(ns|us|µs|ms|s|m|h|d|w|u|µ)").unwrap())
}

/// A signed duration with nanosecond precision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration(i64);

impl Duration {
    /// The zero duration, formatted as `"0s"`.
    pub const ZERO: Duration = Duration(0);

    /// Construct from a raw nanosecond count.
    pub fn nanoseconds(ns: i64) -> Self {
        Duration(ns)
    }

    /// Construct from microseconds.
    pub fn microseconds(us: i64) -> Self {
        Duration(us * 1_000)
    }

    /// Construct from milliseconds.
    pub fn milliseconds(ms: i64) -> Self {
        Duration(ms * 1_000_000)
    }

    /// Construct from seconds.
    pub fn seconds(s: i64) -> Self {
        Duration(s * 1_000_000_000)
    }

    /// Construct from minutes.
    pub fn minutes(m: i64) -> Self {
        Duration(m * 60_000_000_000)
    }

    /// Construct from hours.
    pub fn hours(h: i64) -> Self {
        Duration(h * 3_600_000_000_000)
    }

    /// Construct from days.
    pub fn days(d: i64) -> Self {
        Duration(d * 86_400_000_000_000)
    }

    /// Construct from weeks.
    pub fn weeks(w: i64) -> Self {
        Duration(w * 604_800_000_000_000)
    }

    /// The raw nanosecond count.
    pub fn as_nanos(&self) -> i64 {
        self.0
    }

    /// True when the duration is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// True when the duration is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "0s");
        }
        // Work in i128 so i64::MIN can be negated safely.
        let mut mag = i128::from(self.0);
        if mag < 0 {
            write!(f, "-")?;
            mag = -mag;
        }
        for (unit, suffix) in UNITS {
            if mag >= unit {
                write!(f, "{}{}", mag / unit, suffix)?;
                mag %= unit;
            }
        }
        Ok(())
    }
}

impl FromStr for Duration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if body.is_empty() {
            return Err(Error::format(format!("invalid duration {s:?}")));
        }
        let mut total: i128 = 0;
        let mut cursor = 0;
        for caps in term_pattern().captures_iter(body) {
            let whole = caps.get(0).unwrap();
            if whole.start() != cursor {
                return Err(Error::format(format!("invalid duration {s:?}")));
            }
            cursor = whole.end();
            let count: i128 = caps[1]
                .parse()
                .map_err(|_| Error::format(format!("invalid duration {s:?}")))?;
            let unit = match &caps[2] {
                "ns" => 1,
                "us" | "µs" | "u" | "µ" => 1_000,
                "ms" => 1_000_000,
                "s" => 1_000_000_000,
                "m" => 60_000_000_000,
                "h" => 3_600_000_000_000,
                "d" => 86_400_000_000_000,
                "w" => 604_800_000_000_000,
                _ => unreachable!(),
            };
            total += count * unit;
        }
        if cursor != body.len() {
            return Err(Error::format(format!("invalid duration {s:?}")));
        }
        if negative {
            total = -total;
        }
        i64::try_from(total)
            .map(Duration)
            .map_err(|_| Error::format(format!("duration {s:?} overflows")))
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Duration) -> Duration {
        Duration(self.0 + rhs.0)
    }
}

impl Sub for Duration {
    type Output = Duration;

    fn sub(self, rhs: Duration) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl Neg for Duration {
    type Output = Duration;

    fn neg(self) -> Duration {
        Duration(-self.0)
    }
}

impl Serialize for Duration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct DurationVisitor;

impl<'de> Visitor<'de> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a duration string like \"1h30m\" or a nanosecond integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Duration, E> {
        v.parse().map_err(de::Error::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Duration, E> {
        Ok(Duration(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Duration, E> {
        i64::try_from(v)
            .map(Duration)
            .map_err(|_| de::Error::custom("nanosecond count overflows"))
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DurationVisitor)
    }
}
