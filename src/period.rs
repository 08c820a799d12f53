use chrono::{DateTime, Duration, Months, Utc};
use std::{fmt, str::FromStr};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported range '{token}', expected one of 7d, 30d, 90d, 6m, 1y")]
pub struct InvalidRangeError {
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RangeToken {
    SevenDays,
    #[default]
    ThirtyDays,
    NinetyDays,
    SixMonths,
    OneYear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangePolicy {
    #[default]
    Fallback,
    Reject,
}

impl RangeToken {
    pub fn as_str(self) -> &'static str {
        match self {
            RangeToken::SevenDays => "7d",
            RangeToken::ThirtyDays => "30d",
            RangeToken::NinetyDays => "90d",
            RangeToken::SixMonths => "6m",
            RangeToken::OneYear => "1y",
        }
    }

    pub fn resolve(self, now: DateTime<Utc>) -> Periods {
        let start = self.lookback_start(now);
        let current = PeriodWindow { start, end: now };
        let previous = PeriodWindow {
            start: start - current.duration(),
            end: start,
        };
        Periods { current, previous }
    }

    fn lookback_start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            RangeToken::SevenDays => now - Duration::days(7),
            RangeToken::ThirtyDays => now - Duration::days(30),
            RangeToken::NinetyDays => now - Duration::days(90),
            RangeToken::SixMonths => now
                .checked_sub_months(Months::new(6))
                .unwrap_or(now - Duration::days(182)),
            RangeToken::OneYear => now
                .checked_sub_months(Months::new(12))
                .unwrap_or(now - Duration::days(365)),
        }
    }
}

impl FromStr for RangeToken {
    type Err = InvalidRangeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "7d" => Ok(RangeToken::SevenDays),
            "30d" => Ok(RangeToken::ThirtyDays),
            "90d" => Ok(RangeToken::NinetyDays),
            "6m" => Ok(RangeToken::SixMonths),
            "1y" => Ok(RangeToken::OneYear),
            other => Err(InvalidRangeError {
                token: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for RangeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open interval `[start, end)`; `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl PeriodWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn trailing_days(now: DateTime<Utc>, days: i64) -> Option<Self> {
        Self::new(now - Duration::days(days), now)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Periods {
    pub current: PeriodWindow,
    pub previous: PeriodWindow,
}

pub fn resolve_range(
    raw: Option<&str>,
    policy: RangePolicy,
    now: DateTime<Utc>,
) -> Result<(RangeToken, Periods), InvalidRangeError> {
    let token = match raw.map(str::parse::<RangeToken>) {
        None => RangeToken::default(),
        Some(Ok(token)) => token,
        Some(Err(err)) => match policy {
            RangePolicy::Reject => return Err(err),
            RangePolicy::Fallback => {
                warn!(range = %err.token, "unknown range token, using 30d");
                RangeToken::default()
            }
        },
    };

    Ok((token, token.resolve(now)))
}
