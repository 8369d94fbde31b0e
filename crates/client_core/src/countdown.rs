//! Time remaining until the event.

use chrono::{DateTime, Utc};

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_HOUR: i64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: i64 = 24 * SECS_PER_HOUR;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownDuration {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl CountdownDuration {
    pub fn total_seconds(&self) -> u64 {
        self.days * SECS_PER_DAY as u64
            + self.hours * SECS_PER_HOUR as u64
            + self.minutes * SECS_PER_MINUTE as u64
            + self.seconds
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Remaining(CountdownDuration),
    Expired,
}

impl Countdown {
    pub fn remaining(&self) -> Option<CountdownDuration> {
        match self {
            Self::Remaining(duration) => Some(*duration),
            Self::Expired => None,
        }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired)
    }
}

/// Whole seconds left until `target`, decomposed into days/hours/minutes/seconds.
///
/// Sub-second remainders are floored. `now >= target` yields
/// [`Countdown::Expired`], never a zero or negative duration.
pub fn time_remaining(target: DateTime<Utc>, now: DateTime<Utc>) -> Countdown {
    if target <= now {
        return Countdown::Expired;
    }

    let total = (target - now).num_seconds();
    Countdown::Remaining(CountdownDuration {
        days: (total / SECS_PER_DAY) as u64,
        hours: ((total % SECS_PER_DAY) / SECS_PER_HOUR) as u64,
        minutes: ((total % SECS_PER_HOUR) / SECS_PER_MINUTE) as u64,
        seconds: (total % SECS_PER_MINUTE) as u64,
    })
}

/// Drives [`time_remaining`] at a one-second cadence.
#[derive(Debug, Clone)]
pub struct CountdownTicker {
    target: DateTime<Utc>,
    last_tick: DateTime<Utc>,
    current: Countdown,
}

impl CountdownTicker {
    pub const PERIOD_MS: i64 = 1_000;

    pub fn new(target: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            target,
            last_tick: now,
            current: time_remaining(target, now),
        }
    }

    pub fn target(&self) -> DateTime<Utc> {
        self.target
    }

    pub fn current(&self) -> Countdown {
        self.current
    }

    /// Recomputes once a full period has elapsed since the previous tick.
    /// Returns `true` when the displayed value was recomputed. An expired
    /// countdown is never recomputed again.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        if self.current.is_expired() {
            return false;
        }
        if (now - self.last_tick).num_milliseconds() < Self::PERIOD_MS {
            return false;
        }
        self.last_tick = now;
        self.current = time_remaining(self.target, now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("valid instant")
    }

    #[test]
    fn decomposes_whole_seconds() {
        let target = at(1_000_000);
        let now = at(1_000_000 - (2 * 86_400 + 3 * 3_600 + 4 * 60 + 5));
        assert_eq!(
            time_remaining(target, now),
            Countdown::Remaining(CountdownDuration {
                days: 2,
                hours: 3,
                minutes: 4,
                seconds: 5,
            })
        );
    }

    #[test]
    fn floors_sub_second_remainder() {
        let target = at(10_000);
        let now = target - Duration::milliseconds(61_999);
        let remaining = time_remaining(target, now).remaining().expect("not expired");
        assert_eq!(remaining.minutes, 1);
        assert_eq!(remaining.seconds, 1);
        assert_eq!(remaining.total_seconds(), 61);
    }

    #[test]
    fn under_one_second_is_zero_not_expired() {
        let target = at(10_000);
        let now = target - Duration::milliseconds(400);
        assert_eq!(
            time_remaining(target, now),
            Countdown::Remaining(CountdownDuration {
                days: 0,
                hours: 0,
                minutes: 0,
                seconds: 0,
            })
        );
    }

    #[test]
    fn sub_millisecond_gap_is_not_expired() {
        let target = at(10_000);
        let now = target - Duration::microseconds(250);
        assert_eq!(
            time_remaining(target, now).remaining().map(|left| left.total_seconds()),
            Some(0)
        );
    }

    #[test]
    fn sum_identity_and_bounds_hold_across_offsets() {
        let target = at(1_786_000_000);
        for offset_ms in [1_000_i64, 59_999, 3_600_000, 86_399_999, 86_400_000, 7_654_321_987] {
            let now = target - Duration::milliseconds(offset_ms);
            let remaining = time_remaining(target, now).remaining().expect("not expired");
            assert_eq!(remaining.total_seconds() as i64, offset_ms / 1000);
            assert!(remaining.hours < 24);
            assert!(remaining.minutes < 60);
            assert!(remaining.seconds < 60);
        }
    }

    #[test]
    fn at_or_after_target_is_expired() {
        let target = at(5_000);
        assert_eq!(time_remaining(target, target), Countdown::Expired);
        assert_eq!(time_remaining(target, at(5_001)), Countdown::Expired);
        assert_eq!(time_remaining(target, at(9_999_999)), Countdown::Expired);
    }

    #[test]
    fn ticker_recomputes_once_per_period() {
        let target = at(100);
        let mut ticker = CountdownTicker::new(target, at(0));
        assert_eq!(ticker.current().remaining().map(|d| d.seconds), Some(40));

        assert!(!ticker.poll(at(0) + Duration::milliseconds(500)));
        assert!(ticker.poll(at(1)));
        assert_eq!(ticker.current().remaining().map(|d| d.seconds), Some(39));
    }

    #[test]
    fn ticker_stops_after_expiry() {
        let target = at(2);
        let mut ticker = CountdownTicker::new(target, at(0));
        assert!(ticker.poll(at(2)));
        assert!(ticker.current().is_expired());
        assert!(!ticker.poll(at(10)));
    }
}
