use chrono::{DateTime, Duration, Utc};

/// Source of "now" for services. Tests pin it with [`Clock::Fixed`].
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Move a fixed clock forward. No effect on the system clock.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    /// Whole seconds elapsed since `start`, zero if `start` is in the future.
    #[must_use]
    pub fn seconds_since(&self, start: DateTime<Utc>) -> u64 {
        let secs = self.now().signed_duration_since(start).num_seconds();
        u64::try_from(secs).unwrap_or(0)
    }
}

/// 2023-11-14T22:13:20Z, used by tests for deterministic timestamps.
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0).unwrap_or_default()
}

#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let mut clock = fixed_clock();
        clock.advance(Duration::seconds(90));
        assert_eq!(clock.seconds_since(fixed_now()), 90);
        assert_eq!(clock.seconds_since(fixed_now() + Duration::hours(1)), 0);
    }
}
