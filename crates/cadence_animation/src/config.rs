//! Scheduler configuration

use std::time::Duration;

/// Tick frequency used when nothing else is configured
pub const DEFAULT_FREQUENCY_HZ: u32 = 60;

/// Configuration of the shared animation timer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TimerConfig {
    /// Time between two ticks
    #[cfg_attr(feature = "serde", serde(rename = "interval_ms", with = "interval_ms"))]
    pub interval: Duration,
}

impl TimerConfig {
    /// Create a configuration ticking every `interval`
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Create a configuration ticking `hz` times per second
    ///
    /// Zero falls back to [`DEFAULT_FREQUENCY_HZ`].
    pub fn with_frequency(hz: u32) -> Self {
        let hz = if hz == 0 { DEFAULT_FREQUENCY_HZ } else { hz };
        Self {
            interval: Duration::from_millis(u64::from((1000 / hz).max(1))),
        }
    }

    /// Set the tick interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Effective ticks per second
    pub fn frequency(&self) -> f32 {
        let ms = self.interval.as_secs_f32() * 1000.0;
        if ms > 0.0 {
            1000.0 / ms
        } else {
            0.0
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self::with_frequency(DEFAULT_FREQUENCY_HZ)
    }
}

#[cfg(feature = "serde")]
mod interval_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(interval: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(interval.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
