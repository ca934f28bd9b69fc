//! Latency samples, their classification, and the probe throttle.
//!
//! Detecting a fresh sample and rate-limiting probe requests are kept apart:
//! [`SampleTracker`] only answers "is this a new sample?", [`ProbeThrottle`]
//! only answers "may we ask for another one yet?".

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyLevel {
    Normal,
    High,
}

/// A classified latency value as handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    pub millis: u32,
    pub level: LatencyLevel,
}

impl Latency {
    pub fn classify(millis: u32, threshold_ms: u32) -> Self {
        let level = if millis > threshold_ms {
            LatencyLevel::High
        } else {
            LatencyLevel::Normal
        };
        Self { millis, level }
    }

    pub fn is_high(&self) -> bool {
        self.level == LatencyLevel::High
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencySample {
    pub millis: u32,
    pub observed_at: Instant,
}

/// Remembers the latest sample and reports only new ones. A reading is new
/// when its value or the transport's sample count differs from the last one.
#[derive(Debug, Default)]
pub struct SampleTracker {
    current: Option<LatencySample>,
    sequence: u64,
}

impl SampleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Negative raw values mean "no sample yet" and are ignored.
    pub fn observe(
        &mut self,
        raw_millis: i64,
        sequence: u64,
        now: Instant,
    ) -> Option<LatencySample> {
        let millis = u32::try_from(raw_millis).ok()?;
        if self
            .current
            .is_some_and(|sample| sample.millis == millis && self.sequence == sequence)
        {
            return None;
        }

        let sample = LatencySample {
            millis,
            observed_at: now,
        };
        self.current = Some(sample);
        self.sequence = sequence;
        Some(sample)
    }

    pub fn current(&self) -> Option<LatencySample> {
        self.current
    }

    pub fn clear(&mut self) {
        self.current = None;
        self.sequence = 0;
    }
}

#[derive(Debug)]
pub struct ProbeThrottle {
    interval: Duration,
    last_probe: Option<Instant>,
}

impl ProbeThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_probe: None,
        }
    }

    /// Restarts the interval as if a probe had just been sent.
    pub fn reset(&mut self, now: Instant) {
        self.last_probe = Some(now);
    }

    /// Returns true, and restarts the interval, when a probe may be sent now.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        match self.last_probe {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last_probe = Some(now);
                true
            }
        }
    }

    pub fn last_probe(&self) -> Option<Instant> {
        self.last_probe
    }
}
