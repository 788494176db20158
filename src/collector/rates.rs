// Previous cumulative counters, used to turn counters into per-second rates

use std::time::{Duration, Instant};

/// A pair of cumulative counters (read/write or sent/recv) and when they were read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterSample {
    pub values: [u64; 2],
    pub at: Instant,
}

impl CounterSample {
    pub fn new(values: [u64; 2], at: Instant) -> Self {
        Self { values, at }
    }

    /// Per-second rates from this sample to `current` taken at `now`.
    pub fn rates_to(&self, current: [u64; 2], now: Instant) -> [Option<f64>; 2] {
        let elapsed = now.saturating_duration_since(self.at);
        [
            per_second(current[0], self.values[0], elapsed),
            per_second(current[1], self.values[1], elapsed),
        ]
    }
}

/// `None` when no time has passed or the counter went backwards (reset or wrap);
/// the caller withholds the rate instead of reporting zero or a negative value.
pub fn per_second(current: u64, previous: u64, elapsed: Duration) -> Option<f64> {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 || current < previous {
        return None;
    }
    Some((current - previous) as f64 / secs)
}

/// Counter state carried between physical collections. Only the collector advances it,
/// once per collection, after that collection's rates have been computed.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateTracker {
    disk: Option<CounterSample>,
    network: Option<CounterSample>,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disk(&self) -> Option<CounterSample> {
        self.disk
    }

    pub fn network(&self) -> Option<CounterSample> {
        self.network
    }

    pub fn record_disk(&mut self, sample: CounterSample) {
        self.disk = Some(sample);
    }

    pub fn record_network(&mut self, sample: CounterSample) {
        self.network = Some(sample);
    }
}
