//! Exponentially time-decayed percentage with hysteresis.
//!
//! [`DecayingGauge`] tracks the fraction of recent events satisfying a
//! condition (hit vs. miss), weighting samples by exponential time decay,
//! and exposes a debounced boolean classification: `is_high` only flips
//! when the percentage crosses outside the band between the two configured
//! thresholds, so it cannot flap while the signal hovers near a single
//! boundary.
//!
//! The state is an immutable snapshot behind an atomically swappable cell.
//! Updates run an optimistic compare-and-retry loop: read the snapshot,
//! compute its successor, attempt the swap, and recompute against the
//! newest snapshot if another caller won the race. No lock is taken and no
//! update is lost; many threads recording concurrently is the expected
//! case.

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;

#[derive(Clone, Copy, Debug)]
struct GaugeState {
    timestamp_nanos: u64,
    percentage: f64,
    is_high: bool,
}

/// A decaying hit-rate gauge with a hysteresis-debounced classification.
///
/// Timestamps are nanoseconds relative to the gauge's construction
/// instant, taken from the monotonic clock. [`record`](Self::record)
/// accepts an explicit timestamp so decay behaviour is testable; the
/// [`record_hit`](Self::record_hit) / [`record_miss`](Self::record_miss)
/// conveniences stamp the current time.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use cqlframe::gauge::DecayingGauge;
///
/// let gauge = DecayingGauge::new(0.0, Duration::from_millis(100), 0.8, 0.2);
/// assert!(!gauge.is_high());
/// gauge.record_hit();
/// assert!(gauge.percentage() >= 0.0);
/// ```
#[derive(Debug)]
pub struct DecayingGauge {
    state: ArcSwap<GaugeState>,
    epoch: Instant,
    lifetime_nanos: f64,
    low_to_high_threshold: f64,
    high_to_low_threshold: f64,
}

impl DecayingGauge {
    /// Construct a gauge.
    ///
    /// `initial_percentage` seeds the tracked ratio (0..=1). `lifetime`
    /// is the decay constant: a sample's weight falls to `1/e` after one
    /// lifetime. `low_to_high_threshold` and `high_to_low_threshold`
    /// bound the hysteresis band and must satisfy
    /// `high_to_low_threshold <= low_to_high_threshold`.
    ///
    /// # Panics
    /// Panics when the thresholds are inverted or `lifetime` is zero;
    /// both are configuration bugs.
    #[must_use]
    pub fn new(
        initial_percentage: f64,
        lifetime: Duration,
        low_to_high_threshold: f64,
        high_to_low_threshold: f64,
    ) -> Self {
        assert!(
            high_to_low_threshold <= low_to_high_threshold,
            "hysteresis thresholds inverted: {high_to_low_threshold} > {low_to_high_threshold}"
        );
        assert!(!lifetime.is_zero(), "decay lifetime must be positive");

        Self {
            state: ArcSwap::from_pointee(GaugeState {
                timestamp_nanos: 0,
                percentage: initial_percentage,
                is_high: initial_percentage > low_to_high_threshold,
            }),
            epoch: Instant::now(),
            lifetime_nanos: lifetime.as_nanos() as f64,
            low_to_high_threshold,
            high_to_low_threshold,
        }
    }

    /// Record a hit at the current time.
    pub fn record_hit(&self) { self.record(self.now_nanos(), true); }

    /// Record a miss at the current time.
    pub fn record_miss(&self) { self.record(self.now_nanos(), false); }

    /// Record a measurement at an explicit timestamp (nanoseconds since
    /// the gauge was constructed).
    ///
    /// A timestamp not later than the stored one discards the measurement:
    /// the clock did not advance, or a concurrent reset moved the stored
    /// timestamp past this one. This matters for decay semantics under
    /// clock skew and is deliberate.
    pub fn record(&self, timestamp_nanos: u64, condition_met: bool) {
        self.state.rcu(|current| {
            let next = self.next_state(current, timestamp_nanos, condition_met);
            Arc::new(next)
        });
    }

    fn next_state(&self, current: &GaugeState, now_nanos: u64, condition_met: bool) -> GaugeState {
        if now_nanos <= current.timestamp_nanos {
            return *current;
        }

        let delta = (now_nanos - current.timestamp_nanos) as f64;
        let alpha = 1.0 - (-delta / self.lifetime_nanos).exp();
        let target = if condition_met { 1.0 } else { 0.0 };
        let percentage = alpha * target + (1.0 - alpha) * current.percentage;

        let is_high = if percentage < self.high_to_low_threshold {
            false
        } else if percentage > self.low_to_high_threshold {
            true
        } else {
            // Inside the hysteresis band: keep the current trend.
            current.is_high
        };

        GaugeState {
            timestamp_nanos: now_nanos,
            percentage,
            is_high,
        }
    }

    /// Discard history and restart from `percentage`.
    ///
    /// The classification restarts as `percentage > low_to_high_threshold`.
    /// Used when an external change (say, a topology event) invalidates
    /// the accumulated signal.
    pub fn reset(&self, percentage: f64) {
        self.state.store(Arc::new(GaugeState {
            timestamp_nanos: self.now_nanos(),
            percentage,
            is_high: percentage > self.low_to_high_threshold,
        }));
    }

    /// The settled classification. Never blocks, never fails.
    #[must_use]
    pub fn is_high(&self) -> bool { self.state.load().is_high }

    /// The current decayed percentage.
    #[must_use]
    pub fn percentage(&self) -> f64 { self.state.load().percentage }

    fn now_nanos(&self) -> u64 { self.epoch.elapsed().as_nanos() as u64 }
}
