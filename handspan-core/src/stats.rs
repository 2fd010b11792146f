//! Fixed-Window Rolling Statistics
//!
//! ## Overview
//!
//! Every glove channel keeps a rolling window of its most recent raw
//! samples and asks one question of it dozens of times per second: is this
//! finger currently still? [`RollingStats`] answers it by maintaining the
//! mean and sample variance of the last `N` samples incrementally, without
//! rescanning the window.
//!
//! ```text
//! add(x) ───▶ [ x₄ x₅ x₆ │ x₇ ... x₃ ]   ring of N samples
//!                  │
//!                  ▼
//!        mean, m2 updated in O(1)
//!                  │
//!                  ▼
//!        std_dev() = √(m2 / (n-1))
//! ```
//!
//! ## Design Rationale
//!
//! 1. **Welford while filling**: numerically stable one-pass updates, no
//!    catastrophic cancellation on raw values in the thousands.
//! 2. **Sliding update once full**: replacing the oldest sample adjusts
//!    mean and m2 directly, so saturation costs the same as filling.
//! 3. **Sample variance (n-1)**: the window is a sample of an ongoing
//!    motion, not the whole population.
//! 4. **No heap**: the window is an inline `[f32; N]`, sized at compile
//!    time per deployment.
//!
//! Degenerate reads are clamped rather than surfaced as errors: an empty
//! window reports a mean and deviation of zero, and float drift can never
//! produce a negative variance.

use libm::sqrtf;

/// Incremental mean/variance over the last `N` samples.
///
/// Samples enter through [`add`](Self::add); the window overwrites its
/// oldest entry once `N` samples have arrived and never shrinks again
/// until [`clear`](Self::clear).
///
/// ## Example
///
/// ```
/// use handspan_core::stats::RollingStats;
///
/// let mut stats: RollingStats<3> = RollingStats::new();
/// for v in [10.0, 20.0, 30.0] {
///     stats.add(v);
/// }
/// assert_eq!(stats.mean(), 20.0);
/// assert_eq!(stats.std_dev(), 10.0);
///
/// // A fourth sample evicts the 10.0: window is now {20, 30, 40}.
/// stats.add(40.0);
/// assert_eq!(stats.mean(), 30.0);
/// assert!(stats.is_saturated());
/// ```
#[derive(Debug, Clone)]
pub struct RollingStats<const N: usize> {
    /// Ring of the most recent samples, oldest at `write_pos` once full.
    window: [f32; N],
    /// Next slot to write.
    write_pos: usize,
    /// Number of valid samples, capped at `N`.
    len: usize,
    /// Running mean of the window contents.
    mean: f32,
    /// Sum of squared deviations from the mean (Welford's m2).
    m2: f32,
}

impl<const N: usize> Default for RollingStats<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RollingStats<N> {
    /// Creates an empty window.
    pub const fn new() -> Self {
        Self {
            window: [0.0; N],
            write_pos: 0,
            len: 0,
            mean: 0.0,
            m2: 0.0,
        }
    }

    /// Pushes a sample, evicting the oldest one once the window is full.
    pub fn add(&mut self, value: f32) {
        if self.len < N {
            // Welford's update while the window fills.
            self.window[self.write_pos] = value;
            self.write_pos = (self.write_pos + 1) % N;
            self.len += 1;

            let delta = value - self.mean;
            self.mean += delta / self.len as f32;
            self.m2 += delta * (value - self.mean);
        } else {
            // Saturated: replace the oldest sample and slide both moments.
            let oldest = self.window[self.write_pos];
            self.window[self.write_pos] = value;
            self.write_pos = (self.write_pos + 1) % N;

            let old_mean = self.mean;
            self.mean += (value - oldest) / N as f32;
            self.m2 += (value - oldest) * (value - self.mean + oldest - old_mean);
        }

        // Float drift can push m2 fractionally below zero.
        if self.m2 < 0.0 {
            self.m2 = 0.0;
        }
    }

    /// Mean of the window, or `0.0` before any sample has arrived.
    pub fn mean(&self) -> f32 {
        if self.len == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance (n-1 divisor) of the window.
    ///
    /// Returns `0.0` with fewer than two samples.
    pub fn variance(&self) -> f32 {
        if self.len < 2 {
            return 0.0;
        }
        let var = self.m2 / (self.len - 1) as f32;
        if var < 0.0 {
            0.0
        } else {
            var
        }
    }

    /// Sample standard deviation of the window.
    ///
    /// Clamped to `0.0` when the variance is sub-epsilon or the square
    /// root degenerates, so callers can compare against thresholds
    /// without NaN checks.
    pub fn std_dev(&self) -> f32 {
        let std = sqrtf(self.variance());
        if std.is_nan() || std < f32::EPSILON {
            0.0
        } else {
            std
        }
    }

    /// Number of samples currently in the window, capped at `N`.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True before the first sample.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True once `N` samples have been observed; stays true until
    /// [`clear`](Self::clear).
    pub fn is_saturated(&self) -> bool {
        self.len == N
    }

    /// Empties the window and zeroes both moments.
    pub fn clear(&mut self) {
        self.write_pos = 0;
        self.len = 0;
        self.mean = 0.0;
        self.m2 = 0.0;
    }
}
