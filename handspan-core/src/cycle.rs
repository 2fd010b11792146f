//! Abduction Cycle Counting
//!
//! The abduction step asks the wearer to swing the thumb out and back a
//! fixed number of times. [`CycleCounter`] counts those oscillations with
//! two-phase hysteresis: a sample must travel more than the count
//! distance past the opposite landmark before the phase flips, so sensor
//! jitter never registers as motion.
//!
//! ```text
//!            value - landmark > d                highest - value > d
//! Outward ───────────────────────▶ Inward ─────────────────────────▶ count += 1
//!    ▲      (landmark = lowest,                                        │
//!    │       or committed min                                          │
//!    │       on the first cycle)                                       │
//!    └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! On the first cycle the outward landmark also considers the channel's
//! committed calibration minimum, so a thumb that starts the step already
//! swung out still gets credit for its first outward leg.

/// Which half of an out-and-back motion the counter is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SweepPhase {
    /// Waiting for the thumb to swing away from the palm.
    Outward,
    /// Waiting for the thumb to swing back.
    Inward,
}

/// Hysteresis counter over a single channel's raw stream.
#[derive(Debug, Clone)]
pub struct CycleCounter {
    count_distance: f32,
    phase: SweepPhase,
    count: u32,
    /// Lowest sample since the last completed cycle.
    lowest: f32,
    /// Highest sample since the last completed cycle.
    highest: f32,
    /// Extremes over the whole step, committed as the abduction range.
    sweep_min: f32,
    sweep_max: f32,
    seen: bool,
    first_cycle: bool,
}

impl CycleCounter {
    /// Creates a counter with the given hysteresis distance (raw units).
    pub const fn new(count_distance: f32) -> Self {
        Self {
            count_distance,
            phase: SweepPhase::Outward,
            count: 0,
            lowest: f32::INFINITY,
            highest: f32::NEG_INFINITY,
            sweep_min: f32::INFINITY,
            sweep_max: f32::NEG_INFINITY,
            seen: false,
            first_cycle: true,
        }
    }

    /// Folds one sample into the counter.
    ///
    /// `committed_min` is the channel's committed calibration minimum, if
    /// an earlier step anchored one; it only influences the first cycle's
    /// outward landmark. Non-finite samples are dropped.
    pub fn advance(&mut self, value: f32, committed_min: Option<f32>) {
        if !value.is_finite() {
            return;
        }
        self.seen = true;
        if value < self.sweep_min {
            self.sweep_min = value;
        }
        if value > self.sweep_max {
            self.sweep_max = value;
        }

        if value < self.lowest {
            self.lowest = value;
        }
        if value > self.highest {
            self.highest = value;
        }

        match self.phase {
            SweepPhase::Outward => {
                let landmark = match committed_min {
                    Some(min) if self.first_cycle && min < self.lowest => min,
                    _ => self.lowest,
                };
                if value - landmark > self.count_distance {
                    self.phase = SweepPhase::Inward;
                }
            }
            SweepPhase::Inward => {
                if self.highest - value > self.count_distance {
                    self.count += 1;
                    self.phase = SweepPhase::Outward;
                    self.lowest = value;
                    self.highest = value;
                    self.first_cycle = false;
                }
            }
        }
    }

    /// Completed out-and-back motions so far.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Phase the counter is currently waiting on.
    pub fn phase(&self) -> SweepPhase {
        self.phase
    }

    /// Hysteresis distance this counter was built with (raw units).
    pub fn count_distance(&self) -> f32 {
        self.count_distance
    }

    /// Lowest and highest samples seen this step, once any exist.
    pub fn sweep(&self) -> Option<(f32, f32)> {
        if self.seen {
            Some((self.sweep_min, self.sweep_max))
        } else {
            None
        }
    }

    /// Clears count, phase and sweep extremes for a fresh step.
    ///
    /// The committed calibration minimum lives in the channel, not here,
    /// so nothing permanent is lost.
    pub fn reset(&mut self) {
        self.phase = SweepPhase::Outward;
        self.count = 0;
        self.lowest = f32::INFINITY;
        self.highest = f32::NEG_INFINITY;
        self.sweep_min = f32::INFINITY;
        self.sweep_max = f32::NEG_INFINITY;
        self.seen = false;
        self.first_cycle = true;
    }
}
