//! Per-Channel Sample State
//!
//! Each sensor channel carries three kinds of state with three lifetimes:
//! the rolling statistics window and step-sample counter (reset at step
//! boundaries or attempt restarts), the first-step excursion trackers
//! (alive only during an attempt's opening gesture), and the committed
//! extremes (written once per anchoring step, widening only).
//!
//! [`SensorBank`] groups one [`ChannelState`] per channel in wire order
//! and is the only place a raw frame fans out.

use heapless::Vec;

use crate::constants::MAX_CHANNELS;
use crate::errors::{CalibrationError, CalibrationResult};
use crate::profile::{ChannelRole, GloveProfile};
use crate::stats::RollingStats;

/// Which committed slot an anchoring step writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Extreme {
    /// The channel's committed minimum.
    Min,
    /// The channel's committed maximum.
    Max,
}

/// Extremes committed by anchoring steps, one slot per direction.
///
/// Slots start empty and only ever widen: a later commit may push the
/// minimum down or the maximum up, never the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CommittedRange {
    /// Committed minimum, if any step has anchored one.
    pub min: Option<f32>,
    /// Committed maximum, if any step has anchored one.
    pub max: Option<f32>,
}

impl CommittedRange {
    /// Distance between the committed extremes, once both exist.
    pub fn span(&self) -> Option<f32> {
        Some(self.max? - self.min?)
    }

    /// True once both extremes are committed.
    pub fn is_complete(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }
}

/// Streaming state for a single sensor channel.
#[derive(Debug, Clone)]
pub struct ChannelState<const N: usize> {
    latest: f32,
    observed_min: f32,
    observed_max: f32,
    first_min: f32,
    first_max: f32,
    first_seen: bool,
    seen: bool,
    committed: CommittedRange,
    stats: RollingStats<N>,
    step_samples: u32,
}

impl<const N: usize> Default for ChannelState<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ChannelState<N> {
    /// Creates a channel that has seen nothing.
    pub const fn new() -> Self {
        Self {
            latest: 0.0,
            observed_min: f32::INFINITY,
            observed_max: f32::NEG_INFINITY,
            first_min: f32::INFINITY,
            first_max: f32::NEG_INFINITY,
            first_seen: false,
            seen: false,
            committed: CommittedRange {
                min: None,
                max: None,
            },
            stats: RollingStats::new(),
            step_samples: 0,
        }
    }

    /// Folds one raw sample into the channel.
    ///
    /// `first_step` marks samples taken during an attempt's opening
    /// gesture; only those feed the first-step excursion trackers.
    /// Non-finite samples are dropped without touching any state.
    pub fn update(&mut self, raw: f32, first_step: bool) {
        if !raw.is_finite() {
            return;
        }
        self.latest = raw;
        self.seen = true;
        if raw < self.observed_min {
            self.observed_min = raw;
        }
        if raw > self.observed_max {
            self.observed_max = raw;
        }
        if first_step {
            self.first_seen = true;
            if raw < self.first_min {
                self.first_min = raw;
            }
            if raw > self.first_max {
                self.first_max = raw;
            }
        }
        self.stats.add(raw);
        self.step_samples += 1;
    }

    /// Commits the latest sample into one extreme slot.
    ///
    /// Callers gate on [`sampled_this_step`](Self::sampled_this_step) so
    /// a channel that saw nothing never anchors its zero placeholder.
    pub fn commit_extreme(&mut self, which: Extreme) -> f32 {
        self.commit_value(which, self.latest)
    }

    /// Commits an explicit value into one extreme slot, widening only.
    ///
    /// Returns the value now stored in the slot. Non-finite values are
    /// dropped and returned unchanged.
    pub fn commit_value(&mut self, which: Extreme, value: f32) -> f32 {
        if !value.is_finite() {
            return value;
        }
        match which {
            Extreme::Min => {
                let next = match self.committed.min {
                    Some(current) if current < value => current,
                    _ => value,
                };
                self.committed.min = Some(next);
                next
            }
            Extreme::Max => {
                let next = match self.committed.max {
                    Some(current) if current > value => current,
                    _ => value,
                };
                self.committed.max = Some(next);
                next
            }
        }
    }

    /// Starts a new step: only the per-step sample counter resets.
    pub fn begin_step(&mut self) {
        self.step_samples = 0;
    }

    /// Restarts the channel for a fresh attempt.
    ///
    /// The rolling window, first-step trackers, committed extremes and
    /// step counter clear. The observed-ever extremes and latest sample
    /// survive: they describe the session, not the attempt, and back the
    /// lock-in fallback for channels that never re-commit.
    pub fn reset(&mut self) {
        self.first_min = f32::INFINITY;
        self.first_max = f32::NEG_INFINITY;
        self.first_seen = false;
        self.committed = CommittedRange::default();
        self.stats.clear();
        self.step_samples = 0;
    }

    /// Most recent finite sample, `0.0` before the first.
    pub fn latest(&self) -> f32 {
        self.latest
    }

    /// True once any finite sample has arrived.
    pub fn has_samples(&self) -> bool {
        self.seen
    }

    /// Lowest and highest samples ever observed, once any exist.
    pub fn observed(&self) -> Option<(f32, f32)> {
        if self.seen {
            Some((self.observed_min, self.observed_max))
        } else {
            None
        }
    }

    /// Excursion recorded during the opening gesture, `0.0` if none.
    pub fn first_movement(&self) -> f32 {
        if self.first_seen {
            self.first_max - self.first_min
        } else {
            0.0
        }
    }

    /// Extremes committed so far.
    pub fn committed(&self) -> CommittedRange {
        self.committed
    }

    /// Rolling statistics over the recent window.
    pub fn stats(&self) -> &RollingStats<N> {
        &self.stats
    }

    /// Samples folded in since the last [`begin_step`](Self::begin_step).
    pub fn step_samples(&self) -> u32 {
        self.step_samples
    }

    /// True if at least one sample arrived this step.
    pub fn sampled_this_step(&self) -> bool {
        self.step_samples > 0
    }
}

/// All channels of one glove, in wire order.
#[derive(Debug, Clone)]
pub struct SensorBank<const N: usize> {
    roles: Vec<ChannelRole, MAX_CHANNELS>,
    channels: Vec<ChannelState<N>, MAX_CHANNELS>,
}

impl<const N: usize> SensorBank<N> {
    /// Builds one channel per entry in the profile's channel table.
    pub fn new(profile: &GloveProfile) -> Self {
        let mut roles = Vec::new();
        let mut channels = Vec::new();
        for spec in profile.channels() {
            roles.push(spec.role).ok();
            channels.push(ChannelState::new()).ok();
        }
        Self { roles, channels }
    }

    /// Fans one raw frame out to the channels.
    ///
    /// The frame must carry exactly one sample per channel, in wire
    /// order. Non-finite samples are logged and dropped per channel; the
    /// rest of the frame still applies.
    pub fn feed(&mut self, samples: &[f32], first_step: bool) -> CalibrationResult<()> {
        if samples.len() != self.channels.len() {
            return Err(CalibrationError::ChannelCountMismatch {
                expected: self.channels.len(),
                got: samples.len(),
            });
        }
        for (i, &raw) in samples.iter().enumerate() {
            if !raw.is_finite() {
                log_warn!("dropping non-finite sample on {} channel", self.roles[i].name());
                continue;
            }
            self.channels[i].update(raw, first_step);
        }
        Ok(())
    }

    /// Channel for a role, if this glove carries it.
    pub fn channel(&self, role: ChannelRole) -> Option<&ChannelState<N>> {
        let idx = self.roles.iter().position(|r| *r == role)?;
        self.channels.get(idx)
    }

    /// Mutable channel for a role, if this glove carries it.
    pub fn channel_mut(&mut self, role: ChannelRole) -> Option<&mut ChannelState<N>> {
        let idx = self.roles.iter().position(|r| *r == role)?;
        self.channels.get_mut(idx)
    }

    /// Resets every channel's per-step sample counter.
    pub fn begin_step(&mut self) {
        for channel in self.channels.iter_mut() {
            channel.begin_step();
        }
    }

    /// Restarts every channel for a fresh attempt.
    pub fn reset(&mut self) {
        for channel in self.channels.iter_mut() {
            channel.reset();
        }
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// True for a bank with no channels.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Iterates `(role, channel)` pairs in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (ChannelRole, &ChannelState<N>)> + '_ {
        self.roles.iter().copied().zip(self.channels.iter())
    }
}
