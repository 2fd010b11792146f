//! Locked-In Range Profiles
//!
//! The product of a calibration session: one raw range per channel, used
//! from then on to normalize live samples into `[0, 1]` pose values. A
//! profile is immutable once minted and carries its own provenance: which
//! glove generation, which hand, and whether the session validated or had
//! to lock in degraded ranges after exhausting its attempts.

use heapless::Vec;

use crate::constants::MAX_CHANNELS;
use crate::profile::{ChannelRole, GloveGeneration, RoleSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which hand the glove was worn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum HandSide {
    /// Left-hand glove.
    Left,
    /// Right-hand glove.
    Right,
}

impl HandSide {
    /// Human-readable side name.
    pub const fn name(&self) -> &'static str {
        match self {
            HandSide::Left => "left",
            HandSide::Right => "right",
        }
    }
}

/// How the session ended up locking in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LockOutcome {
    /// Every channel's committed span met its minimum.
    Validated,
    /// Attempts ran out; the widest ranges seen were locked in anyway.
    Forced {
        /// Channels whose span stayed below the required minimum.
        shortfall: RoleSet,
    },
}

/// Raw calibration range of one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelRange {
    /// Raw value mapping to a fully relaxed pose.
    pub min: f32,
    /// Raw value mapping to a fully engaged pose.
    pub max: f32,
}

impl ChannelRange {
    /// Width of the range in raw units.
    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    /// True when the range cannot normalize anything.
    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }

    /// Maps a raw sample into `[0, 1]`, clamping at both ends.
    ///
    /// Degenerate ranges and non-finite samples map to `0.0` so pose
    /// consumers never see NaN.
    pub fn normalize(&self, raw: f32) -> f32 {
        if self.is_degenerate() || !raw.is_finite() {
            return 0.0;
        }
        ((raw - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// One channel's entry in a locked-in profile.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RangeEntry {
    /// The channel this range belongs to.
    pub role: ChannelRole,
    /// Its locked-in raw range.
    pub range: ChannelRange,
}

/// The normalization table a finished session locks in.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RangeProfile {
    generation: GloveGeneration,
    side: HandSide,
    outcome: LockOutcome,
    entries: Vec<RangeEntry, MAX_CHANNELS>,
}

impl RangeProfile {
    /// Assembles a profile; only finished sessions mint these.
    pub(crate) fn new(
        generation: GloveGeneration,
        side: HandSide,
        outcome: LockOutcome,
        entries: Vec<RangeEntry, MAX_CHANNELS>,
    ) -> Self {
        Self {
            generation,
            side,
            outcome,
            entries,
        }
    }

    /// Glove generation the profile was calibrated on.
    pub fn generation(&self) -> GloveGeneration {
        self.generation
    }

    /// Hand the glove was worn on.
    pub fn side(&self) -> HandSide {
        self.side
    }

    /// How the session locked in.
    pub fn outcome(&self) -> LockOutcome {
        self.outcome
    }

    /// True when every channel validated.
    pub fn is_validated(&self) -> bool {
        matches!(self.outcome, LockOutcome::Validated)
    }

    /// Number of channel entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True for a profile with no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in wire order.
    pub fn iter(&self) -> impl Iterator<Item = &RangeEntry> + '_ {
        self.entries.iter()
    }

    /// Range for a role, if the glove carried that channel.
    pub fn range_for(&self, role: ChannelRole) -> Option<ChannelRange> {
        self.entries
            .iter()
            .find(|entry| entry.role == role)
            .map(|entry| entry.range)
    }

    /// Normalizes a raw sample on one channel into `[0, 1]`.
    pub fn normalize(&self, role: ChannelRole, raw: f32) -> Option<f32> {
        Some(self.range_for(role)?.normalize(raw))
    }
}
