//! Glove Hardware Profiles
//!
//! Two sensor generations are in the field. V1 gloves report five
//! channels with one combined index-flexion sensor; V2 gloves split the
//! index finger into proximal and distal joints and ship six channels
//! with roughly half the V1 abduction sweep. Everything generation
//! specific lives here: the channel table, the per-step commit tables,
//! and the tuning knobs the session and evaluator read.
//!
//! Profiles are cheap to clone and immutable once built; `with_*`
//! overrides exist for hosts that need non-standard timing (and for
//! tests).

use crate::channel::Extreme;
use crate::constants::{
    FIRST_MOVEMENT_MIN_RAW, FLEXION_MIN_SPAN_RAW, MAX_ATTEMPTS, REQUIRED_ABDUCTION_MOTIONS,
    RELEASE_DISTANCE_RAW, SPLIT_INDEX_MIN_SPAN_RAW, SPLIT_INDEX_RELEASE_DISTANCE_RAW,
    STABILITY_THRESHOLD_RAW, STABLE_HOLD_MS, STEP_PAUSE_MS, STEP_TIME_LIMIT_MS,
    THUMB_FLEXION_DISTANCE_RAW, V1_ABDUCTION_MIN_SPAN_RAW, V1_COUNT_DISTANCE_RAW,
    V2_ABDUCTION_MIN_SPAN_RAW, V2_COUNT_DISTANCE_RAW,
};
use crate::steps::CalibrationStep;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sensor hardware generation of a glove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum GloveGeneration {
    /// Five channels, combined index sensor, wide abduction sweep.
    V1 = 1,
    /// Six channels, split index joints, halved abduction sweep.
    V2 = 2,
}

impl GloveGeneration {
    /// Human-readable generation name.
    pub const fn name(&self) -> &'static str {
        match self {
            GloveGeneration::V1 => "v1",
            GloveGeneration::V2 => "v2",
        }
    }
}

/// What a sensor channel measures.
///
/// Frame order on the wire follows the profile's channel table, so roles
/// double as the stable lookup key for committed ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum ChannelRole {
    /// Thumb splay away from the palm.
    ThumbAbduction = 0,
    /// Thumb curl.
    ThumbFlexion = 1,
    /// Combined index curl (V1 only).
    IndexFlexion = 2,
    /// Index proximal joint curl (V2 only).
    IndexProximal = 3,
    /// Index distal joint curl (V2 only).
    IndexDistal = 4,
    /// Middle finger curl.
    MiddleFlexion = 5,
    /// Ring finger curl.
    RingFlexion = 6,
}

impl ChannelRole {
    /// Every role either generation can report.
    pub const ALL: [ChannelRole; 7] = [
        ChannelRole::ThumbAbduction,
        ChannelRole::ThumbFlexion,
        ChannelRole::IndexFlexion,
        ChannelRole::IndexProximal,
        ChannelRole::IndexDistal,
        ChannelRole::MiddleFlexion,
        ChannelRole::RingFlexion,
    ];

    /// Human-readable role name.
    pub const fn name(&self) -> &'static str {
        match self {
            ChannelRole::ThumbAbduction => "thumb abduction",
            ChannelRole::ThumbFlexion => "thumb flexion",
            ChannelRole::IndexFlexion => "index flexion",
            ChannelRole::IndexProximal => "index proximal",
            ChannelRole::IndexDistal => "index distal",
            ChannelRole::MiddleFlexion => "middle flexion",
            ChannelRole::RingFlexion => "ring flexion",
        }
    }

    /// Bit used by [`RoleSet`].
    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Set of channel roles, packed into one byte.
///
/// Session events use it to report which channels a step committed,
/// skipped, or left with an insufficient range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoleSet(u8);

impl RoleSet {
    /// Set containing no roles.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Adds a role to the set.
    pub fn insert(&mut self, role: ChannelRole) {
        self.0 |= role.bit();
    }

    /// True if the role is in the set.
    pub const fn contains(&self, role: ChannelRole) -> bool {
        (self.0 & role.bit()) != 0
    }

    /// Number of roles in the set.
    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// True if no role is in the set.
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterates members in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = ChannelRole> + '_ {
        ChannelRole::ALL
            .iter()
            .copied()
            .filter(move |role| self.contains(*role))
    }
}

/// Per-channel hardware expectations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSpec {
    /// What the channel measures.
    pub role: ChannelRole,
    /// Smallest committed span that counts as a usable calibration (raw).
    pub min_span: f32,
    /// How far the channel must sit from a committed opposite extreme
    /// before a follow-up gesture is accepted (raw).
    pub release_distance: f32,
}

// Channel tables double as the frame layout: samples arrive in this order.

const V1_CHANNELS: [ChannelSpec; 5] = [
    ChannelSpec {
        role: ChannelRole::ThumbAbduction,
        min_span: V1_ABDUCTION_MIN_SPAN_RAW,
        release_distance: RELEASE_DISTANCE_RAW,
    },
    ChannelSpec {
        role: ChannelRole::ThumbFlexion,
        min_span: FLEXION_MIN_SPAN_RAW,
        release_distance: RELEASE_DISTANCE_RAW,
    },
    ChannelSpec {
        role: ChannelRole::IndexFlexion,
        min_span: FLEXION_MIN_SPAN_RAW,
        release_distance: RELEASE_DISTANCE_RAW,
    },
    ChannelSpec {
        role: ChannelRole::MiddleFlexion,
        min_span: FLEXION_MIN_SPAN_RAW,
        release_distance: RELEASE_DISTANCE_RAW,
    },
    ChannelSpec {
        role: ChannelRole::RingFlexion,
        min_span: FLEXION_MIN_SPAN_RAW,
        release_distance: RELEASE_DISTANCE_RAW,
    },
];

const V2_CHANNELS: [ChannelSpec; 6] = [
    ChannelSpec {
        role: ChannelRole::ThumbAbduction,
        min_span: V2_ABDUCTION_MIN_SPAN_RAW,
        release_distance: RELEASE_DISTANCE_RAW,
    },
    ChannelSpec {
        role: ChannelRole::ThumbFlexion,
        min_span: FLEXION_MIN_SPAN_RAW,
        release_distance: RELEASE_DISTANCE_RAW,
    },
    ChannelSpec {
        role: ChannelRole::IndexProximal,
        min_span: SPLIT_INDEX_MIN_SPAN_RAW,
        release_distance: SPLIT_INDEX_RELEASE_DISTANCE_RAW,
    },
    ChannelSpec {
        role: ChannelRole::IndexDistal,
        min_span: SPLIT_INDEX_MIN_SPAN_RAW,
        release_distance: SPLIT_INDEX_RELEASE_DISTANCE_RAW,
    },
    ChannelSpec {
        role: ChannelRole::MiddleFlexion,
        min_span: FLEXION_MIN_SPAN_RAW,
        release_distance: RELEASE_DISTANCE_RAW,
    },
    ChannelSpec {
        role: ChannelRole::RingFlexion,
        min_span: FLEXION_MIN_SPAN_RAW,
        release_distance: RELEASE_DISTANCE_RAW,
    },
];

// Which extremes each step anchors. The thumbs-up fist flexes the fingers
// fully and extends the thumb; hands-together does the opposite for the
// fingers. The abduction step commits both abduction extremes from the
// cycle counter's sweep instead of the latest sample.

const V1_THUMBS_UP: [(ChannelRole, Extreme); 4] = [
    (ChannelRole::IndexFlexion, Extreme::Max),
    (ChannelRole::MiddleFlexion, Extreme::Max),
    (ChannelRole::RingFlexion, Extreme::Max),
    (ChannelRole::ThumbFlexion, Extreme::Min),
];

const V2_THUMBS_UP: [(ChannelRole, Extreme); 5] = [
    (ChannelRole::IndexProximal, Extreme::Max),
    (ChannelRole::IndexDistal, Extreme::Max),
    (ChannelRole::MiddleFlexion, Extreme::Max),
    (ChannelRole::RingFlexion, Extreme::Max),
    (ChannelRole::ThumbFlexion, Extreme::Min),
];

const THUMB_BELOW_RING: [(ChannelRole, Extreme); 2] = [
    (ChannelRole::ThumbFlexion, Extreme::Max),
    (ChannelRole::ThumbAbduction, Extreme::Min),
];

const THUMB_ABDUCTION: [(ChannelRole, Extreme); 2] = [
    (ChannelRole::ThumbAbduction, Extreme::Min),
    (ChannelRole::ThumbAbduction, Extreme::Max),
];

const V1_HANDS_TOGETHER: [(ChannelRole, Extreme); 3] = [
    (ChannelRole::IndexFlexion, Extreme::Min),
    (ChannelRole::MiddleFlexion, Extreme::Min),
    (ChannelRole::RingFlexion, Extreme::Min),
];

const V2_HANDS_TOGETHER: [(ChannelRole, Extreme); 4] = [
    (ChannelRole::IndexProximal, Extreme::Min),
    (ChannelRole::IndexDistal, Extreme::Min),
    (ChannelRole::MiddleFlexion, Extreme::Min),
    (ChannelRole::RingFlexion, Extreme::Min),
];

// Finger-flexion role sets, also the proxies for the opening movement
// check (the thumb is excluded: its resting pose is too wearer-dependent).

const V1_FINGER_ROLES: [ChannelRole; 3] = [
    ChannelRole::IndexFlexion,
    ChannelRole::MiddleFlexion,
    ChannelRole::RingFlexion,
];

const V2_FINGER_ROLES: [ChannelRole; 4] = [
    ChannelRole::IndexProximal,
    ChannelRole::IndexDistal,
    ChannelRole::MiddleFlexion,
    ChannelRole::RingFlexion,
];

/// Everything the calibration engine needs to know about one glove model.
///
/// Construct with [`v1`](Self::v1) or [`v2`](Self::v2), then adjust
/// individual knobs through the `with_*` methods if the deployment calls
/// for it:
///
/// ```
/// use handspan_core::GloveProfile;
///
/// let profile = GloveProfile::v2()
///     .with_stable_hold(400)
///     .with_max_attempts(3);
/// assert_eq!(profile.channel_count(), 6);
/// ```
#[derive(Debug, Clone)]
pub struct GloveProfile {
    generation: GloveGeneration,
    channels: &'static [ChannelSpec],
    stability_threshold: f32,
    first_movement_min: f32,
    thumb_flexion_distance: f32,
    count_distance: f32,
    required_motions: u32,
    step_time_limit_ms: u32,
    stable_hold_ms: u32,
    step_pause_ms: u32,
    max_attempts: u8,
    allow_retry: bool,
}

impl GloveProfile {
    /// Profile for first-generation gloves (five channels).
    pub fn v1() -> Self {
        Self {
            generation: GloveGeneration::V1,
            channels: &V1_CHANNELS,
            stability_threshold: STABILITY_THRESHOLD_RAW,
            first_movement_min: FIRST_MOVEMENT_MIN_RAW,
            thumb_flexion_distance: THUMB_FLEXION_DISTANCE_RAW,
            count_distance: V1_COUNT_DISTANCE_RAW,
            required_motions: REQUIRED_ABDUCTION_MOTIONS,
            step_time_limit_ms: STEP_TIME_LIMIT_MS,
            stable_hold_ms: STABLE_HOLD_MS,
            step_pause_ms: STEP_PAUSE_MS,
            max_attempts: MAX_ATTEMPTS,
            allow_retry: true,
        }
    }

    /// Profile for second-generation gloves (six channels, split index).
    pub fn v2() -> Self {
        Self {
            generation: GloveGeneration::V2,
            channels: &V2_CHANNELS,
            count_distance: V2_COUNT_DISTANCE_RAW,
            ..Self::v1()
        }
    }

    /// Overrides the stillness threshold (raw standard deviation).
    pub fn with_stability_threshold(mut self, raw: f32) -> Self {
        self.stability_threshold = raw;
        self
    }

    /// Overrides the per-step wall-clock budget (ms).
    pub fn with_step_time_limit(mut self, ms: u32) -> Self {
        self.step_time_limit_ms = ms;
        self
    }

    /// Overrides how long a gesture must stay stable to commit (ms).
    pub fn with_stable_hold(mut self, ms: u32) -> Self {
        self.stable_hold_ms = ms;
        self
    }

    /// Overrides the pause between steps (ms).
    pub fn with_step_pause(mut self, ms: u32) -> Self {
        self.step_pause_ms = ms;
        self
    }

    /// Overrides the attempt budget.
    pub fn with_max_attempts(mut self, attempts: u8) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Enables or disables the automatic retry after a failed attempt.
    pub fn with_retry(mut self, allowed: bool) -> Self {
        self.allow_retry = allowed;
        self
    }

    /// Hardware generation this profile describes.
    pub fn generation(&self) -> GloveGeneration {
        self.generation
    }

    /// Channel table in wire order.
    pub fn channels(&self) -> &'static [ChannelSpec] {
        self.channels
    }

    /// Number of channels in a sensor frame.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Position of a role within the frame, if this generation carries it.
    pub fn index_of(&self, role: ChannelRole) -> Option<usize> {
        self.channels.iter().position(|spec| spec.role == role)
    }

    /// Spec for a role, if this generation carries it.
    pub fn spec_of(&self, role: ChannelRole) -> Option<&'static ChannelSpec> {
        self.channels.iter().find(|spec| spec.role == role)
    }

    /// Maximum rolling standard deviation that counts as still (raw).
    pub fn stability_threshold(&self) -> f32 {
        self.stability_threshold
    }

    /// Minimum opening-step excursion that counts as movement (raw).
    pub fn first_movement_min(&self) -> f32 {
        self.first_movement_min
    }

    /// Thumb travel that confirms the thumb-below-ring tuck (raw).
    pub fn thumb_flexion_distance(&self) -> f32 {
        self.thumb_flexion_distance
    }

    /// Hysteresis distance for one abduction half-sweep (raw).
    pub fn count_distance(&self) -> f32 {
        self.count_distance
    }

    /// Out-and-back motions required by the abduction step.
    pub fn required_motions(&self) -> u32 {
        self.required_motions
    }

    /// Per-step wall-clock budget (ms).
    pub fn step_time_limit_ms(&self) -> u32 {
        self.step_time_limit_ms
    }

    /// Required stable hold before a step commits (ms).
    pub fn stable_hold_ms(&self) -> u32 {
        self.stable_hold_ms
    }

    /// Pause between steps (ms).
    pub fn step_pause_ms(&self) -> u32 {
        self.step_pause_ms
    }

    /// Attempt budget for one session.
    pub fn max_attempts(&self) -> u8 {
        self.max_attempts
    }

    /// Whether a failed attempt restarts automatically.
    pub fn retry_allowed(&self) -> bool {
        self.allow_retry
    }

    /// Extremes a step anchors when it commits.
    ///
    /// The abduction entries are listed for completeness; their values
    /// come from the cycle counter's sweep rather than the live sample.
    pub fn commits(&self, step: CalibrationStep) -> &'static [(ChannelRole, Extreme)] {
        match (self.generation, step) {
            (GloveGeneration::V1, CalibrationStep::ThumbsUp) => &V1_THUMBS_UP,
            (GloveGeneration::V2, CalibrationStep::ThumbsUp) => &V2_THUMBS_UP,
            (_, CalibrationStep::ThumbBelowRing) => &THUMB_BELOW_RING,
            (_, CalibrationStep::ThumbAbduction) => &THUMB_ABDUCTION,
            (GloveGeneration::V1, CalibrationStep::HandsTogether) => &V1_HANDS_TOGETHER,
            (GloveGeneration::V2, CalibrationStep::HandsTogether) => &V2_HANDS_TOGETHER,
        }
    }

    /// Finger-flexion roles for this generation (thumb excluded).
    pub fn finger_roles(&self) -> &'static [ChannelRole] {
        match self.generation {
            GloveGeneration::V1 => &V1_FINGER_ROLES,
            GloveGeneration::V2 => &V2_FINGER_ROLES,
        }
    }
}
