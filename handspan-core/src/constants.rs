//! Calibration Thresholds and Timing
//!
//! This module provides centralized, well-documented constants used
//! throughout the calibration engine. All numeric values are defined here
//! with clear explanations of their purpose, source, and rationale.
//!
//! Values are expressed in raw sensor units unless a unit suffix says
//! otherwise. Raw units are the unscaled ADC counts reported by the glove;
//! full flexion of a finger typically sweeps 1600-3000 counts.
//!
//! ## Usage Guidelines
//!
//! 1. Always use these constants instead of magic numbers
//! 2. When adding new constants, document purpose and source
//! 3. Per-generation values carry a `V1_`/`V2_` prefix

// ===== ROLLING-WINDOW STATISTICS =====

/// Number of samples in the per-channel rolling statistics window.
///
/// At the glove's 50-60 Hz frame rate this covers roughly one second of
/// motion, long enough to ride out tremor without masking real gestures.
///
/// Source: bring-up tuning on production gloves
pub const ROLLING_WINDOW: usize = 55;

/// Maximum rolling standard deviation for a channel to count as still (raw).
///
/// Channels quieter than this are treated as held in a fixed pose.
/// Sensor noise on a motionless hand measures 10-30 raw units, deliberate
/// motion measures hundreds.
pub const STABILITY_THRESHOLD_RAW: f32 = 55.0;

// ===== OPENING-STEP MOVEMENT CHECK =====

/// Minimum first-step excursion that counts as deliberate movement (raw).
///
/// Guards against locking onto a glove lying on a table: the opening
/// gesture only completes once the wearer has visibly moved.
pub const FIRST_MOVEMENT_MIN_RAW: f32 = 400.0;

/// How many proxy flexion channels must show the opening movement.
///
/// Two independent fingers moving rules out a single noisy channel
/// passing the check on its own.
pub const FIRST_MOVEMENT_CHANNELS: usize = 2;

// ===== GESTURE-ORDERING DISTANCES =====

/// Thumb travel from its committed resting minimum that confirms the thumb
/// is tucked for the thumb-below-ring gesture (raw).
pub const THUMB_FLEXION_DISTANCE_RAW: f32 = 1000.0;

/// Release distance for full-range flexion channels (raw).
///
/// A finger must sit at least this far from its committed opposite extreme
/// before a follow-up gesture is accepted.
pub const RELEASE_DISTANCE_RAW: f32 = 1000.0;

/// Release distance for the split index joints on V2 gloves (raw).
///
/// The proximal and distal index sensors each see roughly a third of the
/// combined V1 sweep, so the release distance shrinks accordingly.
pub const SPLIT_INDEX_RELEASE_DISTANCE_RAW: f32 = 300.0;

// ===== ABDUCTION CYCLE COUNTING =====

/// Hysteresis distance for one abduction half-sweep on V1 gloves (raw).
///
/// The thumb must travel this far past the sweep landmark before the
/// counter flips phase, so jitter never registers as motion.
pub const V1_COUNT_DISTANCE_RAW: f32 = 100.0;

/// Hysteresis distance for one abduction half-sweep on V2 gloves (raw).
///
/// V2 abduction sensors span about half the V1 range.
pub const V2_COUNT_DISTANCE_RAW: f32 = 50.0;

/// Out-and-back thumb motions required to finish the abduction step.
pub const REQUIRED_ABDUCTION_MOTIONS: u32 = 4;

// ===== RANGE SUFFICIENCY =====

/// Minimum committed span for full-range flexion channels (raw).
///
/// Narrower spans normalize noise into large pose swings, so the attempt
/// is rejected instead.
pub const FLEXION_MIN_SPAN_RAW: f32 = 1600.0;

/// Minimum committed span for the split index joints on V2 gloves (raw).
pub const SPLIT_INDEX_MIN_SPAN_RAW: f32 = 500.0;

/// Minimum committed thumb-abduction span on V1 gloves (raw).
pub const V1_ABDUCTION_MIN_SPAN_RAW: f32 = 200.0;

/// Minimum committed thumb-abduction span on V2 gloves (raw).
pub const V2_ABDUCTION_MIN_SPAN_RAW: f32 = 100.0;

// ===== SESSION TIMING =====

/// Wall-clock budget for a single calibration step (ms).
///
/// When the budget runs out the step commits whatever arrived and the
/// session moves on rather than trapping the wearer.
pub const STEP_TIME_LIMIT_MS: u32 = 8_000;

/// How long a gesture must stay stable before its step commits (ms).
///
/// A brief pass through the target pose is not enough; the wearer has to
/// hold it.
pub const STABLE_HOLD_MS: u32 = 800;

/// Pause between consecutive steps (ms).
///
/// Gives the wearer time to read the next instruction. Samples keep
/// flowing into the rolling windows during the pause; evaluation resumes
/// with the next step.
pub const STEP_PAUSE_MS: u32 = 1_000;

// ===== ATTEMPTS =====

/// Maximum guided attempts before the session locks in whatever it has.
pub const MAX_ATTEMPTS: u8 = 2;

// ===== CAPACITY =====

/// Upper bound on sensor channels per glove, sized for future hardware.
pub const MAX_CHANNELS: usize = 8;
