//! Core calibration engine for Handspan
//!
//! Turns raw flex-sensor streams from a haptic glove into per-finger
//! normalization ranges through a guided four-gesture calibration.
//! Designed for the glove's companion MCU as well as desktop hosts.
//!
//! Key constraints:
//! - No heap allocation in the sample path
//! - Fixed-size rolling windows, bounded channel tables
//! - One `advance()` call per sensor frame, millisecond-scale budget
//!
//! ```
//! use handspan_core::{CalibrationSession, GloveProfile, HandSide, ROLLING_WINDOW};
//!
//! let profile = GloveProfile::v2();
//! let mut session = CalibrationSession::<ROLLING_WINDOW>::new(profile, HandSide::Right);
//! session.start().unwrap();
//!
//! // One tick: six raw channel readings plus elapsed milliseconds.
//! let frame = [500.0, 200.0, 3000.0, 3000.0, 3400.0, 3400.0];
//! match session.advance(&frame, 20) {
//!     Ok(_event) => {}  // Sampling, StepCommitted, Paused, ...
//!     Err(_e) => {}     // Wrong frame width, session not running, ...
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

// Internal logging that compiles away without the `log` feature.
#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {{}};
}

pub mod channel;
pub mod constants;
pub mod cycle;
pub mod errors;
pub mod evaluator;
pub mod profile;
pub mod range;
pub mod session;
pub mod stats;
pub mod steps;

// Public API
pub use channel::{ChannelState, CommittedRange, Extreme, SensorBank};
pub use constants::ROLLING_WINDOW;
pub use cycle::{CycleCounter, SweepPhase};
pub use errors::{CalibrationError, CalibrationResult};
pub use evaluator::StepEvaluator;
pub use profile::{ChannelRole, ChannelSpec, GloveGeneration, GloveProfile, RoleSet};
pub use range::{ChannelRange, HandSide, LockOutcome, RangeEntry, RangeProfile};
pub use session::{CalibrationSession, SessionEvent, SessionPhase, StepReport};
pub use stats::RollingStats;
pub use steps::{CalibrationStep, StepSet};

/// Crate version, taken from the package manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
