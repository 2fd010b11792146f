//! Error Types
//!
//! Errors are reserved for host programming mistakes: frames of the wrong
//! width, ticking a session that is not running, locking in before the
//! session finished. Degraded *data* is never an error. Non-finite
//! samples, silent channels and insufficient ranges are logged, skipped
//! or reported through session events instead, because a glove mid-use
//! cannot stop to unwind.
//!
//! The one exception is [`CalibrationError::NoData`]: a channel that
//! produced nothing across the whole session leaves lock-in with no
//! number to write, and inventing one would be worse than failing.

use thiserror_no_std::Error;

use crate::profile::ChannelRole;
use crate::session::SessionPhase;

/// Errors surfaced by the calibration engine.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum CalibrationError {
    /// A frame did not carry one sample per channel.
    #[error("frame carried {got} samples, profile expects {expected}")]
    ChannelCountMismatch {
        /// Channels in the glove profile.
        expected: usize,
        /// Samples in the offending frame.
        got: usize,
    },

    /// `advance` was called while no attempt was running.
    #[error("session is not running (phase {phase:?})")]
    NotRunning {
        /// Phase the session was in.
        phase: SessionPhase,
    },

    /// `start` was called on a session that already started.
    #[error("session already started")]
    AlreadyStarted,

    /// `lock_in` was called before the session finished.
    #[error("calibration not finished (phase {phase:?})")]
    NotFinished {
        /// Phase the session was in.
        phase: SessionPhase,
    },

    /// A channel produced no usable sample across the entire session.
    #[error("no data ever received on {role:?} channel")]
    NoData {
        /// The silent channel.
        role: ChannelRole,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for CalibrationError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::ChannelCountMismatch { expected, got } => {
                defmt::write!(fmt, "frame carried {} samples, expected {}", got, expected)
            }
            Self::NotRunning { phase } => {
                defmt::write!(fmt, "session is not running (phase {})", phase)
            }
            Self::AlreadyStarted => defmt::write!(fmt, "session already started"),
            Self::NotFinished { phase } => {
                defmt::write!(fmt, "calibration not finished (phase {})", phase)
            }
            Self::NoData { role } => {
                defmt::write!(fmt, "no data ever received on {} channel", role)
            }
        }
    }
}

/// Result alias for calibration operations.
pub type CalibrationResult<T> = Result<T, CalibrationError>;
