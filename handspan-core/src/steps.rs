//! Calibration Steps
//!
//! The guided calibration walks the wearer through four gestures. Each
//! step anchors specific channel extremes; later steps check their
//! gesture against extremes committed by earlier ones.
//!
//! Cross-step checks consult [`CalibrationStep::committed_predecessors`],
//! an explicit table of which steps must already have committed for a
//! check to apply. Step identity is never compared by discriminant value,
//! so reordering the sequence cannot silently flip a rule.

/// One gesture in the guided calibration sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CalibrationStep {
    /// Fist with the thumb pointing up: anchors finger-flexion maxima and
    /// the thumb-flexion minimum.
    ThumbsUp = 0,
    /// Thumb tucked under the ring finger: anchors the thumb-flexion
    /// maximum and the thumb-abduction minimum.
    ThumbBelowRing = 1,
    /// Thumb swung out and back repeatedly: sweeps the full abduction
    /// range while the cycle counter watches.
    ThumbAbduction = 2,
    /// Palms pressed flat together: anchors finger-flexion minima.
    HandsTogether = 3,
}

impl CalibrationStep {
    /// The canonical guided order.
    pub const SEQUENCE: [CalibrationStep; 4] = [
        CalibrationStep::ThumbsUp,
        CalibrationStep::ThumbBelowRing,
        CalibrationStep::ThumbAbduction,
        CalibrationStep::HandsTogether,
    ];

    /// Number of steps in one attempt.
    pub const COUNT: usize = Self::SEQUENCE.len();

    /// The step that follows this one, or `None` after the last.
    pub fn next(&self) -> Option<CalibrationStep> {
        match self {
            CalibrationStep::ThumbsUp => Some(CalibrationStep::ThumbBelowRing),
            CalibrationStep::ThumbBelowRing => Some(CalibrationStep::ThumbAbduction),
            CalibrationStep::ThumbAbduction => Some(CalibrationStep::HandsTogether),
            CalibrationStep::HandsTogether => None,
        }
    }

    /// Instruction label for host UIs.
    pub const fn display_name(&self) -> &'static str {
        match self {
            CalibrationStep::ThumbsUp => "THUMBS UP",
            CalibrationStep::ThumbBelowRing => "THUMB BELOW RING FINGER",
            CalibrationStep::ThumbAbduction => "THUMB IN AND OUT",
            CalibrationStep::HandsTogether => "HANDS FLAT TOGETHER",
        }
    }

    /// Steps whose committed extremes this step's movement check reads.
    ///
    /// A check only applies once the predecessor it references has
    /// committed; until then the step is gated by stability alone.
    pub fn committed_predecessors(&self) -> &'static [CalibrationStep] {
        match self {
            CalibrationStep::ThumbsUp => {
                &[CalibrationStep::ThumbBelowRing, CalibrationStep::HandsTogether]
            }
            CalibrationStep::ThumbBelowRing => &[CalibrationStep::ThumbsUp],
            CalibrationStep::ThumbAbduction => &[],
            CalibrationStep::HandsTogether => &[CalibrationStep::ThumbsUp],
        }
    }

    /// Bit used by [`StepSet`].
    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Set of calibration steps, packed into one byte.
///
/// Tracks which steps of the current attempt have committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepSet(u8);

impl StepSet {
    /// Set containing no steps.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Adds a step to the set.
    pub fn insert(&mut self, step: CalibrationStep) {
        self.0 |= step.bit();
    }

    /// True if the step is in the set.
    pub const fn contains(&self, step: CalibrationStep) -> bool {
        (self.0 & step.bit()) != 0
    }

    /// Number of steps in the set.
    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// True if no step is in the set.
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Removes every step.
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Iterates members in canonical sequence order.
    pub fn iter(&self) -> impl Iterator<Item = CalibrationStep> + '_ {
        CalibrationStep::SEQUENCE
            .iter()
            .copied()
            .filter(move |step| self.contains(*step))
    }
}
