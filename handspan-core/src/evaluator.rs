//! Step Satisfaction Rules
//!
//! A step commits when the hand is demonstrably *in* the requested
//! gesture, not merely still. [`StepEvaluator`] combines two signals:
//! stillness of every channel's rolling window, and a per-step movement
//! rule that checks the live pose against extremes committed by earlier
//! steps.
//!
//! ```text
//! step             movement rule (applies once its predecessor committed)
//! ─────────────    ──────────────────────────────────────────────────────
//! ThumbsUp         opening pass: two finger channels moved since the
//!                  attempt began; later pass: fingers released from
//!                  their committed maxima, or thumb released from its
//!                  committed maximum
//! ThumbBelowRing   thumb flexion at least thumb_flexion_distance above
//!                  its committed minimum
//! ThumbAbduction   none; the cycle counter gates this step
//! HandsTogether    every finger at least release_distance below its
//!                  committed maximum
//! ─────────────    ──────────────────────────────────────────────────────
//! ```
//!
//! Every cross-step check is doubly gated: the predecessor step must have
//! committed, and the referenced extreme must actually exist. A check
//! whose data is missing simply does not apply, leaving stillness as the
//! only gate. Gating never inspects enum discriminants, so resequencing
//! the steps cannot silently invert a rule.

use crate::channel::SensorBank;
use crate::cycle::CycleCounter;
use crate::profile::{ChannelRole, GloveProfile};
use crate::steps::{CalibrationStep, StepSet};

/// Decides when the current gesture satisfies the current step.
#[derive(Debug, Clone)]
pub struct StepEvaluator {
    profile: GloveProfile,
}

impl StepEvaluator {
    /// Builds an evaluator for one glove profile.
    pub fn new(profile: &GloveProfile) -> Self {
        Self {
            profile: profile.clone(),
        }
    }

    /// True when every channel is still and has sampled this step.
    ///
    /// A single restless or silent channel keeps the whole hand unstable;
    /// an empty bank is never stable.
    pub fn is_stable<const N: usize>(&self, bank: &SensorBank<N>) -> bool {
        if bank.is_empty() {
            return false;
        }
        for (_, channel) in bank.iter() {
            if !channel.sampled_this_step() {
                return false;
            }
            if channel.stats().std_dev() > self.profile.stability_threshold() {
                return false;
            }
        }
        true
    }

    /// Applies the step's movement rule against the live pose.
    pub fn movement_satisfied<const N: usize>(
        &self,
        step: CalibrationStep,
        bank: &SensorBank<N>,
        completed: StepSet,
    ) -> bool {
        match step {
            CalibrationStep::ThumbsUp => {
                let later_pass = step
                    .committed_predecessors()
                    .iter()
                    .any(|pred| completed.contains(*pred));
                if !later_pass {
                    return self.opening_movement(bank);
                }
                let mut applicable = false;
                if completed.contains(CalibrationStep::HandsTogether)
                    && self.any_finger_committed_max(bank)
                {
                    applicable = true;
                    if self.fingers_released(bank) {
                        return true;
                    }
                }
                if completed.contains(CalibrationStep::ThumbBelowRing)
                    && self.thumb_committed_max(bank)
                {
                    applicable = true;
                    if self.thumb_released(bank) {
                        return true;
                    }
                }
                // No alternative had data to check against.
                !applicable
            }
            CalibrationStep::ThumbBelowRing => {
                if completed.contains(CalibrationStep::ThumbsUp) {
                    self.thumb_tucked(bank)
                } else {
                    true
                }
            }
            CalibrationStep::ThumbAbduction => true,
            CalibrationStep::HandsTogether => {
                if completed.contains(CalibrationStep::ThumbsUp) {
                    self.fingers_released(bank)
                } else {
                    true
                }
            }
        }
    }

    /// Full per-step verdict: counter progress for the abduction step,
    /// stillness plus the movement rule for everything else.
    pub fn step_satisfied<const N: usize>(
        &self,
        step: CalibrationStep,
        bank: &SensorBank<N>,
        counter: &CycleCounter,
        completed: StepSet,
    ) -> bool {
        match step {
            CalibrationStep::ThumbAbduction => {
                counter.count() >= self.profile.required_motions()
            }
            _ => self.is_stable(bank) && self.movement_satisfied(step, bank, completed),
        }
    }

    /// Opening check: enough proxy fingers moved since the attempt began.
    fn opening_movement<const N: usize>(&self, bank: &SensorBank<N>) -> bool {
        let mut moved = 0;
        for role in self.profile.finger_roles() {
            if let Some(channel) = bank.channel(*role) {
                if channel.first_movement() >= self.profile.first_movement_min() {
                    moved += 1;
                }
            }
        }
        moved >= crate::constants::FIRST_MOVEMENT_CHANNELS
    }

    /// Thumb flexed well past its committed resting minimum.
    fn thumb_tucked<const N: usize>(&self, bank: &SensorBank<N>) -> bool {
        if let Some(channel) = bank.channel(ChannelRole::ThumbFlexion) {
            if let Some(min) = channel.committed().min {
                return channel.latest() - min >= self.profile.thumb_flexion_distance();
            }
        }
        true
    }

    /// Thumb released from its committed flexion maximum.
    fn thumb_released<const N: usize>(&self, bank: &SensorBank<N>) -> bool {
        if let (Some(channel), Some(spec)) = (
            bank.channel(ChannelRole::ThumbFlexion),
            self.profile.spec_of(ChannelRole::ThumbFlexion),
        ) {
            if let Some(max) = channel.committed().max {
                return max - channel.latest() >= spec.release_distance;
            }
        }
        true
    }

    /// Every finger released from its committed flexion maximum.
    fn fingers_released<const N: usize>(&self, bank: &SensorBank<N>) -> bool {
        for role in self.profile.finger_roles() {
            if let (Some(channel), Some(spec)) =
                (bank.channel(*role), self.profile.spec_of(*role))
            {
                if let Some(max) = channel.committed().max {
                    if max - channel.latest() < spec.release_distance {
                        return false;
                    }
                }
            }
        }
        true
    }

    fn any_finger_committed_max<const N: usize>(&self, bank: &SensorBank<N>) -> bool {
        self.profile.finger_roles().iter().any(|role| {
            bank.channel(*role)
                .map(|channel| channel.committed().max.is_some())
                .unwrap_or(false)
        })
    }

    fn thumb_committed_max<const N: usize>(&self, bank: &SensorBank<N>) -> bool {
        bank.channel(ChannelRole::ThumbFlexion)
            .map(|channel| channel.committed().max.is_some())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Extreme;

    const WINDOW: usize = 8;

    fn quiet_bank(profile: &GloveProfile, frame: &[f32]) -> SensorBank<WINDOW> {
        let mut bank = SensorBank::new(profile);
        for _ in 0..WINDOW {
            bank.feed(frame, false).unwrap();
        }
        bank
    }

    fn commit(bank: &mut SensorBank<WINDOW>, role: ChannelRole, which: Extreme, value: f32) {
        bank.channel_mut(role)
            .unwrap()
            .commit_value(which, value);
    }

    #[test]
    fn stable_when_every_channel_is_quiet() {
        let profile = GloveProfile::v2();
        let bank = quiet_bank(&profile, &[500.0, 200.0, 3000.0, 3000.0, 3400.0, 3400.0]);
        let evaluator = StepEvaluator::new(&profile);
        assert!(evaluator.is_stable(&bank));
    }

    #[test]
    fn one_restless_channel_blocks_stability() {
        let profile = GloveProfile::v2();
        let mut bank: SensorBank<WINDOW> = SensorBank::new(&profile);
        for i in 0..WINDOW {
            let wobble = if i % 2 == 0 { 0.0 } else { 400.0 };
            bank.feed(&[500.0 + wobble, 200.0, 3000.0, 3000.0, 3400.0, 3400.0], false)
                .unwrap();
        }
        let evaluator = StepEvaluator::new(&profile);
        assert!(!evaluator.is_stable(&bank));
    }

    #[test]
    fn silent_channel_blocks_stability() {
        let profile = GloveProfile::v2();
        let mut bank = quiet_bank(&profile, &[500.0, 200.0, 3000.0, 3000.0, 3400.0, 3400.0]);
        bank.begin_step();
        let evaluator = StepEvaluator::new(&profile);
        assert!(!evaluator.is_stable(&bank));
        bank.feed(&[500.0, 200.0, 3000.0, 3000.0, 3400.0, 3400.0], false)
            .unwrap();
        assert!(evaluator.is_stable(&bank));
    }

    #[test]
    fn opening_movement_needs_two_moving_fingers() {
        let profile = GloveProfile::v2();
        let evaluator = StepEvaluator::new(&profile);

        // Both index joints sweep 1600 raw units during the opening step.
        let mut bank: SensorBank<WINDOW> = SensorBank::new(&profile);
        bank.feed(&[500.0, 200.0, 1400.0, 1400.0, 1400.0, 1400.0], true)
            .unwrap();
        bank.feed(&[500.0, 200.0, 3000.0, 3000.0, 1400.0, 1400.0], true)
            .unwrap();
        assert!(evaluator.movement_satisfied(
            CalibrationStep::ThumbsUp,
            &bank,
            StepSet::empty()
        ));

        // A single finger moving is not enough.
        let mut lone: SensorBank<WINDOW> = SensorBank::new(&profile);
        lone.feed(&[500.0, 200.0, 1400.0, 1400.0, 1400.0, 1400.0], true)
            .unwrap();
        lone.feed(&[500.0, 200.0, 3000.0, 1400.0, 1400.0, 1400.0], true)
            .unwrap();
        assert!(!evaluator.movement_satisfied(
            CalibrationStep::ThumbsUp,
            &lone,
            StepSet::empty()
        ));
    }

    #[test]
    fn motion_outside_the_opening_step_does_not_count() {
        let profile = GloveProfile::v2();
        let evaluator = StepEvaluator::new(&profile);
        let mut bank: SensorBank<WINDOW> = SensorBank::new(&profile);
        // Same sweep, but none of it flagged as opening-step motion.
        bank.feed(&[500.0, 200.0, 1400.0, 1400.0, 1400.0, 1400.0], false)
            .unwrap();
        bank.feed(&[500.0, 200.0, 3000.0, 3000.0, 1400.0, 1400.0], false)
            .unwrap();
        assert!(!evaluator.movement_satisfied(
            CalibrationStep::ThumbsUp,
            &bank,
            StepSet::empty()
        ));
    }

    #[test]
    fn thumb_below_ring_needs_the_thumb_tucked() {
        let profile = GloveProfile::v2();
        let evaluator = StepEvaluator::new(&profile);
        let mut completed = StepSet::empty();
        completed.insert(CalibrationStep::ThumbsUp);

        // Thumb rest committed at 200; 1500 is 1300 above it.
        let mut bank = quiet_bank(&profile, &[500.0, 1500.0, 2800.0, 2800.0, 3200.0, 3200.0]);
        commit(&mut bank, ChannelRole::ThumbFlexion, Extreme::Min, 200.0);
        assert!(evaluator.movement_satisfied(CalibrationStep::ThumbBelowRing, &bank, completed));

        // 900 is only 700 above the rest pose: not tucked yet.
        let mut shallow = quiet_bank(&profile, &[500.0, 900.0, 2800.0, 2800.0, 3200.0, 3200.0]);
        commit(&mut shallow, ChannelRole::ThumbFlexion, Extreme::Min, 200.0);
        assert!(!evaluator.movement_satisfied(CalibrationStep::ThumbBelowRing, &shallow, completed));
    }

    #[test]
    fn thumb_below_ring_passes_without_predecessor_data() {
        let profile = GloveProfile::v2();
        let evaluator = StepEvaluator::new(&profile);
        let bank = quiet_bank(&profile, &[500.0, 900.0, 2800.0, 2800.0, 3200.0, 3200.0]);
        // Nothing committed yet: the check has no data and does not apply.
        assert!(evaluator.movement_satisfied(
            CalibrationStep::ThumbBelowRing,
            &bank,
            StepSet::empty()
        ));
    }

    #[test]
    fn hands_together_needs_every_finger_released() {
        let profile = GloveProfile::v2();
        let evaluator = StepEvaluator::new(&profile);
        let mut completed = StepSet::empty();
        completed.insert(CalibrationStep::ThumbsUp);

        let mut bank = quiet_bank(&profile, &[500.0, 1200.0, 1000.0, 1000.0, 800.0, 800.0]);
        for role in profile.finger_roles() {
            commit(&mut bank, *role, Extreme::Max, 3200.0);
        }
        assert!(evaluator.movement_satisfied(CalibrationStep::HandsTogether, &bank, completed));

        // Ring finger still near its fist pose blocks the step.
        let mut curled = quiet_bank(&profile, &[500.0, 1200.0, 1000.0, 1000.0, 800.0, 3000.0]);
        for role in profile.finger_roles() {
            commit(&mut curled, *role, Extreme::Max, 3200.0);
        }
        assert!(!evaluator.movement_satisfied(CalibrationStep::HandsTogether, &curled, completed));
    }

    #[test]
    fn resequenced_thumbs_up_checks_committed_alternatives() {
        let profile = GloveProfile::v2();
        let evaluator = StepEvaluator::new(&profile);

        // After hands-together: fingers must sit well below the fist
        // maxima recorded by an earlier pass.
        let mut after_flat = StepSet::empty();
        after_flat.insert(CalibrationStep::HandsTogether);
        let mut bank = quiet_bank(&profile, &[500.0, 200.0, 1000.0, 1000.0, 800.0, 800.0]);
        for role in profile.finger_roles() {
            commit(&mut bank, *role, Extreme::Max, 3200.0);
        }
        assert!(evaluator.movement_satisfied(CalibrationStep::ThumbsUp, &bank, after_flat));

        let mut still_fisted = quiet_bank(&profile, &[500.0, 200.0, 3000.0, 3000.0, 3000.0, 3000.0]);
        for role in profile.finger_roles() {
            commit(&mut still_fisted, *role, Extreme::Max, 3200.0);
        }
        assert!(!evaluator.movement_satisfied(CalibrationStep::ThumbsUp, &still_fisted, after_flat));

        // After thumb-below-ring: the thumb must have released its tuck.
        let mut after_tuck = StepSet::empty();
        after_tuck.insert(CalibrationStep::ThumbBelowRing);
        let mut released = quiet_bank(&profile, &[500.0, 300.0, 3000.0, 3000.0, 3200.0, 3200.0]);
        commit(&mut released, ChannelRole::ThumbFlexion, Extreme::Max, 2400.0);
        assert!(evaluator.movement_satisfied(CalibrationStep::ThumbsUp, &released, after_tuck));

        let mut tucked = quiet_bank(&profile, &[500.0, 2200.0, 3000.0, 3000.0, 3200.0, 3200.0]);
        commit(&mut tucked, ChannelRole::ThumbFlexion, Extreme::Max, 2400.0);
        assert!(!evaluator.movement_satisfied(CalibrationStep::ThumbsUp, &tucked, after_tuck));
    }

    #[test]
    fn resequenced_thumbs_up_without_data_passes_vacuously() {
        let profile = GloveProfile::v2();
        let evaluator = StepEvaluator::new(&profile);
        let mut completed = StepSet::empty();
        completed.insert(CalibrationStep::ThumbBelowRing);
        // Predecessor nominally done but its extreme never committed
        // (every channel skipped): no alternative applies.
        let bank = quiet_bank(&profile, &[500.0, 2200.0, 3000.0, 3000.0, 3200.0, 3200.0]);
        assert!(evaluator.movement_satisfied(CalibrationStep::ThumbsUp, &bank, completed));
    }

    #[test]
    fn abduction_is_gated_by_the_counter_alone() {
        let profile = GloveProfile::v2();
        let evaluator = StepEvaluator::new(&profile);
        let bank = quiet_bank(&profile, &[500.0, 200.0, 3000.0, 3000.0, 3400.0, 3400.0]);

        let mut counter = CycleCounter::new(profile.count_distance());
        assert!(!evaluator.step_satisfied(
            CalibrationStep::ThumbAbduction,
            &bank,
            &counter,
            StepSet::empty()
        ));
        for _ in 0..4 {
            counter.advance(300.0, None);
            counter.advance(500.0, None);
        }
        counter.advance(300.0, None);
        assert!(evaluator.step_satisfied(
            CalibrationStep::ThumbAbduction,
            &bank,
            &counter,
            StepSet::empty()
        ));
    }

    #[test]
    fn step_satisfied_requires_both_stillness_and_movement() {
        let profile = GloveProfile::v2();
        let evaluator = StepEvaluator::new(&profile);
        let counter = CycleCounter::new(profile.count_distance());
        let mut completed = StepSet::empty();
        completed.insert(CalibrationStep::ThumbsUp);

        // Tucked and still: satisfied.
        let mut bank = quiet_bank(&profile, &[500.0, 1500.0, 2800.0, 2800.0, 3200.0, 3200.0]);
        commit(&mut bank, ChannelRole::ThumbFlexion, Extreme::Min, 200.0);
        assert!(evaluator.step_satisfied(
            CalibrationStep::ThumbBelowRing,
            &bank,
            &counter,
            completed
        ));

        // Tucked but the hand is still moving: not yet.
        let mut moving: SensorBank<WINDOW> = SensorBank::new(&profile);
        for i in 0..WINDOW {
            let wobble = if i % 2 == 0 { 0.0 } else { 300.0 };
            moving
                .feed(&[500.0, 1500.0 + wobble, 2800.0, 2800.0, 3200.0, 3200.0], false)
                .unwrap();
        }
        commit(&mut moving, ChannelRole::ThumbFlexion, Extreme::Min, 200.0);
        assert!(!evaluator.step_satisfied(
            CalibrationStep::ThumbBelowRing,
            &moving,
            &counter,
            completed
        ));
    }
}
