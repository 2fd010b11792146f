//! Calibration Session Orchestration
//!
//! [`CalibrationSession`] owns everything one guided calibration needs:
//! the sensor bank, the cycle counter, the evaluator and the step/attempt
//! bookkeeping. The host owns the clock and the transport; it calls
//! [`advance`](CalibrationSession::advance) once per sensor frame with
//! the elapsed milliseconds and reacts to the returned event.
//!
//! ```text
//!  NotStarted ──start()──▶ WaitingForStability ◀─────────────┐
//!                          WaitingForAbduction               │ pause over
//!                               │                            │
//!                 satisfied+held│ or time limit          StepPause
//!                               ▼                            ▲
//!                          commit step ──── more steps ──────┘
//!                               │ last step
//!                               ▼
//!                  spans sufficient ──▶ Finished (validated)
//!                  else, attempt left ─▶ restart at step one
//!                  else ──────────────▶ Finished (forced)
//!
//!  abandon() from anywhere ──▶ Abandoned
//! ```
//!
//! Steps commit even when their time limit expires: whatever extremes the
//! wearer produced are kept, the gaps surface in the [`StepReport`] and,
//! if the final spans come up short, in the attempt verdict. A session
//! that exhausts its attempts still locks in the widest ranges it saw,
//! flagged as [`LockOutcome::Forced`].

use crate::channel::{Extreme, SensorBank};
use crate::cycle::CycleCounter;
use crate::errors::{CalibrationError, CalibrationResult};
use crate::evaluator::StepEvaluator;
use crate::profile::{ChannelRole, GloveProfile, RoleSet};
use crate::range::{ChannelRange, HandSide, LockOutcome, RangeEntry, RangeProfile};
use crate::steps::{CalibrationStep, StepSet};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionPhase {
    /// Built but not started.
    NotStarted,
    /// A gesture step is waiting for the hand to settle into pose.
    WaitingForStability,
    /// The abduction step is waiting for enough thumb motions.
    WaitingForAbduction,
    /// Between steps; samples flow, evaluation is suspended.
    StepPause,
    /// All steps done, verdict reached; ready for lock-in.
    Finished,
    /// Discarded by the host.
    Abandoned,
}

/// What one committed step produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepReport {
    /// The step that committed.
    pub step: CalibrationStep,
    /// Channels whose extremes were anchored.
    pub committed: RoleSet,
    /// Channels that saw no sample and anchored nothing.
    pub skipped: RoleSet,
    /// True when the time limit forced the commit.
    pub timed_out: bool,
}

/// What a single `advance` tick produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionEvent {
    /// Still collecting; `stable` reflects the evaluator's verdict this
    /// tick (always false during the abduction step).
    Sampling {
        /// Step being collected.
        step: CalibrationStep,
        /// Whether the gesture satisfied the step this tick.
        stable: bool,
    },
    /// A step just committed its extremes.
    StepCommitted(StepReport),
    /// Between steps; `next` is what the wearer should prepare for.
    Paused {
        /// The upcoming step.
        next: CalibrationStep,
    },
    /// The attempt produced insufficient spans; a fresh attempt started.
    AttemptRetried {
        /// The attempt that failed (1-based).
        attempt: u8,
        /// Channels whose spans came up short.
        shortfall: RoleSet,
    },
    /// The attempt validated; the session is finished.
    AttemptValidated {
        /// The attempt that validated (1-based).
        attempt: u8,
    },
    /// The last allowed attempt still came up short; the session is
    /// finished and will lock in forced ranges.
    AttemptsExhausted {
        /// The final attempt number (1-based).
        attempt: u8,
        /// Channels whose spans came up short.
        shortfall: RoleSet,
    },
}

/// One guided calibration, from `start` to `lock_in`.
///
/// `N` is the rolling-window length;
/// [`ROLLING_WINDOW`](crate::constants::ROLLING_WINDOW) is the production
/// value.
#[derive(Debug, Clone)]
pub struct CalibrationSession<const N: usize> {
    profile: GloveProfile,
    evaluator: StepEvaluator,
    bank: SensorBank<N>,
    counter: CycleCounter,
    side: HandSide,
    phase: SessionPhase,
    step: CalibrationStep,
    pending: Option<CalibrationStep>,
    completed: StepSet,
    attempt: u8,
    step_elapsed_ms: u32,
    hold_ms: u32,
    pause_elapsed_ms: u32,
    outcome: Option<LockOutcome>,
    last_report: Option<StepReport>,
}

impl<const N: usize> CalibrationSession<N> {
    /// Builds a session for one glove; call [`start`](Self::start) when
    /// the wearer is ready.
    pub fn new(profile: GloveProfile, side: HandSide) -> Self {
        let evaluator = StepEvaluator::new(&profile);
        let bank = SensorBank::new(&profile);
        let counter = CycleCounter::new(profile.count_distance());
        Self {
            profile,
            evaluator,
            bank,
            counter,
            side,
            phase: SessionPhase::NotStarted,
            step: CalibrationStep::SEQUENCE[0],
            pending: None,
            completed: StepSet::empty(),
            attempt: 0,
            step_elapsed_ms: 0,
            hold_ms: 0,
            pause_elapsed_ms: 0,
            outcome: None,
            last_report: None,
        }
    }

    /// Begins the first attempt at the first step.
    pub fn start(&mut self) -> CalibrationResult<()> {
        if self.phase != SessionPhase::NotStarted {
            return Err(CalibrationError::AlreadyStarted);
        }
        self.attempt = 1;
        self.begin_step(CalibrationStep::SEQUENCE[0]);
        Ok(())
    }

    /// Feeds one sensor frame plus the milliseconds since the last one.
    ///
    /// The frame must carry one sample per profile channel, in wire
    /// order. Returns what the tick produced; errors only for frames of
    /// the wrong width or ticks outside a running attempt.
    pub fn advance(&mut self, frame: &[f32], dt_ms: u32) -> CalibrationResult<SessionEvent> {
        if !self.is_running() {
            return Err(CalibrationError::NotRunning { phase: self.phase });
        }
        let first_step = self.in_opening_step();
        self.bank.feed(frame, first_step)?;

        let event = match self.phase {
            SessionPhase::StepPause => self.tick_pause(dt_ms),
            SessionPhase::WaitingForAbduction => self.tick_abduction(frame, dt_ms),
            // The only remaining running phase.
            _ => self.tick_stability(dt_ms),
        };
        Ok(event)
    }

    /// Discards the session; every later call errors.
    pub fn abandon(&mut self) {
        self.phase = SessionPhase::Abandoned;
    }

    /// Consumes a finished session and mints its normalization profile.
    ///
    /// Channels whose commit slots stayed empty fall back to their
    /// observed-ever extremes; a channel with no data at all fails with
    /// [`CalibrationError::NoData`].
    pub fn lock_in(self) -> CalibrationResult<RangeProfile> {
        if self.phase != SessionPhase::Finished {
            return Err(CalibrationError::NotFinished { phase: self.phase });
        }
        let outcome = match self.outcome {
            Some(outcome) => outcome,
            None => LockOutcome::Validated,
        };
        let mut entries = heapless::Vec::new();
        for (role, channel) in self.bank.iter() {
            let committed = channel.committed();
            let (fallback_min, fallback_max) = match channel.observed() {
                Some(extremes) => extremes,
                None => return Err(CalibrationError::NoData { role }),
            };
            let range = ChannelRange {
                min: committed.min.unwrap_or(fallback_min),
                max: committed.max.unwrap_or(fallback_max),
            };
            entries.push(RangeEntry { role, range }).ok();
        }
        Ok(RangeProfile::new(
            self.profile.generation(),
            self.side,
            outcome,
            entries,
        ))
    }

    /// Where the session is in its lifecycle.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The step being collected, or prepared for during a pause.
    pub fn current_step(&self) -> Option<CalibrationStep> {
        match self.phase {
            SessionPhase::WaitingForStability | SessionPhase::WaitingForAbduction => {
                Some(self.step)
            }
            SessionPhase::StepPause => self.pending,
            _ => None,
        }
    }

    /// Attempt number, 1-based; `0` before `start`.
    pub fn attempt(&self) -> u8 {
        self.attempt
    }

    /// Hand this session calibrates.
    pub fn side(&self) -> HandSide {
        self.side
    }

    /// Profile the session was built with.
    pub fn profile(&self) -> &GloveProfile {
        &self.profile
    }

    /// Fraction of the current attempt's steps committed, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        self.completed.len() as f32 / CalibrationStep::COUNT as f32
    }

    /// Completed out-and-back motions in the current abduction step.
    pub fn abduction_motions(&self) -> u32 {
        self.counter.count()
    }

    /// True when every channel's committed span meets its minimum.
    pub fn range_sufficient(&self) -> bool {
        self.shortfall().is_empty()
    }

    /// Report of the most recently committed step, if any.
    pub fn last_report(&self) -> Option<StepReport> {
        self.last_report
    }

    /// Verdict reached at finish, if the session is finished.
    pub fn outcome(&self) -> Option<LockOutcome> {
        self.outcome
    }

    /// Live state of one channel, for host diagnostics.
    pub fn channel(&self, role: ChannelRole) -> Option<&crate::channel::ChannelState<N>> {
        self.bank.channel(role)
    }

    fn is_running(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::WaitingForStability
                | SessionPhase::WaitingForAbduction
                | SessionPhase::StepPause
        )
    }

    fn in_opening_step(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::WaitingForStability | SessionPhase::WaitingForAbduction
        ) && self.step == CalibrationStep::SEQUENCE[0]
    }

    /// Enters a step: timers and per-step counters restart, and the
    /// abduction step gets a fresh cycle counter.
    fn begin_step(&mut self, step: CalibrationStep) {
        self.step = step;
        self.pending = None;
        self.step_elapsed_ms = 0;
        self.hold_ms = 0;
        self.pause_elapsed_ms = 0;
        self.bank.begin_step();
        if step == CalibrationStep::ThumbAbduction {
            self.counter.reset();
            self.phase = SessionPhase::WaitingForAbduction;
        } else {
            self.phase = SessionPhase::WaitingForStability;
        }
    }

    fn tick_pause(&mut self, dt_ms: u32) -> SessionEvent {
        self.pause_elapsed_ms = self.pause_elapsed_ms.saturating_add(dt_ms);
        let next = match self.pending {
            Some(step) => step,
            None => self.step,
        };
        if self.pause_elapsed_ms >= self.profile.step_pause_ms() {
            self.begin_step(next);
        }
        SessionEvent::Paused { next }
    }

    fn tick_abduction(&mut self, frame: &[f32], dt_ms: u32) -> SessionEvent {
        self.step_elapsed_ms = self.step_elapsed_ms.saturating_add(dt_ms);
        if let Some(idx) = self.profile.index_of(ChannelRole::ThumbAbduction) {
            let committed_min = self
                .bank
                .channel(ChannelRole::ThumbAbduction)
                .and_then(|channel| channel.committed().min);
            if let Some(&value) = frame.get(idx) {
                self.counter.advance(value, committed_min);
            }
        }
        let satisfied =
            self.evaluator
                .step_satisfied(self.step, &self.bank, &self.counter, self.completed);
        if satisfied {
            self.complete_step(false)
        } else if self.step_elapsed_ms >= self.profile.step_time_limit_ms() {
            self.complete_step(true)
        } else {
            SessionEvent::Sampling {
                step: self.step,
                stable: false,
            }
        }
    }

    fn tick_stability(&mut self, dt_ms: u32) -> SessionEvent {
        self.step_elapsed_ms = self.step_elapsed_ms.saturating_add(dt_ms);
        let satisfied =
            self.evaluator
                .step_satisfied(self.step, &self.bank, &self.counter, self.completed);
        if satisfied {
            self.hold_ms = self.hold_ms.saturating_add(dt_ms);
        } else {
            self.hold_ms = 0;
        }
        if satisfied && self.hold_ms >= self.profile.stable_hold_ms() {
            self.complete_step(false)
        } else if self.step_elapsed_ms >= self.profile.step_time_limit_ms() {
            self.complete_step(true)
        } else {
            SessionEvent::Sampling {
                step: self.step,
                stable: satisfied,
            }
        }
    }

    /// Commits the current step, then either pauses before the next step
    /// or resolves the attempt.
    fn complete_step(&mut self, timed_out: bool) -> SessionEvent {
        let report = self.commit_step(timed_out);
        self.last_report = Some(report);
        match self.step.next() {
            Some(next) => {
                self.pending = Some(next);
                self.pause_elapsed_ms = 0;
                self.phase = SessionPhase::StepPause;
                SessionEvent::StepCommitted(report)
            }
            None => self.finish_attempt(),
        }
    }

    /// Anchors the step's extremes. Channels that saw no sample this step
    /// anchor nothing; they are reported as skipped, never invented.
    fn commit_step(&mut self, timed_out: bool) -> StepReport {
        let step = self.step;
        let mut committed = RoleSet::empty();
        let mut skipped = RoleSet::empty();

        if step == CalibrationStep::ThumbAbduction {
            match self.counter.sweep() {
                Some((low, high)) => {
                    if let Some(channel) = self.bank.channel_mut(ChannelRole::ThumbAbduction) {
                        channel.commit_value(Extreme::Min, low);
                        channel.commit_value(Extreme::Max, high);
                        committed.insert(ChannelRole::ThumbAbduction);
                    }
                }
                None => {
                    log_warn!("abduction step saw no samples; nothing anchored");
                    skipped.insert(ChannelRole::ThumbAbduction);
                }
            }
        } else {
            for &(role, extreme) in self.profile.commits(step) {
                if let Some(channel) = self.bank.channel_mut(role) {
                    if !channel.sampled_this_step() {
                        log_warn!(
                            "{} channel saw no samples during {}; nothing anchored",
                            role.name(),
                            step.display_name()
                        );
                        skipped.insert(role);
                        continue;
                    }
                    channel.commit_extreme(extreme);
                    committed.insert(role);
                }
            }
        }

        self.completed.insert(step);
        StepReport {
            step,
            committed,
            skipped,
            timed_out,
        }
    }

    /// Resolves a finished attempt: validate, retry, or lock-in forced.
    fn finish_attempt(&mut self) -> SessionEvent {
        let shortfall = self.shortfall();
        if shortfall.is_empty() {
            self.phase = SessionPhase::Finished;
            self.outcome = Some(LockOutcome::Validated);
            SessionEvent::AttemptValidated {
                attempt: self.attempt,
            }
        } else if self.profile.retry_allowed() && self.attempt < self.profile.max_attempts() {
            let failed = self.attempt;
            self.restart_attempt();
            SessionEvent::AttemptRetried {
                attempt: failed,
                shortfall,
            }
        } else {
            log_warn!(
                "attempt {} still short on {} channel(s); locking in forced ranges",
                self.attempt,
                shortfall.len()
            );
            self.phase = SessionPhase::Finished;
            self.outcome = Some(LockOutcome::Forced { shortfall });
            SessionEvent::AttemptsExhausted {
                attempt: self.attempt,
                shortfall,
            }
        }
    }

    /// Channels whose committed span is missing or below the minimum.
    fn shortfall(&self) -> RoleSet {
        let mut short = RoleSet::empty();
        for spec in self.profile.channels() {
            let sufficient = self
                .bank
                .channel(spec.role)
                .and_then(|channel| channel.committed().span())
                .map(|span| span >= spec.min_span)
                .unwrap_or(false);
            if !sufficient {
                short.insert(spec.role);
            }
        }
        short
    }

    fn restart_attempt(&mut self) {
        self.attempt = self.attempt.saturating_add(1);
        self.bank.reset();
        self.counter.reset();
        self.completed.clear();
        self.last_report = None;
        self.begin_step(CalibrationStep::SEQUENCE[0]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: usize = 8;

    fn quiet_frame() -> [f32; 6] {
        [500.0, 200.0, 3000.0, 3000.0, 3400.0, 3400.0]
    }

    fn started_session() -> CalibrationSession<WINDOW> {
        let mut session = CalibrationSession::new(GloveProfile::v2(), HandSide::Right);
        session.start().unwrap();
        session
    }

    #[test]
    fn new_session_is_not_started() {
        let session: CalibrationSession<WINDOW> =
            CalibrationSession::new(GloveProfile::v2(), HandSide::Left);
        assert_eq!(session.phase(), SessionPhase::NotStarted);
        assert_eq!(session.attempt(), 0);
        assert_eq!(session.current_step(), None);
        assert_eq!(session.progress(), 0.0);
    }

    #[test]
    fn start_enters_the_first_step() {
        let session = started_session();
        assert_eq!(session.phase(), SessionPhase::WaitingForStability);
        assert_eq!(session.current_step(), Some(CalibrationStep::ThumbsUp));
        assert_eq!(session.attempt(), 1);
    }

    #[test]
    fn start_twice_fails() {
        let mut session = started_session();
        assert_eq!(session.start(), Err(CalibrationError::AlreadyStarted));
    }

    #[test]
    fn advance_before_start_fails() {
        let mut session: CalibrationSession<WINDOW> =
            CalibrationSession::new(GloveProfile::v2(), HandSide::Right);
        let err = session.advance(&quiet_frame(), 20).unwrap_err();
        assert_eq!(
            err,
            CalibrationError::NotRunning {
                phase: SessionPhase::NotStarted
            }
        );
    }

    #[test]
    fn wrong_frame_width_fails() {
        let mut session = started_session();
        let err = session.advance(&[1.0, 2.0], 20).unwrap_err();
        assert_eq!(
            err,
            CalibrationError::ChannelCountMismatch {
                expected: 6,
                got: 2
            }
        );
    }

    #[test]
    fn first_tick_reports_sampling() {
        let mut session = started_session();
        let event = session.advance(&quiet_frame(), 20).unwrap();
        match event {
            SessionEvent::Sampling { step, .. } => {
                assert_eq!(step, CalibrationStep::ThumbsUp);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn abandoned_session_rejects_everything() {
        let mut session = started_session();
        session.advance(&quiet_frame(), 20).unwrap();
        session.abandon();
        assert_eq!(session.phase(), SessionPhase::Abandoned);
        assert_eq!(
            session.advance(&quiet_frame(), 20),
            Err(CalibrationError::NotRunning {
                phase: SessionPhase::Abandoned
            })
        );
        let err = session.lock_in().unwrap_err();
        assert_eq!(
            err,
            CalibrationError::NotFinished {
                phase: SessionPhase::Abandoned
            }
        );
    }

    #[test]
    fn lock_in_requires_a_finished_session() {
        let session = started_session();
        let err = session.lock_in().unwrap_err();
        assert_eq!(
            err,
            CalibrationError::NotFinished {
                phase: SessionPhase::WaitingForStability
            }
        );
    }

    #[test]
    fn opening_step_times_out_on_a_motionless_hand() {
        // No first-step movement ever arrives, so the step can only end
        // by its time limit, committing the fist extremes it did see.
        let profile = GloveProfile::v2()
            .with_step_time_limit(200)
            .with_stable_hold(50);
        let mut session: CalibrationSession<WINDOW> =
            CalibrationSession::new(profile, HandSide::Right);
        session.start().unwrap();

        let mut committed = None;
        for _ in 0..20 {
            match session.advance(&quiet_frame(), 50).unwrap() {
                SessionEvent::StepCommitted(report) => {
                    committed = Some(report);
                    break;
                }
                _ => {}
            }
        }
        let report = committed.expect("step never committed");
        assert_eq!(report.step, CalibrationStep::ThumbsUp);
        assert!(report.timed_out);
        assert!(report.committed.contains(ChannelRole::ThumbFlexion));
        assert_eq!(session.phase(), SessionPhase::StepPause);
        assert_eq!(
            session.current_step(),
            Some(CalibrationStep::ThumbBelowRing)
        );
    }

    #[test]
    fn pause_suspends_evaluation_but_not_sampling() {
        let profile = GloveProfile::v2()
            .with_step_time_limit(100)
            .with_step_pause(200);
        let mut session: CalibrationSession<WINDOW> =
            CalibrationSession::new(profile, HandSide::Right);
        session.start().unwrap();

        // Time the opening step out, then land in the pause.
        session.advance(&quiet_frame(), 50).unwrap();
        let event = session.advance(&quiet_frame(), 50).unwrap();
        assert!(matches!(event, SessionEvent::StepCommitted(_)));
        assert_eq!(session.phase(), SessionPhase::StepPause);

        let before = session
            .channel(ChannelRole::MiddleFlexion)
            .unwrap()
            .stats()
            .len();
        let event = session.advance(&quiet_frame(), 50).unwrap();
        assert_eq!(
            event,
            SessionEvent::Paused {
                next: CalibrationStep::ThumbBelowRing
            }
        );
        let after = session
            .channel(ChannelRole::MiddleFlexion)
            .unwrap()
            .stats()
            .len();
        assert_eq!(after, before + 1);

        // Pause budget is 200 ms: the fourth 50 ms tick ends it.
        session.advance(&quiet_frame(), 50).unwrap();
        session.advance(&quiet_frame(), 50).unwrap();
        assert_eq!(session.phase(), SessionPhase::StepPause);
        session.advance(&quiet_frame(), 50).unwrap();
        assert_eq!(session.phase(), SessionPhase::WaitingForStability);
        assert_eq!(session.step, CalibrationStep::ThumbBelowRing);
    }
}
