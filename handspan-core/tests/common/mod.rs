//! Shared helpers for calibration session integration tests
//!
//! This module provides:
//! - Canonical hand poses expressed per channel role, valid for both
//!   glove generations
//! - A deterministic jitter source so scripted frames never repeat
//!   bit-identically
//! - Drivers that push posed frames through a session tick by tick and
//!   stop on the event a test cares about

#![allow(dead_code)]

use handspan_core::{
    CalibrationSession, ChannelRole, SessionEvent, StepReport,
};

/// Frame period used by every driver, in milliseconds (20 Hz host loop).
pub const TICK_MS: u32 = 50;

/// Raw-unit jitter applied to every scripted sample.
pub const JITTER_RAW: f32 = 4.0;

/// A hand pose: one raw target value per channel role.
pub type Pose = fn(ChannelRole) -> f32;

/// Deterministic pseudo-random jitter (linear congruential).
pub struct Jitter {
    seed: u32,
}

impl Jitter {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    /// Uniform jitter in `[-amplitude, +amplitude]`.
    pub fn next(&mut self, amplitude: f32) -> f32 {
        self.seed = self.seed.wrapping_mul(1664525).wrapping_add(1013904223);
        let uniform = (self.seed as f32) / (u32::MAX as f32);
        (uniform - 0.5) * 2.0 * amplitude
    }
}

// ===== Poses =====
//
// Raw values follow the ADC conventions of the firmware: thumb flexion
// and finger flexion grow as the digit curls, thumb abduction grows as
// the thumb swings in toward the palm.

/// Hand at rest, fingers half open. Opening pose for every attempt.
pub fn relaxed(role: ChannelRole) -> f32 {
    match role {
        ChannelRole::ThumbAbduction => 500.0,
        ChannelRole::ThumbFlexion => 200.0,
        _ => 1400.0,
    }
}

/// Thumbs up: fingers curled hard, thumb extended.
pub fn thumbs_up(role: ChannelRole) -> f32 {
    match role {
        ChannelRole::ThumbAbduction => 500.0,
        ChannelRole::ThumbFlexion => 200.0,
        ChannelRole::IndexFlexion | ChannelRole::IndexProximal | ChannelRole::IndexDistal => 3000.0,
        ChannelRole::MiddleFlexion | ChannelRole::RingFlexion => 3400.0,
    }
}

/// Thumb tucked below the ring finger, flexed deep.
pub fn thumb_tucked(role: ChannelRole) -> f32 {
    match role {
        ChannelRole::ThumbAbduction => 300.0,
        ChannelRole::ThumbFlexion => 2400.0,
        ChannelRole::IndexFlexion | ChannelRole::IndexProximal | ChannelRole::IndexDistal => 2800.0,
        ChannelRole::MiddleFlexion | ChannelRole::RingFlexion => 3200.0,
    }
}

/// A half-hearted tuck: the thumb barely moves, so its flexion span
/// ends the attempt short.
pub fn shallow_tuck(role: ChannelRole) -> f32 {
    match role {
        ChannelRole::ThumbFlexion => 900.0,
        other => thumb_tucked(other),
    }
}

/// Hands pressed flat together: every digit extended.
pub fn hands_flat(role: ChannelRole) -> f32 {
    match role {
        ChannelRole::ThumbAbduction => 400.0,
        ChannelRole::ThumbFlexion => 1200.0,
        ChannelRole::IndexFlexion | ChannelRole::IndexProximal | ChannelRole::IndexDistal => 1000.0,
        ChannelRole::MiddleFlexion | ChannelRole::RingFlexion => 800.0,
    }
}

// ===== Drivers =====

/// Builds one jittered frame of `pose` in the session's wire order.
pub fn frame(roles: &[ChannelRole], pose: Pose, jitter: &mut Jitter) -> Vec<f32> {
    roles
        .iter()
        .map(|&role| pose(role) + jitter.next(JITTER_RAW))
        .collect()
}

/// Wire-order roles of a session, captured once so drivers can build
/// frames without borrowing the session.
pub fn wire_roles<const N: usize>(session: &CalibrationSession<N>) -> Vec<ChannelRole> {
    session
        .profile()
        .channels()
        .iter()
        .map(|spec| spec.role)
        .collect()
}

/// Holds one pose, ticking until `accept` takes an event.
///
/// Panics when the tick budget runs out, with the last event seen so a
/// failing script is easy to read.
pub fn hold_until<const N: usize>(
    session: &mut CalibrationSession<N>,
    pose: Pose,
    jitter: &mut Jitter,
    max_ticks: usize,
    mut accept: impl FnMut(&SessionEvent) -> bool,
) -> SessionEvent {
    let roles = wire_roles(session);
    let mut last = None;
    for _ in 0..max_ticks {
        let samples = frame(&roles, pose, jitter);
        let event = session
            .advance(&samples, TICK_MS)
            .expect("advance failed mid-script");
        if accept(&event) {
            return event;
        }
        last = Some(event);
    }
    panic!(
        "no accepted event within {} ticks; last was {:?}",
        max_ticks, last
    );
}

/// Holds one pose for exactly `ticks` ticks, ignoring events.
pub fn hold_for<const N: usize>(
    session: &mut CalibrationSession<N>,
    pose: Pose,
    jitter: &mut Jitter,
    ticks: usize,
) {
    let roles = wire_roles(session);
    for _ in 0..ticks {
        let samples = frame(&roles, pose, jitter);
        session
            .advance(&samples, TICK_MS)
            .expect("advance failed mid-script");
    }
}

/// Swings the abduction channel between `low` and `high` every tick
/// while the rest of the hand holds `pose`, until `accept` takes an
/// event. One full swing pair completes one counted motion.
pub fn pump_thumb<const N: usize>(
    session: &mut CalibrationSession<N>,
    pose: Pose,
    low: f32,
    high: f32,
    jitter: &mut Jitter,
    max_ticks: usize,
    mut accept: impl FnMut(&SessionEvent) -> bool,
) -> SessionEvent {
    let roles = wire_roles(session);
    let mut last = None;
    for tick in 0..max_ticks {
        let mut samples = frame(&roles, pose, jitter);
        let swing = if tick % 2 == 0 { low } else { high };
        for (value, &role) in samples.iter_mut().zip(roles.iter()) {
            if role == ChannelRole::ThumbAbduction {
                *value = swing + jitter.next(JITTER_RAW);
            }
        }
        let event = session
            .advance(&samples, TICK_MS)
            .expect("advance failed mid-script");
        if accept(&event) {
            return event;
        }
        last = Some(event);
    }
    panic!(
        "no accepted event within {} ticks; last was {:?}",
        max_ticks, last
    );
}

/// Unwraps a `StepCommitted` event or panics with what arrived instead.
pub fn committed(event: SessionEvent) -> StepReport {
    match event {
        SessionEvent::StepCommitted(report) => report,
        other => panic!("expected a step commit, got {:?}", other),
    }
}

/// True for any event that ends a step or the attempt.
pub fn step_boundary(event: &SessionEvent) -> bool {
    matches!(
        event,
        SessionEvent::StepCommitted(_)
            | SessionEvent::AttemptRetried { .. }
            | SessionEvent::AttemptValidated { .. }
            | SessionEvent::AttemptsExhausted { .. }
    )
}
