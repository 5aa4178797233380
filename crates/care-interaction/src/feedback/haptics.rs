// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Haptics playback with per-target auto-stop timers.
//!
//! Every play request schedules a stop `duration` seconds of simulation time
//! later. A target never has two timers: a new request cancels the running
//! one before it starts.

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, warn};

use super::rule::HapticPattern;
use crate::ident::HapticTarget;

/// Errors surfaced by haptics playback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HapticsError {
    /// Non-zero playback was requested for the unresolved sentinel.
    #[error("refusing haptics playback on an unresolved target")]
    UnresolvedTarget,
    /// The back end has no device behind the target.
    #[error("no haptics device for {0}")]
    NoDevice(HapticTarget),
}

/// Device-facing haptics port.
pub trait HapticsBackend {
    /// Starts `pattern` on `target`.
    fn play(&mut self, target: HapticTarget, pattern: &HapticPattern) -> Result<(), HapticsError>;
    /// Stops whatever plays on `target`. Must tolerate idle targets.
    fn stop(&mut self, target: HapticTarget);
}

/// Back end for hosts without haptic devices; accepts and ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHaptics;

impl HapticsBackend for NullHaptics {
    fn play(
        &mut self,
        _target: HapticTarget,
        _pattern: &HapticPattern,
    ) -> Result<(), HapticsError> {
        Ok(())
    }

    fn stop(&mut self, _target: HapticTarget) {}
}

/// Pending auto-stop for one target.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HapticTimer {
    /// Simulation time the pattern started.
    pub started: f32,
    /// Simulation time the pattern is stopped.
    pub deadline: f32,
}

/// Drives a [`HapticsBackend`] and owns the auto-stop timers.
pub struct HapticsPlayer {
    backend: Box<dyn HapticsBackend>,
    timers: FxHashMap<HapticTarget, HapticTimer>,
    now: f32,
    cancelled: u64,
}

impl HapticsPlayer {
    /// Player over `backend`, clock at zero.
    pub fn new(backend: Box<dyn HapticsBackend>) -> Self {
        Self {
            backend,
            timers: FxHashMap::default(),
            now: 0.0,
            cancelled: 0,
        }
    }

    /// Plays `pattern` on `target` and schedules its stop.
    ///
    /// A running pattern on `target` is replaced; if the back end then refuses
    /// the new one, the old one is stopped immediately. The sentinel target is refused for non-zero amplitude without touching
    /// the back end; zero-amplitude requests on it are accepted as no-ops.
    pub fn play(
        &mut self,
        target: HapticTarget,
        pattern: HapticPattern,
    ) -> Result<(), HapticsError> {
        if !target.is_resolved() {
            if pattern.amplitude() > 0.0 {
                warn!(%target, "haptics requested for unresolved target; dropped");
                return Err(HapticsError::UnresolvedTarget);
            }
            return Ok(());
        }

        let previous = self.timers.remove(&target);
        if let Some(previous) = previous {
            self.cancelled += 1;
            debug!(%target, deadline = previous.deadline, "cancelled running haptic timer");
        }

        if let Err(err) = self.backend.play(target, &pattern) {
            warn!(%target, %err, "haptics playback dropped");
            if previous.is_some() {
                // The cancelled pulse has no timer left to end it.
                self.backend.stop(target);
            }
            return Err(err);
        }

        self.timers.insert(
            target,
            HapticTimer {
                started: self.now,
                deadline: self.now + pattern.duration(),
            },
        );
        Ok(())
    }

    /// Stops `target` and drops its timer. Always accepted; the sentinel is a
    /// no-op.
    pub fn stop(&mut self, target: HapticTarget) {
        self.timers.remove(&target);
        if target.is_resolved() {
            self.backend.stop(target);
        }
    }

    /// Advances the clock to `now` and stops every expired target.
    /// Returns how many targets were stopped.
    pub fn tick(&mut self, now: f32) -> usize {
        if now > self.now {
            self.now = now;
        }
        let mut expired: Vec<HapticTarget> = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.deadline <= self.now)
            .map(|(target, _)| *target)
            .collect();
        expired.sort_unstable();
        for target in &expired {
            self.timers.remove(target);
            self.backend.stop(*target);
        }
        expired.len()
    }

    /// Current simulation time.
    pub fn now(&self) -> f32 {
        self.now
    }

    /// Running timer for `target`.
    pub fn timer(&self, target: HapticTarget) -> Option<HapticTimer> {
        self.timers.get(&target).copied()
    }

    /// Number of running timers.
    pub fn active_timers(&self) -> usize {
        self.timers.len()
    }

    /// Timers cancelled by a newer request on the same target.
    pub fn cancelled_timers(&self) -> u64 {
        self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Log(Rc<RefCell<Vec<String>>>);

    impl HapticsBackend for Log {
        fn play(&mut self, target: HapticTarget, p: &HapticPattern) -> Result<(), HapticsError> {
            if target.raw() == 99 {
                return Err(HapticsError::NoDevice(target));
            }
            self.0
                .borrow_mut()
                .push(format!("play {} {}", target.raw(), p.amplitude()));
            Ok(())
        }

        fn stop(&mut self, target: HapticTarget) {
            self.0.borrow_mut().push(format!("stop {}", target.raw()));
        }
    }

    fn player() -> (HapticsPlayer, Log) {
        let log = Log::default();
        (HapticsPlayer::new(Box::new(log.clone())), log)
    }

    #[test]
    fn timer_stops_after_duration() {
        let (mut p, log) = player();
        p.play(HapticTarget::new(1), HapticPattern::new(0.5, 0.2, 0.5))
            .unwrap();
        assert_eq!(p.tick(0.1), 0);
        assert_eq!(p.tick(0.2), 1);
        assert_eq!(*log.0.borrow(), vec!["play 1 0.5", "stop 1"]);
        assert_eq!(p.active_timers(), 0);
    }

    #[test]
    fn second_request_replaces_timer() {
        let (mut p, _log) = player();
        let target = HapticTarget::new(2);
        p.play(target, HapticPattern::new(1.0, 1.0, 0.5)).unwrap();
        p.tick(0.5);
        p.play(target, HapticPattern::new(1.0, 0.1, 0.5)).unwrap();
        assert_eq!(p.cancelled_timers(), 1);
        assert_eq!(p.active_timers(), 1);
        let timer = p.timer(target).unwrap();
        assert_eq!(timer.started, 0.5);
        assert!((timer.deadline - 0.6).abs() < 1e-6);
    }

    #[test]
    fn sentinel_play_rejected_stop_accepted() {
        let (mut p, log) = player();
        assert_eq!(
            p.play(HapticTarget::UNRESOLVED, HapticPattern::new(0.8, 0.1, 0.5)),
            Err(HapticsError::UnresolvedTarget)
        );
        p.stop(HapticTarget::UNRESOLVED);
        assert!(log.0.borrow().is_empty());
    }

    struct Flaky {
        log: Rc<RefCell<Vec<String>>>,
        plays_left: usize,
    }

    impl HapticsBackend for Flaky {
        fn play(&mut self, target: HapticTarget, _p: &HapticPattern) -> Result<(), HapticsError> {
            if self.plays_left == 0 {
                return Err(HapticsError::NoDevice(target));
            }
            self.plays_left -= 1;
            self.log.borrow_mut().push(format!("play {}", target.raw()));
            Ok(())
        }

        fn stop(&mut self, target: HapticTarget) {
            self.log.borrow_mut().push(format!("stop {}", target.raw()));
        }
    }

    #[test]
    fn refused_replacement_stops_running_pattern() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut p = HapticsPlayer::new(Box::new(Flaky {
            log: Rc::clone(&log),
            plays_left: 1,
        }));
        let target = HapticTarget::new(1);
        p.play(target, HapticPattern::new(1.0, 0.5, 0.5)).unwrap();
        assert!(p.play(target, HapticPattern::new(1.0, 0.5, 0.5)).is_err());
        assert_eq!(*log.borrow(), vec!["play 1", "stop 1"]);
        assert_eq!(p.active_timers(), 0);
        assert_eq!(p.tick(5.0), 0);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn missing_device_starts_no_timer() {
        let (mut p, _log) = player();
        let target = HapticTarget::new(99);
        assert_eq!(
            p.play(target, HapticPattern::new(0.8, 0.1, 0.5)),
            Err(HapticsError::NoDevice(target))
        );
        assert!(p.timer(target).is_none());
    }
}
