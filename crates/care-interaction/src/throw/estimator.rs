// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Release-velocity estimator: manipulator lifecycle in, throw velocity out.

use rustc_hash::FxHashMap;
use tracing::debug;

use super::fit::VelocityFitter;
use super::pose::{
    AssumeHighConfidence, ConfidenceProvider, PoseSource, TrackedBody, VelocityEstimate,
};
use super::session::{ManipulationSession, SessionArena};
use crate::config::EstimatorConfig;
use crate::ident::{ManipulatorId, ObjectId};
use crate::subscription::{Listeners, Subscription};

/// Delivered to release listeners once per finalized session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReleaseEvent {
    /// Released object.
    pub object: ObjectId,
    /// Velocity applied to it.
    pub estimate: VelocityEstimate,
}

/// Tracks manipulation sessions and produces a velocity when the last
/// manipulator lets go.
///
/// Invariants:
/// - a session exists exactly while its manipulator set is non-empty;
/// - an estimate is produced at most once per session, and only when the
///   last manipulator leaves with `can_finalize = true`.
pub struct ReleaseVelocityEstimator {
    fitter: VelocityFitter,
    sessions: SessionArena,
    estimates: FxHashMap<ObjectId, VelocityEstimate>,
    confidence: Box<dyn ConfidenceProvider>,
    released: Listeners<ReleaseEvent>,
}

impl Default for ReleaseVelocityEstimator {
    fn default() -> Self {
        Self::new(&EstimatorConfig::default())
    }
}

impl ReleaseVelocityEstimator {
    /// Estimator without a tracking-confidence source.
    pub fn new(config: &EstimatorConfig) -> Self {
        Self::with_confidence(config, Box::new(AssumeHighConfidence))
    }

    /// Estimator consulting `confidence` for every recorded frame.
    pub fn with_confidence(
        config: &EstimatorConfig,
        confidence: Box<dyn ConfidenceProvider>,
    ) -> Self {
        let fitter = VelocityFitter::new(config);
        let window = fitter.config().window;
        Self {
            fitter,
            sessions: SessionArena::new(window),
            estimates: FxHashMap::default(),
            confidence,
            released: Listeners::new(),
        }
    }

    /// Active tuning (sanitized).
    pub fn config(&self) -> &EstimatorConfig {
        self.fitter.config()
    }

    /// Registers `listener` for release events while the handle lives.
    pub fn on_release(&self, listener: impl FnMut(&ReleaseEvent) + 'static) -> Subscription {
        self.released.subscribe(listener)
    }

    /// Adds `manipulator` to the object's session, creating the session on
    /// the first manipulator. Adding an id twice is harmless.
    pub fn begin_manipulation(&mut self, object: ObjectId, manipulator: ManipulatorId) {
        let (handle, created) = self.sessions.acquire(object);
        if created {
            self.estimates.remove(&object);
            debug!(%object, ?manipulator, "manipulation session started");
        }
        if let Some(session) = self.sessions.get_mut(handle) {
            session.insert(manipulator);
        }
    }

    /// Records one held frame for `object`.
    ///
    /// The sample pushed is the previous frame's pose; the pose read now is
    /// kept pending. No-op when `source` is absent or `manipulator` is not
    /// part of the object's session.
    pub fn record_move(
        &mut self,
        object: ObjectId,
        manipulator: ManipulatorId,
        source: Option<&dyn PoseSource>,
    ) {
        let Some(source) = source else {
            return;
        };
        let confidence = &*self.confidence;
        let Some(session) = self.sessions.session_mut(object) else {
            return;
        };
        if !session.contains(manipulator) {
            return;
        }
        let confident = session_confident(confidence, session);
        session.advance(source.now(), source.pose(), confident);
    }

    /// Removes `manipulator`; when it was the last one the session ends.
    ///
    /// With `can_finalize`, the final pose is captured, the velocity is
    /// fitted, applied to `body`, stored, and announced, and the estimate is
    /// returned. Without it (forced cancel) nothing is produced. The session
    /// is torn down either way.
    pub fn end_manipulation(
        &mut self,
        object: ObjectId,
        manipulator: ManipulatorId,
        can_finalize: bool,
        body: Option<&mut dyn TrackedBody>,
    ) -> Option<VelocityEstimate> {
        let confident = self
            .confidence
            .tracking_confidence(manipulator)
            .unwrap_or(true);
        let session = self.sessions.session_mut(object)?;
        if !session.remove(manipulator) {
            return None;
        }
        if session.manipulator_count() > 0 {
            return None;
        }

        if !can_finalize {
            self.sessions.release(object);
            debug!(%object, ?manipulator, "manipulation cancelled");
            return None;
        }

        let estimate = match body {
            Some(body) => {
                session.capture_final(body.now(), body.pose(), confident);
                let estimate = self.fitter.fit(session.samples());
                if let Some(estimate) = &estimate {
                    body.apply_velocity(estimate);
                }
                estimate
            }
            None => self.fitter.fit(session.samples()),
        };
        self.sessions.release(object);

        let Some(estimate) = estimate else {
            debug!(%object, "released without enough samples for a velocity");
            return None;
        };
        debug!(
            %object,
            linear = ?estimate.linear.to_array(),
            angular = ?estimate.angular.to_array(),
            inliers = estimate.linear_inliers,
            "release velocity"
        );
        self.estimates.insert(object, estimate);
        self.released.emit(&ReleaseEvent { object, estimate });
        Some(estimate)
    }

    /// Ends every manipulation of `object` without producing a velocity.
    pub fn cancel(&mut self, object: ObjectId) -> bool {
        let cancelled = self.sessions.release(object);
        if cancelled {
            debug!(%object, "manipulation cancelled");
        }
        cancelled
    }

    /// Drops everything held for `object`: a live session (as [`Self::cancel`])
    /// and the stored estimate. Hosts call this when the object is destroyed.
    /// Returns false when nothing was held.
    pub fn forget(&mut self, object: ObjectId) -> bool {
        let cancelled = self.sessions.release(object);
        let stored = self.estimates.remove(&object).is_some();
        if cancelled || stored {
            debug!(%object, cancelled, "object forgotten");
        }
        cancelled || stored
    }

    /// Number of objects with a stored estimate.
    pub fn stored_estimates(&self) -> usize {
        self.estimates.len()
    }

    /// Last velocity produced for the object's current session lineage.
    pub fn try_get_estimate(&self, object: ObjectId) -> Option<VelocityEstimate> {
        self.estimates.get(&object).copied()
    }

    /// True while `object` is held by at least one manipulator.
    pub fn is_manipulating(&self, object: ObjectId) -> bool {
        self.sessions.session(object).is_some()
    }

    /// Number of manipulators holding `object`.
    pub fn manipulator_count(&self, object: ObjectId) -> usize {
        self.sessions
            .session(object)
            .map_or(0, ManipulationSession::manipulator_count)
    }

    /// Number of samples recorded in the object's live session.
    pub fn sample_count(&self, object: ObjectId) -> usize {
        self.sessions
            .session(object)
            .map_or(0, ManipulationSession::sample_count)
    }

    /// Confidence of the object's most recent frame, if held.
    pub fn is_high_confidence(&self, object: ObjectId) -> Option<bool> {
        self.sessions
            .session(object)
            .map(ManipulationSession::is_high_confidence)
    }

    /// Number of objects currently held.
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}

fn session_confident(provider: &dyn ConfidenceProvider, session: &ManipulationSession) -> bool {
    session
        .manipulators()
        .all(|m| provider.tracking_confidence(m).unwrap_or(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::throw::pose::Pose;
    use care_math::Vec3;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    struct Body {
        time: Cell<f32>,
        pose: Cell<Pose>,
        applied: RefCell<Vec<VelocityEstimate>>,
    }

    impl Body {
        fn new() -> Self {
            Self {
                time: Cell::new(0.0),
                pose: Cell::new(Pose::default()),
                applied: RefCell::new(Vec::new()),
            }
        }

        fn step(&self, time: f32, x: f32) {
            self.time.set(time);
            self.pose.set(Pose::at(Vec3::new(x, 0.0, 0.0)));
        }
    }

    impl PoseSource for Body {
        fn now(&self) -> f32 {
            self.time.get()
        }

        fn pose(&self) -> Pose {
            self.pose.get()
        }
    }

    impl TrackedBody for Body {
        fn apply_velocity(&mut self, estimate: &VelocityEstimate) {
            self.applied.borrow_mut().push(*estimate);
        }
    }

    const A: ObjectId = ObjectId(10);
    const LEFT: ManipulatorId = ManipulatorId(1);
    const RIGHT: ManipulatorId = ManipulatorId(2);

    fn hold_and_move(est: &mut ReleaseVelocityEstimator, body: &Body, frames: usize) {
        for k in 0..frames {
            let t = k as f32 * 0.01;
            body.step(t, t * 3.0);
            est.record_move(A, LEFT, Some(body));
        }
    }

    #[test]
    fn release_produces_velocity_once() {
        let mut est = ReleaseVelocityEstimator::default();
        let releases = Rc::new(Cell::new(0));
        let r = Rc::clone(&releases);
        let _sub = est.on_release(move |_| r.set(r.get() + 1));

        est.begin_manipulation(A, LEFT);
        let mut body = Body::new();
        hold_and_move(&mut est, &body, 8);
        body.step(0.08, 0.24);
        let v = est.end_manipulation(A, LEFT, true, Some(&mut body)).unwrap();

        assert!((v.linear.x() - 3.0).abs() < 1e-2, "{v:?}");
        assert_eq!(body.applied.borrow().len(), 1);
        assert_eq!(releases.get(), 1);
        assert_eq!(est.try_get_estimate(A), Some(v));
        assert!(!est.is_manipulating(A));
    }

    #[test]
    fn second_manipulator_keeps_session_alive() {
        let mut est = ReleaseVelocityEstimator::default();
        est.begin_manipulation(A, LEFT);
        est.begin_manipulation(A, RIGHT);
        est.begin_manipulation(A, RIGHT);
        assert_eq!(est.manipulator_count(A), 2);

        let mut body = Body::new();
        hold_and_move(&mut est, &body, 5);
        assert!(est.end_manipulation(A, LEFT, true, Some(&mut body)).is_none());
        assert!(est.is_manipulating(A));
        assert!(est.end_manipulation(A, RIGHT, true, Some(&mut body)).is_some());
    }

    #[test]
    fn cancel_never_yields_estimate() {
        let mut est = ReleaseVelocityEstimator::default();
        est.begin_manipulation(A, LEFT);
        let mut body = Body::new();
        hold_and_move(&mut est, &body, 10);
        assert!(est.end_manipulation(A, LEFT, false, Some(&mut body)).is_none());
        assert!(est.try_get_estimate(A).is_none());
        assert!(body.applied.borrow().is_empty());
        assert_eq!(est.active_sessions(), 0);
    }

    #[test]
    fn moves_from_unknown_manipulator_are_ignored() {
        let mut est = ReleaseVelocityEstimator::default();
        est.begin_manipulation(A, LEFT);
        let body = Body::new();
        for k in 0..4 {
            body.step(k as f32 * 0.01, k as f32);
            est.record_move(A, RIGHT, Some(&body));
            est.record_move(A, LEFT, None);
        }
        assert_eq!(est.sample_count(A), 0);
    }

    #[test]
    fn low_tracking_confidence_marks_frame() {
        let mut provider = rustc_hash::FxHashMap::default();
        provider.insert(LEFT, false);
        let mut est = ReleaseVelocityEstimator::with_confidence(
            &EstimatorConfig::default(),
            Box::new(provider),
        );
        est.begin_manipulation(A, LEFT);
        let body = Body::new();
        hold_and_move(&mut est, &body, 3);
        assert_eq!(est.is_high_confidence(A), Some(false));
    }

    #[test]
    fn forget_releases_estimate_and_session() {
        let mut est = ReleaseVelocityEstimator::default();
        est.begin_manipulation(A, LEFT);
        let mut body = Body::new();
        hold_and_move(&mut est, &body, 6);
        assert!(est.end_manipulation(A, LEFT, true, Some(&mut body)).is_some());
        assert_eq!(est.stored_estimates(), 1);

        assert!(est.forget(A));
        assert_eq!(est.stored_estimates(), 0);
        assert!(est.try_get_estimate(A).is_none());
        assert!(!est.forget(A));

        est.begin_manipulation(A, LEFT);
        assert!(est.forget(A));
        assert!(!est.is_manipulating(A));
    }

    #[test]
    fn new_session_clears_previous_estimate() {
        let mut est = ReleaseVelocityEstimator::default();
        est.begin_manipulation(A, LEFT);
        let mut body = Body::new();
        hold_and_move(&mut est, &body, 6);
        assert!(est.end_manipulation(A, LEFT, true, Some(&mut body)).is_some());
        est.begin_manipulation(A, LEFT);
        assert!(est.try_get_estimate(A).is_none());
    }
}
