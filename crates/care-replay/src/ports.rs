// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Host ports backed by log output and replayed frames.

use std::cell::RefCell;
use std::rc::Rc;

use care_interaction::{
    ActionContext, ActionSink, ConfidenceProvider, FeedbackAction, HapticPattern, HapticTarget,
    HapticsBackend, HapticsError, ManipulatorId, Pose, PoseSource, TrackedBody, VelocityEstimate,
};
use rustc_hash::FxHashMap;
use tracing::info;

/// Haptics back end that logs requests.
#[derive(Debug, Default)]
pub struct LoggingHaptics;

impl HapticsBackend for LoggingHaptics {
    fn play(&mut self, target: HapticTarget, pattern: &HapticPattern) -> Result<(), HapticsError> {
        info!(
            %target,
            amplitude = pattern.amplitude(),
            duration = pattern.duration(),
            frequency = pattern.frequency(),
            "haptics play"
        );
        Ok(())
    }

    fn stop(&mut self, target: HapticTarget) {
        info!(%target, "haptics stop");
    }
}

/// Action sink that logs audio and VFX requests.
#[derive(Debug, Default)]
pub struct LoggingSink;

impl ActionSink for LoggingSink {
    fn execute(&mut self, action: &FeedbackAction, context: &ActionContext) {
        match action {
            FeedbackAction::Audio { clip, volume } => {
                info!(object = %context.source, clip = %clip, volume, "audio");
            }
            FeedbackAction::Vfx { effect } => {
                info!(object = %context.source, effect = %effect, "vfx");
            }
            FeedbackAction::Haptics(_) | FeedbackAction::StopHaptics => {}
        }
    }
}

/// Confidence levels updated by replayed steps. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct SharedConfidence {
    levels: Rc<RefCell<FxHashMap<ManipulatorId, bool>>>,
}

impl SharedConfidence {
    /// Records the confidence of `manipulator`.
    pub fn set(&self, manipulator: ManipulatorId, high: bool) {
        self.levels.borrow_mut().insert(manipulator, high);
    }
}

impl ConfidenceProvider for SharedConfidence {
    fn tracking_confidence(&self, manipulator: ManipulatorId) -> Option<bool> {
        self.levels.borrow().tracking_confidence(manipulator)
    }
}

/// One replayed frame standing in for the host's tracked body.
#[derive(Debug, Clone, Copy)]
pub struct FrameBody {
    time: f32,
    pose: Pose,
    applied: Option<VelocityEstimate>,
}

impl FrameBody {
    /// Body at `pose` at host time `time`.
    pub fn new(time: f32, pose: Pose) -> Self {
        Self {
            time,
            pose,
            applied: None,
        }
    }

    /// Velocity handed to the body at release.
    pub fn applied(&self) -> Option<VelocityEstimate> {
        self.applied
    }
}

impl PoseSource for FrameBody {
    fn now(&self) -> f32 {
        self.time
    }

    fn pose(&self) -> Pose {
        self.pose
    }
}

impl TrackedBody for FrameBody {
    fn apply_velocity(&mut self, estimate: &VelocityEstimate) {
        self.applied = Some(*estimate);
    }
}
