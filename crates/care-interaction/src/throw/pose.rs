// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pose samples and the host-facing ports the estimator reads from.

use care_math::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::ident::ManipulatorId;

/// World-space pose of a tracked body.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// Position in metres.
    pub position: Vec3,
    /// Orientation as a unit quaternion.
    #[serde(default)]
    pub orientation: Quat,
}

impl Pose {
    /// Creates a pose from parts.
    pub const fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Pose at `position` with identity orientation.
    pub const fn at(position: Vec3) -> Self {
        Self::new(position, Quat::identity())
    }
}

/// One entry of a session's pose history.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PoseSample {
    /// Monotonic time in seconds.
    pub time: f32,
    /// Pose at `time`.
    pub pose: Pose,
    /// Whether tracking was trusted when the sample was captured.
    pub high_confidence: bool,
}

/// Linear and angular release velocity.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityEstimate {
    /// Metres per second.
    pub linear: Vec3,
    /// Rotation vector rate (axis × rad/s).
    pub angular: Vec3,
    /// Samples that entered the fit.
    pub samples: usize,
    /// Samples agreeing with the chosen linear model.
    pub linear_inliers: usize,
    /// Samples agreeing with the chosen angular model.
    pub angular_inliers: usize,
    /// False when the fit fell back to plain least squares.
    pub robust: bool,
}

/// Supplies the current world pose of a tracked body and the host clock.
pub trait PoseSource {
    /// Monotonic time in seconds.
    fn now(&self) -> f32;
    /// Current world pose.
    fn pose(&self) -> Pose;
}

/// A pose source whose physics body receives the release velocity.
pub trait TrackedBody: PoseSource {
    /// Sets the body's linear and angular velocity.
    fn apply_velocity(&mut self, estimate: &VelocityEstimate);
}

/// Keyed lookup of per-manipulator tracking confidence.
pub trait ConfidenceProvider {
    /// `Some(false)` for low confidence; `None` when the provider knows
    /// nothing about `manipulator` (treated as high confidence).
    fn tracking_confidence(&self, manipulator: ManipulatorId) -> Option<bool>;
}

/// Provider for hosts without tracking-confidence data.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeHighConfidence;

impl ConfidenceProvider for AssumeHighConfidence {
    fn tracking_confidence(&self, _manipulator: ManipulatorId) -> Option<bool> {
        None
    }
}

impl ConfidenceProvider for rustc_hash::FxHashMap<ManipulatorId, bool> {
    fn tracking_confidence(&self, manipulator: ManipulatorId) -> Option<bool> {
        self.get(&manipulator).copied()
    }
}
