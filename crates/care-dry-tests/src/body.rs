// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scripted pose tracks and confidence providers.

use care_interaction::{
    ConfidenceProvider, ManipulatorId, Pose, PoseSource, TrackedBody, VelocityEstimate,
};
use care_math::{Quat, Vec3};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Default frame step used by the builders: 90 Hz.
pub const DEFAULT_DT: f32 = 1.0 / 90.0;

/// [`TrackedBody`] replaying a fixed list of `(time, pose)` frames.
///
/// The body reads the frame under its cursor; [`ScriptedBody::advance`]
/// moves the cursor, stopping at the last frame. Velocities applied at
/// release are recorded.
///
/// # Example
///
/// ```
/// use care_dry_tests::ScriptedBody;
/// use care_interaction::PoseSource;
/// use care_math::Vec3;
///
/// let mut body = ScriptedBody::constant_velocity(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), 0.1, 3);
/// body.advance();
/// assert!((body.pose().position.x() - 0.2).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedBody {
    frames: Vec<(f32, Pose)>,
    cursor: usize,
    applied: Vec<VelocityEstimate>,
}

impl ScriptedBody {
    /// Body over explicit frames.
    pub fn new(frames: Vec<(f32, Pose)>) -> Self {
        Self {
            frames,
            cursor: 0,
            applied: Vec::new(),
        }
    }

    /// `count` frames moving from `start` at constant `velocity`, `dt` apart.
    pub fn constant_velocity(start: Vec3, velocity: Vec3, dt: f32, count: usize) -> Self {
        Self::new(
            (0..count)
                .map(|k| {
                    let t = k as f32 * dt;
                    (t, Pose::at(start.add(&velocity.scale(t))))
                })
                .collect(),
        )
    }

    /// `count` frames spinning about `axis` at `rate` rad/s, `dt` apart.
    pub fn constant_spin(axis: Vec3, rate: f32, dt: f32, count: usize) -> Self {
        Self::new(
            (0..count)
                .map(|k| {
                    let t = k as f32 * dt;
                    (
                        t,
                        Pose::new(Vec3::ZERO, Quat::from_axis_angle(axis, rate * t)),
                    )
                })
                .collect(),
        )
    }

    /// Displaces the position of frame `index` by `offset` (outlier injection).
    pub fn perturb(mut self, index: usize, offset: Vec3) -> Self {
        if let Some((_, pose)) = self.frames.get_mut(index) {
            pose.position = pose.position.add(&offset);
        }
        self
    }

    /// Moves to the next frame; false when already on the last one.
    pub fn advance(&mut self) -> bool {
        if self.cursor + 1 < self.frames.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Index of the current frame.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of scripted frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Velocities applied so far.
    pub fn applied(&self) -> &[VelocityEstimate] {
        &self.applied
    }

    fn frame(&self) -> (f32, Pose) {
        self.frames
            .get(self.cursor)
            .copied()
            .unwrap_or((0.0, Pose::default()))
    }
}

impl PoseSource for ScriptedBody {
    fn now(&self) -> f32 {
        self.frame().0
    }

    fn pose(&self) -> Pose {
        self.frame().1
    }
}

impl TrackedBody for ScriptedBody {
    fn apply_velocity(&mut self, estimate: &VelocityEstimate) {
        self.applied.push(*estimate);
    }
}

/// Confidence provider whose answers tests can flip between frames.
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct StaticConfidence {
    levels: Rc<RefCell<HashMap<ManipulatorId, bool>>>,
}

impl StaticConfidence {
    /// Provider that knows nothing (every manipulator counts as confident).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the confidence reported for `manipulator`.
    pub fn set(&self, manipulator: ManipulatorId, high: bool) {
        self.levels.borrow_mut().insert(manipulator, high);
    }
}

impl ConfidenceProvider for StaticConfidence {
    fn tracking_confidence(&self, manipulator: ManipulatorId) -> Option<bool> {
        self.levels.borrow().get(&manipulator).copied()
    }
}
