// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Throw handling: per-object manipulation sessions and the outlier-robust
//! release-velocity fit run when the last manipulator lets go.

mod estimator;
mod fit;
mod pose;
mod ring;
mod session;

pub use estimator::{ReleaseEvent, ReleaseVelocityEstimator};
pub use fit::{VelocityFitter, MIN_FIT_SAMPLES};
pub use pose::{
    AssumeHighConfidence, ConfidenceProvider, Pose, PoseSample, PoseSource, TrackedBody,
    VelocityEstimate,
};
pub use ring::SampleRing;
pub use session::{ManipulationSession, SessionArena, SessionHandle};
