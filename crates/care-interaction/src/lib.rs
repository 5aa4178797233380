// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! care-interaction: release-velocity estimation and feedback rule routing
//! for EchoCare's mixed-reality interactions.
//!
//! Both halves are engine-agnostic. Hosts feed manipulator lifecycle events
//! and pose reads into a [`ReleaseVelocityEstimator`], and interaction events
//! into a [`FeedbackRouter`]; everything the engine owns (transforms, clocks,
//! haptic devices, audio) sits behind the traits re-exported here.
//!
//! Execution is single-threaded and frame driven. Nothing in this crate
//! spawns threads or blocks; haptic auto-stop is a timer advanced by
//! [`FeedbackRouter::tick`].
#![forbid(unsafe_code)]

pub mod config;
pub mod feedback;
pub mod ident;
pub mod services;
pub mod subscription;
pub mod throw;

pub use config::{EstimatorConfig, ObjectSettingsConfig};
pub use feedback::{
    ActionContext, ActionSink, FeedbackAction, FeedbackError, FeedbackMode, FeedbackRouter,
    FeedbackRule, FeedbackSettings, HapticPattern, HapticsBackend, HapticsError, HapticsPlayer,
    InteractionEvent, InteractionType, InteractorKind, InteractorKinds, NullHaptics, NullSink,
    PointerPhase, RouteOutcome, RuleTable, SourceObject,
};
pub use ident::{HapticTarget, ManipulatorId, ObjectId};
pub use services::{CareServices, HostPorts};
pub use subscription::{EventChannel, Listeners, Subscription};
pub use throw::{
    AssumeHighConfidence, ConfidenceProvider, Pose, PoseSample, PoseSource, ReleaseEvent,
    ReleaseVelocityEstimator, TrackedBody, VelocityEstimate,
};
