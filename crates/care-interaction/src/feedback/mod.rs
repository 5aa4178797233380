// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Interaction feedback: events, rules, per-object settings, haptics, and
//! the router tying them together.

mod event;
mod haptics;
mod router;
mod rule;
mod settings;

pub use event::{
    InteractionEvent, InteractionType, InteractorKind, InteractorKinds, PointerPhase,
    SourceObject,
};
pub use haptics::{HapticTimer, HapticsBackend, HapticsError, HapticsPlayer, NullHaptics};
pub use router::{ActionContext, ActionSink, FeedbackError, FeedbackRouter, NullSink, RouteOutcome};
pub use rule::{FeedbackAction, FeedbackRule, HapticPattern, RuleTable, TagMatch};
pub use settings::{FeedbackMode, FeedbackSettings};
