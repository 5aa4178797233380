// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Feedback rule router.
//!
//! Resolution order per event: per-object settings (suppress, then
//! override), then the global [`RuleTable`]. Haptics actions go through the
//! router's [`HapticsPlayer`]; audio and VFX go to the host's [`ActionSink`].

use std::cell::RefCell;
use std::rc::Rc;

use care_app_core::config::{ConfigError, ConfigService, ConfigStore};
use rustc_hash::FxHashMap;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::event::{InteractionEvent, InteractionType};
use super::haptics::{HapticsBackend, HapticsError, HapticsPlayer};
use super::rule::{FeedbackAction, HapticPattern, RuleTable};
use super::settings::{FeedbackMode, FeedbackSettings};
use crate::config::{load_object_settings, load_rule_table};
use crate::ident::{HapticTarget, ObjectId};
use crate::subscription::{EventChannel, Subscription};

/// Errors from wiring a router to an event source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedbackError {
    /// No event channel was supplied; the router stays idle.
    #[error("no interaction event channel to attach to")]
    MissingChannel,
    /// The router is already attached to this channel.
    #[error("router already attached to this channel")]
    AlreadyAttached,
}

/// What an action is being executed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionContext {
    /// Interaction that triggered the action.
    pub interaction: InteractionType,
    /// Object the interaction is about.
    pub source: ObjectId,
    /// Resolved haptics target (may be the sentinel).
    pub target: HapticTarget,
}

/// Host port executing the non-haptic actions (audio, VFX).
pub trait ActionSink {
    /// Runs `action`. Only [`FeedbackAction::Audio`] and
    /// [`FeedbackAction::Vfx`] reach the sink.
    fn execute(&mut self, action: &FeedbackAction, context: &ActionContext);
}

/// Sink that drops every action.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ActionSink for NullSink {
    fn execute(&mut self, _action: &FeedbackAction, _context: &ActionContext) {}
}

/// Result of routing one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RouteOutcome {
    /// The object suppresses all feedback.
    Suppressed,
    /// The object's override list ran; the global table was not consulted.
    Overridden {
        /// Actions in the override list.
        actions: usize,
        /// Haptics actions refused for the target.
        dropped: usize,
    },
    /// A global rule matched and ran.
    Matched {
        /// Index of the rule in the table.
        rule: usize,
        /// Actions in the rule.
        actions: usize,
        /// Whether the rule's default pattern was requested.
        default_haptics: bool,
        /// Haptics requests refused for the target.
        dropped: usize,
    },
    /// No rule matched.
    NoMatch,
    /// No rule table is loaded.
    NoRuleTable,
}

/// Routes interaction events to feedback actions.
pub struct FeedbackRouter {
    rules: Option<Rc<RuleTable>>,
    settings: FxHashMap<ObjectId, FeedbackSettings>,
    haptics: HapticsPlayer,
    sink: Box<dyn ActionSink>,
    missing_rules_logged: bool,
}

impl FeedbackRouter {
    /// Router without a rule table; load one with [`Self::reload_rules`].
    pub fn new(haptics: Box<dyn HapticsBackend>, sink: Box<dyn ActionSink>) -> Self {
        Self {
            rules: None,
            settings: FxHashMap::default(),
            haptics: HapticsPlayer::new(haptics),
            sink,
            missing_rules_logged: false,
        }
    }

    /// Router with `rules` already loaded.
    pub fn with_rules(
        rules: RuleTable,
        haptics: Box<dyn HapticsBackend>,
        sink: Box<dyn ActionSink>,
    ) -> Self {
        let mut router = Self::new(haptics, sink);
        router.reload_rules(Some(rules));
        router
    }

    /// Replaces the rule snapshot wholesale. `None` unloads it.
    pub fn reload_rules(&mut self, rules: Option<RuleTable>) {
        debug!(
            rules = rules.as_ref().map_or(0, RuleTable::len),
            "feedback rule table replaced"
        );
        self.rules = rules.map(Rc::new);
        self.missing_rules_logged = false;
    }

    /// Current rule snapshot.
    pub fn rules(&self) -> Option<Rc<RuleTable>> {
        self.rules.clone()
    }

    /// Attaches `settings` to `object`, replacing any previous ones.
    pub fn set_object_settings(&mut self, object: ObjectId, settings: FeedbackSettings) {
        self.settings.insert(object, settings);
    }

    /// Detaches the settings of `object`.
    pub fn clear_object_settings(&mut self, object: ObjectId) -> Option<FeedbackSettings> {
        self.settings.remove(&object)
    }

    /// Settings attached to `object`.
    pub fn object_settings(&self, object: ObjectId) -> Option<&FeedbackSettings> {
        self.settings.get(&object)
    }

    /// Reloads the rule table and every object's settings from `config`.
    ///
    /// On error the current state is kept.
    pub fn reload_from_config<S: ConfigStore>(
        &mut self,
        config: &ConfigService<S>,
    ) -> Result<(), ConfigError> {
        let rules = load_rule_table(config)?;
        let objects = load_object_settings(config)?;
        if rules.is_none() {
            warn!("no feedback rule table configured");
        }
        self.reload_rules(rules);
        self.settings = objects
            .objects
            .into_iter()
            .map(|entry| (entry.object, entry.settings))
            .collect();
        Ok(())
    }

    /// Routes one event and runs the resulting actions.
    pub fn route(&mut self, event: &InteractionEvent) -> RouteOutcome {
        let Self {
            rules,
            settings,
            haptics,
            sink,
            missing_rules_logged,
        } = self;
        let context = ActionContext {
            interaction: event.interaction,
            source: event.source.id,
            target: event.haptic_target(),
        };

        if let Some(settings) = settings.get(&context.source) {
            match settings.mode {
                FeedbackMode::Suppress => {
                    debug!(
                        object = %context.source,
                        interaction = ?context.interaction,
                        "feedback suppressed"
                    );
                    return RouteOutcome::Suppressed;
                }
                FeedbackMode::Override => {
                    if let Some(actions) = settings.override_for(context.interaction) {
                        let dropped = execute(haptics, sink.as_mut(), actions, &context);
                        debug!(
                            object = %context.source,
                            actions = actions.len(),
                            "feedback override"
                        );
                        return RouteOutcome::Overridden {
                            actions: actions.len(),
                            dropped,
                        };
                    }
                }
                FeedbackMode::Default => {}
            }
        }

        let Some(table) = rules.as_deref() else {
            if !*missing_rules_logged {
                warn!("no feedback rule table loaded; feedback disabled");
                *missing_rules_logged = true;
            }
            return RouteOutcome::NoRuleTable;
        };
        let Some(index) = table.find_match(event.interaction, event.kind, event.source.tag())
        else {
            return RouteOutcome::NoMatch;
        };
        let Some(rule) = table.get(index) else {
            return RouteOutcome::NoMatch;
        };

        let mut dropped = execute(haptics, sink.as_mut(), &rule.actions, &context);
        if let Some(pattern) = rule.default_haptics {
            if haptics.play(context.target, pattern).is_err() {
                dropped += 1;
            }
        }
        debug!(
            object = %context.source,
            interaction = ?context.interaction,
            rule = index,
            "feedback rule matched"
        );
        RouteOutcome::Matched {
            rule: index,
            actions: rule.actions.len(),
            default_haptics: rule.default_haptics.is_some(),
            dropped,
        }
    }

    /// Plays `pattern` on `target` through the haptics player.
    pub fn play_haptics(
        &mut self,
        target: HapticTarget,
        pattern: HapticPattern,
    ) -> Result<(), HapticsError> {
        self.haptics.play(target, pattern)
    }

    /// Stops haptics on `target`.
    pub fn stop_haptics(&mut self, target: HapticTarget) {
        self.haptics.stop(target);
    }

    /// Advances haptic timers; returns how many targets were auto-stopped.
    pub fn tick(&mut self, now: f32) -> usize {
        self.haptics.tick(now)
    }

    /// Haptics player state.
    pub fn haptics(&self) -> &HapticsPlayer {
        &self.haptics
    }

    /// Subscribes `router` to `channel`.
    ///
    /// The subscription holds the router weakly, so dropping the last strong
    /// handle silences it. Attaching the same router twice to one channel is
    /// rejected.
    pub fn attach(
        router: &Rc<RefCell<Self>>,
        channel: Option<&EventChannel<InteractionEvent>>,
    ) -> Result<Subscription, FeedbackError> {
        let Some(channel) = channel else {
            warn!("feedback router has no interaction event channel");
            return Err(FeedbackError::MissingChannel);
        };
        let key = Rc::as_ptr(router).cast::<()>() as usize;
        let weak = Rc::downgrade(router);
        channel
            .subscribe_keyed(key, move |event: &InteractionEvent| {
                let Some(router) = weak.upgrade() else {
                    return;
                };
                let Ok(mut router) = router.try_borrow_mut() else {
                    warn!("feedback router busy; event dropped");
                    return;
                };
                router.route(event);
            })
            .ok_or_else(|| {
                warn!("feedback router already attached to this channel");
                FeedbackError::AlreadyAttached
            })
    }
}

/// Runs `actions` in order; returns how many haptics requests were refused.
fn execute(
    haptics: &mut HapticsPlayer,
    sink: &mut dyn ActionSink,
    actions: &[FeedbackAction],
    context: &ActionContext,
) -> usize {
    let mut dropped = 0;
    for action in actions {
        match action {
            FeedbackAction::Haptics(pattern) => {
                if haptics.play(context.target, *pattern).is_err() {
                    dropped += 1;
                }
            }
            FeedbackAction::StopHaptics => haptics.stop(context.target),
            FeedbackAction::Audio { .. } | FeedbackAction::Vfx { .. } => {
                sink.execute(action, context);
            }
        }
    }
    dropped
}
