// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Drives [`CareServices`] through a scenario and records what happened.

use std::cell::RefCell;
use std::rc::Rc;

use care_app_core::config::{ConfigService, ConfigStore};
use care_interaction::{
    CareServices, FeedbackRouter, HostPorts, ObjectId, ReleaseEvent, ReleaseVelocityEstimator,
    RouteOutcome, Subscription, TrackedBody, VelocityEstimate,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::ports::{FrameBody, LoggingHaptics, LoggingSink, SharedConfidence};
use crate::scenario::{Scenario, Step};

/// One line of replay output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplayRecord {
    /// A release produced a velocity.
    Release {
        /// Step index.
        step: usize,
        /// Released object.
        object: ObjectId,
        /// Fitted velocity.
        estimate: VelocityEstimate,
    },
    /// The last manipulator let go without a velocity (cancel or too few
    /// samples).
    NoRelease {
        /// Step index.
        step: usize,
        /// Released object.
        object: ObjectId,
    },
    /// An explicit cancel.
    Cancelled {
        /// Step index.
        step: usize,
        /// Cancelled object.
        object: ObjectId,
        /// Whether a session was live.
        active: bool,
    },
    /// An interaction event was routed.
    Route {
        /// Step index.
        step: usize,
        /// Event source.
        object: ObjectId,
        /// Router decision.
        outcome: RouteOutcome,
    },
    /// Haptic timers expired on a tick.
    HapticsStopped {
        /// Step index.
        step: usize,
        /// Targets stopped.
        count: usize,
    },
}

/// Scenario runner owning the services and the replay-side ports.
pub struct Replayer {
    services: CareServices,
    confidence: SharedConfidence,
    released: Rc<RefCell<Vec<ReleaseEvent>>>,
    _release_listener: Subscription,
}

impl Replayer {
    /// Services configured from the scenario's inline sections.
    pub fn from_scenario(scenario: &Scenario) -> Self {
        let confidence = SharedConfidence::default();
        let estimator = ReleaseVelocityEstimator::with_confidence(
            &scenario.estimator.clone().unwrap_or_default(),
            Box::new(confidence.clone()),
        );
        let mut router = FeedbackRouter::new(Box::new(LoggingHaptics), Box::new(LoggingSink));
        router.reload_rules(scenario.rules.clone());
        for entry in scenario.objects.iter().flat_map(|o| o.objects.iter()) {
            router.set_object_settings(entry.object, entry.settings.clone());
        }
        Self::with_services(CareServices::new(estimator, router), confidence)
    }

    /// Services loaded from a config store.
    pub fn from_config<S: ConfigStore>(config: &ConfigService<S>) -> anyhow::Result<Self> {
        let confidence = SharedConfidence::default();
        let ports = HostPorts {
            haptics: Box::new(LoggingHaptics),
            sink: Box::new(LoggingSink),
            confidence: Box::new(confidence.clone()),
        };
        let services = CareServices::from_config(config, ports)?;
        Ok(Self::with_services(services, confidence))
    }

    fn with_services(services: CareServices, confidence: SharedConfidence) -> Self {
        let released = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&released);
        let listener = services
            .estimator()
            .on_release(move |event: &ReleaseEvent| sink.borrow_mut().push(*event));
        Self {
            services,
            confidence,
            released,
            _release_listener: listener,
        }
    }

    /// Underlying services.
    pub fn services(&self) -> &CareServices {
        &self.services
    }

    /// Replays every step in order.
    pub fn run(&mut self, steps: &[Step]) -> Vec<ReplayRecord> {
        steps
            .iter()
            .enumerate()
            .filter_map(|(index, step)| self.step(index, step))
            .collect()
    }

    /// Replays one step; returns a record when the step has a visible result.
    pub fn step(&mut self, index: usize, step: &Step) -> Option<ReplayRecord> {
        match step {
            Step::Begin {
                object,
                manipulator,
            } => {
                self.services
                    .estimator_mut()
                    .begin_manipulation(*object, *manipulator);
                None
            }
            Step::Move {
                object,
                manipulator,
                time,
                pose,
            } => {
                let body = FrameBody::new(*time, *pose);
                self.services
                    .estimator_mut()
                    .record_move(*object, *manipulator, Some(&body));
                None
            }
            Step::End {
                object,
                manipulator,
                finalize,
                time,
                pose,
            } => {
                let mut body = time.zip(*pose).map(|(t, p)| FrameBody::new(t, p));
                let was_held = self.services.estimator().is_manipulating(*object);
                let estimate = self.services.estimator_mut().end_manipulation(
                    *object,
                    *manipulator,
                    *finalize,
                    body.as_mut().map(|b| b as &mut dyn TrackedBody),
                );
                if estimate.is_some() {
                    let released = self.released.borrow_mut().pop();
                    debug!(step = index, ?released, "release observed");
                    return released.map(|event| ReplayRecord::Release {
                        step: index,
                        object: event.object,
                        estimate: event.estimate,
                    });
                }
                if was_held && !self.services.estimator().is_manipulating(*object) {
                    return Some(ReplayRecord::NoRelease {
                        step: index,
                        object: *object,
                    });
                }
                None
            }
            Step::Cancel { object } => Some(ReplayRecord::Cancelled {
                step: index,
                object: *object,
                active: self.services.estimator_mut().cancel(*object),
            }),
            Step::Confidence { manipulator, high } => {
                self.confidence.set(*manipulator, *high);
                None
            }
            Step::Interact { event } => {
                let router = self.services.router();
                let Ok(mut router) = router.try_borrow_mut() else {
                    warn!(step = index, "router busy; event skipped");
                    return None;
                };
                Some(ReplayRecord::Route {
                    step: index,
                    object: event.source.id,
                    outcome: router.route(event),
                })
            }
            Step::Tick { time } => {
                let count = self.services.tick(*time);
                (count > 0).then_some(ReplayRecord::HapticsStopped { step: index, count })
            }
        }
    }
}
