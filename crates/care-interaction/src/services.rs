// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Explicit service registry for hosts that want one access point.
//!
//! Nothing here is global: the host builds a [`CareServices`] and passes it
//! (or the pieces it needs) to its call sites.

use std::cell::RefCell;
use std::rc::Rc;

use care_app_core::config::{ConfigError, ConfigService, ConfigStore};
use tracing::info;

use crate::config::load_estimator_config;
use crate::feedback::{
    ActionSink, FeedbackError, FeedbackRouter, HapticsBackend, InteractionEvent, NullHaptics,
    NullSink,
};
use crate::subscription::{EventChannel, Subscription};
use crate::throw::{AssumeHighConfidence, ConfidenceProvider, ReleaseVelocityEstimator};

/// Host-side ports the services are built over.
pub struct HostPorts {
    /// Haptics device back end.
    pub haptics: Box<dyn HapticsBackend>,
    /// Audio / VFX executor.
    pub sink: Box<dyn ActionSink>,
    /// Tracking-confidence source.
    pub confidence: Box<dyn ConfidenceProvider>,
}

impl Default for HostPorts {
    fn default() -> Self {
        Self {
            haptics: Box::new(NullHaptics),
            sink: Box::new(NullSink),
            confidence: Box::new(AssumeHighConfidence),
        }
    }
}

/// The estimator and the router, owned together.
pub struct CareServices {
    estimator: ReleaseVelocityEstimator,
    router: Rc<RefCell<FeedbackRouter>>,
}

impl CareServices {
    /// Bundles already-built services.
    pub fn new(estimator: ReleaseVelocityEstimator, router: FeedbackRouter) -> Self {
        Self {
            estimator,
            router: Rc::new(RefCell::new(router)),
        }
    }

    /// Builds both services from configuration.
    ///
    /// A missing rule table leaves the router loaded but inert; malformed
    /// configuration is an error.
    pub fn from_config<S: ConfigStore>(
        config: &ConfigService<S>,
        ports: HostPorts,
    ) -> Result<Self, ConfigError> {
        let estimator_config = load_estimator_config(config)?;
        let estimator =
            ReleaseVelocityEstimator::with_confidence(&estimator_config, ports.confidence);
        let mut router = FeedbackRouter::new(ports.haptics, ports.sink);
        router.reload_from_config(config)?;
        info!(
            window = estimator_config.window,
            rules = router.rules().map_or(0, |r| r.len()),
            "care services ready"
        );
        Ok(Self::new(estimator, router))
    }

    /// Velocity estimator.
    pub fn estimator(&self) -> &ReleaseVelocityEstimator {
        &self.estimator
    }

    /// Velocity estimator, mutably.
    pub fn estimator_mut(&mut self) -> &mut ReleaseVelocityEstimator {
        &mut self.estimator
    }

    /// Shared handle to the feedback router.
    pub fn router(&self) -> Rc<RefCell<FeedbackRouter>> {
        Rc::clone(&self.router)
    }

    /// Subscribes the router to `channel`.
    pub fn attach(
        &self,
        channel: Option<&EventChannel<InteractionEvent>>,
    ) -> Result<Subscription, FeedbackError> {
        FeedbackRouter::attach(&self.router, channel)
    }

    /// Frame tick: advances haptic timers. Returns how many were stopped.
    pub fn tick(&self, now: f32) -> usize {
        self.router.borrow_mut().tick(now)
    }
}
