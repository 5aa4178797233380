// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Serde-backed configuration for the estimator and the feedback router.
//!
//! Everything is read through a [`ConfigService`]; hosts pick the backing
//! [`ConfigStore`] (filesystem, in-memory, bundled asset).

use care_app_core::config::{ConfigError, ConfigService, ConfigStore};
use serde::{Deserialize, Serialize};

use crate::feedback::{FeedbackSettings, RuleTable};
use crate::ident::ObjectId;

/// Config key holding [`EstimatorConfig`].
pub const ESTIMATOR_KEY: &str = "estimator";
/// Config key holding the global [`RuleTable`].
pub const FEEDBACK_RULES_KEY: &str = "feedback_rules";
/// Config key holding [`ObjectSettingsConfig`].
pub const FEEDBACK_OBJECTS_KEY: &str = "feedback_objects";

/// Tuning for the release-velocity fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Pose samples kept per session (rolling window).
    pub window: usize,
    /// Below this many usable samples the fit is plain least squares.
    pub min_ransac_samples: usize,
    /// Candidate models drawn per fit; when at least the number of sample
    /// pairs, every pair is tried instead.
    pub iterations: usize,
    /// Position residual (metres) under which a sample counts as an inlier.
    pub linear_inlier_threshold: f32,
    /// Orientation residual (radians) under which a sample counts as an inlier.
    pub angular_inlier_threshold: f32,
    /// Seed for subset sampling.
    pub seed: u64,
    /// Leave low-confidence samples out of the fit while at least two
    /// high-confidence samples remain.
    pub exclude_low_confidence: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            window: 10,
            min_ransac_samples: 4,
            iterations: 64,
            linear_inlier_threshold: 0.015,
            angular_inlier_threshold: 0.1,
            seed: 0x5eed_ca5e,
            exclude_low_confidence: true,
        }
    }
}

impl EstimatorConfig {
    /// Copy with every field forced into its valid range.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let threshold = |v: f32, fallback: f32| {
            if v.is_finite() && v >= 0.0 {
                v
            } else {
                fallback
            }
        };
        Self {
            window: self.window.max(2),
            min_ransac_samples: self.min_ransac_samples.max(3),
            iterations: self.iterations.max(1),
            linear_inlier_threshold: threshold(
                self.linear_inlier_threshold,
                defaults.linear_inlier_threshold,
            ),
            angular_inlier_threshold: threshold(
                self.angular_inlier_threshold,
                defaults.angular_inlier_threshold,
            ),
            seed: self.seed,
            exclude_low_confidence: self.exclude_low_confidence,
        }
    }
}

/// Per-object feedback settings as stored in configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectSettingsConfig {
    /// One entry per configured object.
    #[serde(default)]
    pub objects: Vec<ObjectSettingsEntry>,
}

/// Settings attached to a single object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSettingsEntry {
    /// Object the settings attach to.
    pub object: ObjectId,
    /// Feedback policy for the object.
    #[serde(flatten)]
    pub settings: FeedbackSettings,
}

/// Loads [`EstimatorConfig`], defaulting when the key is missing.
pub fn load_estimator_config<S: ConfigStore>(
    config: &ConfigService<S>,
) -> Result<EstimatorConfig, ConfigError> {
    Ok(config
        .load_or_default::<EstimatorConfig>(ESTIMATOR_KEY)?
        .sanitized())
}

/// Loads the global rule table; `Ok(None)` when none is configured.
pub fn load_rule_table<S: ConfigStore>(
    config: &ConfigService<S>,
) -> Result<Option<RuleTable>, ConfigError> {
    config.load(FEEDBACK_RULES_KEY)
}

/// Loads per-object settings, empty when the key is missing.
pub fn load_object_settings<S: ConfigStore>(
    config: &ConfigService<S>,
) -> Result<ObjectSettingsConfig, ConfigError> {
    config.load_or_default(FEEDBACK_OBJECTS_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_estimator_config_keeps_defaults() {
        let cfg: EstimatorConfig = serde_json::from_str(r#"{ "window": 6 }"#).unwrap();
        assert_eq!(cfg.window, 6);
        assert_eq!(cfg.min_ransac_samples, 4);
    }

    #[test]
    fn sanitized_repairs_out_of_range_values() {
        let cfg = EstimatorConfig {
            window: 0,
            min_ransac_samples: 1,
            iterations: 0,
            linear_inlier_threshold: -1.0,
            angular_inlier_threshold: f32::NAN,
            ..EstimatorConfig::default()
        }
        .sanitized();
        assert_eq!(cfg.window, 2);
        assert_eq!(cfg.min_ransac_samples, 3);
        assert_eq!(cfg.iterations, 1);
        assert_eq!(cfg.linear_inlier_threshold, 0.015);
        assert_eq!(cfg.angular_inlier_threshold, 0.1);
    }
}
