// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scenario files: optional inline configuration plus an ordered step list.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use care_interaction::{
    EstimatorConfig, InteractionEvent, ManipulatorId, ObjectId, ObjectSettingsConfig, Pose,
    RuleTable,
};
use serde::Deserialize;

/// A recorded session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    /// Estimator tuning; defaults when absent.
    #[serde(default)]
    pub estimator: Option<EstimatorConfig>,
    /// Global feedback rules; the router stays idle when absent.
    #[serde(default)]
    pub rules: Option<RuleTable>,
    /// Per-object feedback settings.
    #[serde(default)]
    pub objects: Option<ObjectSettingsConfig>,
    /// Steps, replayed in order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    /// True when the scenario carries any configuration section.
    pub fn has_inline_config(&self) -> bool {
        self.estimator.is_some() || self.rules.is_some() || self.objects.is_some()
    }
}

/// One recorded host callback.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// A manipulator grabbed an object.
    Begin {
        /// Grabbed object.
        object: ObjectId,
        /// Grabbing manipulator.
        manipulator: ManipulatorId,
    },
    /// Held-frame pose read.
    Move {
        /// Held object.
        object: ObjectId,
        /// Manipulator reporting the frame.
        manipulator: ManipulatorId,
        /// Host clock.
        time: f32,
        /// Object pose this frame.
        pose: Pose,
    },
    /// A manipulator let go.
    End {
        /// Released object.
        object: ObjectId,
        /// Releasing manipulator.
        manipulator: ManipulatorId,
        /// False for a forced cancel.
        #[serde(default = "finalize_by_default")]
        finalize: bool,
        /// Host clock at release; without it the body is unavailable.
        #[serde(default)]
        time: Option<f32>,
        /// Object pose at release.
        #[serde(default)]
        pose: Option<Pose>,
    },
    /// Every manipulation of an object was aborted.
    Cancel {
        /// Aborted object.
        object: ObjectId,
    },
    /// Tracking confidence changed for a manipulator.
    Confidence {
        /// Tracked manipulator.
        manipulator: ManipulatorId,
        /// New confidence.
        high: bool,
    },
    /// An interaction event fired.
    Interact {
        /// The event.
        event: InteractionEvent,
    },
    /// Frame tick advancing the haptic timers.
    Tick {
        /// Host clock.
        time: f32,
    },
}

const fn finalize_by_default() -> bool {
    true
}

/// Reads a scenario from a JSON file.
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let file = File::open(path)
        .with_context(|| format!("failed to open scenario {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse scenario {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_parse_with_defaults() {
        let scenario: Scenario = serde_json::from_str(
            r#"{ "steps": [
                { "op": "begin", "object": 1, "manipulator": 4 },
                { "op": "move", "object": 1, "manipulator": 4, "time": 0.0, "pose": { "position": [0, 1, 0] } },
                { "op": "end", "object": 1, "manipulator": 4 },
                { "op": "tick", "time": 0.5 }
            ] }"#,
        )
        .unwrap();
        assert!(!scenario.has_inline_config());
        assert_eq!(scenario.steps.len(), 4);
        assert!(matches!(
            scenario.steps[2],
            Step::End {
                finalize: true,
                time: None,
                ..
            }
        ));
    }
}
