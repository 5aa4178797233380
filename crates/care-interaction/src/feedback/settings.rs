// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-object feedback policy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::event::InteractionType;
use super::rule::FeedbackAction;

/// Whether the global rules apply to an object.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackMode {
    /// Global rule table applies.
    #[default]
    Default,
    /// No feedback at all for this object.
    Suppress,
    /// Per-type overrides replace the global rules.
    Override,
}

/// Feedback policy attached to one interactable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSettings {
    /// Policy.
    #[serde(default)]
    pub mode: FeedbackMode,
    /// Actions per interaction type, used in [`FeedbackMode::Override`].
    /// An empty list silences that type.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<InteractionType, Vec<FeedbackAction>>,
}

impl FeedbackSettings {
    /// Settings dropping every event.
    pub fn suppress() -> Self {
        Self {
            mode: FeedbackMode::Suppress,
            overrides: BTreeMap::new(),
        }
    }

    /// Override settings from `(type, actions)` pairs.
    pub fn overriding(
        overrides: impl IntoIterator<Item = (InteractionType, Vec<FeedbackAction>)>,
    ) -> Self {
        Self {
            mode: FeedbackMode::Override,
            overrides: overrides.into_iter().collect(),
        }
    }

    /// Override actions for `interaction`, only in override mode.
    pub fn override_for(&self, interaction: InteractionType) -> Option<&[FeedbackAction]> {
        if self.mode != FeedbackMode::Override {
            return None;
        }
        self.overrides.get(&interaction).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_only_apply_in_override_mode() {
        let mut settings =
            FeedbackSettings::overriding([(InteractionType::SelectStart, Vec::new())]);
        assert_eq!(
            settings.override_for(InteractionType::SelectStart),
            Some(&[][..])
        );
        assert_eq!(settings.override_for(InteractionType::HoverStart), None);
        settings.mode = FeedbackMode::Default;
        assert_eq!(settings.override_for(InteractionType::SelectStart), None);
    }

    #[test]
    fn settings_parse_with_type_keys() {
        let settings: FeedbackSettings = serde_json::from_str(
            r#"{ "mode": "override", "overrides": { "hover_start": [ { "type": "stop_haptics" } ] } }"#,
        )
        .unwrap();
        assert_eq!(
            settings.override_for(InteractionType::HoverStart),
            Some(&[FeedbackAction::StopHaptics][..])
        );
    }
}
