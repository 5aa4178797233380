// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Feedback actions, haptic patterns, and the prioritized rule table.

use care_math::{clamp, saturate};
use serde::{Deserialize, Serialize};

use super::event::{InteractionType, InteractorKind, InteractorKinds};

/// Haptic pulse description. Values are clamped on construction:
/// amplitude and frequency to `[0, 1]`, duration to `≥ 0` seconds.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawHapticPattern")]
pub struct HapticPattern {
    amplitude: f32,
    duration: f32,
    frequency: f32,
}

#[derive(Deserialize)]
struct RawHapticPattern {
    amplitude: f32,
    duration: f32,
    #[serde(default = "default_frequency")]
    frequency: f32,
}

const fn default_frequency() -> f32 {
    0.5
}

impl From<RawHapticPattern> for HapticPattern {
    fn from(raw: RawHapticPattern) -> Self {
        Self::new(raw.amplitude, raw.duration, raw.frequency)
    }
}

impl HapticPattern {
    /// Clamped pattern.
    pub fn new(amplitude: f32, duration: f32, frequency: f32) -> Self {
        Self {
            amplitude: saturate(amplitude),
            duration: clamp(duration, 0.0, f32::MAX),
            frequency: saturate(frequency),
        }
    }

    /// Amplitude in `[0, 1]`.
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    /// Duration in seconds, `≥ 0`.
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Normalized frequency in `[0, 1]`.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }
}

/// One feedback side effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedbackAction {
    /// Play a haptic pattern on the event's target.
    Haptics(HapticPattern),
    /// Stop haptics on the event's target.
    StopHaptics,
    /// Play an audio clip.
    Audio {
        /// Clip asset name.
        clip: String,
        /// Linear volume.
        #[serde(default = "unit_volume")]
        volume: f32,
    },
    /// Spawn a visual effect.
    Vfx {
        /// Effect asset name.
        effect: String,
    },
}

const fn unit_volume() -> f32 {
    1.0
}

/// How a rule's tag filter relates to an event tag.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TagMatch {
    /// Rule has no tag filter.
    Wildcard,
    /// Rule tag equals the event tag.
    Exact,
    /// Rule tag differs from the event tag.
    Miss,
}

/// Entry of the global rule table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRule {
    /// Interaction the rule reacts to.
    pub interaction: InteractionType,
    /// Exact-match tag filter; absent or empty matches any tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Interactor kinds the rule applies to.
    #[serde(default)]
    pub kinds: InteractorKinds,
    /// Actions run in order when the rule wins.
    #[serde(default)]
    pub actions: Vec<FeedbackAction>,
    /// Pattern played on the event's target in addition to `actions`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_haptics: Option<HapticPattern>,
}

impl FeedbackRule {
    /// Rule for `interaction` matching any tag and kind, with no actions.
    pub fn new(interaction: InteractionType) -> Self {
        Self {
            interaction,
            tag: None,
            kinds: InteractorKinds::ALL,
            actions: Vec::new(),
            default_haptics: None,
        }
    }

    /// Compares the tag filter against an event tag.
    pub fn tag_match(&self, tag: Option<&str>) -> TagMatch {
        match self.tag.as_deref().filter(|t| !t.is_empty()) {
            None => TagMatch::Wildcard,
            Some(filter) if tag == Some(filter) => TagMatch::Exact,
            Some(_) => TagMatch::Miss,
        }
    }

    /// True when type and kind filters accept the event.
    pub fn accepts(&self, interaction: InteractionType, kind: InteractorKind) -> bool {
        self.interaction == interaction && self.kinds.contains(kind)
    }
}

/// Ordered, immutable rule list; position is priority.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleTable {
    #[serde(default)]
    rules: Vec<FeedbackRule>,
}

impl RuleTable {
    /// Table over `rules` in priority order.
    pub fn new(rules: Vec<FeedbackRule>) -> Self {
        Self { rules }
    }

    /// Rules in priority order.
    pub fn rules(&self) -> &[FeedbackRule] {
        &self.rules
    }

    /// Rule at `index`.
    pub fn get(&self, index: usize) -> Option<&FeedbackRule> {
        self.rules.get(index)
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when the table holds no rule.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Index of the winning rule for an event.
    ///
    /// The first rule whose tag equals `tag` wins immediately. Otherwise the
    /// first untagged rule seen is the answer; later untagged rules never
    /// replace it.
    pub fn find_match(
        &self,
        interaction: InteractionType,
        kind: InteractorKind,
        tag: Option<&str>,
    ) -> Option<usize> {
        let mut fallback = None;
        for (index, rule) in self.rules.iter().enumerate() {
            if !rule.accepts(interaction, kind) {
                continue;
            }
            match rule.tag_match(tag) {
                TagMatch::Exact => return Some(index),
                TagMatch::Wildcard if fallback.is_none() => fallback = Some(index),
                TagMatch::Wildcard | TagMatch::Miss => {}
            }
        }
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(interaction: InteractionType, tag: &str) -> FeedbackRule {
        FeedbackRule {
            tag: Some(tag.to_owned()),
            ..FeedbackRule::new(interaction)
        }
    }

    #[test]
    fn pattern_values_are_clamped() {
        let p = HapticPattern::new(1.5, -1.0, -0.2);
        assert_eq!(p.amplitude(), 1.0);
        assert_eq!(p.duration(), 0.0);
        assert_eq!(p.frequency(), 0.0);

        let parsed: HapticPattern =
            serde_json::from_str(r#"{ "amplitude": 3.0, "duration": -2.0 }"#).unwrap();
        assert_eq!(parsed, HapticPattern::new(1.0, 0.0, 0.5));
    }

    #[test]
    fn exact_tag_beats_earlier_wildcard() {
        let table = RuleTable::new(vec![
            FeedbackRule::new(InteractionType::SelectStart),
            tagged(InteractionType::SelectStart, "red"),
        ]);
        let kind = InteractorKind::Grab;
        assert_eq!(
            table.find_match(InteractionType::SelectStart, kind, Some("red")),
            Some(1)
        );
        assert_eq!(
            table.find_match(InteractionType::SelectStart, kind, Some("blue")),
            Some(0)
        );
        assert_eq!(table.find_match(InteractionType::HoverEnd, kind, None), None);
    }

    #[test]
    fn first_wildcard_is_kept() {
        let mut second = FeedbackRule::new(InteractionType::HoverStart);
        second.kinds = InteractorKinds::only(InteractorKind::Poke);
        let table = RuleTable::new(vec![FeedbackRule::new(InteractionType::HoverStart), second]);
        assert_eq!(
            table.find_match(InteractionType::HoverStart, InteractorKind::Poke, None),
            Some(0)
        );
    }

    #[test]
    fn kind_filter_excludes_rule() {
        let mut rule = tagged(InteractionType::HoverStart, "red");
        rule.kinds = InteractorKinds::only(InteractorKind::Ray);
        let table = RuleTable::new(vec![rule]);
        assert_eq!(
            table.find_match(InteractionType::HoverStart, InteractorKind::Poke, Some("red")),
            None
        );
    }

    #[test]
    fn empty_tag_is_a_wildcard() {
        let rule = tagged(InteractionType::HoverStart, "");
        assert_eq!(rule.tag_match(Some("anything")), TagMatch::Wildcard);
    }

    #[test]
    fn actions_parse_from_tagged_json() {
        let actions: Vec<FeedbackAction> = serde_json::from_str(
            r#"[
                { "type": "haptics", "amplitude": 0.4, "duration": 0.1, "frequency": 0.9 },
                { "type": "audio", "clip": "chime" },
                { "type": "vfx", "effect": "sparkle" },
                { "type": "stop_haptics" }
            ]"#,
        )
        .unwrap();
        assert_eq!(actions[0], FeedbackAction::Haptics(HapticPattern::new(0.4, 0.1, 0.9)));
        assert_eq!(
            actions[1],
            FeedbackAction::Audio {
                clip: "chime".into(),
                volume: 1.0
            }
        );
        assert_eq!(actions[3], FeedbackAction::StopHaptics);
    }
}
