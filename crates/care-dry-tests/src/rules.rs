// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fluent feedback rule builder for tests.

use care_interaction::{
    FeedbackAction, FeedbackRule, HapticPattern, InteractionType, InteractorKind, InteractorKinds,
};

/// Builder for [`FeedbackRule`]s.
///
/// # Example
///
/// ```
/// use care_dry_tests::RuleBuilder;
/// use care_interaction::{InteractionType, InteractorKind};
///
/// let rule = RuleBuilder::new(InteractionType::SelectStart)
///     .tag("red")
///     .only(InteractorKind::Poke)
///     .audio("click")
///     .default_haptics(0.6, 0.05, 0.5)
///     .build();
/// assert_eq!(rule.actions.len(), 1);
/// ```
pub struct RuleBuilder {
    rule: FeedbackRule,
}

impl RuleBuilder {
    /// Rule for `interaction`, any tag, any kind, no actions.
    pub fn new(interaction: InteractionType) -> Self {
        Self {
            rule: FeedbackRule::new(interaction),
        }
    }

    /// Set the exact-match tag filter.
    pub fn tag(mut self, tag: &str) -> Self {
        self.rule.tag = Some(tag.to_owned());
        self
    }

    /// Set the interactor-kind mask.
    pub fn kinds(mut self, kinds: InteractorKinds) -> Self {
        self.rule.kinds = kinds;
        self
    }

    /// Restrict the rule to a single interactor kind.
    pub fn only(self, kind: InteractorKind) -> Self {
        self.kinds(InteractorKinds::only(kind))
    }

    /// Append an action.
    pub fn action(mut self, action: FeedbackAction) -> Self {
        self.rule.actions.push(action);
        self
    }

    /// Append an audio action at full volume.
    pub fn audio(self, clip: &str) -> Self {
        self.action(FeedbackAction::Audio {
            clip: clip.to_owned(),
            volume: 1.0,
        })
    }

    /// Append a VFX action.
    pub fn vfx(self, effect: &str) -> Self {
        self.action(FeedbackAction::Vfx {
            effect: effect.to_owned(),
        })
    }

    /// Append a haptics action.
    pub fn haptics(self, amplitude: f32, duration: f32, frequency: f32) -> Self {
        self.action(FeedbackAction::Haptics(HapticPattern::new(
            amplitude, duration, frequency,
        )))
    }

    /// Request the default haptic pattern.
    pub fn default_haptics(mut self, amplitude: f32, duration: f32, frequency: f32) -> Self {
        self.rule.default_haptics = Some(HapticPattern::new(amplitude, duration, frequency));
        self
    }

    /// Build the rule.
    pub fn build(self) -> FeedbackRule {
        self.rule
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_any_kind() {
        let rule = RuleBuilder::new(InteractionType::HoverStart).build();
        assert!(rule.tag.is_none());
        assert_eq!(rule.kinds, InteractorKinds::ALL);
        assert!(rule.default_haptics.is_none());
    }

    #[test]
    fn builder_keeps_action_order() {
        let rule = RuleBuilder::new(InteractionType::HoverStart)
            .vfx("glow")
            .audio("tick")
            .haptics(2.0, 0.1, 0.5)
            .build();
        assert!(matches!(rule.actions[0], FeedbackAction::Vfx { .. }));
        assert!(matches!(rule.actions[1], FeedbackAction::Audio { .. }));
        assert_eq!(
            rule.actions[2],
            FeedbackAction::Haptics(HapticPattern::new(1.0, 0.1, 0.5))
        );
    }
}
