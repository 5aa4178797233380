// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Interaction events and the classification carried with them.

use serde::{Deserialize, Serialize};

use crate::ident::{HapticTarget, ManipulatorId, ObjectId};

/// Lifecycle step of an interaction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    /// An interactor started hovering the object.
    HoverStart,
    /// An interactor stopped hovering the object.
    HoverEnd,
    /// An interactor selected (grabbed, pressed) the object.
    SelectStart,
    /// An interactor released the object.
    SelectEnd,
}

/// UI pointer callback phase.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    /// Pointer entered the element.
    Enter,
    /// Pointer left the element.
    Exit,
    /// Pointer pressed on the element.
    Down,
    /// Pointer released on the element.
    Up,
}

impl From<PointerPhase> for InteractionType {
    fn from(phase: PointerPhase) -> Self {
        match phase {
            PointerPhase::Enter => Self::HoverStart,
            PointerPhase::Exit => Self::HoverEnd,
            PointerPhase::Down => Self::SelectStart,
            PointerPhase::Up => Self::SelectEnd,
        }
    }
}

/// Category of the interactor behind an event, fixed when the interactor is
/// created.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum InteractorKind {
    /// Finger poke.
    Poke = 0,
    /// Far-field ray.
    Ray = 1,
    /// Controller grab.
    Grab = 2,
    /// Hand grab.
    HandGrab = 3,
    /// Controller distance grab.
    DistanceGrab = 4,
    /// Hand distance grab.
    DistanceHandGrab = 5,
    /// Hand grab triggered by touch.
    TouchHandGrab = 6,
    /// Anything else.
    Other = 7,
}

impl InteractorKind {
    /// Every kind, in bit order.
    pub const ALL: [Self; 8] = [
        Self::Poke,
        Self::Ray,
        Self::Grab,
        Self::HandGrab,
        Self::DistanceGrab,
        Self::DistanceHandGrab,
        Self::TouchHandGrab,
        Self::Other,
    ];

    const fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

/// Bitmask of [`InteractorKind`]s used as a rule filter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<InteractorKind>", into = "Vec<InteractorKind>")]
pub struct InteractorKinds(u32);

impl InteractorKinds {
    /// Matches nothing.
    pub const NONE: Self = Self(0);
    /// Matches every kind.
    pub const ALL: Self = Self(0xff);
    /// Hand-grab family (hand, distance-hand, touch-hand).
    pub const HAND_GRAB_FAMILY: Self = Self(
        InteractorKind::HandGrab.bit()
            | InteractorKind::DistanceHandGrab.bit()
            | InteractorKind::TouchHandGrab.bit(),
    );

    /// Mask with a single kind.
    pub const fn only(kind: InteractorKind) -> Self {
        Self(kind.bit())
    }

    /// Mask with `kind` added.
    pub const fn with(self, kind: InteractorKind) -> Self {
        Self(self.0 | kind.bit())
    }

    /// True when `kind` is in the mask.
    pub const fn contains(self, kind: InteractorKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl Default for InteractorKinds {
    fn default() -> Self {
        Self::ALL
    }
}

impl FromIterator<InteractorKind> for InteractorKinds {
    fn from_iter<I: IntoIterator<Item = InteractorKind>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, Self::with)
    }
}

impl From<Vec<InteractorKind>> for InteractorKinds {
    fn from(kinds: Vec<InteractorKind>) -> Self {
        kinds.into_iter().collect()
    }
}

impl From<InteractorKinds> for Vec<InteractorKind> {
    fn from(mask: InteractorKinds) -> Self {
        InteractorKind::ALL
            .into_iter()
            .filter(|k| mask.contains(*k))
            .collect()
    }
}

/// Object an event originates from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceObject {
    /// Object identity.
    pub id: ObjectId,
    /// Scene tag used by tag-filtered rules.
    #[serde(default)]
    pub tag: Option<String>,
}

impl SourceObject {
    /// Untagged source.
    pub fn new(id: ObjectId) -> Self {
        Self { id, tag: None }
    }

    /// Tagged source. An empty tag counts as no tag.
    pub fn tagged(id: ObjectId, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self {
            id,
            tag: (!tag.is_empty()).then_some(tag),
        }
    }

    /// Tag, with empty strings treated as absent.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref().filter(|t| !t.is_empty())
    }
}

/// One interaction occurrence, built per callback and not retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    /// What happened.
    pub interaction: InteractionType,
    /// Category of the interactor involved.
    pub kind: InteractorKind,
    /// Interactor id (3D flow).
    #[serde(default)]
    pub interactor: Option<ManipulatorId>,
    /// Object the event is about.
    pub source: SourceObject,
    /// UI pointer id; `-1` when unknown.
    #[serde(default = "unresolved_pointer")]
    pub pointer_id: i32,
}

const fn unresolved_pointer() -> i32 {
    HapticTarget::UNRESOLVED_RAW
}

impl InteractionEvent {
    /// Event raised by a 3D interactor.
    pub fn from_interactor(
        interaction: InteractionType,
        kind: InteractorKind,
        interactor: ManipulatorId,
        source: SourceObject,
    ) -> Self {
        Self {
            interaction,
            kind,
            interactor: Some(interactor),
            source,
            pointer_id: HapticTarget::UNRESOLVED_RAW,
        }
    }

    /// Event raised by a UI pointer callback.
    pub fn from_pointer(
        phase: PointerPhase,
        kind: InteractorKind,
        pointer_id: i32,
        source: SourceObject,
    ) -> Self {
        Self {
            interaction: phase.into(),
            kind,
            interactor: None,
            source,
            pointer_id,
        }
    }

    /// Haptics target: the interactor id when known, else the pointer id.
    pub fn haptic_target(&self) -> HapticTarget {
        self.interactor
            .map_or(HapticTarget::new(self.pointer_id), HapticTarget::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_mask_round_trips_through_list() {
        let mask: InteractorKinds = [InteractorKind::Poke, InteractorKind::HandGrab]
            .into_iter()
            .collect();
        assert!(mask.contains(InteractorKind::Poke));
        assert!(!mask.contains(InteractorKind::Ray));
        let list: Vec<InteractorKind> = mask.into();
        assert_eq!(list, vec![InteractorKind::Poke, InteractorKind::HandGrab]);
        assert!(InteractorKinds::HAND_GRAB_FAMILY.contains(InteractorKind::TouchHandGrab));
        assert!(InteractorKind::ALL
            .into_iter()
            .all(|k| InteractorKinds::ALL.contains(k)));
    }

    #[test]
    fn target_prefers_interactor_then_pointer() {
        let src = SourceObject::new(ObjectId(1));
        let ev = InteractionEvent::from_interactor(
            InteractionType::HoverStart,
            InteractorKind::Ray,
            ManipulatorId(4),
            src.clone(),
        );
        assert_eq!(ev.haptic_target(), HapticTarget::new(4));

        let ui = InteractionEvent::from_pointer(PointerPhase::Down, InteractorKind::Poke, 9, src);
        assert_eq!(ui.interaction, InteractionType::SelectStart);
        assert_eq!(ui.haptic_target(), HapticTarget::new(9));

        let mapped: Vec<InteractionType> = [
            PointerPhase::Enter,
            PointerPhase::Exit,
            PointerPhase::Down,
            PointerPhase::Up,
        ]
        .into_iter()
        .map(InteractionType::from)
        .collect();
        assert_eq!(
            mapped,
            vec![
                InteractionType::HoverStart,
                InteractionType::HoverEnd,
                InteractionType::SelectStart,
                InteractionType::SelectEnd,
            ]
        );
    }

    #[test]
    fn missing_pointer_id_deserializes_to_sentinel() {
        let ev: InteractionEvent = serde_json::from_str(
            r#"{ "interaction": "hover_end", "kind": "poke", "source": { "id": 3 } }"#,
        )
        .unwrap();
        assert_eq!(ev.haptic_target(), HapticTarget::UNRESOLVED);
        assert_eq!(SourceObject::tagged(ObjectId(3), "").tag(), None);
    }
}
