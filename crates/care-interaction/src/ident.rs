// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stable identities handed in by the host.
//!
//! The host owns its objects; this crate only ever sees these integer
//! handles, so no session or settings table extends an object's lifetime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a manipulable / interactable object.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

/// Identity of a manipulator (hand, controller ray, ...).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManipulatorId(pub i32);

/// Identifier used to address a haptics device.
///
/// Resolved from an interactor id or a UI pointer id. The value `-1` is the
/// reserved "unresolved" sentinel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HapticTarget(i32);

impl HapticTarget {
    /// Raw sentinel value for an unresolved target.
    pub const UNRESOLVED_RAW: i32 = -1;

    /// The unresolved sentinel.
    pub const UNRESOLVED: Self = Self(Self::UNRESOLVED_RAW);

    /// Wraps a raw identifier.
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Raw identifier.
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// False only for the sentinel.
    pub const fn is_resolved(self) -> bool {
        self.0 != Self::UNRESOLVED_RAW
    }
}

impl From<ManipulatorId> for HapticTarget {
    fn from(value: ManipulatorId) -> Self {
        Self(value.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

impl fmt::Display for HapticTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_resolved() {
            write!(f, "target#{}", self.0)
        } else {
            f.write_str("target#unresolved")
        }
    }
}
