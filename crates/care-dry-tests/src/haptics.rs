// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Recording haptics back end.

use care_interaction::{HapticPattern, HapticTarget, HapticsBackend, HapticsError};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// One call observed by [`RecordingHaptics`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HapticsCall {
    /// `play` reached the back end.
    Play {
        /// Target addressed.
        target: HapticTarget,
        /// Pattern requested.
        pattern: HapticPattern,
    },
    /// `stop` reached the back end.
    Stop {
        /// Target addressed.
        target: HapticTarget,
    },
}

#[derive(Default)]
struct Inner {
    calls: Vec<HapticsCall>,
    missing: HashSet<HapticTarget>,
}

/// [`HapticsBackend`] that records every call. Clones share the log.
#[derive(Clone, Default)]
pub struct RecordingHaptics {
    inner: Rc<RefCell<Inner>>,
}

impl RecordingHaptics {
    /// Back end with a device behind every target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `target` report [`HapticsError::NoDevice`].
    pub fn without_device(self, target: HapticTarget) -> Self {
        self.inner.borrow_mut().missing.insert(target);
        self
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<HapticsCall> {
        self.inner.borrow().calls.clone()
    }

    /// Targets and patterns of successful `play` calls.
    pub fn plays(&self) -> Vec<(HapticTarget, HapticPattern)> {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match *c {
                HapticsCall::Play { target, pattern } => Some((target, pattern)),
                HapticsCall::Stop { .. } => None,
            })
            .collect()
    }

    /// Targets of `stop` calls.
    pub fn stops(&self) -> Vec<HapticTarget> {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match *c {
                HapticsCall::Stop { target } => Some(target),
                HapticsCall::Play { .. } => None,
            })
            .collect()
    }

    /// True when nothing reached the back end.
    pub fn is_untouched(&self) -> bool {
        self.inner.borrow().calls.is_empty()
    }
}

impl HapticsBackend for RecordingHaptics {
    fn play(&mut self, target: HapticTarget, pattern: &HapticPattern) -> Result<(), HapticsError> {
        let mut inner = self.inner.borrow_mut();
        if inner.missing.contains(&target) {
            return Err(HapticsError::NoDevice(target));
        }
        inner.calls.push(HapticsCall::Play {
            target,
            pattern: *pattern,
        });
        Ok(())
    }

    fn stop(&mut self, target: HapticTarget) {
        self.inner
            .borrow_mut()
            .calls
            .push(HapticsCall::Stop { target });
    }
}
