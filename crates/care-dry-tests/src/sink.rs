// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Recording action sink.

use care_interaction::{ActionContext, ActionSink, FeedbackAction};
use std::cell::RefCell;
use std::rc::Rc;

/// [`ActionSink`] that records every executed action. Clones share the log.
#[derive(Clone, Default)]
pub struct RecordingSink {
    executed: Rc<RefCell<Vec<(FeedbackAction, ActionContext)>>>,
}

impl RecordingSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Actions with their contexts, in execution order.
    pub fn executed(&self) -> Vec<(FeedbackAction, ActionContext)> {
        self.executed.borrow().clone()
    }

    /// Audio clip names, in execution order.
    pub fn clips(&self) -> Vec<String> {
        self.executed
            .borrow()
            .iter()
            .filter_map(|(action, _)| match action {
                FeedbackAction::Audio { clip, .. } => Some(clip.clone()),
                _ => None,
            })
            .collect()
    }

    /// VFX effect names, in execution order.
    pub fn effects(&self) -> Vec<String> {
        self.executed
            .borrow()
            .iter()
            .filter_map(|(action, _)| match action {
                FeedbackAction::Vfx { effect } => Some(effect.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of executed actions.
    pub fn len(&self) -> usize {
        self.executed.borrow().len()
    }

    /// True when nothing was executed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ActionSink for RecordingSink {
    fn execute(&mut self, action: &FeedbackAction, context: &ActionContext) {
        self.executed
            .borrow_mut()
            .push((action.clone(), *context));
    }
}
