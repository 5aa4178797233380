// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scenario replay for EchoCare interaction logic.
//!
//! A scenario is a JSON file of recorded host callbacks (grabs, held
//! frames, releases, interaction events, ticks). Replaying it through the
//! estimator and the feedback router yields one [`ReplayRecord`] per visible
//! result, which the binary prints as JSON lines.
#![forbid(unsafe_code)]

pub mod ports;
pub mod replay;
pub mod scenario;

pub use replay::{ReplayRecord, Replayer};
pub use scenario::{load_scenario, Scenario, Step};
