// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for EchoCare crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`haptics`] - Recording haptics back end
//! - [`body`] - Scripted pose tracks and confidence providers
//! - [`sink`] - Recording action sink
//! - [`rules`] - Fluent feedback rule builder

pub mod body;
pub mod config;
pub mod haptics;
pub mod rules;
pub mod sink;

// Re-export commonly used items at crate root for convenience
pub use body::{ScriptedBody, StaticConfidence};
pub use config::InMemoryConfigStore;
pub use haptics::{HapticsCall, RecordingHaptics};
pub use rules::RuleBuilder;
pub use sink::RecordingSink;
