// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for EchoCare hosts.
//! Keeps engine adapters thin: they hand a [`config::ConfigStore`] to the
//! interaction core and never parse configuration blobs themselves.

pub mod config;
