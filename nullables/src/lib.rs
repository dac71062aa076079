//! Nullable infrastructure for deterministic testing.
//!
//! Inspired by the "A-frame architecture" pattern from RsNano.
//! Every external collaborator of the orchestrator (result store, callback
//! target, vendor services) sits behind a trait. This crate provides
//! test-friendly implementations that:
//! - Return scripted values
//! - Record every call for assertions
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod notifier;
pub mod store;
pub mod vendor;

pub use notifier::NullNotifier;
pub use store::NullResultStore;
pub use vendor::{Script, ScriptedVendor};
