//! Trait abstractions for dependency injection and testability.
//!
//! This module provides trait-based abstractions for external dependencies,
//! enabling unit testing without requiring a wallet, a confidential-compute
//! network or durable browser-like storage.

pub mod compute;
pub mod session;
pub mod storage;
pub mod time;

// Re-export all traits for crate-internal use.
// The public API surface is controlled by lib.rs re-exports.
pub use compute::{ComputeNetwork, StatusCallback};
pub use session::{TransactionRequest, WalletSession};
pub use storage::{JsonFileStore, KeyValueStore};
pub use time::TimeProvider;

// Re-export default implementations
pub use time::SystemTimeProvider;
