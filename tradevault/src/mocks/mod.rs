//! Mock implementations for testing.
//!
//! This module provides mock implementations of the trait abstractions
//! that allow unit testing without a wallet, a network or durable storage.

pub mod archive;
pub mod compute;
pub mod session;
pub mod storage;
pub mod time;

pub use archive::{make_test_zip, TestZipEntry};
pub use compute::{make_test_address, MockComputeNetwork};
pub use session::MockWallet;
pub use storage::MemoryStore;
pub use time::MockTime;
