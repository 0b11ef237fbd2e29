mod harness;

pub use harness::{MarketplaceHarness, TestState, BUYER, SELLER, TEST_APP};
