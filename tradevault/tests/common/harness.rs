//! Two-party marketplace harness.
//!
//! The seller and the buyer each get their own `SharedAppState` (own
//! wallet, own catalog, own local storage) over one shared mock network.

use std::time::Duration;

use tradevault::actions::{publish_strategy, PublishRequest, PublishResult};
use tradevault::mocks::{MemoryStore, MockComputeNetwork, MockTime, MockWallet};
use tradevault::{SharedAppState, VaultConfig};

pub const SELLER: &str = "0x5e11e70000000000000000000000000000000001";
pub const BUYER: &str = "0xb0b0000000000000000000000000000000000002";
pub const TEST_APP: &str = "0xa990000000000000000000000000000000000003";

pub type TestState = SharedAppState<MockComputeNetwork, MockWallet, MockTime, MemoryStore>;

#[allow(dead_code)]
pub struct MarketplaceHarness {
    pub network: MockComputeNetwork,
    pub time: MockTime,
    pub seller_wallet: MockWallet,
    pub buyer_wallet: MockWallet,
    pub seller: TestState,
    pub buyer: TestState,
    pub buyer_store: MemoryStore,
}

#[allow(dead_code)]
impl MarketplaceHarness {
    pub async fn new() -> Self {
        let network = MockComputeNetwork::new();
        network.set_owner(SELLER).await;
        let time = MockTime::new(1_000);
        let config = VaultConfig {
            authorized_app: TEST_APP.to_string(),
            auto_load_listings: true,
            grant_retry_delay_ms: 4000,
            ..VaultConfig::default()
        };

        let seller_wallet = MockWallet::new(SELLER);
        let buyer_wallet = MockWallet::new(BUYER);
        let buyer_store = MemoryStore::new();

        let seller = SharedAppState::new(
            config.clone(),
            network.clone(),
            seller_wallet.clone(),
            time.clone(),
            MemoryStore::new(),
        );
        let buyer = SharedAppState::new(
            config,
            network.clone(),
            buyer_wallet.clone(),
            time.clone(),
            buyer_store.clone(),
        );

        Self {
            network,
            time,
            seller_wallet,
            buyer_wallet,
            seller,
            buyer,
            buyer_store,
        }
    }

    /// Publish a strategy as the seller.
    pub async fn publish(&self, title: &str, price_rlc: f64) -> PublishResult {
        publish_strategy(
            &self.seller,
            PublishRequest {
                title: title.to_string(),
                asset: "BTC".to_string(),
                price_rlc: Some(price_rlc),
                file_name: "strategy.py".to_string(),
                file_bytes: b"def decide(prices):\n    return 'BUY'\n".to_vec(),
            },
        )
        .await
        .expect("publish should succeed")
    }

    /// Retry delays taken so far.
    pub fn delays(&self) -> Vec<Duration> {
        self.time.sleeps()
    }
}
