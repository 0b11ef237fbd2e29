//! Mock wallet session for testing.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::traits::{TransactionRequest, WalletSession};

#[derive(Debug, Default)]
struct MockWalletInner {
    address: RwLock<Option<String>>,
    sent: RwLock<Vec<TransactionRequest>>,
    fail_send: RwLock<bool>,
}

/// Mock wallet: a fixed address and a recorder for sent transactions.
#[derive(Debug, Clone, Default)]
pub struct MockWallet {
    inner: Arc<MockWalletInner>,
}

impl MockWallet {
    pub fn new(address: &str) -> Self {
        let wallet = Self::default();
        wallet.connect(address);
        wallet
    }

    /// A wallet with no connected account.
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn connect(&self, address: &str) {
        *self.inner.address.write() = Some(address.to_string());
    }

    pub fn disconnect(&self) {
        *self.inner.address.write() = None;
    }

    pub fn fail_send(&self, fail: bool) {
        *self.inner.fail_send.write() = fail;
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.inner.sent.read().clone()
    }
}

#[async_trait]
impl WalletSession for MockWallet {
    fn address(&self) -> Option<String> {
        self.inner.address.read().clone()
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<String> {
        if *self.inner.fail_send.read() {
            return Err(anyhow!("User rejected the request"));
        }
        let mut sent = self.inner.sent.write();
        sent.push(tx.clone());
        Ok(format!("0x{:064x}", sent.len()))
    }
}
