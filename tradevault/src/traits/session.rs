//! Wallet session abstraction.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Raw transaction handed to the wallet for signing and broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub from: String,
    pub to: String,
    pub data: String,
    /// Hex-encoded value in wei.
    pub value: String,
}

/// Abstraction over the connected wallet.
///
/// The session is "ready" once it exposes a non-empty address.
#[async_trait]
pub trait WalletSession: Send + Sync + Clone {
    /// Address of the connected account, if any.
    fn address(&self) -> Option<String>;

    /// Whether a consumer session is available.
    fn is_ready(&self) -> bool {
        self.address().is_some_and(|a| !a.trim().is_empty())
    }

    /// Sign and send a raw transaction. Returns the transaction hash.
    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<String>;
}
