//! Marketplace flows shared by the binaries and the integration tests.
//!
//! Publishing a strategy, delisting it, refreshing the catalog from the
//! network and executing a transaction extracted from a job result.

use std::collections::BTreeMap;
use std::io::{Cursor, Write};

use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::config::{DEFAULT_GRANT_VOLUME, STRATEGY_ENTRY_NAME, STRATEGY_PAYLOAD_KEY};
use crate::error::{VaultError, VaultResult};
use crate::grant::WorkflowResult;
use crate::marketplace::{discover_listings, normalize_rlc_input, rlc_to_nrlc, Listing};
use crate::result::ExecutableAction;
use crate::shared_state::SharedAppState;
use crate::traits::{ComputeNetwork, KeyValueStore, TimeProvider, TransactionRequest, WalletSession};

/// Listing price used when the seller leaves it blank or invalid.
pub const DEFAULT_PRICE_RLC: f64 = 0.02;
const DEFAULT_TITLE: &str = "DeFi Strategy";
const DEFAULT_ASSET: &str = "BTC";

/// Seller input for a new strategy listing.
#[derive(Debug, Clone, Default)]
pub struct PublishRequest {
    pub title: String,
    pub asset: String,
    pub price_rlc: Option<f64>,
    /// Original name of the uploaded file (must end in `.py`).
    pub file_name: String,
    pub file_bytes: Vec<u8>,
}

/// Result of publishing a strategy.
#[derive(Debug, Clone)]
pub struct PublishResult {
    pub listing: Listing,
    pub grant: WorkflowResult,
}

/// Package a strategy source file into a zip archive under the fixed entry name.
pub fn package_strategy(source: &[u8]) -> VaultResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file(STRATEGY_ENTRY_NAME, SimpleFileOptions::default())?;
    writer
        .write_all(source)
        .map_err(|e| VaultError::Storage(format!("Failed to package strategy: {e}")))?;
    Ok(writer.finish()?.into_inner())
}

/// Publish a strategy and grant the authorized application access to it.
///
/// The new listing is prepended to the catalog before the grant workflow
/// runs, so a failed grant leaves a listing without an authorized app.
pub async fn publish_strategy<N, S, T, K>(
    state: &SharedAppState<N, S, T, K>,
    request: PublishRequest,
) -> VaultResult<PublishResult>
where
    N: ComputeNetwork,
    S: WalletSession,
    T: TimeProvider,
    K: KeyValueStore,
{
    let owner = state.current_address().ok_or_else(|| {
        VaultError::Precondition("Please connect your wallet before listing.".to_string())
    })?;
    if !request.file_name.trim().ends_with(".py") {
        return Err(VaultError::Validation(
            "Please upload a valid .py Python strategy file.".to_string(),
        ));
    }

    let price_rlc = normalize_rlc_input(request.price_rlc.unwrap_or(DEFAULT_PRICE_RLC), DEFAULT_PRICE_RLC);
    let price_nrlc = rlc_to_nrlc(price_rlc);
    let title = match request.title.trim() {
        "" => DEFAULT_TITLE.to_string(),
        t => t.to_string(),
    };

    let archive = package_strategy(&request.file_bytes)?;
    let payload = BTreeMap::from([(STRATEGY_PAYLOAD_KEY.to_string(), archive)]);
    let resource = state
        .network
        .publish_resource(&title, &payload)
        .await
        .map_err(|e| VaultError::Network(format!("Failed to protect strategy: {e}")))?;
    info!("Published strategy '{}' as {}", title, resource.address);

    let asset = match request.asset.trim() {
        "" => DEFAULT_ASSET,
        a => a,
    };
    let listing = Listing::builder_with_time(state.time.clone())
        .protected_address(resource.address.clone())
        .title(title)
        .asset(asset)
        .owner(owner)
        .price_nrlc(price_nrlc)
        .tags(["DeFi", "Calldata"])
        .build()
        .map_err(VaultError::Validation)?;
    state.catalog.prepend(listing).await;

    let grant = state
        .grants
        .auto_grant_after_publish(&resource.address, price_nrlc, DEFAULT_GRANT_VOLUME)
        .await;
    if !matches!(grant, WorkflowResult::Granted { .. }) {
        warn!("Automatic grant for {} did not complete: {:?}", resource.address, grant);
    }

    let listing = state
        .catalog
        .get(&resource.address)
        .await
        .ok_or_else(|| VaultError::NotFound(resource.address.clone()))?;
    Ok(PublishResult { listing, grant })
}

/// Revoke all access to an owned listing and hide it locally.
///
/// A failure to persist the hidden set is returned after the listing has
/// been revoked and removed; it stays hidden for the current session.
pub async fn delist<N, S, T, K>(state: &SharedAppState<N, S, T, K>, listing: &Listing) -> VaultResult<()>
where
    N: ComputeNetwork,
    S: WalletSession,
    T: TimeProvider,
    K: KeyValueStore,
{
    let protected = listing
        .protected_address
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| VaultError::Precondition("Listing has no protected data address.".to_string()))?;
    let address = state
        .current_address()
        .ok_or_else(|| VaultError::Precondition("Connect your wallet first".to_string()))?;
    if !listing.is_owned_by(&address) {
        return Err(VaultError::Precondition(
            "You can only delist items you own".to_string(),
        ));
    }

    state
        .network
        .revoke_all_access(protected)
        .await
        .map_err(|e| VaultError::Network(format!("Failed to delist: {e}")))?;
    let persisted = state.hidden.insert(protected);
    state.catalog.remove(protected).await;
    info!("Delisted {}", protected);
    persisted.map(|_| ())
}

/// Discover published strategies and reconcile them into the catalog.
///
/// With `auto_load_listings` off the network is not queried and only the
/// listings published in this session are kept. Returns the catalog size.
pub async fn refresh_catalog<N, S, T, K>(state: &SharedAppState<N, S, T, K>) -> VaultResult<usize>
where
    N: ComputeNetwork,
    S: WalletSession,
    T: TimeProvider,
    K: KeyValueStore,
{
    if !state.config.auto_load_listings {
        let count = state.catalog.len().await;
        debug!("Listing discovery disabled, keeping {} local listings", count);
        return Ok(count);
    }
    let fresh = discover_listings(&state.network, &state.time).await?;
    let hidden = state.hidden.load();
    Ok(state.catalog.reconcile(fresh, &hidden).await)
}

fn validate_hex(field: &str, value: &str, byte_len: Option<usize>) -> VaultResult<()> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| VaultError::Validation(format!("{field} must be 0x-prefixed hex")))?;
    let bytes = hex::decode(digits)
        .map_err(|e| VaultError::Validation(format!("{field} is not valid hex: {e}")))?;
    match byte_len {
        Some(len) if bytes.len() != len => Err(VaultError::Validation(format!(
            "{field} must be {len} bytes, got {}",
            bytes.len()
        ))),
        _ => Ok(()),
    }
}

/// Send the transaction described by an extracted action. Returns the transaction hash.
pub async fn execute_action<S: WalletSession>(
    session: &S,
    action: &ExecutableAction,
) -> VaultResult<String> {
    let from = session
        .address()
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| VaultError::Precondition("Connect your wallet first".to_string()))?;
    let to = action
        .target_contract()
        .ok_or_else(|| VaultError::Validation("Action has no target_contract".to_string()))?;
    let data = action
        .calldata()
        .ok_or_else(|| VaultError::Validation("Action has no calldata".to_string()))?;
    validate_hex("target_contract", to, Some(20))?;
    validate_hex("calldata", data, None)?;

    let tx = TransactionRequest {
        from,
        to: to.to_string(),
        data: data.to_string(),
        value: action.value().to_string(),
    };
    let hash = session
        .send_transaction(&tx)
        .await
        .map_err(|e| VaultError::Submission(format!("Transaction failed: {e}")))?;
    info!("Sent transaction {} to {}", hash, tx.to);
    Ok(hash)
}
