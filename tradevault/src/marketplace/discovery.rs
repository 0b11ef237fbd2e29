//! Turning published protected resources into catalog listings.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::Listing;
use crate::config::STRATEGY_PAYLOAD_KEY;
use crate::error::{VaultError, VaultResult};
use crate::traits::{ComputeNetwork, TimeProvider};

/// A protected resource as reported by the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedResource {
    /// Protected-resource address
    pub address: String,
    /// Name chosen at publication time
    #[serde(default)]
    pub name: Option<String>,
    /// Owner account
    pub owner: String,
    /// Payload schema: entry name to type (or nested schema)
    #[serde(default)]
    pub schema: Map<String, Value>,
}

impl PublishedResource {
    /// Whether the schema describes a packaged or stepwise strategy.
    pub fn is_strategy(&self) -> bool {
        let s = &self.schema;
        let step1_typed = matches!(
            s.get("step1").and_then(Value::as_str),
            Some("string") | Some("file")
        );
        s.contains_key("file-key")
            || s.contains_key("strategy_json")
            || s.contains_key(STRATEGY_PAYLOAD_KEY)
            || step1_typed
    }

    /// Display title: the resource name, or a short address-derived label.
    pub fn display_title(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!(
                "Strategy {}",
                self.address.chars().take(6).collect::<String>()
            ),
        }
    }
}

/// Discover strategy listings among the resources visible on the network.
///
/// The authorized application of each listing is read from its first
/// access grant; a failure to list grants leaves it unset.
pub async fn discover_listings<N, T>(network: &N, time: &T) -> VaultResult<Vec<Listing>>
where
    N: ComputeNetwork,
    T: TimeProvider,
{
    let resources = network
        .list_published_resources()
        .await
        .map_err(|e| VaultError::Network(format!("Failed to list protected data: {e}")))?;

    let total = resources.len();
    let mut listings = Vec::new();
    for resource in resources.into_iter().filter(PublishedResource::is_strategy) {
        let authorized_app = match network.list_access_grants(&resource.address).await {
            Ok(grants) => grants.into_iter().next().and_then(|g| g.app_restrict),
            Err(e) => {
                warn!("Failed to read grants for {}: {}", resource.address, e);
                None
            }
        };

        let listing = Listing::builder_with_time(time.clone())
            .protected_address(resource.address.clone())
            .title(resource.display_title())
            .owner(resource.owner.clone())
            .authorized_app(authorized_app)
            .tags(["protected"])
            .build()
            .map_err(VaultError::Validation)?;
        debug!("Discovered listing '{}' at {}", listing.title, resource.address);
        listings.push(listing);
    }

    info!("Discovered {} strategy listings among {} resources", listings.len(), total);
    Ok(listings)
}
