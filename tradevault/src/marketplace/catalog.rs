//! In-memory listing catalog and reconciliation with freshly discovered listings.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use super::Listing;

/// Merge freshly discovered listings with previously known ones.
///
/// Fresh entries win on identifier collision (case-insensitive), prior
/// entries the fetch did not rediscover are kept, and anything in `hidden`
/// is dropped regardless of where it came from. Order: fresh entries first
/// in discovery order, then surviving prior entries in their prior order.
pub fn reconcile_listings(
    fresh: Vec<Listing>,
    prior: &[Listing],
    hidden: &BTreeSet<String>,
) -> Vec<Listing> {
    let mut merged: Vec<Listing> = Vec::with_capacity(fresh.len() + prior.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for listing in fresh {
        let key = listing.key();
        if hidden.contains(&key) {
            continue;
        }
        match positions.get(&key) {
            Some(&idx) => merged[idx] = listing,
            None => {
                positions.insert(key, merged.len());
                merged.push(listing);
            }
        }
    }

    for listing in prior {
        let key = listing.key();
        if positions.contains_key(&key) || hidden.contains(&key) {
            continue;
        }
        positions.insert(key, merged.len());
        merged.push(listing.clone());
    }

    merged
}

/// Shared listing catalog.
///
/// Clones share the same underlying storage. Identifiers are unique
/// (case-insensitive) within the catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    listings: Arc<RwLock<Vec<Listing>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog pre-populated with `listings`.
    pub fn with_listings(listings: Vec<Listing>) -> Self {
        let deduped = reconcile_listings(listings, &[], &BTreeSet::new());
        Self {
            listings: Arc::new(RwLock::new(deduped)),
        }
    }

    /// Snapshot of all listings.
    pub async fn snapshot(&self) -> Vec<Listing> {
        self.listings.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.listings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.listings.read().await.is_empty()
    }

    /// Find a listing by resource identifier (case-insensitive).
    pub async fn get(&self, resource: &str) -> Option<Listing> {
        self.listings
            .read()
            .await
            .iter()
            .find(|l| l.matches(resource))
            .cloned()
    }

    /// Insert a just-published listing at the front, replacing any entry with the same key.
    pub async fn prepend(&self, listing: Listing) {
        let key = listing.key();
        let mut listings = self.listings.write().await;
        listings.retain(|l| l.key() != key);
        listings.insert(0, listing);
        debug!("Catalog now holds {} listings", listings.len());
    }

    /// Remove a listing. Returns the removed entry, if any.
    pub async fn remove(&self, resource: &str) -> Option<Listing> {
        let mut listings = self.listings.write().await;
        let idx = listings.iter().position(|l| l.matches(resource))?;
        Some(listings.remove(idx))
    }

    /// Record the application authorized on a resource. Returns `false` if no listing matched.
    pub async fn attach_authorized_app(&self, resource: &str, app: &str) -> bool {
        let mut listings = self.listings.write().await;
        let mut updated = false;
        for listing in listings.iter_mut().filter(|l| l.matches(resource)) {
            listing.authorized_app = Some(app.to_string());
            updated = true;
        }
        if updated {
            info!("Attached authorized app {} to listing {}", app, resource);
        }
        updated
    }

    /// Reconcile the catalog against freshly discovered listings.
    pub async fn reconcile(&self, fresh: Vec<Listing>, hidden: &BTreeSet<String>) -> usize {
        let mut listings = self.listings.write().await;
        let fresh_count = fresh.len();
        *listings = reconcile_listings(fresh, &listings, hidden);
        info!(
            "Reconciled {} fresh listings into catalog of {}",
            fresh_count,
            listings.len()
        );
        listings.len()
    }
}
