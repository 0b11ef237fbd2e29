//! Strategy listings shown in the catalog.

use serde::{Deserialize, Serialize};

use super::price::format_rlc;
use crate::traits::{SystemTimeProvider, TimeProvider};

/// A marketplace listing for a protected strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Catalog identifier (the protected-resource address once published)
    pub id: String,

    /// Title of the strategy (publicly visible)
    pub title: String,

    /// Traded asset the strategy targets (e.g. `BTC`)
    pub asset: String,

    /// Address of the seller that owns the protected resource
    pub owner: String,

    /// Price per run in nRLC
    pub price_nrlc: u64,

    /// Number of buyer reviews
    pub reviews: u32,

    /// Application currently authorized to process the protected resource
    pub authorized_app: Option<String>,

    /// Address of the protected resource holding the encrypted strategy
    pub protected_address: Option<String>,

    /// Free-form labels shown on the card
    #[serde(default)]
    pub tags: Vec<String>,

    /// Unix timestamp when the listing was created locally or discovered
    pub published_at: u64,
}

impl Listing {
    /// Create a new listing builder
    pub const fn builder() -> ListingBuilder<SystemTimeProvider> {
        ListingBuilder::new(SystemTimeProvider::new())
    }

    /// Create a new listing builder with a custom time provider
    pub const fn builder_with_time<T: TimeProvider>(time: T) -> ListingBuilder<T> {
        ListingBuilder::new(time)
    }

    /// Case-insensitive catalog key: the protected address, else the id.
    pub fn key(&self) -> String {
        self.protected_address
            .as_deref()
            .filter(|a| !a.is_empty())
            .unwrap_or(&self.id)
            .to_lowercase()
    }

    /// Whether this listing refers to `resource` (case-insensitive).
    pub fn matches(&self, resource: &str) -> bool {
        self.key() == resource.trim().to_lowercase()
    }

    /// Whether `address` owns this listing (case-insensitive).
    pub fn is_owned_by(&self, address: &str) -> bool {
        !address.is_empty() && self.owner.eq_ignore_ascii_case(address.trim())
    }

    /// Price rendered in RLC.
    pub fn price_display(&self) -> String {
        format_rlc(self.price_nrlc)
    }
}

/// Builder for creating new listings
pub struct ListingBuilder<T: TimeProvider> {
    time: T,
    id: Option<String>,
    title: Option<String>,
    asset: Option<String>,
    owner: Option<String>,
    price_nrlc: u64,
    reviews: u32,
    authorized_app: Option<String>,
    protected_address: Option<String>,
    tags: Vec<String>,
}

impl<T: TimeProvider> ListingBuilder<T> {
    /// Create a new builder with a time provider
    pub const fn new(time: T) -> Self {
        Self {
            time,
            id: None,
            title: None,
            asset: None,
            owner: None,
            price_nrlc: 0,
            reviews: 0,
            authorized_app: None,
            protected_address: None,
            tags: Vec::new(),
        }
    }

    /// Set both the id and the protected address.
    #[must_use]
    pub fn protected_address(mut self, address: impl Into<String>) -> Self {
        let address = address.into();
        self.id = Some(address.clone());
        self.protected_address = Some(address);
        self
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn asset(mut self, asset: impl Into<String>) -> Self {
        self.asset = Some(asset.into());
        self
    }

    #[must_use]
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    #[must_use]
    pub const fn price_nrlc(mut self, price: u64) -> Self {
        self.price_nrlc = price;
        self
    }

    #[must_use]
    pub const fn reviews(mut self, reviews: u32) -> Self {
        self.reviews = reviews;
        self
    }

    #[must_use]
    pub fn authorized_app(mut self, app: Option<String>) -> Self {
        self.authorized_app = app.filter(|a| !a.trim().is_empty());
        self
    }

    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Build the listing (returns error if required fields are missing)
    pub fn build(self) -> Result<Listing, String> {
        Ok(Listing {
            id: self.id.ok_or("id is required")?,
            title: self.title.ok_or("title is required")?,
            asset: self.asset.unwrap_or_else(|| "BTC".to_string()),
            owner: self.owner.ok_or("owner is required")?,
            price_nrlc: self.price_nrlc,
            reviews: self.reviews,
            authorized_app: self.authorized_app,
            protected_address: self.protected_address,
            tags: self.tags,
            published_at: self.time.now_unix(),
        })
    }
}
