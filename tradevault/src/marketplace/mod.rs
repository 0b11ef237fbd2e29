pub mod catalog;
pub mod discovery;
pub mod hidden;
pub mod listing;
pub mod price;

pub use catalog::{reconcile_listings, Catalog};
pub use discovery::{discover_listings, PublishedResource};
pub use hidden::HiddenSet;
pub use listing::{Listing, ListingBuilder};
pub use price::{format_rlc, normalize_rlc_input, rlc_to_nrlc};
