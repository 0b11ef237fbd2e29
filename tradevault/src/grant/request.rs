use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_GRANT_PRICE_NRLC, DEFAULT_GRANT_VOLUME, ZERO_ADDRESS};
use crate::error::{VaultError, VaultResult};

pub const MISSING_RESOURCE: &str = "No protected data address provided.";
pub const MISSING_AUTHORIZED_APP: &str = "No authorized app address provided.";

/// Access-grant request for an application/user pair on a protected resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantRequest {
    pub protected_data: String,
    pub authorized_app: String,
    /// [`ZERO_ADDRESS`] means "any user".
    pub authorized_user: String,
    /// Price per access in nRLC.
    pub price_per_access: u64,
    /// Number of accesses, at least 1.
    pub number_of_access: u64,
}

impl GrantRequest {
    /// Validate and normalize a grant request.
    ///
    /// Negative prices fall back to [`DEFAULT_GRANT_PRICE_NRLC`] and volumes
    /// below 1 to [`DEFAULT_GRANT_VOLUME`]. A blank user becomes the "any
    /// user" sentinel.
    pub fn new(
        protected_data: &str,
        authorized_app: &str,
        authorized_user: &str,
        price_per_access: i64,
        number_of_access: i64,
    ) -> VaultResult<Self> {
        let protected_data = protected_data.trim();
        if protected_data.is_empty() {
            return Err(VaultError::Precondition(MISSING_RESOURCE.to_string()));
        }
        let authorized_app = authorized_app.trim();
        if authorized_app.is_empty() {
            return Err(VaultError::Precondition(MISSING_AUTHORIZED_APP.to_string()));
        }
        let authorized_user = match authorized_user.trim() {
            "" => ZERO_ADDRESS,
            user => user,
        };

        Ok(Self {
            protected_data: protected_data.to_string(),
            authorized_app: authorized_app.to_string(),
            authorized_user: authorized_user.to_string(),
            price_per_access: u64::try_from(price_per_access).unwrap_or(DEFAULT_GRANT_PRICE_NRLC),
            number_of_access: u64::try_from(number_of_access)
                .ok()
                .filter(|v| *v >= 1)
                .unwrap_or(DEFAULT_GRANT_VOLUME),
        })
    }
}

/// Grant record returned by the network.
///
/// Field names follow the network's order format; every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrantOutcome {
    pub dataset: Option<String>,
    #[serde(rename = "datasetprice")]
    pub dataset_price: Option<u64>,
    pub volume: Option<u64>,
    #[serde(rename = "apprestrict")]
    pub app_restrict: Option<String>,
    #[serde(rename = "workerpoolrestrict")]
    pub workerpool_restrict: Option<String>,
    #[serde(rename = "requesterrestrict")]
    pub requester_restrict: Option<String>,
}

impl GrantOutcome {
    /// Effective price, falling back to the requested one.
    pub fn effective_price(&self, requested: u64) -> u64 {
        self.dataset_price.unwrap_or(requested)
    }

    /// Effective volume, falling back to the requested one when absent or zero.
    pub fn effective_volume(&self, requested: u64) -> u64 {
        self.volume.filter(|v| *v > 0).unwrap_or(requested)
    }
}
