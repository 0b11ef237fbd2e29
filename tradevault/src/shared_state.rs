//! Shared application state handed to every entry point.
//!
//! `SharedAppState` bundles the catalog, the hidden set and the grant
//! coordinator together with the collaborators they talk to. Clones share
//! the same catalog, hidden-set storage and grant workflow flag.

use crate::config::VaultConfig;
use crate::grant::{AccessGrantCoordinator, RetryPolicy};
use crate::job::JobRunOrchestrator;
use crate::marketplace::{Catalog, HiddenSet};
use crate::traits::{ComputeNetwork, KeyValueStore, TimeProvider, WalletSession};

#[derive(Clone)]
pub struct SharedAppState<N, S, T, K>
where
    N: ComputeNetwork,
    S: WalletSession,
    T: TimeProvider,
    K: KeyValueStore,
{
    pub config: VaultConfig,
    pub network: N,
    pub session: S,
    pub time: T,
    pub catalog: Catalog,
    pub hidden: HiddenSet<K>,
    pub grants: AccessGrantCoordinator<N, S, T>,
}

impl<N, S, T, K> SharedAppState<N, S, T, K>
where
    N: ComputeNetwork,
    S: WalletSession,
    T: TimeProvider,
    K: KeyValueStore,
{
    pub fn new(config: VaultConfig, network: N, session: S, time: T, store: K) -> Self {
        let catalog = Catalog::new();
        let grants = AccessGrantCoordinator::new(
            network.clone(),
            session.clone(),
            time.clone(),
            catalog.clone(),
        )
        .with_policy(RetryPolicy::from_config(&config))
        .with_authorized_app(config.authorized_app.clone());

        Self {
            config,
            network,
            session,
            time,
            catalog,
            hidden: HiddenSet::new(store),
            grants,
        }
    }

    /// A fresh orchestrator for one run view.
    pub fn job_runner(&self) -> JobRunOrchestrator<N, S> {
        JobRunOrchestrator::new(self.network.clone(), self.session.clone())
            .with_explorer_slug(self.config.explorer_slug.clone())
    }

    /// Connected account address, if any.
    pub fn current_address(&self) -> Option<String> {
        self.session
            .address()
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
    }
}
