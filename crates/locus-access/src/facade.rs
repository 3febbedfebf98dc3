//! Single entry point for application code.
//!
//! # Example
//!
//! ```ignore
//! use locus_access::{LocationAccess, LocationAccessConfig, LocationAccessFacade};
//!
//! let config = LocationAccessConfig::load("locus.toml")?;
//! let access = LocationAccessFacade::from_config(&config).await?;
//!
//! // `claims` are the verified token claims of the current request
//! if access.is_granted(&claims, 12) {
//!     // act on location 12
//! }
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::LocationResult;
use crate::cache::{CacheStore, DirectoryCache, create_store};
use crate::config::LocationAccessConfig;
use crate::directory::LocationDirectoryProvider;
use crate::grants::{GrantedLocationResolver, PrincipalClaims};
use crate::record::{Directory, LocationRecord};

/// Location listing and authorization, independent of backend and store.
#[async_trait]
pub trait LocationAccess: Send + Sync {
    /// Every known location. Empty while the backend is unavailable.
    async fn list_all(&self) -> LocationResult<Directory>;

    /// One location by id.
    async fn find_by_id(&self, id: u64) -> LocationResult<Option<LocationRecord>>;

    /// Every location id the principal is granted.
    async fn granted_ids(&self, claims: &dyn PrincipalClaims) -> LocationResult<BTreeSet<u64>>;

    /// `true` if the principal is granted every location.
    fn is_granted_all(&self, claims: &dyn PrincipalClaims) -> bool;

    /// `true` if the principal is granted at least one of `ids`.
    fn is_granted_any(&self, claims: &dyn PrincipalClaims, ids: &[u64]) -> bool;

    /// `true` if the principal is granted location `id`.
    fn is_granted(&self, claims: &dyn PrincipalClaims, id: u64) -> bool;
}

/// Default [`LocationAccess`] implementation composing the directory
/// provider and the grant resolver.
#[derive(Clone)]
pub struct LocationAccessFacade {
    directory: LocationDirectoryProvider,
    resolver: GrantedLocationResolver,
}

impl LocationAccessFacade {
    #[must_use]
    pub fn new(directory: LocationDirectoryProvider, resolver: GrantedLocationResolver) -> Self {
        Self {
            directory,
            resolver,
        }
    }

    /// Wires the subsystem from configuration, creating the configured store.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error for invalid settings and a `Cache`
    /// error if the Redis store cannot be reached.
    pub async fn from_config(config: &LocationAccessConfig) -> LocationResult<Self> {
        config.validate()?;
        let store = create_store(&config.cache).await?;
        Self::with_store(config, store)
    }

    /// Wires the subsystem from configuration over an existing store.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if the directory backend is
    /// misconfigured.
    pub fn with_store(
        config: &LocationAccessConfig,
        store: Arc<dyn CacheStore>,
    ) -> LocationResult<Self> {
        let cache = DirectoryCache::new(store, &config.cache);
        let directory = LocationDirectoryProvider::from_config(&config.directory, cache)?;
        let resolver = GrantedLocationResolver::new(&config.grants, directory.clone());
        Ok(Self::new(directory, resolver))
    }

    /// The directory provider, for cache maintenance.
    #[must_use]
    pub fn directory(&self) -> &LocationDirectoryProvider {
        &self.directory
    }

    /// The grant resolver.
    #[must_use]
    pub fn resolver(&self) -> &GrantedLocationResolver {
        &self.resolver
    }
}

#[async_trait]
impl LocationAccess for LocationAccessFacade {
    async fn list_all(&self) -> LocationResult<Directory> {
        self.directory.find_all().await
    }

    async fn find_by_id(&self, id: u64) -> LocationResult<Option<LocationRecord>> {
        self.directory.find_by_id(id).await
    }

    async fn granted_ids(&self, claims: &dyn PrincipalClaims) -> LocationResult<BTreeSet<u64>> {
        self.resolver.granted_location_ids(claims).await
    }

    fn is_granted_all(&self, claims: &dyn PrincipalClaims) -> bool {
        self.resolver.is_granted_all(claims)
    }

    fn is_granted_any(&self, claims: &dyn PrincipalClaims, ids: &[u64]) -> bool {
        self.resolver.is_granted_any(claims, ids.iter().copied())
    }

    fn is_granted(&self, claims: &dyn PrincipalClaims, id: u64) -> bool {
        self.resolver.is_granted(claims, id)
    }
}
