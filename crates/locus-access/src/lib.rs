//! # locus-access
//!
//! Location-scoped access control.
//!
//! This crate provides:
//! - A codec for location grant bit-vectors carried in token claims
//! - A location directory backed by a REST service or an identity-admin API
//! - A directory cache over an in-memory or Redis store
//! - A facade combining listing and authorization checks
//!
//! ## Grants
//!
//! A principal's token carries a base64 claim (default `location_grants`)
//! that decodes to a little-endian bitset. Bit 0 grants every location;
//! bit `i` grants location `i`. A missing or undecodable claim grants nothing.
//!
//! ## Modules
//!
//! - [`config`] - Cache, directory, grant and logging configuration
//! - [`error`] - Error type and categories
//! - [`record`] - Location record model
//! - [`grants`] - Grant bit-vector codec and resolver
//! - [`directory`] - Location sources and the directory provider
//! - [`cache`] - Directory cache and key-value stores
//! - [`facade`] - The [`LocationAccess`] entry point

pub mod cache;
pub mod config;
pub mod directory;
pub mod error;
pub mod facade;
pub mod grants;
pub mod record;

pub use cache::{CacheStore, DirectoryCache, MemoryStore, RedisStore, create_store};
pub use config::{
    CacheConfig, CacheStoreKind, DIRECTORY_CACHE_KEY, DirectoryBackend, DirectoryConfig,
    GrantsConfig, IdentityAdminConfig, LocationAccessConfig, LoggingConfig, RedisConfig,
    RestSourceConfig,
};
pub use directory::{
    IdentityAdminSource, LocationDirectoryProvider, LocationSource, RestSource,
    RoleRepresentation, build_source,
};
pub use error::{ErrorCategory, LocationError};
pub use facade::{LocationAccess, LocationAccessFacade};
pub use grants::{
    ALL_LOCATIONS_BIT, GrantVector, GrantedLocationResolver, MAX_ENCODABLE_ID, PrincipalClaims,
};
pub use record::{Address, CustomAttribute, Directory, LocationRecord, directory_from};

/// Type alias for location access results.
pub type LocationResult<T> = Result<T, LocationError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use locus_access::prelude::*;
/// ```
pub mod prelude {
    pub use crate::LocationResult;
    pub use crate::config::LocationAccessConfig;
    pub use crate::error::{ErrorCategory, LocationError};
    pub use crate::facade::{LocationAccess, LocationAccessFacade};
    pub use crate::grants::{GrantVector, PrincipalClaims};
    pub use crate::record::{Directory, LocationRecord};
}
