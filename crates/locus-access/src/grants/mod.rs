//! Granted-location resolution.
//!
//! The [`GrantedLocationResolver`] answers, for one principal, whether they
//! are granted all locations, a given location, any of a set of locations,
//! and (when needed) the full granted set. The principal's claims are passed
//! in explicitly on every call.
//!
//! Every decision is fail-closed: a missing claim, a non-string claim or a
//! claim that is not base64 grants nothing.

pub mod vector;

use std::collections::{BTreeSet, HashMap};

pub use vector::{ALL_LOCATIONS_BIT, GrantVector, MAX_ENCODABLE_ID};

use crate::LocationResult;
use crate::config::GrantsConfig;
use crate::directory::LocationDirectoryProvider;

/// Read access to a principal's token claims.
pub trait PrincipalClaims: Send + Sync {
    /// Returns the string value of claim `name`, if present.
    fn string_claim(&self, name: &str) -> Option<&str>;
}

impl PrincipalClaims for serde_json::Map<String, serde_json::Value> {
    fn string_claim(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(serde_json::Value::as_str)
    }
}

impl PrincipalClaims for serde_json::Value {
    fn string_claim(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(serde_json::Value::as_str)
    }
}

impl PrincipalClaims for HashMap<String, serde_json::Value> {
    fn string_claim(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(serde_json::Value::as_str)
    }
}

impl PrincipalClaims for HashMap<String, String> {
    fn string_claim(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Decodes grant claims into authorization decisions.
#[derive(Clone)]
pub struct GrantedLocationResolver {
    claim_name: String,
    directory: LocationDirectoryProvider,
}

impl GrantedLocationResolver {
    /// Creates a resolver reading `config.claim_name`.
    ///
    /// `directory` is only consulted when a principal holds the "all" grant.
    #[must_use]
    pub fn new(config: &GrantsConfig, directory: LocationDirectoryProvider) -> Self {
        Self {
            claim_name: config.claim_name.clone(),
            directory,
        }
    }

    /// The claim this resolver reads.
    #[must_use]
    pub fn claim_name(&self) -> &str {
        &self.claim_name
    }

    /// Decodes the principal's grant vector, empty on any problem.
    pub fn grant_vector<C>(&self, claims: &C) -> GrantVector
    where
        C: PrincipalClaims + ?Sized,
    {
        let Some(value) = claims.string_claim(&self.claim_name) else {
            tracing::trace!(claim = %self.claim_name, "No grant claim, granting nothing");
            return GrantVector::empty();
        };

        GrantVector::decode(value).unwrap_or_else(|e| {
            tracing::debug!(claim = %self.claim_name, error = %e, "Ignoring undecodable grant claim");
            GrantVector::empty()
        })
    }

    /// `true` if the principal is granted every location.
    pub fn is_granted_all<C>(&self, claims: &C) -> bool
    where
        C: PrincipalClaims + ?Sized,
    {
        self.grant_vector(claims).is_granted_all()
    }

    /// `true` if the principal is granted location `id`. Id 0 is never granted.
    pub fn is_granted<C>(&self, claims: &C, id: u64) -> bool
    where
        C: PrincipalClaims + ?Sized,
    {
        self.grant_vector(claims).is_granted(id)
    }

    /// `true` if the principal is granted at least one of `ids`.
    pub fn is_granted_any<C>(&self, claims: &C, ids: impl IntoIterator<Item = u64>) -> bool
    where
        C: PrincipalClaims + ?Sized,
    {
        self.grant_vector(claims).is_granted_any(ids)
    }

    /// Returns every location id the principal is granted.
    ///
    /// For the "all" grant this is the directory's id set, not anything the
    /// vector encodes.
    ///
    /// # Errors
    ///
    /// Only for the "all" grant, when loading the directory fails (see
    /// [`LocationDirectoryProvider::find_all`]).
    pub async fn granted_location_ids<C>(&self, claims: &C) -> LocationResult<BTreeSet<u64>>
    where
        C: PrincipalClaims + ?Sized,
    {
        let vector = self.grant_vector(claims);
        if vector.is_granted_all() {
            return self.directory.find_all_ids().await;
        }
        Ok(vector.explicit_ids())
    }
}
