//! Identity provider admin API backend.
//!
//! Each location is a role of one client:
//!
//! - role `name` is the numeric location id
//! - role `description` is the location name
//! - role `attributes` carry the address, flags and timestamps
//!
//! Roles are listed with `GET <admin_base_url>/clients/{client}/roles` and
//! fetched singly with `GET .../roles/{name}`. A role whose name or attributes
//! do not parse fails the whole fetch: a corrupt admin record must not turn
//! into a silently missing location.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use url::Url;

use crate::LocationResult;
use crate::config::IdentityAdminConfig;
use crate::directory::LocationSource;
use crate::directory::http::{BackendClient, join_url};
use crate::error::LocationError;
use crate::record::{Address, CustomAttribute, LocationRecord};

const ATTR_PHONE: &str = "phone";
const ATTR_ADDRESS1: &str = "address1";
const ATTR_ADDRESS2: &str = "address2";
const ATTR_COUNTRY: &str = "country";
const ATTR_COUNTRY_CODE: &str = "countryCode";
const ATTR_PROVINCE: &str = "province";
const ATTR_PROVINCE_CODE: &str = "provinceCode";
const ATTR_ZIP: &str = "zip";
const ATTR_ACTIVE: &str = "active";
const ATTR_ADDRESS_VERIFIED: &str = "addressVerified";
const ATTR_CREATED_AT: &str = "createdAt";
const ATTR_UPDATED_AT: &str = "updatedAt";
const ATTR_DEACTIVATED_AT: &str = "deactivatedAt";

/// Role as returned by the admin API.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleRepresentation {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, Vec<String>>,
}

/// Loads locations from client roles in an identity provider.
pub struct IdentityAdminSource {
    client: BackendClient,
    roles_url: Url,
    custom_attribute_keys: Vec<String>,
}

impl IdentityAdminSource {
    /// Creates an identity admin source.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if the admin base URL or client id is
    /// missing, or the HTTP client cannot be built.
    pub fn new(
        config: &IdentityAdminConfig,
        request_timeout: Duration,
        custom_attribute_keys: Vec<String>,
    ) -> LocationResult<Self> {
        if config.admin_base_url.trim().is_empty() {
            return Err(LocationError::configuration(
                "directory.backend.admin_base_url is required",
            ));
        }
        if config.internal_client_id.trim().is_empty() {
            return Err(LocationError::configuration(
                "directory.backend.internal_client_id is required",
            ));
        }

        let roles_url = join_url(
            &config.admin_base_url,
            &format!("clients/{}/roles", config.internal_client_id.trim()),
        )?;

        Ok(Self {
            client: BackendClient::new(
                "identity_admin",
                request_timeout,
                config.bearer_token.clone(),
            )?,
            roles_url,
            custom_attribute_keys,
        })
    }

    /// Fetches a single location by id.
    ///
    /// Returns `Ok(None)` if the role does not exist.
    ///
    /// # Errors
    ///
    /// Returns `BackendUnavailable` if the call fails and `MalformedRecord` if
    /// the role cannot be converted.
    pub async fn fetch_one(&self, id: u64) -> LocationResult<Option<LocationRecord>> {
        let mut url = self.roles_url.clone();
        url.path_segments_mut()
            .map_err(|()| LocationError::configuration("admin_base_url cannot be a base URL"))?
            .push(&id.to_string());

        let role: Option<RoleRepresentation> = self.client.get_json_optional(&url).await?;
        role.map(|r| self.to_record(&r)).transpose()
    }

    /// Converts a role into a location.
    ///
    /// # Errors
    ///
    /// Returns `MalformedRecord` if the role name is not a positive integer or
    /// a boolean/instant attribute does not parse.
    pub fn to_record(&self, role: &RoleRepresentation) -> LocationResult<LocationRecord> {
        let id = parse_location_id(&role.name)?;
        let attrs = RoleAttributes {
            role: &role.name,
            attributes: &role.attributes,
        };

        let address = Address {
            phone: attrs.string(ATTR_PHONE),
            address1: attrs.string(ATTR_ADDRESS1),
            address2: attrs.string(ATTR_ADDRESS2),
            country: attrs.string(ATTR_COUNTRY),
            country_code: attrs.string(ATTR_COUNTRY_CODE),
            province: attrs.string(ATTR_PROVINCE),
            province_code: attrs.string(ATTR_PROVINCE_CODE),
            zip: attrs.string(ATTR_ZIP),
        };

        let custom_attributes = self
            .custom_attribute_keys
            .iter()
            .filter_map(|key| attrs.string(key).map(|v| CustomAttribute::new(key, v)))
            .collect();

        let name = role
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(role.name.as_str())
            .to_string();

        let record = LocationRecord {
            id,
            name,
            address,
            address_verified: attrs.boolean(ATTR_ADDRESS_VERIFIED)?.unwrap_or(false),
            active: attrs.boolean(ATTR_ACTIVE)?.unwrap_or(true),
            created_at: attrs.instant(ATTR_CREATED_AT)?,
            updated_at: attrs.instant(ATTR_UPDATED_AT)?,
            deactivated_at: attrs.instant(ATTR_DEACTIVATED_AT)?,
            custom_attributes,
        };
        Ok(record.normalized(&self.custom_attribute_keys))
    }
}

#[async_trait]
impl LocationSource for IdentityAdminSource {
    fn name(&self) -> &'static str {
        "identity_admin"
    }

    async fn fetch_all(&self) -> LocationResult<Vec<LocationRecord>> {
        // The list endpoint omits attributes unless asked for the full representation.
        let mut url = self.roles_url.clone();
        url.query_pairs_mut()
            .append_pair("briefRepresentation", "false");

        let roles: Vec<RoleRepresentation> = self.client.get_json(&url).await?;
        tracing::debug!(roles = roles.len(), "Loaded location roles");

        roles.iter().map(|role| self.to_record(role)).collect()
    }
}

fn parse_location_id(name: &str) -> LocationResult<u64> {
    match name.trim().parse::<u64>() {
        Ok(0) => Err(LocationError::malformed_record(
            name,
            "location id must be positive",
        )),
        Ok(id) => Ok(id),
        Err(e) => Err(LocationError::malformed_record(
            name,
            format!("role name is not a location id: {e}"),
        )),
    }
}

/// Typed view over a role's attribute bag.
struct RoleAttributes<'a> {
    role: &'a str,
    attributes: &'a HashMap<String, Vec<String>>,
}

impl RoleAttributes<'_> {
    /// First value of `key`, if the list is non-empty and the value non-blank.
    fn first(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .and_then(|values| values.first())
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn string(&self, key: &str) -> Option<String> {
        self.first(key).map(str::to_string)
    }

    fn boolean(&self, key: &str) -> LocationResult<Option<bool>> {
        self.first(key)
            .map(|v| {
                if v.eq_ignore_ascii_case("true") {
                    Ok(true)
                } else if v.eq_ignore_ascii_case("false") {
                    Ok(false)
                } else {
                    Err(LocationError::malformed_record(
                        self.role,
                        format!("attribute '{key}' is not a boolean: '{v}'"),
                    ))
                }
            })
            .transpose()
    }

    fn instant(&self, key: &str) -> LocationResult<Option<OffsetDateTime>> {
        self.first(key)
            .map(|v| {
                OffsetDateTime::parse(v, &Rfc3339).map_err(|e| {
                    LocationError::malformed_record(
                        self.role,
                        format!("attribute '{key}' is not an RFC 3339 instant: {e}"),
                    )
                })
            })
            .transpose()
    }
}
