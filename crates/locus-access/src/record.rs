//! Location records and the directory map.
//!
//! A [`LocationRecord`] is a read-only projection of upstream state. It is
//! never mutated here; the whole [`Directory`] is replaced when it is
//! reloaded from the backend.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// All known locations keyed by id.
pub type Directory = HashMap<u64, LocationRecord>;

/// Postal and contact details of a location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Contact phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// First address line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,

    /// Second address line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,

    /// Localized country name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// ISO country code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,

    /// Localized province or state name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,

    /// Province or state code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province_code: Option<String>,

    /// Postal code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
}

/// A custom key/value attribute attached to a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomAttribute {
    pub key: String,
    pub value: String,
}

impl CustomAttribute {
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A location (store, warehouse, business unit) that grants are scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    /// Location id assigned by the backend.
    pub id: u64,

    /// Display name.
    pub name: String,

    /// Postal and contact details.
    #[serde(default)]
    pub address: Address,

    /// Whether the address has been verified.
    #[serde(default)]
    pub address_verified: bool,

    /// Whether the location is active.
    #[serde(default = "default_active")]
    pub active: bool,

    /// When the location was created upstream.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,

    /// When the location was last updated upstream.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<OffsetDateTime>,

    /// When the location was deactivated. Only set on inactive locations.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub deactivated_at: Option<OffsetDateTime>,

    /// Allow-listed custom attributes, in allow-list order.
    #[serde(default)]
    pub custom_attributes: Vec<CustomAttribute>,
}

fn default_active() -> bool {
    true
}

impl LocationRecord {
    /// Creates an active location with no address details.
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            address: Address::default(),
            address_verified: false,
            active: true,
            created_at: None,
            updated_at: None,
            deactivated_at: None,
            custom_attributes: Vec::new(),
        }
    }

    /// Restores the record invariants after assembly from backend data.
    ///
    /// An active location never carries a deactivation timestamp, and custom
    /// attributes are limited to `allowed_keys` in allow-list order.
    #[must_use]
    pub(crate) fn normalized(mut self, allowed_keys: &[String]) -> Self {
        if self.active && self.deactivated_at.is_some() {
            tracing::debug!(
                location_id = self.id,
                "Dropping deactivation timestamp of active location"
            );
            self.deactivated_at = None;
        }

        let mut attributes = std::mem::take(&mut self.custom_attributes);
        self.custom_attributes = allowed_keys
            .iter()
            .filter_map(|key| {
                attributes
                    .iter()
                    .position(|a| &a.key == key)
                    .map(|idx| attributes.swap_remove(idx))
            })
            .collect();
        self
    }

    /// Gets a custom attribute value by key.
    #[must_use]
    pub fn custom_attribute(&self, key: &str) -> Option<&str> {
        self.custom_attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

/// Builds a directory from records, keyed by id.
///
/// When two records share an id the later one wins.
pub fn directory_from(records: impl IntoIterator<Item = LocationRecord>) -> Directory {
    records.into_iter().map(|r| (r.id, r)).collect()
}
