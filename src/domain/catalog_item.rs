//! Catalog items as stored by the catalog repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GatewayError;

/// A product in the catalog.
///
/// `name` and `price` are the only fields the gateway looks at. Everything
/// else the client sent (thumbnail URL, description, ...) is kept verbatim
/// in `attributes` and flattened back into the JSON object on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Server-assigned identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: f64,
    /// When the item was stored.
    pub created_at: DateTime<Utc>,
    /// Remaining client-supplied fields.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Fields of a catalog item before the repository assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCatalogItem {
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: f64,
    /// Remaining client-supplied fields.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Keys owned by the repository. Never stored as attributes.
pub const RESERVED_KEYS: [&str; 2] = ["id", "created_at"];

/// Removes [`RESERVED_KEYS`] from client-supplied attributes.
pub fn strip_reserved(attributes: &mut Map<String, Value>) {
    for key in RESERVED_KEYS {
        attributes.remove(key);
    }
}

impl NewCatalogItem {
    /// Parses an untyped JSON payload into item fields.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if the payload is not an
    /// object with a string `name` and numeric `price`.
    pub fn from_value(value: Value) -> Result<Self, GatewayError> {
        serde_json::from_value(value).map_err(|e| GatewayError::InvalidRequest(e.to_string()))
    }

    /// Checks the payload shape beyond what deserialization enforces.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for an empty name or a
    /// negative / non-finite price.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.name.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "name must not be empty".to_string(),
            ));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(GatewayError::InvalidRequest(
                "price must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }

    /// Attaches repository-assigned metadata.
    ///
    /// Client-supplied `id` / `created_at` attributes are discarded so they
    /// cannot shadow the stored values.
    #[must_use]
    pub fn into_item(mut self, id: i64, created_at: DateTime<Utc>) -> CatalogItem {
        strip_reserved(&mut self.attributes);
        CatalogItem {
            id,
            name: self.name,
            price: self.price,
            created_at,
            attributes: self.attributes,
        }
    }
}
