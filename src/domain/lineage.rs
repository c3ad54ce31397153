//! Address lineage: where a pipeline reads from and writes to.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A named data location (table, bucket, topic, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    /// Fully qualified name, e.g. `db.schema.table`.
    pub name: String,

    /// Concrete technology, e.g. `postgres`, `snowflake`.
    pub address_type_name: String,

    /// Technology family, e.g. `database`, `warehouse`.
    pub address_type_group_name: String,
}

impl Address {
    pub fn new(
        name: impl Into<String>,
        address_type_name: impl Into<String>,
        address_type_group_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address_type_name: address_type_name.into(),
            address_type_group_name: address_type_group_name.into(),
        }
    }
}

/// Source and target addresses of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressLineage {
    pub source_addresses: Vec<Address>,
    pub target_addresses: Vec<Address>,
}

impl AddressLineage {
    /// Check that both sides of the lineage are populated.
    pub fn validate(&self) -> Result<()> {
        if self.source_addresses.is_empty() {
            return Err(Error::invalid_usage(
                "address lineage must have at least one source address",
            ));
        }
        if self.target_addresses.is_empty() {
            return Err(Error::invalid_usage(
                "address lineage must have at least one target address",
            ));
        }
        Ok(())
    }
}
