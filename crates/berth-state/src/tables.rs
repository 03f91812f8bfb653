//! redb table definitions for the Berth state store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized domain
//! types). Both tables are keyed by the auxiliary deployment ID.

use redb::TableDefinition;

/// Auxiliary deployment base records keyed by auxiliary ID.
pub const AUX_DEPLOYMENTS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("aux_deployments");

/// Container records keyed by the owning auxiliary ID.
pub const AUX_CONTAINERS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("aux_containers");
