//! redb table definitions for the status store.

use redb::TableDefinition;

/// Worker status keyed by `{owner_id}`.
pub const WORKER_STATUS: TableDefinition<&str, &[u8]> = TableDefinition::new("worker_status");
