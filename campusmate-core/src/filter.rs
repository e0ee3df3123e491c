//! Pure suggestion filter over the catalog.
//!
//! Combines the catalog, an already-fetched enablement snapshot, and the
//! user-typed query into the ordered list of visible commands. No I/O, no
//! hidden state: for fixed inputs the output is identical on every call.

use crate::catalog::{Catalog, CommandSpec};
use crate::enablement::EnablementSnapshot;

/// Filter the catalog down to the visible commands for the given query.
///
/// Commands keep catalog order; there is no ranking. A non-empty query
/// matches by case-insensitive substring containment on the trigger, not
/// anchored to the start.
pub fn suggestions<'a>(
    catalog: &'a Catalog,
    enablement: &EnablementSnapshot,
    query: &str,
) -> Vec<&'a CommandSpec> {
    let query = query.to_lowercase();
    catalog
        .list()
        .iter()
        .filter(|cmd| enablement.is_enabled(&cmd.plugin_id))
        .filter(|cmd| query.is_empty() || cmd.trigger.to_lowercase().contains(&query))
        .collect()
}
