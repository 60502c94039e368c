//! Device inventory fetcher.
//!
//! Reads every entity state from the backend and keeps only the domains the
//! agent can reason about. Failures degrade to an empty inventory so the
//! conversation can still proceed without device context.

use hv_protocol::EntityRecord;

use crate::client::AutomationBackend;
use crate::error::InventoryFetchError;

/// Keep records whose domain is in `allowlist`, preserving source order.
pub fn filter_supported(records: Vec<EntityRecord>, allowlist: &[&str]) -> Vec<EntityRecord> {
    records
        .into_iter()
        .filter(|r| allowlist.iter().any(|d| *d == r.domain()))
        .collect()
}

/// Fetch and filter the inventory, surfacing backend errors.
pub async fn try_fetch_inventory(
    backend: &dyn AutomationBackend,
    allowlist: &[&str],
) -> Result<Vec<EntityRecord>, InventoryFetchError> {
    let records = backend.fetch_states().await?;
    let total = records.len();
    let kept = filter_supported(records, allowlist);
    tracing::debug!(total, kept = kept.len(), "inventory filtered");
    Ok(kept)
}

/// Fetch and filter the inventory. Never fails: errors yield an empty list.
pub async fn fetch_inventory(
    backend: &dyn AutomationBackend,
    allowlist: &[&str],
) -> Vec<EntityRecord> {
    match try_fetch_inventory(backend, allowlist).await {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(error = %e, "continuing with empty inventory");
            Vec::new()
        }
    }
}
