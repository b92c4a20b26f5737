//! Remote breakpoint reconciliation.

use tracing::debug;

use crate::models::breakpoint::Breakpoint;
use crate::wire::WireClient;
use crate::Result;

/// Remote operations performed by one [`reconcile`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconciled {
    /// Remote entries removed.
    pub removed: usize,
    /// Whether a new remote entry was added.
    pub added: bool,
}

/// Make the remote list hold `target` exactly once (`enabled`) or not at all.
///
/// Every remote entry at the target location is removed, highest index
/// first, and then one entry is added if `enabled`. Repeating a call leaves
/// the same remote set.
///
/// # Errors
///
/// Propagates the first wire client failure; earlier removals stay applied.
pub async fn reconcile(
    client: &dyn WireClient,
    target: &Breakpoint,
    enabled: bool,
) -> Result<Reconciled> {
    let remote = client.list_breakpoints().await?;
    let mut outcome = Reconciled::default();

    for (index, existing) in remote.iter().enumerate().rev() {
        if existing.same_location(target) {
            client.remove_breakpoint(index).await?;
            outcome.removed += 1;
        }
    }

    if enabled {
        client
            .add_breakpoint(&target.file_name, target.line_number)
            .await?;
        outcome.added = true;
    }

    debug!(
        file = %target.file_name,
        line = target.line_number,
        removed = outcome.removed,
        added = outcome.added,
        "breakpoint reconciled"
    );
    Ok(outcome)
}
