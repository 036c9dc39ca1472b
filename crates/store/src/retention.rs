// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! Retention pruner for `session_events` (spec.md §9 open question,
//! resolved in DESIGN.md: keep events for 30 days after the owning
//! session reaches a terminal status). Grounded on the teacher's
//! `broker/registry.rs::run_health_checks` ticker shape (`tokio::select!`
//! between a sleep and a `CancellationToken`).

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::db::Db;
use crate::error::FlowgenticError;

/// Default retention window, used by callers that don't configure one
/// explicitly (DESIGN.md open question #2).
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(30 * 24 * 3600);

/// How often the pruner sweeps for expired events.
const SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Delete events belonging to sessions that have been in a terminal
/// status for longer than `retention`. Returns the number of events
/// deleted.
pub async fn prune_expired_events(db: &Db, retention: Duration) -> Result<u64, FlowgenticError> {
    let cutoff_millis = current_epoch_millis().saturating_sub(retention.as_millis() as u64);
    let cutoff = crate::model::format_epoch_millis(cutoff_millis);
    db.prune_events_for_sessions_updated_before(&cutoff).await
}

fn current_epoch_millis() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Run the retention pruner loop until cancelled.
pub async fn run(db: Db, retention: Duration, shutdown: CancellationToken) {
    info!(retention_secs = retention.as_secs(), "retention pruner started");
    loop {
        tokio::select! {
            _ = tokio::time::sleep(SWEEP_INTERVAL) => {}
            _ = shutdown.cancelled() => {
                debug!("retention pruner shutting down");
                return;
            }
        }

        match prune_expired_events(&db, retention).await {
            Ok(0) => {}
            Ok(n) => info!(deleted = n, "pruned expired session events"),
            Err(e) => tracing::warn!(error = %e, "retention sweep failed"),
        }
    }
}

#[cfg(test)]
#[path = "retention_tests.rs"]
mod tests;
