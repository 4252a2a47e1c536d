use tracing::{info, warn};

use crate::errors::{SyncError, TransportError};
use crate::model::{DeviceConfig, SensorData};
use crate::reconcile;
use crate::store::{self, KvStore};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced { config_changed: bool },
    /// The server does not know this identity. Terminal for this device's
    /// registration until it is provisioned externally; surfaced prominently
    /// by the caller, retried on the normal cadence.
    NotFound,
}

/// One reconciliation round: pull the server's snapshot for our identity,
/// merge mileage forward, then merge the proposed config. Every failure
/// leaves prior state intact.
pub async fn reconcile<T: Transport, S: KvStore>(
    transport: &T,
    store: &mut S,
    config: &mut DeviceConfig,
    data: &mut SensorData,
) -> Result<SyncOutcome, SyncError> {
    let response = match transport.fetch_sync(&config.identity).await {
        Ok(response) => response,
        Err(TransportError::NotFound) => return Ok(SyncOutcome::NotFound),
        Err(e) => return Err(e.into()),
    };

    if !response.success {
        return Err(SyncError::ServerRejected);
    }
    let snapshot = response.data.ok_or(SyncError::ServerRejected)?;

    if let Some(remote_identity) = snapshot.identity.as_deref() {
        if !remote_identity.is_empty() && remote_identity != config.identity {
            // Observation only: identity reassignment flows through the
            // config merge, never through the snapshot header.
            warn!(
                local = %config.identity,
                remote = %remote_identity,
                "server reports a different identity for this device"
            );
        }
    }

    // Server is authoritative for forward corrections only; the odometer
    // never rolls back.
    if snapshot.mileage > data.mileage {
        info!(from = data.mileage, to = snapshot.mileage, "odometer corrected from server");
        data.mileage = snapshot.mileage;
        store::save_mileage(store, data.mileage)?;
    }

    let mut config_changed = false;
    if let Some(proposed) = &snapshot.config {
        config_changed = reconcile::merge(config, proposed);
        if config_changed {
            store::save_device_config(store, config)?;
        }
    }

    Ok(SyncOutcome::Synced { config_changed })
}
