//! Background registration service

use sspcloud_core::{ForgeRegistry, Result, FORGES_KEY};
use std::future::Future;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::registration::{RebuildReport, RegistrationSet, ScriptRegistrar};
use crate::settings::SettingsStore;
use crate::storage::StorageArea;

async fn rebuild_from_store<S, R>(
    store: &SettingsStore<S>,
    registrar: &R,
    set: &mut RegistrationSet,
) -> Result<RebuildReport>
where
    S: StorageArea,
    R: ScriptRegistrar + ?Sized,
{
    let forges: ForgeRegistry = store.forges().await?;
    let report = set.rebuild(registrar, &forges).await;
    info!(
        "Registration rebuild: {} registered, {} failed, {} unregistered",
        report.registered.len(),
        report.failed.len(),
        report.unregistered.len()
    );
    Ok(report)
}

/// Keep content-script registrations in sync with the stored forge list
///
/// Rebuilds once on start and then after every change touching `forges`,
/// until `shutdown` resolves or the change stream closes. Returns the set
/// registered at exit.
pub async fn run_registration_service<S, R>(
    storage: S,
    registrar: &R,
    shutdown: impl Future<Output = ()>,
) -> RegistrationSet
where
    S: StorageArea,
    R: ScriptRegistrar + ?Sized,
{
    // Subscribe before the first read so no change slips through
    let mut changes = storage.subscribe();
    let store = SettingsStore::new(storage);
    let mut set = RegistrationSet::new();

    if let Err(e) = rebuild_from_store(&store, registrar, &mut set).await {
        warn!("Initial registration failed: {}", e);
    }

    tokio::pin!(shutdown);
    loop {
        let rebuild = tokio::select! {
            change = changes.recv() => match change {
                Ok(change) if change.touches(FORGES_KEY) => true,
                Ok(change) => {
                    debug!("Ignoring storage change {:?}", change.keys);
                    false
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!("Missed {} storage changes, rebuilding", missed);
                    true
                }
                Err(RecvError::Closed) => {
                    info!("Storage change stream closed");
                    break;
                }
            },
            _ = &mut shutdown => {
                info!("Received shutdown signal");
                break;
            }
        };

        if rebuild {
            if let Err(e) = rebuild_from_store(&store, registrar, &mut set).await {
                warn!("Registration rebuild skipped: {}", e);
            }
        }
    }

    set
}
