// chirpbot-core/src/tasks/credential_refresh.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::auth::CredentialManager;

/// Default margin before expiry at which a token is rotated.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(10 * 60);

/// Refreshes every identity whose access token expires within `margin`.
/// Failures are logged; returns how many identities were refreshed.
pub async fn refresh_expiring_credentials(manager: &CredentialManager, margin: Duration) -> usize {
    let expiring = manager.expiring_within(margin);
    if expiring.is_empty() {
        debug!("No credentials expiring in the next {:?}.", margin);
        return 0;
    }

    info!("Found {} credential(s) expiring soon; attempting to refresh...", expiring.len());

    let mut refreshed = 0;
    for user_id in expiring {
        match manager.refresh_credential(&user_id).await {
            Ok(identity) => {
                info!(
                    "Refreshed credential for user_id={} (expires_in={:?})",
                    identity.user_id, identity.expires_in
                );
                refreshed += 1;
            }
            Err(e) if !e.is_recoverable() => {
                // Same cause for every remaining id; stop this round.
                error!("Credential refresh aborted: {}", e);
                break;
            }
            Err(e) => {
                error!("Failed to refresh credential for user_id={}: {}", user_id, e);
            }
        }
    }
    refreshed
}

/// Spawns the periodic refresh loop. Exits when `shutdown_rx` flips to true.
pub fn spawn_credential_refresh_task(
    manager: Arc<CredentialManager>,
    interval: Duration,
    margin: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick fires immediately; startup already validated everything.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    refresh_expiring_credentials(&manager, margin).await;
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        debug!("credential refresh task stopping");
                        break;
                    }
                }
            }
        }
    })
}
