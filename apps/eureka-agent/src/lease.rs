//! Registration and lease renewal for the local instance.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use eureka_client::RegistryClient;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::RegisterFailurePolicy;

/// Outcome of one renewal attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renewal {
    Renewed,
    /// The registry had dropped the lease; the instance was registered again.
    Reregistered,
    Failed,
}

/// Register the instance, then send the first heartbeat.
///
/// # Errors
/// Returns the registration error when `policy` is [`RegisterFailurePolicy::Abort`].
pub async fn announce(client: &RegistryClient, policy: RegisterFailurePolicy) -> Result<()> {
    match client.register().await {
        Ok(resp) => {
            tracing::info!(
                app = client.app(),
                instance_id = client.instance_id(),
                status = resp.status().as_u16(),
                "registered with registry"
            );
        }
        Err(e) => match policy {
            RegisterFailurePolicy::Abort => {
                return Err(e).with_context(|| {
                    format!(
                        "failed to register {} with {}",
                        client.instance_id(),
                        client.base_url()
                    )
                });
            }
            RegisterFailurePolicy::Continue => {
                tracing::warn!(error = %e, "registration failed; continuing");
            }
        },
    }

    renew(client).await;
    Ok(())
}

/// Send one heartbeat. A 404 means the registry forgot the lease, so the
/// instance registers again. Failures are logged, never returned.
pub async fn renew(client: &RegistryClient) -> Renewal {
    match client.heartbeat().await {
        Ok(_) => {
            tracing::debug!(instance_id = client.instance_id(), "lease renewed");
            Renewal::Renewed
        }
        Err(e) if e.is_not_found() => {
            tracing::warn!(
                instance_id = client.instance_id(),
                "registry does not know this instance; registering again"
            );
            match client.register().await {
                Ok(_) => Renewal::Reregistered,
                Err(e) => {
                    tracing::warn!(error = %e, "re-registration failed");
                    Renewal::Failed
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "heartbeat failed");
            Renewal::Failed
        }
    }
}

/// Renew the lease every `every` until `cancel` fires.
///
/// The first renewal happens one interval after the call.
pub async fn run_heartbeats(
    client: Arc<RegistryClient>,
    every: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                tracing::debug!("heartbeat loop cancelled");
                break;
            }

            _ = ticker.tick() => {
                renew(&client).await;
            }
        }
    }
}

/// Background lease renewal started by [`Heartbeats::spawn`].
pub struct Heartbeats {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Heartbeats {
    #[must_use]
    pub fn spawn(client: Arc<RegistryClient>, every: Duration) -> Self {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_heartbeats(client, every, cancel.clone()));
        Self { cancel, task }
    }

    /// Cancel the loop and wait for an in-flight renewal to finish.
    ///
    /// # Errors
    /// Returns an error if the heartbeat task panicked.
    pub async fn stop(self) -> Result<()> {
        self.cancel.cancel();
        self.task.await.context("heartbeat task failed")
    }
}

/// Stop renewing, then give the lease back when `deregister` is set.
///
/// Deregistration runs even if the heartbeat task failed; that failure is
/// returned afterwards. A failed deregistration is only logged.
///
/// # Errors
/// Returns the error from [`Heartbeats::stop`].
pub async fn shutdown(
    client: &RegistryClient,
    heartbeats: Heartbeats,
    deregister: bool,
) -> Result<()> {
    let stopped = heartbeats.stop().await;

    if deregister {
        match client.deregister().await {
            Ok(_) => tracing::info!(instance_id = client.instance_id(), "deregistered"),
            Err(e) => tracing::warn!(error = %e, "deregistration failed"),
        }
    }

    stopped
}
