//! Timer-driven job dispatch.
//!
//! Each tick claims due jobs under the workspace lock (pending → sent),
//! delivers them with the lock released, then records the outcome.
//! A failed delivery leaves the job in `error`. There is no retry.

use std::sync::Arc;
use std::time::Duration;

use leadflow_channels::TransportRouter;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::commands::Workspace;

/// Result of one dispatch tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// (job id, transport name)
    pub sent: Vec<(String, String)>,
    /// (job id, reason)
    pub failed: Vec<(String, String)>,
}

impl DispatchReport {
    pub fn is_empty(&self) -> bool {
        self.sent.is_empty() && self.failed.is_empty()
    }
}

pub struct Dispatcher {
    workspace: Arc<Mutex<Workspace>>,
    router: Arc<TransportRouter>,
}

impl Dispatcher {
    pub fn new(workspace: Arc<Mutex<Workspace>>, router: Arc<TransportRouter>) -> Self {
        Self { workspace, router }
    }

    /// Claim and deliver every job that is due right now.
    pub async fn tick(&self) -> DispatchReport {
        let claimed = {
            let mut ws = self.workspace.lock().await;
            ws.claim_due()
        };

        let mut report = DispatchReport::default();
        for message in claimed {
            let Some(job_id) = message.job_id.clone() else {
                continue;
            };
            let delivered = self.router.deliver(&message).await;

            let mut ws = self.workspace.lock().await;
            match delivered {
                Ok(transport) => match ws.record_delivery(&job_id) {
                    Ok(_) => report.sent.push((job_id, transport)),
                    Err(e) => {
                        tracing::warn!("⚠️ Delivered job {job_id} could not be recorded: {e}");
                        report.failed.push((job_id, e.to_string()));
                    }
                },
                Err(e) => {
                    tracing::error!("❌ Job {job_id} delivery failed: {e}");
                    let reason = e.to_string();
                    if let Err(e) = ws.record_failure(&job_id, &reason) {
                        tracing::warn!("⚠️ Could not flag job {job_id}: {e}");
                    }
                    report.failed.push((job_id, reason));
                }
            }
        }
        report
    }

    /// Tick forever on `interval`.
    pub async fn run(self, interval: Duration) {
        tracing::info!("⏰ Dispatcher started (check every {}s)", interval.as_secs());
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let report = self.tick().await;
            if !report.is_empty() {
                tracing::info!(
                    "📣 Dispatch tick: {} sent, {} failed",
                    report.sent.len(),
                    report.failed.len()
                );
            }
        }
    }
}

/// Spawn the dispatcher loop as a background tokio task.
pub fn spawn_dispatcher(
    workspace: Arc<Mutex<Workspace>>,
    router: Arc<TransportRouter>,
    interval_secs: u64,
) -> JoinHandle<()> {
    let dispatcher = Dispatcher::new(workspace, router);
    tokio::spawn(dispatcher.run(Duration::from_secs(interval_secs.max(1))))
}
