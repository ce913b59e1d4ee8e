//! HTTP server lifecycle: bind, spawn the axum server in a background
//! task, hand back a handle with a shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::clinic_router;
use crate::core_state::CoreState;

/// Handle to a running clinic server.
pub struct ClinicServer {
    pub addr: SocketAddr,
    pub started_at: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ClinicServer {
    /// Shut down the server gracefully.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Clinic server shutdown signal sent");
        }
    }

    /// Wait for the server task to finish.
    pub async fn wait(self) {
        if let Err(e) = self.task.await {
            tracing::error!("Clinic server task failed: {e}");
        }
    }
}

/// Bind `addr` and start serving the clinic router.
///
/// Port 0 picks an ephemeral port; the bound address is in the handle.
pub async fn start_server(
    core: Arc<CoreState>,
    addr: SocketAddr,
    cookie_secure: bool,
) -> Result<ClinicServer, std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let addr = listener.local_addr()?;

    let app = clinic_router(core.clone(), cookie_secure);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("Clinic server received shutdown signal");
        };

        tracing::info!(%addr, "Clinic server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("Clinic server error: {e}");
        }

        if let Err(e) = core.flush_and_prune_audit() {
            tracing::warn!("Final audit flush failed: {e}");
        }
        tracing::info!("Clinic server stopped");
    });

    Ok(ClinicServer {
        addr,
        started_at: chrono::Utc::now().to_rfc3339(),
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
