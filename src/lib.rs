#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;
pub mod workers;

use crate::adapters::push::{FcmPushProvider, LogPushProvider};
use crate::config::FcmConfig;
use crate::services::notification::PushProvider;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Picks the FCM client when a project is configured, the logging stub otherwise.
///
/// # Errors
/// Returns an error if a project is configured without an access token, or the HTTP client
/// cannot be built.
pub fn build_push_provider(config: &FcmConfig) -> anyhow::Result<Arc<dyn PushProvider>> {
    match (&config.project_id, &config.access_token) {
        (Some(project_id), Some(access_token)) => {
            tracing::info!(project_id = %project_id, "Using FCM push provider");
            Ok(Arc::new(FcmPushProvider::new(config, project_id, access_token.clone())?))
        }
        (Some(_), None) => anyhow::bail!("an FCM project id requires an access token"),
        (None, _) => {
            tracing::warn!("No FCM project configured, pushes will only be logged");
            Ok(Arc::new(LogPushProvider))
        }
    }
}

/// Flips `shutdown_tx` and cancels `cancel` on Ctrl-C or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>, cancel: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {},
            () = terminate => {},
        }

        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
        cancel.cancel();
    });
}
