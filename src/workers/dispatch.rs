use crate::domain::notification::{NotificationCommand, NotificationPayload};
use crate::error::{AppError, Result};
use crate::services::notification::Dispatcher;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::Instrument;

/// Hands notification commands to a [`DispatchWorker`].
#[derive(Clone, Debug)]
pub struct NotificationPublisher {
    tx: mpsc::Sender<NotificationCommand>,
}

impl NotificationPublisher {
    /// Queues a command for dispatch, waiting for queue space.
    ///
    /// # Errors
    /// Returns `AppError::Internal` if the worker has stopped.
    pub async fn publish(&self, command: NotificationCommand) -> Result<()> {
        self.tx.send(command).await.map_err(|_| AppError::Internal("dispatch queue closed".to_string()))
    }

    /// Resolves a business payload to its command and queues it.
    ///
    /// # Errors
    /// Returns `AppError::Internal` if the worker has stopped.
    pub async fn publish_payload(&self, payload: NotificationPayload) -> Result<()> {
        self.publish(payload.into()).await
    }
}

/// Creates a bounded command queue.
#[must_use]
pub fn channel(capacity: usize) -> (NotificationPublisher, mpsc::Receiver<NotificationCommand>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (NotificationPublisher { tx }, rx)
}

/// Runs every queued command through the dispatcher, each in its own task.
#[derive(Debug)]
pub struct DispatchWorker {
    dispatcher: Dispatcher,
    rx: mpsc::Receiver<NotificationCommand>,
}

impl DispatchWorker {
    #[must_use]
    pub const fn new(dispatcher: Dispatcher, rx: mpsc::Receiver<NotificationCommand>) -> Self {
        Self { dispatcher, rx }
    }

    /// Consumes commands until every publisher is dropped or `shutdown` flips. On exit the
    /// queue is closed, commands already queued are still dispatched, and in-flight
    /// dispatches are awaited.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut in_flight = JoinSet::new();

        while !*shutdown.borrow() {
            tokio::select! {
                received = self.rx.recv() => {
                    let Some(command) = received else { break };
                    self.spawn_dispatch(&mut in_flight, command);
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!(error = %e, "Dispatch task aborted");
                    }
                }
                _ = shutdown.changed() => break,
            }
        }

        self.rx.close();
        let mut queued = 0_usize;
        while let Some(command) = self.rx.recv().await {
            self.spawn_dispatch(&mut in_flight, command);
            queued += 1;
        }

        tracing::info!(pending = in_flight.len(), queued, "Dispatch worker shutting down...");
        async {
            while let Some(joined) = in_flight.join_next().await {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "Dispatch task aborted");
                }
            }
        }
        .instrument(tracing::info_span!("dispatch_worker_drain"))
        .await;
    }

    fn spawn_dispatch(&self, in_flight: &mut JoinSet<()>, command: NotificationCommand) {
        let dispatcher = self.dispatcher.clone();
        in_flight.spawn(async move { dispatcher.send(command).await });
    }
}
