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

use push_dispatcher::adapters::database::device_token_repo::DeviceTokenRepository;
use push_dispatcher::adapters::database::outcome_log_repo::OutcomeLogRepository;
use push_dispatcher::adapters::database::{self, PgDeliveryStore};
use push_dispatcher::config::{Command, Config, NotificationKind};
use push_dispatcher::domain::notification::{NotificationCommand, NotificationType, Recipient, Sender};
use push_dispatcher::services::notification::{
    DeliveryExecutor, DeviceRegistry, Dispatcher, OutcomeLogStore, RetryPolicy,
};
use push_dispatcher::workers::{DispatchWorker, dispatch};
use push_dispatcher::{build_push_provider, spawn_signal_handler, telemetry};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    let telemetry_guard = telemetry::init_telemetry(&config.telemetry)?;

    let result = run(config).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "push-dispatcher failed");
    }

    telemetry_guard.shutdown();
    result
}

async fn run(config: Config) -> anyhow::Result<()> {
    let (dispatcher, shutdown_tx, shutdown_rx) = async {
        let pool = database::init_pool(&config.database).await?;
        if matches!(config.command, Command::Migrate) {
            database::run_migrations(&pool).await?;
            tracing::info!("Migrations applied");
        }

        let provider = build_push_provider(&config.fcm)?;
        let store = Arc::new(PgDeliveryStore::new(pool, DeviceTokenRepository::new(), OutcomeLogRepository::new()));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let cancel = CancellationToken::new();
        spawn_signal_handler(shutdown_tx.clone(), cancel.clone());

        let registry = Arc::clone(&store) as Arc<dyn DeviceRegistry>;
        let logs: Arc<dyn OutcomeLogStore> = store;
        let executor = DeliveryExecutor::new(provider, Arc::clone(&logs), RetryPolicy::from(&config.retry));
        let dispatcher = Dispatcher::new(registry, logs, executor, &config.dispatch).with_shutdown(cancel);

        Ok::<_, anyhow::Error>((dispatcher, shutdown_tx, shutdown_rx))
    }
    .instrument(tracing::info_span!("boot"))
    .await?;

    match config.command {
        Command::Migrate => {}
        Command::Send(args) => {
            let kind = match args.kind {
                NotificationKind::ExampleAlarm => NotificationType::ExampleAlarm,
            };
            let recipients = args.recipients.into_iter().map(|id| Recipient { id }).collect();
            dispatcher.send(NotificationCommand::new(Sender { id: args.sender }, recipients, kind)).await;
        }
        Command::Listen => {
            let (publisher, rx) = dispatch::channel(config.dispatch.queue_capacity);
            let worker = tokio::spawn(DispatchWorker::new(dispatcher, rx).run(shutdown_rx.clone()));

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            let mut stop = shutdown_rx;
            loop {
                tokio::select! {
                    line = lines.next_line() => {
                        let Some(line) = line? else { break };
                        if line.trim().is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<NotificationCommand>(&line) {
                            Ok(command) => publisher.publish(command).await?,
                            Err(e) => tracing::warn!(error = %e, "Ignoring malformed notification command"),
                        }
                    }
                    _ = stop.changed() => break,
                }
            }

            // Closing the queue lets the worker finish what it has and exit.
            drop(publisher);
            let timeout = Duration::from_secs(config.dispatch.shutdown_timeout_secs);
            if tokio::time::timeout(timeout, worker).await.is_err() {
                tracing::warn!("Timeout waiting for in-flight dispatches to finish.");
            }
        }
    }

    let _ = shutdown_tx.send(true);
    Ok(())
}
