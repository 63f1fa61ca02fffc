use clap::{Args, Parser, Subcommand, ValueEnum};
use std::time::Duration;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub fcm: FcmConfig,

    #[command(flatten)]
    pub retry: RetryConfig,

    #[command(flatten)]
    pub dispatch: DispatchConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Apply database migrations and exit
    Migrate,
    /// Dispatch a single notification
    Send(SendArgs),
    /// Read notification commands as JSON lines from stdin and dispatch them
    Listen,
}

#[derive(Clone, Debug, Args)]
pub struct SendArgs {
    /// Identifier of the sending user
    #[arg(long)]
    pub sender: i64,

    /// Recipient user identifiers (repeatable, duplicates are sent twice)
    #[arg(long = "recipient", required = true)]
    pub recipients: Vec<i64>,

    /// Notification type
    #[arg(long = "type", value_enum, default_value_t = NotificationKind::ExampleAlarm)]
    pub kind: NotificationKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum NotificationKind {
    ExampleAlarm,
}

#[derive(Clone, Debug, Args)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[arg(long = "database-url", env = "PUSH_DATABASE_URL")]
    pub url: String,

    /// Maximum number of pooled connections
    #[arg(long, env = "PUSH_DB_MAX_CONNECTIONS", default_value_t = 10)]
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection
    #[arg(long, env = "PUSH_DB_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    pub acquire_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct FcmConfig {
    /// Firebase project identifier. When unset, pushes are only logged.
    #[arg(long = "fcm-project-id", env = "PUSH_FCM_PROJECT_ID")]
    pub project_id: Option<String>,

    /// OAuth2 bearer token used to authenticate against FCM
    #[arg(long = "fcm-access-token", env = "PUSH_FCM_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Base URL of the FCM HTTP v1 API
    #[arg(long = "fcm-base-url", env = "PUSH_FCM_BASE_URL", default_value = "https://fcm.googleapis.com")]
    pub base_url: String,

    /// Per-request timeout for provider calls
    #[arg(long = "fcm-request-timeout-secs", env = "PUSH_FCM_REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct RetryConfig {
    /// Total send attempts per device, including the first one
    #[arg(long = "retry-max-attempts", env = "PUSH_RETRY_MAX_ATTEMPTS", default_value_t = 4)]
    pub max_attempts: u32,

    /// Delay before the first retry
    #[arg(long = "retry-initial-delay-ms", env = "PUSH_RETRY_INITIAL_DELAY_MS", default_value_t = 5000)]
    pub initial_delay_ms: u64,

    /// Factor applied to the delay after each retry
    #[arg(long = "retry-multiplier", env = "PUSH_RETRY_MULTIPLIER", default_value_t = 2.0)]
    pub multiplier: f32,

    /// Upper bound for a single retry delay
    #[arg(long = "retry-max-delay-ms", env = "PUSH_RETRY_MAX_DELAY_MS", default_value_t = 60_000)]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 4, initial_delay_ms: 5000, multiplier: 2.0, max_delay_ms: 60_000 }
    }
}

#[derive(Clone, Debug, Args)]
pub struct DispatchConfig {
    /// Maximum number of device deliveries in flight per command
    #[arg(long = "dispatch-concurrency", env = "PUSH_DISPATCH_CONCURRENCY", default_value_t = 32)]
    pub concurrency: usize,

    /// Deadline for a whole command; pending retry waits are abandoned once it passes
    #[arg(long = "dispatch-timeout-secs", env = "PUSH_DISPATCH_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Capacity of the inbound command queue
    #[arg(long = "dispatch-queue-capacity", env = "PUSH_DISPATCH_QUEUE_CAPACITY", default_value_t = 256)]
    pub queue_capacity: usize,

    /// Seconds to wait for in-flight dispatches on shutdown
    #[arg(long = "shutdown-timeout-secs", env = "PUSH_SHUTDOWN_TIMEOUT_SECS", default_value_t = 30)]
    pub shutdown_timeout_secs: u64,
}

impl DispatchConfig {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { concurrency: 32, timeout_secs: None, queue_capacity: 256, shutdown_timeout_secs: 30 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// OTLP collector endpoint for traces and metrics
    #[arg(long = "otlp-endpoint", env = "PUSH_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Log output format
    #[arg(long = "log-format", env = "PUSH_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
