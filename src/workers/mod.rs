pub mod dispatch;

pub use dispatch::{DispatchWorker, NotificationPublisher};
