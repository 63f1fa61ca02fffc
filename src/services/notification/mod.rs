pub mod classifier;
pub mod dispatcher;
pub mod executor;
pub mod provider;
pub mod retry;
pub mod store;

pub use classifier::{Decision, classify};
pub use dispatcher::Dispatcher;
pub use executor::DeliveryExecutor;
pub use provider::{PushError, PushProvider};
pub use retry::RetryPolicy;
pub use store::{DeviceRegistry, OutcomeLogStore};
