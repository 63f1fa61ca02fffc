pub mod fcm;
pub mod log;

pub use fcm::FcmPushProvider;
pub use log::LogPushProvider;
