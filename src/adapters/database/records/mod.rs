pub mod device_token;
pub mod outcome_log;

pub use device_token::DeviceTokenRecord;
pub use outcome_log::OutcomeLogRecord;
