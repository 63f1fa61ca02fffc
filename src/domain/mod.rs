pub mod device_token;
pub mod notification;
pub mod outcome_log;
pub mod push;
