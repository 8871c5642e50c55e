pub mod error;
pub mod log_rotation;
pub mod logger;
pub mod monitor;
pub mod validation;
