pub mod config;
pub mod error;

pub use config::{LoadConfig, QueueConfig, ServiceConfig, format_duration, parse_duration};
pub use error::{ConfigError, ConfigResult};
