//! Command implementations.

pub mod config;
pub mod interview;
pub mod rules;

pub use self::config::execute_config;
pub use self::interview::execute_interview;
pub use self::rules::execute_rules;
