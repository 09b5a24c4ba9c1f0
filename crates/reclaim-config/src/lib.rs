//! # Reclaim Config
//!
//! Application configuration for the reclaim workspace: where the task store
//! lives, how often the scheduler ticks, and where logs go.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
