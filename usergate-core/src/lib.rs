//! usergate-core: domain types shared by the usergate store
//!
//! Everything here is pure: validation, settings projection and
//! environment configuration. Database access lives in `usergate-store`.

pub mod config;
pub mod settings;
pub mod tracing_setup;
pub mod user;
pub mod validation;

pub use config::{Backend, ConfigError, StoreConfig};
pub use settings::project_key;
pub use user::{NewUser, UserRecord};
pub use validation::ValidationError;
