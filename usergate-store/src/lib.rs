//! usergate-store: data access for the `users` table
//!
//! Three layers, leaf first:
//! - [`Store`]: owns the connection pool (explicit connect/close)
//! - [`UserGateway`]: one parameterized round trip per operation
//! - [`UserManager`]: batch workflows, including the transactional bulk insert

pub mod db;
pub mod error;
pub mod gateway;
pub mod manager;

pub use db::{migrations, Store};
pub use error::{StoreError, StoreResult};
pub use gateway::{UserGateway, USERS_PAGE_LIMIT};
pub use manager::UserManager;

pub use usergate_core::{Backend, NewUser, StoreConfig, UserRecord, ValidationError};
