//! Database layer - connection pool, schema and SQL text
//!
//! # Design Principles
//!
//! - One pool per `Store`, passed by reference - no global connection
//! - A transaction pins one pooled connection until commit/rollback
//! - SQL text is chosen per backend (placeholders and identifier quoting differ)

pub mod migrations;
pub mod pool;
pub(crate) mod queries;

pub use pool::Store;
