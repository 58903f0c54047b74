//! Connection pool management
//!
//! Uses an sqlx `AnyPool` so the DSN decides the backend at runtime.

use sqlx::any::AnyPoolOptions;
use sqlx::{Any, AnyPool, Transaction};
use usergate_core::{Backend, StoreConfig};

use crate::error::{StoreError, StoreResult};

/// Owner of the connection pool.
///
/// Gateways and managers borrow a `&Store`; the pool lives until
/// [`Store::close`] or drop.
pub struct Store {
    pool: AnyPool,
    backend: Backend,
}

impl Store {
    /// Open a pool for the configured DSN.
    ///
    /// # Errors
    ///
    /// `StoreError::Config` for an unsupported scheme,
    /// `StoreError::Connection` if the store is unreachable or rejects the
    /// credentials.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let store = Store::connect(&StoreConfig::from_env()?).await?;
    /// ```
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        sqlx::any::install_default_drivers();

        let backend = config.backend()?;
        let url = config.connection_url()?;

        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&url)
            .await
            .map_err(StoreError::Connection)?;

        tracing::info!(
            ?backend,
            dsn = %config.redacted_dsn(),
            max_connections = config.max_connections,
            "connected to user store"
        );

        Ok(Self { pool, backend })
    }

    /// The shared pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Begin a transaction on a connection borrowed from the pool.
    pub async fn begin(&self) -> StoreResult<Transaction<'static, Any>> {
        Ok(self.pool.begin().await?)
    }

    /// Close the pool, waiting for borrowed connections to return.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::debug!("user store closed");
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.backend)
            .field("size", &self.pool.size())
            .finish_non_exhaustive()
    }
}
