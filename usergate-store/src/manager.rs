//! User manager - batch workflows on top of [`UserGateway`]

use std::collections::HashMap;

use usergate_core::{NewUser, UserRecord};

use crate::db::Store;
use crate::error::{StoreError, StoreResult};
use crate::gateway::UserGateway;

/// User manager
pub struct UserManager<'a> {
    gateway: UserGateway<'a>,
}

impl<'a> UserManager<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self {
            gateway: UserGateway::new(store),
        }
    }

    pub fn gateway(&self) -> &UserGateway<'a> {
        &self.gateway
    }

    pub async fn get_users_older_than(&self, age_from: i64) -> StoreResult<Vec<UserRecord>> {
        self.gateway.list_users_older_than(age_from).await
    }

    /// One lookup per name, results in input order.
    ///
    /// The first name with no match aborts the batch with
    /// `StoreError::NotFound` naming it.
    pub async fn get_users_by_names<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> StoreResult<Vec<UserRecord>> {
        let mut users = Vec::with_capacity(names.len());
        for name in names {
            users.push(self.gateway.get_user_by_name(name.as_ref()).await?);
        }
        Ok(users)
    }

    /// Single-query alternative to [`get_users_by_names`](Self::get_users_by_names).
    pub async fn group_users_by_names<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> StoreResult<HashMap<String, Vec<UserRecord>>> {
        self.gateway.find_users_by_names(names).await
    }

    /// Insert all users in one transaction (all-or-nothing).
    ///
    /// Every entry is validated before the transaction opens. On success the
    /// returned ids line up with `users`; an entry may be `None` if its
    /// identity could not be confirmed. If any insert fails, the transaction
    /// is rolled back and `StoreError::BatchRolledBack` names the failing
    /// index; no ids are returned.
    pub async fn add_users(&self, users: &[NewUser]) -> StoreResult<Vec<Option<i64>>> {
        for (index, user) in users.iter().enumerate() {
            user.validate()
                .map_err(|source| StoreError::Validation { index, source })?;
        }

        if users.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.gateway.store().begin().await?;
        let mut ids = Vec::with_capacity(users.len());

        for (index, user) in users.iter().enumerate() {
            match self.gateway.add_user_on(&mut *tx, user).await {
                Ok(id) => ids.push(id),
                Err(source) => {
                    tracing::warn!(index, error = %source, "insert failed, rolling back batch");
                    if let Err(rollback_err) = tx.rollback().await {
                        tracing::error!(error = %rollback_err, "rollback failed");
                    }
                    return Err(StoreError::BatchRolledBack {
                        index,
                        source: Box::new(source),
                    });
                }
            }
        }

        tx.commit().await?;

        let unconfirmed = ids.iter().filter(|id| id.is_none()).count();
        tracing::info!(count = ids.len(), unconfirmed, "committed user batch");
        Ok(ids)
    }
}
