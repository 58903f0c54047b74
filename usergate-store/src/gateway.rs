//! User gateway - one parameterized round trip per operation
//!
//! Handles the users table with:
//! - age listing capped at [`USERS_PAGE_LIMIT`], settings `key` projected
//! - lookup by exact name (first match)
//! - insert with identity read-back (`None` when it can't be confirmed)

use std::collections::HashMap;

use sqlx::any::AnyRow;
use sqlx::{AnyConnection, Row};
use usergate_core::{project_key, NewUser, UserRecord};

use crate::db::queries::{self, UserQueries};
use crate::db::Store;
use crate::error::{StoreError, StoreResult};

/// Page size for [`UserGateway::list_users_older_than`]
pub const USERS_PAGE_LIMIT: i64 = 10;

/// Integer columns may be INT or BIGINT depending on who created the schema.
fn get_int(row: &AnyRow, column: &str) -> Result<i64, sqlx::Error> {
    row.try_get::<i64, _>(column)
        .or_else(|_| row.try_get::<i32, _>(column).map(i64::from))
}

fn user_from_row(row: &AnyRow) -> Result<UserRecord, sqlx::Error> {
    Ok(UserRecord {
        id: get_int(row, "id")?,
        name: row.try_get("name")?,
        last_name: row.try_get("last_name")?,
        from: row.try_get("from")?,
        age: get_int(row, "age")?,
        key: None,
    })
}

/// User gateway
pub struct UserGateway<'a> {
    store: &'a Store,
}

impl<'a> UserGateway<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// The borrowed store, for callers that need transaction control.
    pub fn store(&self) -> &'a Store {
        self.store
    }

    fn queries(&self) -> &'static UserQueries {
        queries::for_backend(self.store.backend())
    }

    /// Users with `age > age_from`, at most [`USERS_PAGE_LIMIT`], in storage order.
    ///
    /// `key` is projected from the settings payload; an unparseable payload
    /// yields `None` rather than an error.
    pub async fn list_users_older_than(&self, age_from: i64) -> StoreResult<Vec<UserRecord>> {
        let rows = sqlx::query(self.queries().list_older_than)
            .bind(age_from)
            .bind(USERS_PAGE_LIMIT)
            .fetch_all(self.store.pool())
            .await?;

        let users = rows
            .iter()
            .map(|row| {
                let mut user = user_from_row(row)?;
                let settings: Option<String> = row.try_get("settings")?;
                user.key = project_key(settings.as_deref());
                Ok(user)
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        tracing::debug!(age_from, count = users.len(), "listed users older than");
        Ok(users)
    }

    /// First user whose name equals `name` exactly.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` when no row matches.
    pub async fn get_user_by_name(&self, name: &str) -> StoreResult<UserRecord> {
        let row = sqlx::query(self.queries().get_by_name)
            .bind(name)
            .fetch_optional(self.store.pool())
            .await?
            .ok_or_else(|| StoreError::not_found("user", name))?;

        Ok(user_from_row(&row)?)
    }

    /// Insert one user on a pooled connection.
    ///
    /// Returns `Ok(None)` when the insert ran but no nonzero identity came
    /// back (e.g. a trigger silently dropped the row); that is a soft
    /// failure, not an error.
    pub async fn add_user(&self, user: &NewUser) -> StoreResult<Option<i64>> {
        let mut conn = self.store.pool().acquire().await?;
        self.add_user_on(&mut conn, user).await
    }

    /// Insert one user on the given connection (e.g. inside a transaction).
    pub async fn add_user_on(
        &self,
        conn: &mut AnyConnection,
        user: &NewUser,
    ) -> StoreResult<Option<i64>> {
        let query = sqlx::query(self.queries().insert)
            .bind(user.name.as_str())
            .bind(user.last_name.as_str())
            .bind(user.age);

        let id = if queries::insert_returns_id(self.store.backend()) {
            query
                .fetch_optional(&mut *conn)
                .await?
                .map(|row| get_int(&row, "id"))
                .transpose()?
        } else {
            query.execute(&mut *conn).await?.last_insert_id()
        };

        let id = id.filter(|id| *id != 0);
        match id {
            Some(id) => tracing::debug!(id, "inserted user"),
            None => tracing::warn!(name = %user.name, "insert executed but identity was not confirmed"),
        }
        Ok(id)
    }

    /// All users whose name is in `names`, grouped by name, in one round trip.
    ///
    /// Names with no match are absent from the map. Within a name, records
    /// are ordered by id.
    pub async fn find_users_by_names<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> StoreResult<HashMap<String, Vec<UserRecord>>> {
        let mut grouped: HashMap<String, Vec<UserRecord>> = HashMap::new();
        if names.is_empty() {
            return Ok(grouped);
        }

        let sql = queries::select_by_names(self.store.backend(), names.len());
        let mut query = sqlx::query(&sql);
        for name in names {
            query = query.bind(name.as_ref());
        }

        let rows = query.fetch_all(self.store.pool()).await?;
        for row in &rows {
            let user = user_from_row(row)?;
            grouped.entry(user.name.clone()).or_default().push(user);
        }

        tracing::debug!(
            requested = names.len(),
            matched = grouped.len(),
            rows = rows.len(),
            "grouped users by name"
        );
        Ok(grouped)
    }

    /// Total number of stored users.
    pub async fn count_users(&self) -> StoreResult<i64> {
        let row = sqlx::query(self.queries().count)
            .fetch_one(self.store.pool())
            .await?;
        Ok(get_int(&row, "total")?)
    }
}
