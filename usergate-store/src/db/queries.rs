//! SQL text per backend.
//!
//! PostgreSQL binds `$n` and quotes `"from"`; MySQL binds `?` and quotes with
//! backticks; SQLite binds `?` and accepts `"from"`.

use usergate_core::Backend;

pub(crate) struct UserQueries {
    pub list_older_than: &'static str,
    pub get_by_name: &'static str,
    pub insert: &'static str,
    pub count: &'static str,
    /// `SELECT ... WHERE name IN (` prefix for the grouped lookup
    pub by_names_prefix: &'static str,
}

const PG: UserQueries = UserQueries {
    list_older_than: r#"
SELECT id, name, last_name, "from", age, settings
FROM users
WHERE age > $1
LIMIT $2
"#,
    get_by_name: r#"
SELECT id, name, last_name, "from", age
FROM users
WHERE name = $1
LIMIT 1
"#,
    insert: r#"
INSERT INTO users (name, last_name, age)
VALUES ($1, $2, $3)
RETURNING id
"#,
    count: "SELECT COUNT(*) AS total FROM users",
    by_names_prefix: r#"SELECT id, name, last_name, "from", age FROM users WHERE name IN ("#,
};

const MYSQL: UserQueries = UserQueries {
    list_older_than: r#"
SELECT id, name, last_name, `from`, age, settings
FROM users
WHERE age > ?
LIMIT ?
"#,
    get_by_name: r#"
SELECT id, name, last_name, `from`, age
FROM users
WHERE name = ?
LIMIT 1
"#,
    insert: r#"
INSERT INTO users (name, last_name, age)
VALUES (?, ?, ?)
"#,
    count: "SELECT COUNT(*) AS total FROM users",
    by_names_prefix: "SELECT id, name, last_name, `from`, age FROM users WHERE name IN (",
};

const SQLITE: UserQueries = UserQueries {
    list_older_than: r#"
SELECT id, name, last_name, "from", age, settings
FROM users
WHERE age > ?
LIMIT ?
"#,
    get_by_name: r#"
SELECT id, name, last_name, "from", age
FROM users
WHERE name = ?
LIMIT 1
"#,
    insert: r#"
INSERT INTO users (name, last_name, age)
VALUES (?, ?, ?)
RETURNING id
"#,
    count: "SELECT COUNT(*) AS total FROM users",
    by_names_prefix: r#"SELECT id, name, last_name, "from", age FROM users WHERE name IN ("#,
};

pub(crate) fn for_backend(backend: Backend) -> &'static UserQueries {
    match backend {
        Backend::PostgreSQL => &PG,
        Backend::MySQL => &MYSQL,
        Backend::SQLite => &SQLITE,
    }
}

/// Whether inserts report their identity through `RETURNING`.
///
/// MySQL has no `RETURNING`; its `Any` query result carries the last insert
/// id instead. The SQLite `Any` mapping never does.
pub(crate) fn insert_returns_id(backend: Backend) -> bool {
    matches!(backend, Backend::PostgreSQL | Backend::SQLite)
}

/// Set-membership lookup for `count` names, ordered by id within the result.
///
/// Only placeholders are generated here; names are always bound.
pub(crate) fn select_by_names(backend: Backend, count: usize) -> String {
    let placeholders: Vec<String> = (1..=count)
        .map(|i| match backend {
            Backend::PostgreSQL => format!("${}", i),
            Backend::MySQL | Backend::SQLite => "?".to_string(),
        })
        .collect();

    format!(
        "{}{}) ORDER BY id",
        for_backend(backend).by_names_prefix,
        placeholders.join(", ")
    )
}
