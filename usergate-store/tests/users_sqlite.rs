//! End-to-end tests against in-memory SQLite through the `Any` driver.

use serde_json::json;
use usergate_store::{
    migrations, NewUser, Store, StoreConfig, StoreError, UserGateway, UserManager,
    USERS_PAGE_LIMIT,
};

/// In-memory SQLite lives per connection, so the pool is pinned to one.
async fn setup() -> Store {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("usergate_store=debug")
        .try_init();

    let store = Store::connect(&StoreConfig::new("sqlite::memory:").max_connections(1))
        .await
        .expect("Failed to connect");
    migrations::run(&store).await.expect("Failed to migrate");
    store
}

fn user(name: &str, last_name: &str, age: i64) -> NewUser {
    NewUser::new(name, last_name, age).expect("valid test user")
}

async fn insert_with_settings(store: &Store, name: &str, age: i64, from: Option<&str>, settings: Option<&str>) {
    sqlx::query(r#"INSERT INTO users (name, last_name, "from", age, settings) VALUES (?, ?, ?, ?, ?)"#)
        .bind(name)
        .bind("Doe")
        .bind(from.map(str::to_string))
        .bind(age)
        .bind(settings.map(str::to_string))
        .execute(store.pool())
        .await
        .expect("Failed to insert user");
}

/// Abort any insert of a user with this name.
async fn fail_inserts_named(store: &Store, name: &str) {
    let trigger = format!(
        "CREATE TRIGGER fail_{name} BEFORE INSERT ON users WHEN NEW.name = '{name}' \
         BEGIN SELECT RAISE(ABORT, 'injected failure'); END"
    );
    sqlx::query(&trigger)
        .execute(store.pool())
        .await
        .expect("Failed to create trigger");
}

/// Silently drop any insert of a user with this name.
async fn ignore_inserts_named(store: &Store, name: &str) {
    let trigger = format!(
        "CREATE TRIGGER ignore_{name} BEFORE INSERT ON users WHEN NEW.name = '{name}' \
         BEGIN SELECT RAISE(IGNORE); END"
    );
    sqlx::query(&trigger)
        .execute(store.pool())
        .await
        .expect("Failed to create trigger");
}

#[tokio::test]
async fn add_user_then_fetch_by_name_round_trips() {
    let store = setup().await;
    let gateway = UserGateway::new(&store);

    let id = gateway
        .add_user(&user("Ada", "Lovelace", 36))
        .await
        .unwrap()
        .expect("identity should be confirmed");
    assert!(id > 0);

    let fetched = gateway.get_user_by_name("Ada").await.unwrap();
    assert_eq!(fetched.id, id);
    assert_eq!(fetched.name, "Ada");
    assert_eq!(fetched.last_name, "Lovelace");
    assert_eq!(fetched.age, 36);
    assert_eq!(fetched.from, None);
    assert_eq!(fetched.key, None);
}

#[tokio::test]
async fn identities_are_distinct() {
    let store = setup().await;
    let gateway = UserGateway::new(&store);

    let first = gateway.add_user(&user("A", "One", 1)).await.unwrap().unwrap();
    let second = gateway.add_user(&user("B", "Two", 2)).await.unwrap().unwrap();
    assert!(second > first);
}

#[tokio::test]
async fn get_user_by_name_missing_is_not_found() {
    let store = setup().await;
    let gateway = UserGateway::new(&store);

    let err = gateway.get_user_by_name("nobody").await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::NotFound { resource: "user", ref key } if key == "nobody"
    ));
}

#[tokio::test]
async fn get_user_by_name_matches_exactly() {
    let store = setup().await;
    let gateway = UserGateway::new(&store);
    gateway.add_user(&user("Ann", "Lee", 30)).await.unwrap();

    assert!(gateway.get_user_by_name("An").await.is_err());
    assert!(gateway.get_user_by_name("Ann ").await.is_err());
    assert_eq!(gateway.get_user_by_name("Ann").await.unwrap().last_name, "Lee");
}

#[tokio::test]
async fn list_filters_by_age_and_caps_page() {
    let store = setup().await;
    let manager = UserManager::new(&store);

    let batch: Vec<NewUser> = (1..=15).map(|age| user(&format!("u{age}"), "X", age)).collect();
    manager.add_users(&batch).await.unwrap();

    let users = manager.get_users_older_than(2).await.unwrap();
    assert_eq!(users.len() as i64, USERS_PAGE_LIMIT);
    assert!(users.iter().all(|u| u.age > 2));

    let users = manager.get_users_older_than(12).await.unwrap();
    let mut ages: Vec<i64> = users.iter().map(|u| u.age).collect();
    ages.sort_unstable();
    assert_eq!(ages, vec![13, 14, 15]);
}

#[tokio::test]
async fn list_with_no_matches_is_empty() {
    let store = setup().await;
    let gateway = UserGateway::new(&store);
    gateway.add_user(&user("Young", "One", 10)).await.unwrap();

    assert!(gateway.list_users_older_than(10).await.unwrap().is_empty());
    assert!(gateway.list_users_older_than(100).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_projects_settings_key() {
    let store = setup().await;
    insert_with_settings(&store, "plain", 40, Some("Oslo"), Some(r#"{"key":"alpha","x":1}"#)).await;
    insert_with_settings(&store, "nested", 41, None, Some(r#"{"key":{"a":[1,2]}}"#)).await;
    insert_with_settings(&store, "nokey", 42, None, Some(r#"{"other":true}"#)).await;
    insert_with_settings(&store, "broken", 43, None, Some("{not json")).await;
    insert_with_settings(&store, "null", 44, None, None).await;

    let users = UserGateway::new(&store).list_users_older_than(0).await.unwrap();
    assert_eq!(users.len(), 5);

    let by_name = |name: &str| users.iter().find(|u| u.name == name).unwrap();
    assert_eq!(by_name("plain").key, Some(json!("alpha")));
    assert_eq!(by_name("plain").from.as_deref(), Some("Oslo"));
    assert_eq!(by_name("nested").key, Some(json!({"a": [1, 2]})));
    assert_eq!(by_name("nokey").key, None);
    assert_eq!(by_name("broken").key, None);
    assert_eq!(by_name("null").key, None);
}

#[tokio::test]
async fn get_users_by_names_keeps_input_order() {
    let store = setup().await;
    let manager = UserManager::new(&store);
    manager
        .add_users(&[user("b", "Second", 2), user("a", "First", 1)])
        .await
        .unwrap();

    let users = manager.get_users_by_names(&["a", "b"]).await.unwrap();
    let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);

    let users = manager.get_users_by_names(&["b", "a", "b"]).await.unwrap();
    let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["b", "a", "b"]);
}

#[tokio::test]
async fn get_users_by_names_aborts_on_missing_name() {
    let store = setup().await;
    let manager = UserManager::new(&store);
    manager.add_users(&[user("a", "First", 1)]).await.unwrap();

    let err = manager
        .get_users_by_names(&["a".to_string(), "ghost".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { ref key, .. } if key == "ghost"));
}

#[tokio::test]
async fn group_users_by_names_uses_one_query() {
    let store = setup().await;
    let manager = UserManager::new(&store);
    let ids = manager
        .add_users(&[
            user("Ann", "First", 20),
            user("Bob", "Only", 30),
            user("Ann", "Second", 40),
        ])
        .await
        .unwrap();

    let grouped = manager
        .group_users_by_names(&["Ann", "Bob", "Zed"])
        .await
        .unwrap();

    assert_eq!(grouped.len(), 2);
    assert!(!grouped.contains_key("Zed"));

    let anns: Vec<Option<i64>> = grouped["Ann"].iter().map(|u| Some(u.id)).collect();
    assert_eq!(anns, vec![ids[0], ids[2]]);
    assert_eq!(grouped["Bob"][0].last_name, "Only");

    let none: &[&str] = &[];
    assert!(manager.group_users_by_names(none).await.unwrap().is_empty());
}

#[tokio::test]
async fn name_lookups_accept_owned_strings() {
    let store = setup().await;
    let manager = UserManager::new(&store);
    manager
        .add_users(&[user("Ann", "First", 20), user("Bob", "Only", 30)])
        .await
        .unwrap();

    let names: Vec<String> = vec!["Bob".to_string(), "Ann".to_string()];
    let grouped = manager.group_users_by_names(&names).await.unwrap();
    assert_eq!(grouped.len(), 2);

    let grouped = manager.gateway().find_users_by_names(&names[..1]).await.unwrap();
    assert_eq!(grouped["Bob"][0].last_name, "Only");

    let ordered = manager.get_users_by_names(&names).await.unwrap();
    assert_eq!(ordered[0].name, "Bob");
    assert_eq!(ordered[1].name, "Ann");
}

#[tokio::test]
async fn add_users_commits_all() {
    let store = setup().await;
    let manager = UserManager::new(&store);

    let batch = vec![
        user("Grace", "Hopper", 85),
        user("Alan", "Turing", 41),
        user("Edsger", "Dijkstra", 72),
    ];
    let ids = manager.add_users(&batch).await.unwrap();

    assert_eq!(ids.len(), batch.len());
    assert_eq!(manager.gateway().count_users().await.unwrap(), 3);

    for (id, input) in ids.iter().zip(&batch) {
        let id = id.expect("identity should be confirmed");
        let stored = manager.gateway().get_user_by_name(&input.name).await.unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.last_name, input.last_name);
        assert_eq!(stored.age, input.age);
    }
}

#[tokio::test]
async fn add_users_empty_batch() {
    let store = setup().await;
    let manager = UserManager::new(&store);

    assert!(manager.add_users(&[]).await.unwrap().is_empty());
    assert_eq!(manager.gateway().count_users().await.unwrap(), 0);
}

#[tokio::test]
async fn add_user_dropped_by_trigger_is_soft_failure() {
    let store = setup().await;
    ignore_inserts_named(&store, "ghost").await;
    let gateway = UserGateway::new(&store);

    let id = gateway.add_user(&user("ghost", "Nobody", 5)).await.unwrap();
    assert_eq!(id, None);
    assert_eq!(gateway.count_users().await.unwrap(), 0);
    assert!(matches!(
        gateway.get_user_by_name("ghost").await,
        Err(StoreError::NotFound { .. })
    ));
}

#[tokio::test]
async fn add_users_commits_around_soft_failure() {
    let store = setup().await;
    ignore_inserts_named(&store, "ghost").await;
    let manager = UserManager::new(&store);

    let ids = manager
        .add_users(&[user("real", "Person", 30), user("ghost", "Nobody", 5)])
        .await
        .unwrap();

    assert_eq!(ids.len(), 2);
    let real_id = ids[0].expect("identity should be confirmed");
    assert_eq!(ids[1], None);

    assert_eq!(manager.gateway().count_users().await.unwrap(), 1);
    let stored = manager.gateway().get_user_by_name("real").await.unwrap();
    assert_eq!(stored.id, real_id);
}

#[tokio::test]
async fn add_users_rolls_back_on_failure() {
    let store = setup().await;
    fail_inserts_named(&store, "boom").await;
    let manager = UserManager::new(&store);

    let batch = vec![
        user("first", "Ok", 10),
        user("second", "Ok", 20),
        user("boom", "Fails", 30),
        user("never", "Reached", 40),
    ];
    let err = manager.add_users(&batch).await.unwrap_err();

    match err {
        StoreError::BatchRolledBack { index, source } => {
            assert_eq!(index, 2);
            assert!(matches!(*source, StoreError::Query(_)));
        }
        other => panic!("expected BatchRolledBack, got {other:?}"),
    }

    assert_eq!(manager.gateway().count_users().await.unwrap(), 0);
    assert!(manager.gateway().get_user_by_name("first").await.is_err());
}

#[tokio::test]
async fn add_users_rolls_back_when_first_insert_fails() {
    let store = setup().await;
    fail_inserts_named(&store, "boom").await;
    let manager = UserManager::new(&store);

    let err = manager
        .add_users(&[user("boom", "Fails", 30), user("after", "Ok", 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::BatchRolledBack { index: 0, .. }));
    assert_eq!(manager.gateway().count_users().await.unwrap(), 0);

    // The store is still usable afterwards
    let ids = manager.add_users(&[user("after", "Ok", 1)]).await.unwrap();
    assert_eq!(ids.len(), 1);
    assert_eq!(manager.gateway().count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn add_users_validates_before_inserting() {
    let store = setup().await;
    let manager = UserManager::new(&store);

    let mut bad = user("ok", "Fine", 5);
    bad.age = -3;
    let batch = vec![user("valid", "One", 1), bad];

    let err = manager.add_users(&batch).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation { index: 1, .. }));
    assert_eq!(manager.gateway().count_users().await.unwrap(), 0);
}

#[tokio::test]
async fn missing_table_is_query_error() {
    let store = Store::connect(&StoreConfig::new("sqlite::memory:").max_connections(1))
        .await
        .unwrap();
    let gateway = UserGateway::new(&store);

    let err = gateway.list_users_older_than(0).await.unwrap_err();
    assert!(matches!(err, StoreError::Query(_)), "unexpected error: {err}");
    assert!(!err.is_connection());
}

#[tokio::test]
async fn closed_store_is_connection_error() {
    let store = setup().await;
    store.pool().close().await;

    let err = UserGateway::new(&store).count_users().await.unwrap_err();
    assert!(err.is_connection(), "unexpected error: {err}");
}
