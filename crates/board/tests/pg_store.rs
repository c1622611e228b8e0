//! Integration tests for the PostgreSQL store.
//!
//! To run these tests, you need:
//! 1. A PostgreSQL database with the migrations in `crates/board/migrations` applied
//! 2. DATABASE_URL environment variable set
//!
//! Run with: `DATABASE_URL=postgres://... cargo nextest run -p board pg_store`
//!
//! Note: These tests only touch rows with keys in a reserved high range and
//! remove them afterwards, so they can run against a development database.

use board::relations::{TASK_ASSIGNEE, TASK_AUTHOR, TASK_PROJECT, USER_TEAM};
use board::store::PgStore;
use board::{CreateRequest, EntityKind, Link, Store, StoreError};
use sqlx::PgPool;
use std::env;
use time::macros::datetime;

const BASE_KEY: i32 = 1_900_000_000;

/// Get a store, skipping tests if DATABASE_URL is not set.
async fn get_test_store() -> Option<PgStore> {
    let database_url = match env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: DATABASE_URL not set");
            return None;
        }
    };

    match PgStore::connect(&database_url, 1).await {
        Ok(store) => Some(store),
        Err(e) => {
            eprintln!("Skipping test: Failed to connect to database: {e}");
            None
        }
    }
}

/// Cleanup helper to remove test rows.
async fn cleanup(pool: &PgPool, base: i32) {
    // Delete in order due to foreign key constraints
    for kind in EntityKind::reverse_order() {
        let _ = sqlx::query(&format!(
            "DELETE FROM {} WHERE {} BETWEEN $1 AND $1 + 99",
            kind.table(),
            kind.primary_key()
        ))
        .bind(base)
        .execute(pool)
        .await;
    }
}

#[tokio::test]
async fn test_create_with_optional_relations() {
    let Some(store) = get_test_store().await else {
        return;
    };
    let base = BASE_KEY;
    cleanup(store.pool(), base).await;

    store
        .create(&CreateRequest::new(EntityKind::Team, base).field("name", "Integration Team"))
        .await
        .expect("Failed to create team");
    store
        .create(
            &CreateRequest::new(EntityKind::Project, base)
                .field("name", "Integration Project")
                .field("start_date", datetime!(2024-01-01 0:00 UTC)),
        )
        .await
        .expect("Failed to create project");
    store
        .create(
            &CreateRequest::new(EntityKind::User, base)
                .field("username", format!("integration-{base}"))
                .relate(USER_TEAM, Some(base)),
        )
        .await
        .expect("Failed to create user");

    let task_key = store
        .create(
            &CreateRequest::new(EntityKind::Task, base)
                .field("title", "Integration task")
                .field("status", "To Do")
                .relate(TASK_PROJECT, Some(base))
                .relate(TASK_AUTHOR, Some(base))
                .relate(TASK_ASSIGNEE, Link::Unset),
        )
        .await
        .expect("Failed to create task");
    assert_eq!(task_key, base);

    let assignee: Option<i32> =
        sqlx::query_scalar("SELECT assigned_user_id FROM tasks WHERE id = $1")
            .bind(base)
            .fetch_one(store.pool())
            .await
            .expect("Failed to read task");
    assert_eq!(assignee, None);

    cleanup(store.pool(), base).await;
    store.close().await;
}

#[tokio::test]
async fn test_dangling_connect_is_foreign_key_error() {
    let Some(store) = get_test_store().await else {
        return;
    };
    let base = BASE_KEY + 100;
    cleanup(store.pool(), base).await;

    let err = store
        .create(
            &CreateRequest::new(EntityKind::User, base)
                .field("username", format!("integration-{base}"))
                .relate(USER_TEAM, Some(base + 50)),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::ForeignKey {
            kind: EntityKind::User,
            ..
        }
    ));

    cleanup(store.pool(), base).await;
    store.close().await;
}

#[tokio::test]
async fn test_duplicate_key_is_classified() {
    let Some(store) = get_test_store().await else {
        return;
    };
    let base = BASE_KEY + 200;
    cleanup(store.pool(), base).await;

    let team = CreateRequest::new(EntityKind::Team, base).field("name", "Twice");
    store.create(&team).await.expect("Failed to create team");
    let err = store.create(&team).await.unwrap_err();
    assert!(matches!(err, StoreError::Duplicate { key, .. } if key == base));

    cleanup(store.pool(), base).await;
    store.close().await;
}
