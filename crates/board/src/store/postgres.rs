//! PostgreSQL-backed store.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::Store;
use crate::errors::StoreError;
use crate::models::{EntityKey, EntityKind};
use crate::request::{CreateRequest, FieldValue};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }

    /// Returns a reference to the pool for advanced usage.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Builds `INSERT INTO <table> (<pk>, <columns>..) VALUES ($1, ..) RETURNING <pk>`.
fn insert_query(request: &CreateRequest) -> QueryBuilder<'static, Postgres> {
    let kind = request.kind();
    let mut qb = QueryBuilder::new(format!("INSERT INTO {} (", kind.table()));

    {
        let mut columns = qb.separated(", ");
        columns.push(kind.primary_key());
        for (column, _) in request.fields() {
            columns.push(*column);
        }
        for connection in request.connections() {
            columns.push(connection.relation.column);
        }
    }

    qb.push(") VALUES (");

    {
        let mut values = qb.separated(", ");
        values.push_bind(request.key());
        for (_, value) in request.fields() {
            match value {
                FieldValue::Int(v) => values.push_bind(*v),
                FieldValue::Text(s) => values.push_bind(s.clone()),
                FieldValue::Timestamp(t) => values.push_bind(*t),
            };
        }
        for connection in request.connections() {
            values.push_bind(connection.key);
        }
    }

    qb.push(") RETURNING ");
    qb.push(kind.primary_key());
    qb
}

#[async_trait]
impl Store for PgStore {
    async fn delete_all(&self, kind: EntityKind) -> Result<u64, StoreError> {
        let result = sqlx::query(&format!("DELETE FROM {}", kind.table()))
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::from_database(e, kind, None))?;

        Ok(result.rows_affected())
    }

    async fn create(&self, request: &CreateRequest) -> Result<EntityKey, StoreError> {
        let mut qb = insert_query(request);
        debug!(kind = %request.kind(), key = request.key(), "{}", qb.sql());

        let key: EntityKey = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::from_database(e, request.kind(), Some(request.key())))?;

        Ok(key)
    }

    async fn count(&self, kind: EntityKind) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", kind.table()))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::from_database(e, kind, None))?;

        Ok(count.max(0) as u64)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
