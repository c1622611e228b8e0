//! In-process store with the same referential rules as the database schema.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Store;
use crate::errors::StoreError;
use crate::models::{EntityKey, EntityKind};
use crate::request::{CreateRequest, FieldValue};

/// A row as the memory store keeps it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoredRow {
    pub fields: BTreeMap<&'static str, FieldValue>,
    /// Connected relations by name. A relation left unset has no entry.
    pub links: BTreeMap<&'static str, EntityKey>,
}

type Table = BTreeMap<EntityKey, StoredRow>;

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<EntityKind, Table>>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of a stored row.
    pub async fn row(&self, kind: EntityKind, key: EntityKey) -> Option<StoredRow> {
        self.tables
            .read()
            .await
            .get(&kind)
            .and_then(|table| table.get(&key))
            .cloned()
    }

    /// Returns copies of every row of `kind`, ordered by key.
    pub async fn rows(&self, kind: EntityKind) -> Vec<(EntityKey, StoredRow)> {
        self.tables
            .read()
            .await
            .get(&kind)
            .map(|table| table.iter().map(|(k, r)| (*k, r.clone())).collect())
            .unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn delete_all(&self, kind: EntityKind) -> Result<u64, StoreError> {
        self.ensure_open()?;
        let mut tables = self.tables.write().await;

        for relation in kind.dependents() {
            let count = tables
                .get(&relation.owner)
                .map(|table| {
                    table
                        .values()
                        .filter(|row| row.links.contains_key(relation.name))
                        .count()
                })
                .unwrap_or(0);

            if count > 0 {
                return Err(StoreError::HasDependents {
                    kind,
                    dependent: relation.owner,
                    count,
                });
            }
        }

        let removed = tables.remove(&kind).map(|t| t.len()).unwrap_or(0);
        Ok(removed as u64)
    }

    async fn create(&self, request: &CreateRequest) -> Result<EntityKey, StoreError> {
        self.ensure_open()?;
        let kind = request.kind();
        let key = request.key();
        let mut tables = self.tables.write().await;

        if tables.get(&kind).is_some_and(|table| table.contains_key(&key)) {
            return Err(StoreError::Duplicate { kind, key });
        }

        for connection in request.connections() {
            let target = connection.relation.target;
            let exists = tables
                .get(&target)
                .is_some_and(|table| table.contains_key(&connection.key));
            if !exists {
                return Err(StoreError::MissingTarget {
                    kind,
                    relation: connection.relation.name,
                    target,
                    key: connection.key,
                });
            }
        }

        let row = StoredRow {
            fields: request.fields().iter().cloned().collect(),
            links: request
                .connections()
                .iter()
                .map(|c| (c.relation.name, c.key))
                .collect(),
        };
        tables.entry(kind).or_default().insert(key, row);

        Ok(key)
    }

    async fn count(&self, kind: EntityKind) -> Result<u64, StoreError> {
        self.ensure_open()?;
        let tables = self.tables.read().await;
        Ok(tables.get(&kind).map(|t| t.len()).unwrap_or(0) as u64)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::relations::{TASK_AUTHOR, TASK_PROJECT, USER_TEAM};

    fn team(id: EntityKey) -> CreateRequest {
        CreateRequest::new(EntityKind::Team, id).field("name", format!("Team {id}"))
    }

    fn user(id: EntityKey, team_id: Option<EntityKey>) -> CreateRequest {
        CreateRequest::new(EntityKind::User, id)
            .field("username", format!("user{id}"))
            .relate(USER_TEAM, team_id)
    }

    #[tokio::test]
    async fn test_create_and_count() {
        let store = MemoryStore::new();
        store.create(&team(1)).await.unwrap();
        store.create(&team(2)).await.unwrap();

        assert_eq!(store.count(EntityKind::Team).await.unwrap(), 2);
        assert_eq!(store.count(EntityKind::User).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_key_rejected() {
        let store = MemoryStore::new();
        store.create(&team(1)).await.unwrap();

        let err = store.create(&team(1)).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Duplicate {
                kind: EntityKind::Team,
                key: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_target_rejected() {
        let store = MemoryStore::new();
        let task = CreateRequest::new(EntityKind::Task, 1)
            .field("title", "Orphan")
            .relate(TASK_PROJECT, Some(9))
            .relate(TASK_AUTHOR, Some(9));

        let err = store.create(&task).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::MissingTarget {
                relation: "project",
                target: EntityKind::Project,
                key: 9,
                ..
            }
        ));
        assert_eq!(store.count(EntityKind::Task).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unset_link_stores_no_relation() {
        let store = MemoryStore::new();
        store.create(&team(1)).await.unwrap();
        store.create(&user(1, Some(1))).await.unwrap();
        store.create(&user(2, None)).await.unwrap();

        let linked = store.row(EntityKind::User, 1).await.unwrap();
        let unlinked = store.row(EntityKind::User, 2).await.unwrap();
        assert_eq!(linked.links.get("team"), Some(&1));
        assert!(unlinked.links.is_empty());
    }

    #[tokio::test]
    async fn test_delete_rejected_while_dependents_exist() {
        let store = MemoryStore::new();
        store.create(&team(1)).await.unwrap();
        store.create(&user(1, Some(1))).await.unwrap();

        let err = store.delete_all(EntityKind::Team).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::HasDependents {
                kind: EntityKind::Team,
                dependent: EntityKind::User,
                count: 1
            }
        ));

        assert_eq!(store.delete_all(EntityKind::User).await.unwrap(), 1);
        assert_eq!(store.delete_all(EntityKind::Team).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unlinked_dependents_do_not_block_delete() {
        let store = MemoryStore::new();
        store.create(&team(1)).await.unwrap();
        store.create(&user(1, None)).await.unwrap();

        assert_eq!(store.delete_all(EntityKind::Team).await.unwrap(), 1);
        assert_eq!(store.count(EntityKind::User).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_closed_store_rejects_operations() {
        let store = MemoryStore::new();
        store.close().await;
        store.close().await;

        assert!(store.is_closed());
        assert!(matches!(
            store.count(EntityKind::Team).await,
            Err(StoreError::Closed)
        ));
    }
}
