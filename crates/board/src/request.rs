//! Insert requests handed to a [`Store`](crate::store::Store).

use time::OffsetDateTime;

use crate::models::{EntityKey, EntityKind, Relation};

/// A scalar column value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i32),
    Text(String),
    Timestamp(OffsetDateTime),
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<OffsetDateTime> for FieldValue {
    fn from(value: OffsetDateTime) -> Self {
        FieldValue::Timestamp(value)
    }
}

/// Target of a relation: either left unset or connected to an existing row by key.
///
/// An unset link never reaches the store as a column value, so a missing
/// relation cannot turn into a default key that happens to match a real row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Link {
    #[default]
    Unset,
    ConnectTo(EntityKey),
}

impl Link {
    pub fn key(&self) -> Option<EntityKey> {
        match self {
            Link::Unset => None,
            Link::ConnectTo(key) => Some(*key),
        }
    }
}

impl From<Option<EntityKey>> for Link {
    fn from(value: Option<EntityKey>) -> Self {
        value.map_or(Link::Unset, Link::ConnectTo)
    }
}

/// A relation resolved to a concrete target key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub relation: Relation,
    pub key: EntityKey,
}

/// Request to insert one row.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRequest {
    kind: EntityKind,
    key: EntityKey,
    fields: Vec<(&'static str, FieldValue)>,
    connections: Vec<Connection>,
}

impl CreateRequest {
    pub fn new(kind: EntityKind, key: EntityKey) -> Self {
        Self {
            kind,
            key,
            fields: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Sets a scalar column.
    pub fn field(mut self, column: &'static str, value: impl Into<FieldValue>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    /// Sets a scalar column only when a value is present.
    pub fn optional_field<T: Into<FieldValue>>(
        mut self,
        column: &'static str,
        value: Option<T>,
    ) -> Self {
        if let Some(value) = value {
            self.fields.push((column, value.into()));
        }
        self
    }

    /// Connects a relation; [`Link::Unset`] leaves it out of the request entirely.
    pub fn relate(mut self, relation: Relation, link: impl Into<Link>) -> Self {
        debug_assert_eq!(relation.owner, self.kind);
        if let Some(key) = link.into().key() {
            self.connections.push(Connection { relation, key });
        }
        self
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn key(&self) -> EntityKey {
        self.key
    }

    pub fn fields(&self) -> &[(&'static str, FieldValue)] {
        &self.fields
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Returns the value of a scalar column, if set.
    pub fn value(&self, column: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    /// Returns the target key of a relation, if connected.
    pub fn connection(&self, relation_name: &str) -> Option<EntityKey> {
        self.connections
            .iter()
            .find(|c| c.relation.name == relation_name)
            .map(|c| c.key)
    }
}
