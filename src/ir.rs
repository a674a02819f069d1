//! Resolved schema model handed to code emitters.

use crate::ast::{Cardinality, Column, TableId};
use serde::Serialize;

/// A foreign key owned by `source` and pointing at `target`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relationship {
    pub name: String,
    pub source: TableId,
    pub target: TableId,
    pub cardinality: Cardinality,
}

impl Relationship {
    /// Emitters render a to-many foreign key for many-side owners and a
    /// one-to-one field otherwise.
    pub fn is_to_many(&self) -> bool {
        self.cardinality.is_many()
    }

    pub fn is_cross_namespace(&self) -> bool {
        self.source.namespace != self.target.namespace
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub id: TableId,
    pub columns: Vec<Column>,
    pub relationships: Vec<Relationship>,
    /// Tables in other namespaces this table points at.
    pub references: Vec<TableId>,
}

impl Table {
    pub fn new(id: TableId, columns: Vec<Column>) -> Self {
        Self {
            id,
            columns,
            relationships: Vec::new(),
            references: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.name == name)
    }
}

/// Tables after foreign-key placement, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedSchema {
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Namespace {
    pub name: String,
    /// Declaration order.
    pub tables: Vec<Table>,
    /// Table names such that each follows every table it references here.
    pub order: Vec<String>,
}

impl Namespace {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.id.table == name)
    }

    /// Tables in dependency order.
    pub fn ordered_tables(&self) -> impl Iterator<Item = &Table> {
        self.order.iter().filter_map(|name| self.table(name))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaModel {
    /// Sorted by name.
    pub namespaces: Vec<Namespace>,
}

impl SchemaModel {
    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.iter().find(|n| n.name == name)
    }

    pub fn table(&self, id: &TableId) -> Option<&Table> {
        self.namespace(&id.namespace)?.table(&id.table)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.namespaces.iter().flat_map(|n| n.tables.iter())
    }
}
