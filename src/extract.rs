//! Entity extraction from a StarUML `.mdj` element tree.

use crate::ast::{Cardinality, Column, DataType, Entity, Extracted, RawRelationship, RelationshipEnd, TableId};
use crate::config::Options;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::tree::{self, walk_kind};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

pub const ENTITY_KIND: &str = "ERDEntity";
pub const RELATIONSHIP_KIND: &str = "ERDRelationship";

const COLUMN_KIND: &str = "column";
const UNKNOWN_ELEMENT: &str = "<unknown>";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Input root must be a JSON object, found {0}")]
    RootNotObject(&'static str),
}

/// Collect every entity and the relationships the entities own.
pub fn extract(root: &Value, options: &Options, diagnostics: &mut Diagnostics) -> Result<Extracted, ExtractError> {
    Extractor::new(options, diagnostics).extract(root)
}

struct Extractor<'o, 'd> {
    options: &'o Options,
    diagnostics: &'d mut Diagnostics,
}

impl<'o, 'd> Extractor<'o, 'd> {
    fn new(options: &'o Options, diagnostics: &'d mut Diagnostics) -> Self {
        Self { options, diagnostics }
    }

    fn extract(&mut self, root: &Value) -> Result<Extracted, ExtractError> {
        if !root.is_object() {
            return Err(ExtractError::RootNotObject(json_type(root)));
        }

        let mut entities = Vec::new();
        let mut entity_nodes = Vec::new();
        let mut seen_tables: HashSet<TableId> = HashSet::new();
        let mut seen_ids: HashSet<String> = HashSet::new();

        for node in walk_kind(root, ENTITY_KIND) {
            // Relationships of skipped entities are still read, so their
            // missing end surfaces as a dangling reference.
            entity_nodes.push(node);
            let Some(entity) = self.parse_entity(node) else {
                continue;
            };
            if seen_ids.contains(&entity.id) {
                self.malformed(ENTITY_KIND, Some(entity.id.as_str()), "element id is not unique");
                continue;
            }
            if !seen_tables.insert(entity.table.clone()) {
                self.diagnostics.push(Diagnostic::DuplicateTable { table: entity.table });
                continue;
            }
            debug!(table = %entity.table, columns = entity.columns.len(), "extracted entity");
            seen_ids.insert(entity.id.clone());
            entities.push(entity);
        }

        let mut relationships = Vec::new();
        let mut seen_relationships: HashSet<&str> = HashSet::new();

        for node in entity_nodes {
            for rel_node in walk_kind(node, RELATIONSHIP_KIND) {
                // Entities nested inside entities would otherwise yield the
                // same relationship twice.
                if let Some(id) = tree::id(rel_node) {
                    if !seen_relationships.insert(id) {
                        continue;
                    }
                }
                if let Some(rel) = self.parse_relationship(rel_node) {
                    relationships.push(rel);
                }
            }
        }

        debug!(
            entities = entities.len(),
            relationships = relationships.len(),
            "extraction finished"
        );

        Ok(Extracted {
            entities,
            relationships,
        })
    }

    fn parse_entity(&mut self, node: &Value) -> Option<Entity> {
        let Some(id) = tree::id(node) else {
            self.malformed(ENTITY_KIND, None, "missing `_id`");
            return None;
        };
        let Some(name) = node.get("name").and_then(Value::as_str) else {
            self.malformed(ENTITY_KIND, Some(id), "missing `name`");
            return None;
        };
        let Some((namespace, table)) = self.options.split_name(name) else {
            self.diagnostics.push(Diagnostic::UnqualifiedName {
                element: id.to_string(),
                name: name.to_string(),
            });
            return None;
        };
        let table = TableId::new(namespace, table);

        let mut columns: Vec<Column> = Vec::new();
        let raw_columns = node.get("columns").and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]);
        for raw in raw_columns {
            let Some(column) = self.parse_column(&table, raw) else {
                continue;
            };
            if columns.iter().any(|c| c.name == column.name) {
                self.diagnostics.push(Diagnostic::DuplicateColumn {
                    table: table.clone(),
                    column: column.name,
                });
                continue;
            }
            columns.push(column);
        }

        Some(Entity {
            id: id.to_string(),
            table,
            columns,
        })
    }

    fn parse_column(&mut self, table: &TableId, raw: &Value) -> Option<Column> {
        let name = match raw.get("name").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => name,
            _ => {
                let element = tree::id(raw).map(str::to_string).unwrap_or_else(|| table.to_string());
                self.malformed(COLUMN_KIND, Some(element.as_str()), "missing `name`");
                return None;
            }
        };

        let declared = raw.get("type").and_then(Value::as_str).unwrap_or("");
        let data_type = match DataType::from_str(declared) {
            Some(t) => t,
            None => {
                self.diagnostics.push(Diagnostic::UnknownColumnType {
                    table: table.clone(),
                    column: name.to_string(),
                    found: declared.to_string(),
                });
                DataType::Text
            }
        };

        let length = if data_type.is_text() {
            let declared = raw
                .get("length")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .filter(|n| *n > 0);
            Some(declared.unwrap_or(self.options.default_text_length))
        } else {
            None
        };

        let flag = |key: &str| raw.get(key).and_then(Value::as_bool).unwrap_or(false);

        Some(Column {
            name: name.to_string(),
            data_type,
            length,
            is_primary_key: flag("primaryKey"),
            is_unique: flag("unique"),
            is_not_null: flag("notNull"),
            is_foreign_key: flag("foreignKey"),
        })
    }

    fn parse_relationship(&mut self, node: &Value) -> Option<RawRelationship> {
        let id = tree::id(node);
        let name = match node.get("name").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => name,
            _ => {
                self.malformed(RELATIONSHIP_KIND, id, "missing `name`");
                return None;
            }
        };

        let end1 = self.parse_end(node, "end1", name)?;
        let end2 = self.parse_end(node, "end2", name)?;

        Some(RawRelationship {
            id: id.map(str::to_string),
            name: name.to_string(),
            end1,
            end2,
        })
    }

    fn parse_end(&mut self, node: &Value, key: &str, relationship: &str) -> Option<RelationshipEnd> {
        let reference = node
            .get(key)
            .and_then(|end| end.get("reference"))
            .and_then(|r| r.get("$ref"))
            .and_then(Value::as_str);
        let Some(reference) = reference else {
            let reason = format!("`{key}` has no entity reference");
            self.malformed(RELATIONSHIP_KIND, Some(relationship), &reason);
            return None;
        };

        let declared = node
            .get(key)
            .and_then(|end| end.get("cardinality"))
            .and_then(Value::as_str)
            .unwrap_or("");
        let cardinality = if declared.trim().is_empty() {
            Cardinality::One
        } else {
            Cardinality::from_str(declared).unwrap_or_else(|| {
                self.diagnostics.push(Diagnostic::UnknownCardinality {
                    relationship: relationship.to_string(),
                    found: declared.to_string(),
                });
                Cardinality::One
            })
        };

        Some(RelationshipEnd {
            reference: reference.to_string(),
            cardinality,
        })
    }

    fn malformed(&mut self, kind: &str, element: Option<&str>, reason: &str) {
        self.diagnostics.push(Diagnostic::MalformedElement {
            kind: kind.to_string(),
            element: element.unwrap_or(UNKNOWN_ELEMENT).to_string(),
            reason: reason.to_string(),
        });
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
