//! JSON export of a resolved schema in the tuple layout code emitters read.
//!
//! ```text
//! {
//!   "schema": {
//!     "<namespace>": {
//!       "<table>": {
//!         "columns":       [ { "<name>": [TYPE, length, pk, unique, not_null] } ],
//!         "relationships": [ { "<name>": [namespace, table, cardinality] } ],
//!         "references":    [ [namespace, table] ]
//!       }
//!     }
//!   },
//!   "order": { "<namespace>": ["<table>", ...] },
//!   "diagnostics": [ { "severity": "warning", "message": "..." } ]
//! }
//! ```

use crate::ast::{Column, TableId};
use crate::diagnostics::Diagnostic;
use crate::ir::{Relationship, SchemaModel, Table};
use serde_json::{Map, Value, json};

pub fn to_json(model: &SchemaModel, diagnostics: &[Diagnostic]) -> Value {
    let mut schema = Map::new();
    let mut order = Map::new();

    for namespace in &model.namespaces {
        let tables: Map<String, Value> = namespace
            .tables
            .iter()
            .map(|table| (table.id.table.clone(), table_json(table)))
            .collect();
        schema.insert(namespace.name.clone(), Value::Object(tables));
        order.insert(namespace.name.clone(), json!(namespace.order));
    }

    let diagnostics: Vec<Value> = diagnostics
        .iter()
        .map(|d| json!({ "severity": d.severity(), "message": d.to_string() }))
        .collect();

    json!({
        "schema": schema,
        "order": order,
        "diagnostics": diagnostics,
    })
}

/// Pretty-printed [`to_json`].
pub fn to_json_string(model: &SchemaModel, diagnostics: &[Diagnostic]) -> String {
    // Serializing a `Value` cannot fail.
    serde_json::to_string_pretty(&to_json(model, diagnostics)).unwrap_or_default()
}

fn table_json(table: &Table) -> Value {
    let columns: Vec<Value> = table.columns.iter().map(column_json).collect();
    let relationships: Vec<Value> = table.relationships.iter().map(relationship_json).collect();
    let references: Vec<Value> = table.references.iter().map(table_ref_json).collect();

    json!({
        "columns": columns,
        "relationships": relationships,
        "references": references,
    })
}

fn column_json(column: &Column) -> Value {
    let mut entry = Map::new();
    entry.insert(
        column.name.clone(),
        json!([
            column.data_type.as_str(),
            column.length.unwrap_or(0),
            column.is_primary_key,
            column.is_unique,
            column.is_not_null,
        ]),
    );
    Value::Object(entry)
}

fn relationship_json(rel: &Relationship) -> Value {
    let mut entry = Map::new();
    entry.insert(
        rel.name.clone(),
        json!([rel.target.namespace, rel.target.table, rel.cardinality.as_str()]),
    );
    Value::Object(entry)
}

fn table_ref_json(id: &TableId) -> Value {
    json!([id.namespace, id.table])
}
