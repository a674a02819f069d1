//! Drop columns superseded by a relationship of the same name.
//!
//! Diagram exports often list a foreign key twice: once as a plain column and
//! once as the navigable relationship. After placement the relationship wins.

use crate::ir::ResolvedSchema;
use std::collections::HashSet;
use tracing::debug;

pub fn reconcile(schema: ResolvedSchema) -> ResolvedSchema {
    let tables = schema
        .tables
        .into_iter()
        .map(|mut table| {
            let names: HashSet<&str> = table.relationships.iter().map(|r| r.name.as_str()).collect();
            table.columns.retain(|column| {
                let keep = !names.contains(column.name.as_str());
                if !keep {
                    debug!(table = %table.id, column = %column.name, "column replaced by relationship");
                }
                keep
            });
            table
        })
        .collect();

    ResolvedSchema { tables }
}
