//! Non-fatal issues found while resolving a diagram.
//!
//! Every input element that is dropped or defaulted leaves one entry here;
//! only an input that is not a JSON element tree at all aborts the run.

use crate::ast::TableId;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Input was defaulted or decided by policy; output is still complete.
    Warning,
    /// Input was dropped from the output.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Diagnostic {
    #[error("malformed {kind} `{element}`: {reason}; skipped")]
    MalformedElement {
        kind: String,
        element: String,
        reason: String,
    },
    #[error("entity `{name}` has no namespace separator; skipped")]
    UnqualifiedName { element: String, name: String },
    #[error("table `{table}` is declared more than once; later declaration skipped")]
    DuplicateTable { table: TableId },
    #[error("column `{column}` is declared more than once on `{table}`; later declaration skipped")]
    DuplicateColumn { table: TableId, column: String },
    #[error("column `{table}`.`{column}` has unknown type `{found}`; defaulted to TEXT")]
    UnknownColumnType {
        table: TableId,
        column: String,
        found: String,
    },
    #[error("relationship `{relationship}` has unknown cardinality `{found}`; treated as \"1\"")]
    UnknownCardinality { relationship: String, found: String },
    #[error("relationship `{relationship}` references unknown entity `{reference}`; dropped")]
    DanglingReference {
        relationship: String,
        reference: String,
    },
    #[error("relationship `{relationship}` between `{first}` and `{second}` is many-to-many; dropped")]
    ManyToMany {
        relationship: String,
        first: TableId,
        second: TableId,
    },
    #[error("one-to-one relationship `{relationship}` placed on `{owner}` referencing `{target}` by fallback policy")]
    AmbiguousOneToOne {
        relationship: String,
        owner: TableId,
        target: TableId,
    },
    #[error("one-to-one relationship `{relationship}` between `{first}` and `{second}` left unresolved by policy; dropped")]
    UnresolvedOneToOne {
        relationship: String,
        first: TableId,
        second: TableId,
    },
    #[error("`{table}` already has a relationship named `{relationship}`; dropped")]
    DuplicateRelationship { table: TableId, relationship: String },
    #[error("dependency cycle in namespace `{namespace}` between {}", .tables.join(", "))]
    DependencyCycle {
        namespace: String,
        tables: Vec<String>,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Self::UnknownColumnType { .. }
            | Self::UnknownCardinality { .. }
            | Self::AmbiguousOneToOne { .. }
            | Self::DependencyCycle { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// Collects the diagnostics of one run, logging each as it arrives.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        warn!(severity = ?diagnostic.severity(), "{diagnostic}");
        self.items.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}
