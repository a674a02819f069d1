//! Plain-text summary of a resolved schema.

use crate::ast::Column;
use crate::diagnostics::{Diagnostic, Severity};
use crate::ir::{Namespace, SchemaModel, Table};
use unicode_width::UnicodeWidthStr;

/// Render namespaces in name order and tables in dependency order.
pub fn summary(model: &SchemaModel, diagnostics: &[Diagnostic]) -> String {
    let mut output = String::new();

    for (i, namespace) in model.namespaces.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        summarize_namespace(&mut output, namespace);
    }

    if !diagnostics.is_empty() {
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&format!("diagnostics ({})\n", diagnostics.len()));
        for d in diagnostics {
            let severity = match d.severity() {
                Severity::Warning => "warning",
                Severity::Error => "error",
            };
            output.push_str(&format!("  {severity}: {d}\n"));
        }
    }

    output
}

fn summarize_namespace(output: &mut String, namespace: &Namespace) {
    output.push_str(&format!("namespace {}\n", namespace.name));
    for table in namespace.ordered_tables() {
        summarize_table(output, table);
    }
}

fn summarize_table(output: &mut String, table: &Table) {
    output.push_str(&format!("  {}\n", table.id.table));

    // Names are padded to the widest one, measured in terminal columns.
    let name_width = table
        .columns
        .iter()
        .map(|c| c.name.as_str())
        .chain(table.relationships.iter().map(|r| r.name.as_str()))
        .map(UnicodeWidthStr::width)
        .max()
        .unwrap_or(0);

    for column in &table.columns {
        output.push_str("    ");
        output.push_str(&pad(&column.name, name_width));
        output.push(' ');
        output.push_str(&column_type(column));
        output.push_str(&column_flags(column));
        output.push('\n');
    }

    for rel in &table.relationships {
        let arity = if rel.is_to_many() { "many-to-one" } else { "one-to-one" };
        output.push_str(&format!(
            "    {} -> {} ({}, {})\n",
            pad(&rel.name, name_width),
            rel.target,
            rel.cardinality,
            arity
        ));
    }

    if !table.references.is_empty() {
        let refs: Vec<String> = table.references.iter().map(|r| r.to_string()).collect();
        output.push_str(&format!("    references {}\n", refs.join(", ")));
    }
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(UnicodeWidthStr::width(text));
    format!("{}{}", text, " ".repeat(fill))
}

fn column_type(column: &Column) -> String {
    match column.length {
        Some(length) => format!("{}({})", column.data_type, length),
        None => column.data_type.to_string(),
    }
}

fn column_flags(column: &Column) -> String {
    let mut flags = String::new();
    if column.is_primary_key {
        flags.push_str(" pk");
    }
    if column.is_unique {
        flags.push_str(" unique");
    }
    if column.is_not_null {
        flags.push_str(" not null");
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Cardinality, DataType, TableId};
    use crate::ir::Relationship;

    fn model() -> SchemaModel {
        let mut id = Column::new("id", DataType::Integer);
        id.is_primary_key = true;
        let mut name = Column::new("名前", DataType::Varchar);
        name.length = Some(40);
        name.is_not_null = true;

        let customer = Table::new(TableId::new("billing", "Customer"), vec![id, name]);
        let mut invoice = Table::new(TableId::new("billing", "Invoice"), vec![]);
        invoice.relationships.push(Relationship {
            name: "customer".to_string(),
            source: invoice.id.clone(),
            target: customer.id.clone(),
            cardinality: Cardinality::Many,
        });

        SchemaModel {
            namespaces: vec![Namespace {
                name: "billing".to_string(),
                tables: vec![invoice, customer],
                order: vec!["Customer".to_string(), "Invoice".to_string()],
            }],
        }
    }

    #[test]
    fn test_summary_follows_dependency_order() {
        let text = summary(&model(), &[]);
        let customer = text.find("  Customer").unwrap();
        let invoice = text.find("  Invoice").unwrap();
        assert!(customer < invoice);
        assert!(text.contains("customer -> billing.Customer (0..*, many-to-one)"));
        assert!(!text.contains("diagnostics"));
    }

    #[test]
    fn test_columns_align_by_display_width() {
        let text = summary(&model(), &[]);
        // "名前" is four columns wide, so "id" gets two spaces of padding.
        assert!(text.contains("    id   INTEGER pk\n"));
        assert!(text.contains("    名前 VARCHAR(40) not null\n"));
    }

    #[test]
    fn test_diagnostics_section() {
        let diagnostics = vec![Diagnostic::DependencyCycle {
            namespace: "billing".to_string(),
            tables: vec!["A".to_string(), "B".to_string()],
        }];
        let text = summary(&model(), &diagnostics);
        assert!(text.contains("diagnostics (1)\n  warning: dependency cycle"));
    }
}
