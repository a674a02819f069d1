//! Table ordering by foreign-key dependencies.
//!
//! Within a namespace every table is placed after the tables it references.
//! Mutually dependent tables (strongly connected components larger than one)
//! are reported as cycles and kept together in declaration order; the rest of
//! the namespace is still ordered around them.

use crate::ast::TableId;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::ir::{Namespace, ResolvedSchema, SchemaModel, Table};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap};
use tracing::debug;

/// Group tables by namespace, order each namespace, and collect the
/// cross-namespace references of every table.
pub fn order(schema: ResolvedSchema, diagnostics: &mut Diagnostics) -> SchemaModel {
    let mut grouped: BTreeMap<String, Vec<Table>> = BTreeMap::new();
    for mut table in schema.tables {
        table.references = cross_namespace_references(&table);
        grouped.entry(table.id.namespace.clone()).or_default().push(table);
    }

    let namespaces = grouped
        .into_iter()
        .map(|(name, tables)| {
            let order = order_namespace(&name, &tables, diagnostics);
            debug!(namespace = %name, order = ?order, "ordered namespace");
            Namespace { name, tables, order }
        })
        .collect();

    SchemaModel { namespaces }
}

fn cross_namespace_references(table: &Table) -> Vec<TableId> {
    let mut references: Vec<TableId> = Vec::new();
    for rel in table.relationships.iter().filter(|r| r.is_cross_namespace()) {
        if !references.contains(&rel.target) {
            references.push(rel.target.clone());
        }
    }
    references
}

fn order_namespace(namespace: &str, tables: &[Table], diagnostics: &mut Diagnostics) -> Vec<String> {
    let index: HashMap<&str, usize> = tables
        .iter()
        .enumerate()
        .map(|(idx, t)| (t.id.table.as_str(), idx))
        .collect();

    // child -> parents, self references left out
    let parents: Vec<Vec<usize>> = tables
        .iter()
        .enumerate()
        .map(|(idx, table)| {
            let mut deps: Vec<usize> = table
                .relationships
                .iter()
                .filter(|r| r.target.namespace == namespace)
                .filter_map(|r| index.get(r.target.table.as_str()).copied())
                .filter(|&dep| dep != idx)
                .collect();
            deps.sort_unstable();
            deps.dedup();
            deps
        })
        .collect();

    let components = strongly_connected(&parents);

    let mut component_of = vec![0; tables.len()];
    for (c, members) in components.iter().enumerate() {
        for &member in members {
            component_of[member] = c;
        }
        if members.len() > 1 {
            diagnostics.push(Diagnostic::DependencyCycle {
                namespace: namespace.to_string(),
                tables: members.iter().map(|&m| tables[m].id.table.clone()).collect(),
            });
        }
    }

    let component_parents: Vec<Vec<usize>> = components
        .iter()
        .enumerate()
        .map(|(c, members)| {
            let mut deps: Vec<usize> = members
                .iter()
                .flat_map(|&m| parents[m].iter().map(|&p| component_of[p]))
                .filter(|&d| d != c)
                .collect();
            deps.sort_unstable();
            deps.dedup();
            deps
        })
        .collect();

    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); components.len()];
    let mut waiting: Vec<usize> = component_parents.iter().map(Vec::len).collect();
    for (c, deps) in component_parents.iter().enumerate() {
        for &d in deps {
            dependents[d].push(c);
        }
    }

    // Components are sorted by their earliest member, so the smallest ready
    // one is the earliest declared.
    let mut ready: BinaryHeap<Reverse<usize>> = (0..components.len())
        .filter(|&c| waiting[c] == 0)
        .map(Reverse)
        .collect();
    let mut order = Vec::with_capacity(tables.len());
    while let Some(Reverse(next)) = ready.pop() {
        order.extend(components[next].iter().map(|&m| tables[m].id.table.clone()));
        for &dependent in &dependents[next] {
            waiting[dependent] -= 1;
            if waiting[dependent] == 0 {
                ready.push(Reverse(dependent));
            }
        }
    }

    order
}

/// Tarjan's algorithm. Members of each component are in ascending index order
/// and components are sorted by their smallest member.
///
/// The depth-first search keeps its own frame stack, so long dependency
/// chains do not grow the call stack.
fn strongly_connected(graph: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut index: Vec<Option<usize>> = vec![None; graph.len()];
    let mut lowlink = vec![0; graph.len()];
    let mut on_stack = vec![false; graph.len()];
    let mut stack: Vec<usize> = Vec::new();
    let mut next_index = 0;
    let mut components: Vec<Vec<usize>> = Vec::new();

    // (node, position of the next edge to follow)
    let mut frames: Vec<(usize, usize)> = Vec::new();

    for root in 0..graph.len() {
        if index[root].is_some() {
            continue;
        }
        frames.push((root, 0));

        while let Some(frame) = frames.last_mut() {
            let (node, cursor) = *frame;

            if cursor == 0 && index[node].is_none() {
                index[node] = Some(next_index);
                lowlink[node] = next_index;
                next_index += 1;
                stack.push(node);
                on_stack[node] = true;
            }

            if let Some(&next) = graph[node].get(cursor) {
                frame.1 += 1;
                match index[next] {
                    None => frames.push((next, 0)),
                    Some(seen) if on_stack[next] => {
                        lowlink[node] = lowlink[node].min(seen);
                    }
                    Some(_) => {}
                }
                continue;
            }

            frames.pop();
            if let Some(&(parent, _)) = frames.last() {
                lowlink[parent] = lowlink[parent].min(lowlink[node]);
            }

            if index[node] == Some(lowlink[node]) {
                let mut members = Vec::new();
                while let Some(member) = stack.pop() {
                    on_stack[member] = false;
                    members.push(member);
                    if member == node {
                        break;
                    }
                }
                components.push(members);
            }
        }
    }

    for members in &mut components {
        members.sort_unstable();
    }
    components.sort_by_key(|members| members[0]);
    components
}
