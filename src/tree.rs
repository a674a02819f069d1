//! Depth-first walk over the `ownedElements` tree of a diagram export.

use serde_json::Value;
use std::slice::Iter;

/// Key holding an element's kind, e.g. `ERDEntity`.
pub const KIND_KEY: &str = "_type";
/// Key holding an element's children.
pub const CHILDREN_KEY: &str = "ownedElements";
pub const ID_KEY: &str = "_id";

pub fn kind(node: &Value) -> Option<&str> {
    node.get(KIND_KEY)?.as_str()
}

pub fn id(node: &Value) -> Option<&str> {
    node.get(ID_KEY)?.as_str()
}

/// Children of a node. A missing or non-array `ownedElements` means none.
pub fn children(node: &Value) -> &[Value] {
    node.get(CHILDREN_KEY)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Pre-order iterator over the descendants of a root node.
///
/// A node is yielded (when it passes the predicate) before any of its own
/// descendants; siblings keep document order. Nodes that fail the predicate
/// are still descended into. Non-object children are skipped.
pub struct Walk<'a, P> {
    stack: Vec<Iter<'a, Value>>,
    predicate: P,
}

impl<'a, P> Iterator for Walk<'a, P>
where
    P: FnMut(&Value) -> bool,
{
    type Item = &'a Value;

    fn next(&mut self) -> Option<&'a Value> {
        loop {
            let next = self.stack.last_mut()?.next();
            match next {
                Some(node) if node.is_object() => {
                    self.stack.push(children(node).iter());
                    if (self.predicate)(node) {
                        return Some(node);
                    }
                }
                Some(_) => {}
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

fn accept_all(_: &Value) -> bool {
    true
}

/// Every descendant of `root`.
pub fn walk(root: &Value) -> Walk<'_, fn(&Value) -> bool> {
    walk_filtered(root, accept_all as fn(&Value) -> bool)
}

pub fn walk_filtered<P>(root: &Value, predicate: P) -> Walk<'_, P>
where
    P: FnMut(&Value) -> bool,
{
    Walk {
        stack: vec![children(root).iter()],
        predicate,
    }
}

/// Descendants of `root` whose kind equals `wanted`.
pub fn walk_kind<'a>(root: &'a Value, wanted: &'a str) -> Walk<'a, impl FnMut(&Value) -> bool + 'a> {
    walk_filtered(root, move |node| kind(node) == Some(wanted))
}
