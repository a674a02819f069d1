//! Foreign-key placement.
//!
//! Each relationship joins two entities. The cardinality pair decides which
//! table holds the foreign key: a many-side end owns the pointer to the other
//! end. One-to-one relationships carry no structural signal, so the table that
//! already has a column named after the relationship becomes the owner, and
//! anything still undecided goes to an injected [`OwnerPolicy`].

use crate::ast::{Cardinality, Entity, Extracted, RawRelationship, TableId};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::ir::{Relationship, ResolvedSchema, Table};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// One end of a relationship, in input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
}

/// Decides which end of an ambiguous one-to-one relationship owns the
/// foreign key. `None` leaves the relationship out of the model.
pub trait OwnerPolicy {
    fn choose_owner(&mut self, first: &TableId, second: &TableId, relationship: &str) -> Option<Side>;
}

impl<F> OwnerPolicy for F
where
    F: FnMut(&TableId, &TableId, &str) -> Option<Side>,
{
    fn choose_owner(&mut self, first: &TableId, second: &TableId, relationship: &str) -> Option<Side> {
        self(first, second, relationship)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FirstEnd;

impl OwnerPolicy for FirstEnd {
    fn choose_owner(&mut self, _: &TableId, _: &TableId, _: &str) -> Option<Side> {
        Some(Side::First)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SecondEnd;

impl OwnerPolicy for SecondEnd {
    fn choose_owner(&mut self, _: &TableId, _: &TableId, _: &str) -> Option<Side> {
        Some(Side::Second)
    }
}

/// The table whose qualified name (`namespace.table`) sorts first is the
/// parent; the other end owns the foreign key. Ties go to the first end.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lexical;

impl OwnerPolicy for Lexical {
    fn choose_owner(&mut self, first: &TableId, second: &TableId, _: &str) -> Option<Side> {
        if first.to_string() < second.to_string() {
            Some(Side::Second)
        } else {
            Some(Side::First)
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Reject;

impl OwnerPolicy for Reject {
    fn choose_owner(&mut self, _: &TableId, _: &TableId, _: &str) -> Option<Side> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The given end is the many side and owns the foreign key.
    OwnedBy(Side),
    OneToOne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClassificationError {
    #[error("Both ends are many ({0} and {1}); a junction table would be required")]
    ManyToMany(Cardinality, Cardinality),
}

/// Classify a relationship by the cardinalities at its two ends.
pub fn classify(end1: Cardinality, end2: Cardinality) -> Result<Classification, ClassificationError> {
    match (end1.is_many(), end2.is_many()) {
        (true, true) => Err(ClassificationError::ManyToMany(end1, end2)),
        (true, false) => Ok(Classification::OwnedBy(Side::First)),
        (false, true) => Ok(Classification::OwnedBy(Side::Second)),
        (false, false) => Ok(Classification::OneToOne),
    }
}

pub struct Resolver<'p> {
    policy: &'p mut dyn OwnerPolicy,
}

impl<'p> Resolver<'p> {
    pub fn new(policy: &'p mut dyn OwnerPolicy) -> Self {
        Self { policy }
    }

    /// Place every relationship on exactly one table.
    pub fn resolve(&mut self, extracted: &Extracted, diagnostics: &mut Diagnostics) -> ResolvedSchema {
        let mut builder = SchemaBuilder::new(&extracted.entities);

        for rel in &extracted.relationships {
            if let Some((owner, relationship)) = self.place(&builder, rel, diagnostics) {
                builder.attach(owner, relationship, diagnostics);
            }
        }

        builder.finish()
    }

    fn place(
        &mut self,
        builder: &SchemaBuilder<'_>,
        rel: &RawRelationship,
        diagnostics: &mut Diagnostics,
    ) -> Option<(usize, Relationship)> {
        let first = builder.lookup(&rel.end1.reference);
        let second = builder.lookup(&rel.end2.reference);
        let (first, second) = match (first, second) {
            (Some(first), Some(second)) => (first, second),
            (None, _) => return dangling(rel, &rel.end1.reference, diagnostics),
            (_, None) => return dangling(rel, &rel.end2.reference, diagnostics),
        };
        let first_entity = builder.entity(first);
        let second_entity = builder.entity(second);

        let owner_side = match classify(rel.end1.cardinality, rel.end2.cardinality) {
            Ok(Classification::OwnedBy(side)) => side,
            Ok(Classification::OneToOne) => self.one_to_one(first_entity, second_entity, rel, diagnostics)?,
            Err(ClassificationError::ManyToMany(..)) => {
                diagnostics.push(Diagnostic::ManyToMany {
                    relationship: rel.name.clone(),
                    first: first_entity.table.clone(),
                    second: second_entity.table.clone(),
                });
                return None;
            }
        };

        let end = move |side: Side| match side {
            Side::First => (first, &rel.end1),
            Side::Second => (second, &rel.end2),
        };
        let (owner, owner_end) = end(owner_side);
        let (target, _) = end(owner_side.other());

        let relationship = Relationship {
            name: rel.name.clone(),
            source: builder.entity(owner).table.clone(),
            target: builder.entity(target).table.clone(),
            cardinality: owner_end.cardinality,
        };
        debug!(
            relationship = %relationship.name,
            source = %relationship.source,
            target = %relationship.target,
            cardinality = %relationship.cardinality,
            "placed foreign key"
        );

        Some((owner, relationship))
    }

    fn one_to_one(
        &mut self,
        first: &Entity,
        second: &Entity,
        rel: &RawRelationship,
        diagnostics: &mut Diagnostics,
    ) -> Option<Side> {
        match (first.has_column(&rel.name), second.has_column(&rel.name)) {
            (true, false) => return Some(Side::First),
            (false, true) => return Some(Side::Second),
            _ => {}
        }

        match self.policy.choose_owner(&first.table, &second.table, &rel.name) {
            Some(side) => {
                let (owner, target) = match side {
                    Side::First => (first, second),
                    Side::Second => (second, first),
                };
                diagnostics.push(Diagnostic::AmbiguousOneToOne {
                    relationship: rel.name.clone(),
                    owner: owner.table.clone(),
                    target: target.table.clone(),
                });
                Some(side)
            }
            None => {
                diagnostics.push(Diagnostic::UnresolvedOneToOne {
                    relationship: rel.name.clone(),
                    first: first.table.clone(),
                    second: second.table.clone(),
                });
                None
            }
        }
    }
}

fn dangling<T>(rel: &RawRelationship, reference: &str, diagnostics: &mut Diagnostics) -> Option<T> {
    diagnostics.push(Diagnostic::DanglingReference {
        relationship: rel.name.clone(),
        reference: reference.to_string(),
    });
    None
}

/// Tables under construction for a single run.
struct SchemaBuilder<'e> {
    entities: &'e [Entity],
    by_id: HashMap<&'e str, usize>,
    relationships: Vec<Vec<Relationship>>,
}

impl<'e> SchemaBuilder<'e> {
    fn new(entities: &'e [Entity]) -> Self {
        let by_id = entities
            .iter()
            .enumerate()
            .map(|(idx, e)| (e.id.as_str(), idx))
            .collect();

        Self {
            entities,
            by_id,
            relationships: vec![Vec::new(); entities.len()],
        }
    }

    fn lookup(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    fn entity(&self, idx: usize) -> &'e Entity {
        &self.entities[idx]
    }

    fn attach(&mut self, owner: usize, relationship: Relationship, diagnostics: &mut Diagnostics) {
        let owned = &mut self.relationships[owner];
        if owned.iter().any(|r| r.name == relationship.name) {
            diagnostics.push(Diagnostic::DuplicateRelationship {
                table: relationship.source,
                relationship: relationship.name,
            });
            return;
        }
        owned.push(relationship);
    }

    fn finish(self) -> ResolvedSchema {
        let tables = self
            .entities
            .iter()
            .zip(self.relationships)
            .map(|(entity, relationships)| Table {
                relationships,
                ..Table::new(entity.table.clone(), entity.columns.clone())
            })
            .collect();

        ResolvedSchema { tables }
    }
}
