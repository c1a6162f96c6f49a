//! Entity-relationship view derived from the catalog.
//!
//! Entities are tables classified by how their primary key relates to their
//! foreign keys; relationships are foreign keys with an inferred cardinality.
//! Bridge tables (two foreign keys that together form the primary key)
//! collapse into a single many-to-many relationship.

use crate::catalog::model::{Catalog, ForeignKey, Table, TableRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    StrongEntity,
    WeakEntity,
    Subtype,
    NonEntity,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StrongEntity => "STRONG_ENTITY",
            Self::WeakEntity => "WEAK_ENTITY",
            Self::Subtype => "SUBTYPE",
            Self::NonEntity => "NON_ENTITY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cardinality {
    OneOne,
    ZeroOne,
    OneMany,
    ZeroMany,
    ManyMany,
}

impl Cardinality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneOne => "ONE_ONE",
            Self::ZeroOne => "ZERO_ONE",
            Self::OneMany => "ONE_MANY",
            Self::ZeroMany => "ZERO_MANY",
            Self::ManyMany => "MANY_MANY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub table: TableRef,
    pub entity_type: EntityType,
}

/// A directed relationship from the referencing table to the referenced one.
///
/// For many-to-many relationships `bridge` names the table that carries
/// both foreign keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub name: String,
    pub from: TableRef,
    pub to: TableRef,
    pub cardinality: Cardinality,
    pub bridge: Option<TableRef>,
}

impl Relationship {
    pub fn involves(&self, table: &TableRef) -> bool {
        &self.from == table || &self.to == table || self.bridge.as_ref() == Some(table)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ErModel {
    entities: Vec<Entity>,
    relationships: Vec<Relationship>,
}

impl ErModel {
    pub fn new(entities: Vec<Entity>, relationships: Vec<Relationship>) -> Self {
        Self {
            entities,
            relationships,
        }
    }

    /// Classify every table of the catalog and infer relationship cardinalities.
    pub fn derive(catalog: &Catalog) -> Self {
        let mut entities = Vec::with_capacity(catalog.tables.len());
        let mut relationships = Vec::new();

        for table in &catalog.tables {
            if let Some((left, right)) = bridge_keys(table) {
                entities.push(Entity {
                    table: table.table_ref(),
                    entity_type: EntityType::NonEntity,
                });
                relationships.push(Relationship {
                    name: table.name.clone(),
                    from: left.referenced_table.clone(),
                    to: right.referenced_table.clone(),
                    cardinality: Cardinality::ManyMany,
                    bridge: Some(table.table_ref()),
                });
                continue;
            }

            entities.push(Entity {
                table: table.table_ref(),
                entity_type: classify(table),
            });
            for fk in &table.foreign_keys {
                relationships.push(Relationship {
                    name: fk.name.clone(),
                    from: table.table_ref(),
                    to: fk.referenced_table.clone(),
                    cardinality: cardinality_of(table, fk),
                    bridge: None,
                });
            }
        }

        debug!(
            "Derived ER model with {} entities and {} relationships",
            entities.len(),
            relationships.len()
        );

        Self {
            entities,
            relationships,
        }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn entity(&self, table: &TableRef) -> Option<&Entity> {
        self.entities.iter().find(|e| &e.table == table)
    }

    pub fn entities_of_type(&self, entity_type: EntityType) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(move |e| e.entity_type == entity_type)
    }

    pub fn relationships_with_cardinality(
        &self,
        cardinality: Cardinality,
    ) -> impl Iterator<Item = &Relationship> {
        self.relationships
            .iter()
            .filter(move |r| r.cardinality == cardinality)
    }

    pub fn relationships_for<'a>(
        &'a self,
        table: &'a TableRef,
    ) -> impl Iterator<Item = &'a Relationship> {
        self.relationships.iter().filter(move |r| r.involves(table))
    }
}

fn primary_key_columns(table: &Table) -> BTreeSet<&str> {
    table
        .primary_key
        .iter()
        .flat_map(|pk| pk.columns.iter().map(String::as_str))
        .collect()
}

fn classify(table: &Table) -> EntityType {
    let pk = primary_key_columns(table);
    if pk.is_empty() {
        return EntityType::NonEntity;
    }

    let mut overlaps = false;
    for fk in &table.foreign_keys {
        let fk_columns: BTreeSet<&str> = fk.columns().collect();
        if fk_columns == pk {
            return EntityType::Subtype;
        }
        if !fk_columns.is_disjoint(&pk) {
            overlaps = true;
        }
    }

    if overlaps {
        EntityType::WeakEntity
    } else {
        EntityType::StrongEntity
    }
}

fn bridge_keys(table: &Table) -> Option<(&ForeignKey, &ForeignKey)> {
    let [left, right] = table.foreign_keys.as_slice() else {
        return None;
    };
    let pk = primary_key_columns(table);
    if pk.is_empty() {
        return None;
    }
    let combined: BTreeSet<&str> = left.columns().chain(right.columns()).collect();
    (combined == pk).then_some((left, right))
}

fn cardinality_of(table: &Table, fk: &ForeignKey) -> Cardinality {
    let fk_columns: BTreeSet<&str> = fk.columns().collect();
    let nullable = fk
        .columns()
        .any(|c| table.column(c).is_none_or(|column| column.nullable));

    let unique = primary_key_columns(table) == fk_columns
        || table.indexes.iter().any(|index| {
            index.unique && index.columns.iter().map(String::as_str).collect::<BTreeSet<_>>() == fk_columns
        });

    match (unique, nullable) {
        (true, true) => Cardinality::ZeroOne,
        (true, false) => Cardinality::OneOne,
        (false, true) => Cardinality::ZeroMany,
        (false, false) => Cardinality::OneMany,
    }
}
