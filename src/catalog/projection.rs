//! Per-call narrowing of the shared catalog.
//!
//! A [`CatalogView`] pairs the immutable, shared [`Catalog`] with the set of
//! members a caller may still see. Projection only ever removes members, so
//! projecting twice with the same spec is a no-op and a broader second
//! projection never restores anything. Every tool call works on its own
//! clone of the view; the catalog itself is never written.

use crate::catalog::inclusion::InclusionRule;
use crate::catalog::model::{
    Catalog, DatabaseInfo, Routine, Sequence, Synonym, Table, TableRef, full_name,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::trace;

/// Kinds of top-level catalog objects that inclusion rules apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Tables,
    Routines,
    Sequences,
    Synonyms,
}

/// Inclusion rules for one projection: exactly one rule per object kind,
/// plus optional sub-object grep filters applied afterwards.
#[derive(Debug, Clone, Default)]
pub struct InclusionSpec {
    pub tables: InclusionRule,
    pub routines: InclusionRule,
    pub sequences: InclusionRule,
    pub synonyms: InclusionRule,
    /// Keep only tables with at least one column whose full name matches.
    pub column_grep: Option<InclusionRule>,
    /// Keep only routines with at least one parameter whose full name matches.
    pub parameter_grep: Option<InclusionRule>,
}

impl InclusionSpec {
    /// Include everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Apply `rule` to `kind` and exclude every other kind.
    pub fn only(kind: ObjectKind, rule: InclusionRule) -> Self {
        let mut spec = Self {
            tables: InclusionRule::ExcludeAll,
            routines: InclusionRule::ExcludeAll,
            sequences: InclusionRule::ExcludeAll,
            synonyms: InclusionRule::ExcludeAll,
            column_grep: None,
            parameter_grep: None,
        };
        *spec.rule_mut(kind) = rule;
        spec
    }

    pub fn with_rule(mut self, kind: ObjectKind, rule: InclusionRule) -> Self {
        *self.rule_mut(kind) = rule;
        self
    }

    pub fn with_column_grep(mut self, rule: InclusionRule) -> Self {
        self.column_grep = Some(rule);
        self
    }

    pub fn with_parameter_grep(mut self, rule: InclusionRule) -> Self {
        self.parameter_grep = Some(rule);
        self
    }

    pub fn rule(&self, kind: ObjectKind) -> &InclusionRule {
        match kind {
            ObjectKind::Tables => &self.tables,
            ObjectKind::Routines => &self.routines,
            ObjectKind::Sequences => &self.sequences,
            ObjectKind::Synonyms => &self.synonyms,
        }
    }

    fn rule_mut(&mut self, kind: ObjectKind) -> &mut InclusionRule {
        match kind {
            ObjectKind::Tables => &mut self.tables,
            ObjectKind::Routines => &mut self.routines,
            ObjectKind::Sequences => &mut self.sequences,
            ObjectKind::Synonyms => &mut self.synonyms,
        }
    }
}

/// A narrowed, copy-on-read view of a shared catalog.
#[derive(Debug, Clone)]
pub struct CatalogView {
    catalog: Arc<Catalog>,
    tables: BTreeSet<usize>,
    routines: BTreeSet<usize>,
    sequences: BTreeSet<usize>,
    synonyms: BTreeSet<usize>,
}

impl CatalogView {
    /// A view that sees the whole catalog.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            tables: (0..catalog.tables.len()).collect(),
            routines: (0..catalog.routines.len()).collect(),
            sequences: (0..catalog.sequences.len()).collect(),
            synonyms: (0..catalog.synonyms.len()).collect(),
            catalog,
        }
    }

    /// Narrow this view in place. Members rejected by any rule are removed
    /// and never come back.
    pub fn project(&mut self, spec: &InclusionSpec) -> &mut Self {
        let catalog = Arc::clone(&self.catalog);
        let before = self.len();

        self.tables
            .retain(|&i| spec.tables.test(&catalog.tables[i].full_name()));
        self.routines
            .retain(|&i| spec.routines.test(&catalog.routines[i].full_name()));
        self.sequences
            .retain(|&i| spec.sequences.test(&catalog.sequences[i].full_name()));
        self.synonyms
            .retain(|&i| spec.synonyms.test(&catalog.synonyms[i].full_name()));

        if let Some(grep) = &spec.column_grep {
            self.tables.retain(|&i| {
                let table = &catalog.tables[i];
                let table_name = table.full_name();
                table
                    .columns
                    .iter()
                    .any(|c| grep.test(&format!("{}.{}", table_name, c.name)))
            });
        }

        if let Some(grep) = &spec.parameter_grep {
            self.routines.retain(|&i| {
                let routine = &catalog.routines[i];
                let routine_name = routine.full_name();
                routine
                    .parameters
                    .iter()
                    .any(|p| grep.test(&format!("{}.{}", routine_name, p.name)))
            });
        }

        trace!("Projected catalog view from {} to {} members", before, self.len());
        self
    }

    /// Convenience for a narrowed copy, leaving `self` untouched.
    pub fn projected(&self, spec: &InclusionSpec) -> Self {
        let mut view = self.clone();
        view.project(spec);
        view
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn database_info(&self) -> &DatabaseInfo {
        &self.catalog.database_info
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter().map(|&i| &self.catalog.tables[i])
    }

    pub fn routines(&self) -> impl Iterator<Item = &Routine> {
        self.routines.iter().map(|&i| &self.catalog.routines[i])
    }

    pub fn sequences(&self) -> impl Iterator<Item = &Sequence> {
        self.sequences.iter().map(|&i| &self.catalog.sequences[i])
    }

    pub fn synonyms(&self) -> impl Iterator<Item = &Synonym> {
        self.synonyms.iter().map(|&i| &self.catalog.synonyms[i])
    }

    /// Look a table up, but only among the members still visible.
    pub fn lookup_table(&self, table: &TableRef) -> Option<&Table> {
        self.catalog
            .table_position(table)
            .filter(|i| self.tables.contains(i))
            .map(|i| &self.catalog.tables[i])
    }

    pub fn contains_table(&self, table: &TableRef) -> bool {
        self.lookup_table(table).is_some()
    }

    /// Whether an object referenced by name (table or routine) is visible.
    pub fn contains_object(&self, object: &TableRef) -> bool {
        self.contains_table(object)
            || self
                .catalog
                .routine_positions(object)
                .iter()
                .any(|i| self.routines.contains(i))
    }

    /// Tables whose foreign keys point at `table`, restricted to this view.
    pub fn dependent_tables(&self, table: &TableRef) -> Vec<TableRef> {
        self.catalog
            .dependent_positions(table)
            .iter()
            .filter(|&i| self.tables.contains(i))
            .map(|&i| self.catalog.tables[i].table_ref())
            .collect()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn routine_count(&self) -> usize {
        self.routines.len()
    }

    pub fn len(&self) -> usize {
        self.tables.len() + self.routines.len() + self.sequences.len() + self.synonyms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Full names of every visible member, grouped by kind.
    pub fn member_names(&self) -> Vec<String> {
        self.tables()
            .map(Table::full_name)
            .chain(self.routines().map(Routine::full_name))
            .chain(self.sequences().map(Sequence::full_name))
            .chain(self.synonyms().map(Synonym::full_name))
            .collect()
    }
}

/// Full name of a column as used by column grep rules.
pub fn column_full_name(table: &Table, column: &str) -> String {
    format!("{}.{}", full_name(&table.schema, &table.name), column)
}
