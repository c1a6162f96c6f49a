//! Entity-relationship tools: `describe-entities` and `describe-relationships`.

use crate::catalog::{Cardinality, EntityType, InclusionRule, InclusionSpec, ObjectKind};
use crate::documents::{EntityDocument, RelationshipDocument};
use crate::error::ExecutionResult;
use crate::tools::context::ToolContext;
use crate::tools::definition::{ResultKind, ToolExecutor};
use crate::tools::outcome::ToolOutcome;
use crate::tools::params::{ToolParameters, normalize_pattern, schema_enum};
use crate::tools::schema::{FieldDescriptor, FieldKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

schema_enum! {
    pub enum EntityTypeFilter {
        All => "ALL",
        StrongEntity => "STRONG_ENTITY",
        WeakEntity => "WEAK_ENTITY",
        Subtype => "SUBTYPE",
        NonEntity => "NON_ENTITY",
    }
    default All
}

impl EntityTypeFilter {
    pub fn accepts(&self, entity_type: EntityType) -> bool {
        match self {
            Self::All => true,
            Self::StrongEntity => entity_type == EntityType::StrongEntity,
            Self::WeakEntity => entity_type == EntityType::WeakEntity,
            Self::Subtype => entity_type == EntityType::Subtype,
            Self::NonEntity => entity_type == EntityType::NonEntity,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct RawDescribeEntitiesParameters {
    entity_name: Option<String>,
    entity_type: Option<EntityTypeFilter>,
    include_relationships: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawDescribeEntitiesParameters")]
pub struct DescribeEntitiesParameters {
    entity_name: String,
    entity_type: EntityTypeFilter,
    include_relationships: bool,
}

impl DescribeEntitiesParameters {
    pub fn new(
        entity_name: Option<String>,
        entity_type: Option<EntityTypeFilter>,
        include_relationships: Option<bool>,
    ) -> Self {
        Self {
            entity_name: normalize_pattern(entity_name),
            entity_type: entity_type.unwrap_or_default(),
            include_relationships: include_relationships.unwrap_or(true),
        }
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn entity_type(&self) -> EntityTypeFilter {
        self.entity_type
    }

    pub fn include_relationships(&self) -> bool {
        self.include_relationships
    }
}

impl From<RawDescribeEntitiesParameters> for DescribeEntitiesParameters {
    fn from(raw: RawDescribeEntitiesParameters) -> Self {
        Self::new(raw.entity_name, raw.entity_type, raw.include_relationships)
    }
}

impl Default for DescribeEntitiesParameters {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

impl ToolParameters for DescribeEntitiesParameters {
    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new(
                "entity_name",
                FieldKind::String,
                "Regular expression matched against fully qualified table names.
                 Leave blank for all entities.",
            )
            .with_default(""),
            FieldDescriptor::new(
                "entity_type",
                FieldKind::Enum(EntityTypeFilter::VARIANTS),
                "Only describe entities of this type.",
            )
            .with_default(EntityTypeFilter::All.as_str()),
            FieldDescriptor::new(
                "include_relationships",
                FieldKind::Boolean,
                "Whether to list the relationships each entity takes part in.",
            )
            .with_default(true),
        ]
    }
}

#[derive(Debug, Serialize)]
struct Entities {
    entities: Vec<EntityDocument>,
}

#[derive(Debug, Default)]
pub struct DescribeEntitiesExecutor {
    parameters: DescribeEntitiesParameters,
}

#[async_trait]
impl ToolExecutor for DescribeEntitiesExecutor {
    type Parameters = DescribeEntitiesParameters;

    const TITLE: &'static str = "Describe Entities";
    const DESCRIPTION: &'static str = "Describes tables as entities of an entity-relationship \
        model: strong entities, weak entities, subtypes, and tables that are not entities, \
        such as bridge tables. Optionally lists the relationships of each entity.";
    const RESULT_KIND: ResultKind = ResultKind::Json;

    fn configure(&mut self, parameters: DescribeEntitiesParameters) {
        self.parameters = parameters;
    }

    #[instrument(skip(self, context), fields(tool = "describe-entities"))]
    async fn call(self, context: ToolContext) -> ExecutionResult<ToolOutcome> {
        let parameters = &self.parameters;
        let mut view = context.view();
        view.project(&InclusionSpec::only(
            ObjectKind::Tables,
            InclusionRule::matching(&parameters.entity_name),
        ));

        // Relationships may point at any table in scope, not just the matched ones.
        let scope = context.catalog();
        let model = context.er_model();
        let entities: Vec<_> = model
            .entities()
            .iter()
            .filter(|e| parameters.entity_type.accepts(e.entity_type))
            .filter(|e| view.contains_table(&e.table))
            .map(|e| EntityDocument::build(e, model, scope, parameters.include_relationships))
            .collect();

        if entities.is_empty() {
            return Ok(ToolOutcome::NoResults);
        }
        ToolOutcome::json(&Entities { entities })
    }
}

schema_enum! {
    pub enum CardinalityFilter {
        All => "ALL",
        OneOne => "ONE_ONE",
        ZeroOne => "ZERO_ONE",
        OneMany => "ONE_MANY",
        ZeroMany => "ZERO_MANY",
        ManyMany => "MANY_MANY",
    }
    default All
}

impl CardinalityFilter {
    pub fn accepts(&self, cardinality: Cardinality) -> bool {
        match self {
            Self::All => true,
            Self::OneOne => cardinality == Cardinality::OneOne,
            Self::ZeroOne => cardinality == Cardinality::ZeroOne,
            Self::OneMany => cardinality == Cardinality::OneMany,
            Self::ZeroMany => cardinality == Cardinality::ZeroMany,
            Self::ManyMany => cardinality == Cardinality::ManyMany,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct RawDescribeRelationshipsParameters {
    table_name: Option<String>,
    cardinality: Option<CardinalityFilter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawDescribeRelationshipsParameters")]
pub struct DescribeRelationshipsParameters {
    table_name: String,
    cardinality: CardinalityFilter,
}

impl DescribeRelationshipsParameters {
    pub fn new(table_name: Option<String>, cardinality: Option<CardinalityFilter>) -> Self {
        Self {
            table_name: normalize_pattern(table_name),
            cardinality: cardinality.unwrap_or_default(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn cardinality(&self) -> CardinalityFilter {
        self.cardinality
    }
}

impl From<RawDescribeRelationshipsParameters> for DescribeRelationshipsParameters {
    fn from(raw: RawDescribeRelationshipsParameters) -> Self {
        Self::new(raw.table_name, raw.cardinality)
    }
}

impl Default for DescribeRelationshipsParameters {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl ToolParameters for DescribeRelationshipsParameters {
    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new(
                "table_name",
                FieldKind::String,
                "Regular expression matched against fully qualified table names. Lists
                 relationships that involve at least one matching table.",
            )
            .with_default(""),
            FieldDescriptor::new(
                "cardinality",
                FieldKind::Enum(CardinalityFilter::VARIANTS),
                "Only list relationships with this cardinality.",
            )
            .with_default(CardinalityFilter::All.as_str()),
        ]
    }
}

#[derive(Debug, Serialize)]
struct Relationships {
    relationships: Vec<RelationshipDocument>,
}

#[derive(Debug, Default)]
pub struct DescribeRelationshipsExecutor {
    parameters: DescribeRelationshipsParameters,
}

#[async_trait]
impl ToolExecutor for DescribeRelationshipsExecutor {
    type Parameters = DescribeRelationshipsParameters;

    const TITLE: &'static str = "Describe Relationships";
    const DESCRIPTION: &'static str = "Describes relationships between entities, with their \
        cardinality. Many-to-many relationships name the bridge table that implements them.";
    const RESULT_KIND: ResultKind = ResultKind::Json;

    fn configure(&mut self, parameters: DescribeRelationshipsParameters) {
        self.parameters = parameters;
    }

    #[instrument(skip(self, context), fields(tool = "describe-relationships"))]
    async fn call(self, context: ToolContext) -> ExecutionResult<ToolOutcome> {
        let parameters = &self.parameters;
        let mut view = context.view();
        view.project(&InclusionSpec::only(
            ObjectKind::Tables,
            InclusionRule::matching(&parameters.table_name),
        ));

        let scope = context.catalog();
        let relationships: Vec<_> = context
            .er_model()
            .relationships()
            .iter()
            .filter(|r| parameters.cardinality.accepts(r.cardinality))
            .filter(|r| view.tables().any(|t| r.involves(&t.table_ref())))
            .filter(|r| RelationshipDocument::is_visible(r, scope))
            .map(RelationshipDocument::from)
            .collect();

        if relationships.is_empty() {
            return Ok(ToolOutcome::NoResults);
        }
        ToolOutcome::json(&Relationships { relationships })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use serde_json::json;
    use std::sync::Arc;

    fn context() -> ToolContext {
        ToolContext::new(Arc::new(
            Catalog::from_value(json!({
                "tables": [
                    {
                        "schema": "PUBLIC", "name": "AUTHORS",
                        "columns": [{ "name": "ID", "nullable": false }],
                        "primary-key": { "columns": ["ID"] }
                    },
                    {
                        "schema": "PUBLIC", "name": "BOOKS",
                        "columns": [{ "name": "ID", "nullable": false }],
                        "primary-key": { "columns": ["ID"] }
                    },
                    {
                        "schema": "PUBLIC", "name": "BOOKAUTHORS",
                        "columns": [
                            { "name": "BOOKID", "nullable": false },
                            { "name": "AUTHORID", "nullable": false }
                        ],
                        "primary-key": { "columns": ["BOOKID", "AUTHORID"] },
                        "foreign-keys": [
                            {
                                "name": "FK_BA_BOOK",
                                "referenced-table": { "schema": "PUBLIC", "name": "BOOKS" },
                                "column-references": [{ "column": "BOOKID", "referenced-column": "ID" }]
                            },
                            {
                                "name": "FK_BA_AUTHOR",
                                "referenced-table": { "schema": "PUBLIC", "name": "AUTHORS" },
                                "column-references": [{ "column": "AUTHORID", "referenced-column": "ID" }]
                            }
                        ]
                    },
                    { "schema": "PUBLIC", "name": "AUDIT_LOG", "columns": [{ "name": "MESSAGE" }] }
                ]
            }))
            .unwrap(),
        ))
    }

    async fn entities(parameters: DescribeEntitiesParameters) -> ToolOutcome {
        let mut executor = DescribeEntitiesExecutor::default();
        executor.configure(parameters);
        executor.call(context()).await.unwrap()
    }

    async fn relationships(parameters: DescribeRelationshipsParameters) -> ToolOutcome {
        let mut executor = DescribeRelationshipsExecutor::default();
        executor.configure(parameters);
        executor.call(context()).await.unwrap()
    }

    #[tokio::test]
    async fn test_describe_entity_with_relationships() {
        let ToolOutcome::Json(value) =
            entities(DescribeEntitiesParameters::new(Some("\\.AUTHORS$".into()), None, None)).await
        else {
            panic!("expected json");
        };
        let authors = &value["entities"][0];
        assert_eq!(authors["entity-type"], "STRONG_ENTITY");
        assert_eq!(authors["relationships"][0]["cardinality"], "MANY_MANY");
        assert_eq!(authors["relationships"][0]["bridge"], "PUBLIC.BOOKAUTHORS");
    }

    #[tokio::test]
    async fn test_filter_by_entity_type() {
        let ToolOutcome::Json(value) = entities(DescribeEntitiesParameters::new(
            None,
            Some(EntityTypeFilter::NonEntity),
            Some(false),
        ))
        .await
        else {
            panic!("expected json");
        };
        let names: Vec<_> = value["entities"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["BOOKAUTHORS", "AUDIT_LOG"]);
        assert!(value["entities"][0].get("relationships").is_none());
    }

    #[tokio::test]
    async fn test_no_subtypes() {
        let outcome = entities(DescribeEntitiesParameters::new(
            None,
            Some(EntityTypeFilter::Subtype),
            None,
        ))
        .await;
        assert_eq!(outcome, ToolOutcome::NoResults);
    }

    #[tokio::test]
    async fn test_relationships_by_table() {
        let outcome = relationships(DescribeRelationshipsParameters::new(
            Some("BOOKS$".into()),
            Some(CardinalityFilter::ManyMany),
        ))
        .await;
        assert_eq!(
            outcome,
            ToolOutcome::Json(json!({
                "relationships": [{
                    "name": "BOOKAUTHORS",
                    "from": "PUBLIC.BOOKS",
                    "to": "PUBLIC.AUTHORS",
                    "cardinality": "MANY_MANY",
                    "bridge": "PUBLIC.BOOKAUTHORS"
                }]
            }))
        );
    }

    #[tokio::test]
    async fn test_relationships_cardinality_mismatch() {
        let outcome = relationships(DescribeRelationshipsParameters::new(
            None,
            Some(CardinalityFilter::OneOne),
        ))
        .await;
        assert_eq!(outcome, ToolOutcome::NoResults);
    }
}
