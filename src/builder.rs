//! Schema Builder
//!
//! Walks the host models, maps every field through the type mapper and
//! merges the smart collections of the [`CollectionRegistry`] into the
//! resulting [`SchemaDocument`].

use crate::collection::CollectionRegistry;
use crate::config::ForestConfig;
use crate::error::Result;
use crate::host::{FieldDescriptor, ModelIntrospector, NativeModel, NativeRelation, RelationKind};
use crate::schema::{
    CollectionSchema, FieldSchema, Relationship, SchemaDocument, SchemaMeta, Validation, LIANA_NAME,
};
use crate::types::{self, ExternalType, ScalarType};
use crate::version;

/// Builds schema documents from host models and registered smart collections
pub struct SchemaBuilder<'a> {
    config: &'a ForestConfig,
    registry: &'a CollectionRegistry,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(config: &'a ForestConfig, registry: &'a CollectionRegistry) -> Self {
        Self { config, registry }
    }

    /// Build a fresh schema document
    pub fn build(&self, host: &dyn ModelIntrospector) -> Result<SchemaDocument> {
        self.config.validate()?;

        let models = host.models();
        let mut collections = Vec::new();

        for model in models.iter().filter(|m| self.config.retains_model(&m.name)) {
            let mut collection = collection_for_model(model, &models);
            self.merge_smart_features(&mut collection);
            collections.push(collection);
        }

        // Names stay unique: a virtual collection never shadows a model,
        // retained or filtered out.
        for entry in self.registry.all().into_iter().filter(|e| e.is_virtual()) {
            let name = &entry.schema.name;
            if models.iter().any(|m| &m.name == name) || collections.iter().any(|c| &c.name == name) {
                tracing::warn!(collection = %name, "virtual collection name is already taken, skipping");
                continue;
            }
            tracing::debug!(collection = %name, "adding virtual collection");
            collections.push(entry.schema);
        }

        let meta = SchemaMeta {
            database_type: self
                .config
                .database_type
                .clone()
                .unwrap_or_else(|| host.database_type()),
            liana: LIANA_NAME.to_string(),
            liana_version: version::liana_version(),
            orm_version: version::version_or_sentinel(host.orm_version()),
        };

        tracing::info!(
            collections = collections.len(),
            models = models.len(),
            "schema built"
        );

        Ok(SchemaDocument { collections, meta })
    }

    // Native fields first, then smart additions in registration order.
    fn merge_smart_features(&self, collection: &mut CollectionSchema) {
        for entry in self.registry.for_model(&collection.name) {
            let smart = entry.schema;
            collection.fields.extend(smart.fields);
            collection.actions.extend(smart.actions);
            collection.segments.extend(smart.segments);
            if !smart.is_searchable {
                collection.is_searchable = false;
            }
        }
    }
}

/// Derive the collection of a native model
pub fn collection_for_model(model: &NativeModel, models: &[NativeModel]) -> CollectionSchema {
    let mut collection = CollectionSchema::new(&model.name);
    collection.fields = model
        .fields
        .iter()
        .map(|field| field_schema(field, models))
        .collect();
    collection
}

/// Derive the schema of one native field
pub fn field_schema(field: &dyn FieldDescriptor, models: &[NativeModel]) -> FieldSchema {
    let mut schema = match field.relation() {
        Some(relation) => relation_field(field.name(), relation, models),
        None => FieldSchema::new(field.name(), types::resolve(field)),
    };

    if field.is_enumerated() {
        schema.enums = field.choices().map(<[String]>::to_vec);
    }
    schema.default_value = field.default_value().filter(|v| !v.is_null()).cloned();
    schema.is_read_only = field.is_primary_key();

    let to_many = field.relation().map(|r| r.kind.is_to_many()).unwrap_or(false);
    schema.is_required = !to_many && is_required(field);
    if schema.is_required {
        schema.validations.push(Validation::is_present());
    }
    schema
}

/// Required unless the host allows null, blank, a default or generates the value
pub fn is_required(field: &dyn FieldDescriptor) -> bool {
    !field.is_nullable() && !field.is_blank() && !field.has_default() && !field.is_primary_key()
}

fn relation_field(name: &str, relation: &NativeRelation, models: &[NativeModel]) -> FieldSchema {
    let target = models.iter().find(|m| m.name == relation.target);
    let (pk_name, pk_type) = match target.and_then(|m| m.primary_key()) {
        Some(pk) => (pk.name.as_str(), types::resolve(pk).scalar()),
        None => ("id", ScalarType::Number),
    };

    let relationship = match relation.kind {
        RelationKind::ForeignKey => Relationship::BelongsTo,
        RelationKind::OneToOne => Relationship::HasOne,
        RelationKind::OneToMany => Relationship::HasMany,
        RelationKind::ManyToMany => Relationship::BelongsToMany,
    };

    let field_type = if relationship.is_to_many() {
        ExternalType::array_of(pk_type)
    } else {
        ExternalType::Scalar(pk_type)
    };

    let mut schema = FieldSchema::new(name, field_type);
    schema.reference = Some(format!("{}.{}", relation.target, pk_name));
    schema.inverse_of = relation.related_name.clone();
    schema.relationship = Some(relationship);
    if relationship.is_to_many() {
        schema.is_filterable = false;
        schema.is_sortable = false;
    }
    schema
}
