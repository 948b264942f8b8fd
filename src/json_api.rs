//! JSON:API serializer descriptors
//!
//! One descriptor per collection, listing which fields render as attributes
//! and which as relationships. The registry is rebuilt from the schema
//! document every time the document changes.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::collection::CollectionRegistry;
use crate::error::{Result, SchemaError};
use crate::schema::{CollectionSchema, SchemaDocument};

/// A relationship of a JSON:API resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipDescriptor {
    pub name: String,
    /// Target collection name
    pub target: String,
    pub many: bool,
}

/// Serializer descriptor of one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonApiSchemaEntry {
    pub collection: String,
    /// JSON:API resource type
    pub type_name: String,
    /// Primary key field used as the resource id
    pub id_field: String,
    pub attributes: Vec<String>,
    pub relationships: Vec<RelationshipDescriptor>,
}

impl JsonApiSchemaEntry {
    pub fn from_collection(collection: &CollectionSchema) -> Self {
        let mut attributes = Vec::new();
        let mut relationships = Vec::new();

        for field in &collection.fields {
            match field.target_collection() {
                Some(target) => relationships.push(RelationshipDescriptor {
                    name: field.field.clone(),
                    target: target.to_string(),
                    many: field.field_type.is_array()
                        || field.relationship.map(|r| r.is_to_many()).unwrap_or(false),
                }),
                None => attributes.push(field.field.clone()),
            }
        }

        let id_field = collection
            .fields
            .iter()
            .find(|f| f.is_read_only && !f.is_virtual && !f.is_relation())
            .map(|f| f.field.clone())
            .unwrap_or_else(|| "id".to_string());

        Self {
            collection: collection.name.clone(),
            type_name: collection.name.to_lowercase(),
            id_field,
            attributes,
            relationships,
        }
    }

    /// Render a flat record as a JSON:API resource object
    ///
    /// Smart attributes are computed from their getter in `smart`. Relationship
    /// values may be a bare id, an object with the target id field, or a list
    /// of either for to-many relationships.
    pub fn render(&self, record: &Value, smart: &CollectionRegistry) -> Value {
        let mut attributes = Map::new();
        for name in &self.attributes {
            if name == &self.id_field {
                continue;
            }
            match smart.getter(&self.collection, name) {
                Some(get) => {
                    attributes.insert(name.clone(), get(record));
                }
                None => {
                    if let Some(value) = record.get(name) {
                        attributes.insert(name.clone(), value.clone());
                    }
                }
            }
        }

        let mut relationships = Map::new();
        for relation in &self.relationships {
            let target_type = relation.target.to_lowercase();
            let data = match record.get(&relation.name) {
                None | Some(Value::Null) if relation.many => Value::Array(Vec::new()),
                None | Some(Value::Null) => Value::Null,
                Some(Value::Array(items)) => Value::Array(
                    items
                        .iter()
                        .map(|item| resource_identifier(&target_type, item))
                        .collect(),
                ),
                Some(item) => resource_identifier(&target_type, item),
            };
            relationships.insert(relation.name.clone(), json!({ "data": data }));
        }

        json!({
            "type": self.type_name,
            "id": id_string(record.get(&self.id_field)),
            "attributes": attributes,
            "relationships": relationships,
        })
    }
}

fn resource_identifier(type_name: &str, item: &Value) -> Value {
    let id = match item {
        Value::Object(map) => map.get("id"),
        other => Some(other),
    };
    json!({ "type": type_name, "id": id_string(id) })
}

// JSON:API ids are strings.
fn id_string(value: Option<&Value>) -> Value {
    match value {
        Some(Value::String(s)) => Value::String(s.clone()),
        Some(Value::Null) | None => Value::Null,
        Some(other) => Value::String(other.to_string()),
    }
}

/// Registry of serializer descriptors, guarded by a single lock
#[derive(Debug, Default)]
pub struct JsonApiSchemaRegistry {
    entries: Mutex<BTreeMap<String, JsonApiSchemaEntry>>,
}

impl JsonApiSchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, JsonApiSchemaEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rebuild from a document; names absent from it are dropped
    pub fn build_from(&self, document: &SchemaDocument) {
        let rebuilt: BTreeMap<String, JsonApiSchemaEntry> = document
            .collections
            .iter()
            .map(|c| (c.name.clone(), JsonApiSchemaEntry::from_collection(c)))
            .collect();

        let mut entries = self.entries();
        *entries = rebuilt;
        tracing::debug!(entries = entries.len(), "JSON:API registry rebuilt");
    }

    pub fn get(&self, name: &str) -> Option<JsonApiSchemaEntry> {
        self.entries().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn reset(&self) {
        self.entries().clear();
    }

    /// Render a record of a collection as a JSON:API document
    pub fn render(&self, collection: &str, record: &Value, smart: &CollectionRegistry) -> Result<Value> {
        let entry = self
            .get(collection)
            .ok_or_else(|| SchemaError::UnknownCollection(collection.to_string()))?;
        Ok(json!({ "data": entry.render(record, smart) }))
    }

    /// Render many records of a collection as one JSON:API document
    pub fn render_many(&self, collection: &str, records: &[Value], smart: &CollectionRegistry) -> Result<Value> {
        let entry = self
            .get(collection)
            .ok_or_else(|| SchemaError::UnknownCollection(collection.to_string()))?;
        let data: Vec<Value> = records.iter().map(|r| entry.render(r, smart)).collect();
        Ok(json!({ "data": data }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{CollectionDefinition, SmartField};
    use crate::host::NativeModel;
    use crate::schema::{FieldSchema, Relationship, SchemaMeta};
    use crate::types::{ExternalType, ScalarType};

    fn document(names: &[&str]) -> SchemaDocument {
        let collections = names
            .iter()
            .map(|name| {
                let mut collection = CollectionSchema::new(*name);
                let mut id = FieldSchema::new("id", ScalarType::Number);
                id.is_read_only = true;
                collection.fields.push(id);
                collection.fields.push(FieldSchema::new("title", ScalarType::String));
                let mut tags = FieldSchema::new("tags", ExternalType::array_of(ScalarType::Number));
                tags.reference = Some("Tag.id".to_string());
                tags.relationship = Some(Relationship::BelongsToMany);
                collection.fields.push(tags);
                let mut owner = FieldSchema::new("owner", ScalarType::Number);
                owner.reference = Some("User.id".to_string());
                owner.relationship = Some(Relationship::BelongsTo);
                collection.fields.push(owner);
                collection
            })
            .collect();

        SchemaDocument {
            collections,
            meta: SchemaMeta {
                database_type: "sqlite".to_string(),
                liana: "forest-rs".to_string(),
                liana_version: "0.0.0".to_string(),
                orm_version: "0.0.0".to_string(),
            },
        }
    }

    #[test]
    fn test_descriptor_split() {
        let registry = JsonApiSchemaRegistry::new();
        registry.build_from(&document(&["Question"]));

        let entry = registry.get("Question").unwrap();
        assert_eq!(entry.type_name, "question");
        assert_eq!(entry.attributes, vec!["id".to_string(), "title".to_string()]);
        assert_eq!(entry.relationships.len(), 2);
        assert!(entry.relationships[0].many);
        assert_eq!(entry.relationships[1].target, "User");
        assert!(!entry.relationships[1].many);
    }

    #[test]
    fn test_rebuild_drops_stale_entries() {
        let registry = JsonApiSchemaRegistry::new();
        registry.build_from(&document(&["Question", "Choice"]));
        assert_eq!(registry.len(), 2);

        registry.build_from(&document(&["Choice"]));
        assert_eq!(registry.names(), vec!["Choice".to_string()]);
        assert!(registry.get("Question").is_none());

        registry.reset();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_render_record() {
        let registry = JsonApiSchemaRegistry::new();
        registry.build_from(&document(&["Question"]));

        let rendered = registry
            .render(
                "Question",
                &json!({"id": 7, "title": "why?", "tags": [1, {"id": 2}], "owner": null}),
                &CollectionRegistry::new(),
            )
            .unwrap();

        assert_eq!(
            rendered,
            json!({
                "data": {
                    "type": "question",
                    "id": "7",
                    "attributes": {"title": "why?"},
                    "relationships": {
                        "tags": {"data": [{"type": "tag", "id": "1"}, {"type": "tag", "id": "2"}]},
                        "owner": {"data": null}
                    }
                }
            })
        );
    }

    struct QuestionForest;

    impl CollectionDefinition for QuestionForest {
        fn name(&self) -> &str {
            "QuestionForest"
        }

        fn fields(&self) -> Vec<SmartField> {
            vec![SmartField::new("shout", ScalarType::String).with_getter(|record| {
                json!(record["title"].as_str().unwrap_or_default().to_uppercase())
            })]
        }
    }

    #[test]
    fn test_render_computes_smart_attributes() {
        let smart = CollectionRegistry::new();
        let model = NativeModel::new("Question", "polls", Vec::new());
        smart.register(&QuestionForest, Some(&model));

        let mut document = document(&["Question"]);
        document.collections[0]
            .fields
            .push(QuestionForest.fields().remove(0).schema);

        let registry = JsonApiSchemaRegistry::new();
        registry.build_from(&document);

        let rendered = registry
            .render_many("Question", &[json!({"id": 1, "title": "why?", "shout": "stale"})], &smart)
            .unwrap();
        assert_eq!(
            rendered["data"][0]["attributes"],
            json!({"title": "why?", "shout": "WHY?"})
        );
    }

    #[test]
    fn test_render_unknown_collection() {
        let registry = JsonApiSchemaRegistry::new();
        let result = registry.render("Foo", &json!({}), &CollectionRegistry::new());
        assert!(matches!(result, Err(SchemaError::UnknownCollection(name)) if name == "Foo"));
    }
}
