//! Collection Registry
//!
//! Holds the smart collections declared by application code: smart fields,
//! actions and segments attached to a native model, or fully virtual
//! collections with no backing model. Entries are keyed by name and a second
//! registration under the same name replaces the first entirely.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::host::NativeModel;
use crate::schema::{Action, CollectionSchema, FieldSchema, Segment};
use crate::types::ExternalType;

/// Computes a smart field value from a serialized record
pub type SmartGetter = Arc<dyn Fn(&serde_json::Value) -> serde_json::Value + Send + Sync>;

/// A user-declared virtual field
#[derive(Clone)]
pub struct SmartField {
    pub schema: FieldSchema,
    /// Never serialized into the schema document
    pub get: Option<SmartGetter>,
}

impl SmartField {
    /// A read-only virtual field
    pub fn new(field: impl Into<String>, field_type: impl Into<ExternalType>) -> Self {
        let mut schema = FieldSchema::new(field, field_type);
        schema.is_virtual = true;
        schema.is_read_only = true;
        schema.is_filterable = false;
        schema.is_sortable = false;
        Self { schema, get: None }
    }

    pub fn with_getter<F>(mut self, get: F) -> Self
    where
        F: Fn(&serde_json::Value) -> serde_json::Value + Send + Sync + 'static,
    {
        self.get = Some(Arc::new(get));
        self
    }

    /// Point the field at another collection
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.schema.reference = Some(reference.into());
        self
    }
}

impl fmt::Debug for SmartField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmartField")
            .field("schema", &self.schema)
            .field("get", &self.get.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// A smart collection declared by application code
pub trait CollectionDefinition {
    /// Collection name, unique within the registry
    fn name(&self) -> &str;

    fn fields(&self) -> Vec<SmartField> {
        Vec::new()
    }

    fn actions(&self) -> Vec<Action> {
        Vec::new()
    }

    fn segments(&self) -> Vec<Segment> {
        Vec::new()
    }

    fn is_searchable(&self) -> bool {
        true
    }
}

/// A registered smart collection
#[derive(Clone)]
pub struct RegisteredCollection {
    /// Smart additions only; native fields are added by the builder
    pub schema: CollectionSchema,
    /// Backing native model, `None` for virtual collections
    pub model: Option<String>,
    getters: HashMap<String, SmartGetter>,
}

impl fmt::Debug for RegisteredCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredCollection")
            .field("schema", &self.schema)
            .field("model", &self.model)
            .field("getters", &self.getters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RegisteredCollection {
    pub fn is_virtual(&self) -> bool {
        self.model.is_none()
    }
}

/// Registry of smart collections, guarded by a single lock
#[derive(Debug, Default)]
pub struct CollectionRegistry {
    entries: Mutex<Vec<RegisteredCollection>>,
}

impl CollectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Every mutation replaces whole entries, so a poisoned guard still holds
    // a consistent table.
    fn entries(&self) -> MutexGuard<'_, Vec<RegisteredCollection>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a smart collection, replacing any entry with the same name
    pub fn register(&self, definition: &dyn CollectionDefinition, model: Option<&NativeModel>) {
        let mut schema = CollectionSchema::new(definition.name());
        schema.is_virtual = model.is_none();
        schema.is_searchable = definition.is_searchable();
        schema.actions = definition.actions();
        schema.segments = definition.segments();

        let mut getters = HashMap::new();
        for smart in definition.fields() {
            if let Some(get) = smart.get {
                getters.insert(smart.schema.field.clone(), get);
            }
            schema.fields.push(smart.schema);
        }

        let entry = RegisteredCollection {
            schema,
            model: model.map(|m| m.name.clone()),
            getters,
        };

        let mut entries = self.entries();
        match entries.iter_mut().find(|e| e.schema.name == entry.schema.name) {
            Some(existing) => {
                tracing::debug!(collection = %entry.schema.name, "replacing registered collection");
                *existing = entry;
            }
            None => {
                tracing::debug!(collection = %entry.schema.name, virtual_only = entry.is_virtual(), "registered collection");
                entries.push(entry);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<RegisteredCollection> {
        self.entries().iter().find(|e| e.schema.name == name).cloned()
    }

    /// All entries in registration order
    pub fn all(&self) -> Vec<RegisteredCollection> {
        self.entries().clone()
    }

    /// Entries attached to the given native model, in registration order
    pub fn for_model(&self, model: &str) -> Vec<RegisteredCollection> {
        self.entries()
            .iter()
            .filter(|e| e.model.as_deref() == Some(model))
            .cloned()
            .collect()
    }

    /// Smart getter of a field, if one was declared
    pub fn getter(&self, collection: &str, field: &str) -> Option<SmartGetter> {
        self.entries()
            .iter()
            .filter(|e| e.schema.name == collection || e.model.as_deref() == Some(collection))
            .find_map(|e| e.getters.get(field).cloned())
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }
}
