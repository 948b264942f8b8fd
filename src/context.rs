//! Application lifecycle root
//!
//! Owns the registries and the built schema. Host startup code creates one
//! [`ForestContext`], registers smart features and builds the schema once.

use serde_json::Value;

use crate::builder::SchemaBuilder;
use crate::collection::CollectionRegistry;
use crate::config::ForestConfig;
use crate::discovery::{self, DiscoveryReport, SmartFeatureCatalog};
use crate::error::Result;
use crate::host::{ModelIntrospector, NativeModel};
use crate::json_api::JsonApiSchemaRegistry;
use crate::schema::{CollectionSchema, SchemaDocument};
use crate::schema_file::SchemaFile;

pub struct ForestContext {
    config: ForestConfig,
    collections: CollectionRegistry,
    json_api: JsonApiSchemaRegistry,
    /// Last built document
    schema: Option<SchemaDocument>,
    /// Document to synchronize with the admin panel, `None` when unavailable
    schema_data: Option<SchemaDocument>,
}

impl ForestContext {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            collections: CollectionRegistry::new(),
            json_api: JsonApiSchemaRegistry::new(),
            schema: None,
            schema_data: None,
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn collections(&self) -> &CollectionRegistry {
        &self.collections
    }

    pub fn json_api(&self) -> &JsonApiSchemaRegistry {
        &self.json_api
    }

    pub fn schema(&self) -> Option<&SchemaDocument> {
        self.schema.as_ref()
    }

    pub fn schema_data(&self) -> Option<&SchemaDocument> {
        self.schema_data.as_ref()
    }

    pub fn schema_file(&self) -> SchemaFile {
        SchemaFile::new(self.config.schema_file_path())
    }

    /// Register the configured smart feature modules
    pub fn add_smart_features(&self, catalog: &SmartFeatureCatalog, models: &[NativeModel]) -> DiscoveryReport {
        discovery::add_smart_features(&self.collections, catalog, &self.config.smart_features, models)
    }

    /// Build the schema document from the host models
    pub fn build_schema(&mut self, host: &dyn ModelIntrospector) -> Result<&SchemaDocument> {
        let document = SchemaBuilder::new(&self.config, &self.collections).build(host)?;
        Ok(&*self.schema.insert(document))
    }

    /// Rebuild the JSON:API descriptors from the built schema
    pub fn handle_json_api_serializer(&self) {
        match &self.schema {
            Some(document) => self.json_api.build_from(document),
            None => self.json_api.reset(),
        }
    }

    /// Render a record as a JSON:API document, smart attributes included
    pub fn render(&self, collection: &str, record: &Value) -> Result<Value> {
        self.json_api.render(collection, record, &self.collections)
    }

    pub fn render_many(&self, collection: &str, records: &[Value]) -> Result<Value> {
        self.json_api.render_many(collection, records, &self.collections)
    }

    /// Reconcile the built schema with the cache file
    pub fn handle_schema_file(&mut self) -> Result<Option<&SchemaDocument>> {
        self.schema_data = None;
        let Some(built) = &self.schema else {
            tracing::debug!("no schema built, skipping schema file");
            return Ok(None);
        };
        self.schema_data = self.schema_file().reconcile(self.config.mode(), built)?;
        Ok(self.schema_data.as_ref())
    }

    /// Collection of the built schema, `None` when absent
    pub fn get_collection(&self, name: &str) -> Option<&CollectionSchema> {
        self.schema.as_ref().and_then(|s| s.get_collection(name))
    }

    /// Full startup sequence
    pub fn startup(&mut self, host: &dyn ModelIntrospector, catalog: &SmartFeatureCatalog) -> Result<DiscoveryReport> {
        let models = host.models();
        let report = self.add_smart_features(catalog, &models);
        self.build_schema(host)?;
        self.handle_json_api_serializer();
        self.handle_schema_file()?;
        Ok(report)
    }

    /// Drop all registered and built state
    pub fn reset(&mut self) {
        self.collections.clear();
        self.json_api.reset();
        self.schema = None;
        self.schema_data = None;
    }
}
