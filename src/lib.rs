//! Forest Admin schema extraction
//!
//! Introspects host data models and produces the schema document consumed
//! by the Forest Admin panel, plus JSON:API serialization of records.
//!
//! ## Features
//!
//! - **Type Mapping**: native field kinds map onto a closed set of admin-panel types
//! - **Smart Collections**: virtual fields, actions and segments declared by application code
//! - **JSON:API Descriptors**: per-collection attribute/relationship split for rendering records
//! - **Schema File**: `.forestadmin-schema.json` rewritten in debug mode, trusted in production
//!
//! ## Startup
//!
//! ```text
//! SmartFeatureCatalog ──► CollectionRegistry ─┐
//!                                             ├─► SchemaBuilder ──► SchemaDocument
//! ModelIntrospector ──► type mapper ──────────┘          │
//!                                          ┌─────────────┴─────────────┐
//!                                          ▼                           ▼
//!                               JsonApiSchemaRegistry         SchemaFile::reconcile
//! ```

pub mod builder;
pub mod checksum;
pub mod collection;
pub mod config;
pub mod context;
pub mod discovery;
pub mod error;
pub mod host;
pub mod json_api;
pub mod schema;
pub mod schema_file;
pub mod types;
pub mod version;

pub use builder::SchemaBuilder;
pub use checksum::Checksum;
pub use collection::{CollectionDefinition, CollectionRegistry, SmartField};
pub use config::{ForestConfig, Mode};
pub use context::ForestContext;
pub use discovery::{add_smart_features, DiscoveryReport, SmartFeatureCatalog, SmartFeatureModule};
pub use error::{Result, SchemaError};
pub use host::{FieldDescriptor, ModelIntrospector, NativeField, NativeModel, RelationKind, StaticModels};
pub use json_api::{JsonApiSchemaEntry, JsonApiSchemaRegistry};
pub use schema::{Action, CollectionSchema, FieldSchema, SchemaDocument, SchemaMeta, Segment};
pub use schema_file::SchemaFile;
pub use types::{resolve, ExternalType, ScalarType};
