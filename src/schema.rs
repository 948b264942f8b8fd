//! Schema document types sent to the admin panel

use serde::{Deserialize, Serialize};

use crate::checksum::Checksum;
use crate::error::Result;
use crate::types::ExternalType;

/// Identifier this integration reports in `meta.liana`
pub const LIANA_NAME: &str = "forest-rs";

/// Relationship kind as named by the admin panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relationship {
    BelongsTo,
    HasOne,
    HasMany,
    BelongsToMany,
}

impl Relationship {
    pub fn is_to_many(&self) -> bool {
        matches!(self, Relationship::HasMany | Relationship::BelongsToMany)
    }
}

/// Field validation rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl Validation {
    pub fn is_present() -> Self {
        Self {
            kind: "is present".to_string(),
            message: None,
        }
    }
}

/// One field of a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub field: String,
    #[serde(rename = "type")]
    pub field_type: ExternalType,
    #[serde(default)]
    pub default_value: Option<serde_json::Value>,
    #[serde(default)]
    pub enums: Option<Vec<String>>,
    #[serde(default)]
    pub integration: Option<String>,
    #[serde(default = "default_true")]
    pub is_filterable: bool,
    #[serde(default)]
    pub is_read_only: bool,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default = "default_true")]
    pub is_sortable: bool,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub inverse_of: Option<String>,
    #[serde(default)]
    pub relationship: Option<Relationship>,
    #[serde(default)]
    pub validations: Vec<Validation>,
}

fn default_true() -> bool {
    true
}

impl FieldSchema {
    /// A filterable, sortable, optional field
    pub fn new(field: impl Into<String>, field_type: impl Into<ExternalType>) -> Self {
        Self {
            field: field.into(),
            field_type: field_type.into(),
            default_value: None,
            enums: None,
            integration: None,
            is_filterable: true,
            is_read_only: false,
            is_required: false,
            is_sortable: true,
            is_virtual: false,
            reference: None,
            inverse_of: None,
            relationship: None,
            validations: Vec::new(),
        }
    }

    pub fn is_relation(&self) -> bool {
        self.reference.is_some()
    }

    /// Target collection name taken from `reference` (`Target.pk`)
    pub fn target_collection(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .map(|r| r.split_once('.').map(|(target, _)| target).unwrap_or(r))
    }
}

/// Smart action attached to a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(rename = "type", default = "default_action_type")]
    pub kind: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_http_method")]
    pub http_method: String,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    #[serde(default)]
    pub redirect: Option<String>,
    #[serde(default)]
    pub download: bool,
}

fn default_action_type() -> String {
    "bulk".to_string()
}

fn default_http_method() -> String {
    "POST".to_string()
}

impl Action {
    /// A bulk POST action served under `/forest/actions/<slug>`
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let slug = name.to_lowercase().replace(' ', "-");
        Self {
            name,
            kind: default_action_type(),
            endpoint: format!("/forest/actions/{}", slug),
            http_method: default_http_method(),
            fields: Vec::new(),
            redirect: None,
            download: false,
        }
    }
}

/// Smart segment attached to a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub name: String,
}

impl Segment {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// One collection of the schema document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub integration: Option<String>,
    #[serde(default)]
    pub is_read_only: bool,
    #[serde(default = "default_true")]
    pub is_searchable: bool,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub only_for_relationships: bool,
    #[serde(default = "default_pagination_type")]
    pub pagination_type: String,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

fn default_pagination_type() -> String {
    "page".to_string()
}

impl CollectionSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: None,
            integration: None,
            is_read_only: false,
            is_searchable: true,
            is_virtual: false,
            only_for_relationships: false,
            pagination_type: default_pagination_type(),
            fields: Vec::new(),
            actions: Vec::new(),
            segments: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.field == name)
    }
}

/// Metadata block of the schema document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMeta {
    pub database_type: String,
    pub liana: String,
    pub liana_version: String,
    pub orm_version: String,
}

/// The complete schema document, also the shape of the cache file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub collections: Vec<CollectionSchema>,
    pub meta: SchemaMeta,
}

impl SchemaDocument {
    /// Linear lookup by collection name
    pub fn get_collection(&self, name: &str) -> Option<&CollectionSchema> {
        self.collections.iter().find(|c| c.name == name)
    }

    pub fn collection_names(&self) -> Vec<&str> {
        self.collections.iter().map(|c| c.name.as_str()).collect()
    }

    /// Pretty-printed JSON with 2-space indentation
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn checksum(&self) -> Result<Checksum> {
        Checksum::of(self)
    }
}
