//! Host framework adapter seam
//!
//! The schema builder never talks to an ORM directly. A host integration
//! implements [`ModelIntrospector`] and exposes its fields through
//! [`FieldDescriptor`]. [`NativeModel`] and [`NativeField`] are plain data
//! implementations that can also be read from a JSON model manifest.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};

/// Kind of relation carried by a relation field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    ForeignKey,
    OneToOne,
    OneToMany,
    ManyToMany,
}

impl RelationKind {
    /// Whether the relation points at many target records
    pub fn is_to_many(&self) -> bool {
        matches!(self, RelationKind::OneToMany | RelationKind::ManyToMany)
    }
}

/// Relation metadata of a native field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeRelation {
    pub kind: RelationKind,
    /// Target model name
    pub target: String,
    /// Field name on the target pointing back at this model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_name: Option<String>,
}

/// Capabilities the schema builder needs from a host field
pub trait FieldDescriptor {
    fn name(&self) -> &str;

    /// Internal storage kind, e.g. `CharField` or `ArrayField`
    fn native_kind(&self) -> &str;

    /// Declared choice values, if the field is enumerated
    fn choices(&self) -> Option<&[String]>;

    /// Storage kind of the elements for array fields
    fn element_kind(&self) -> Option<&str>;

    fn is_nullable(&self) -> bool;

    fn is_blank(&self) -> bool;

    fn default_value(&self) -> Option<&serde_json::Value>;

    fn is_primary_key(&self) -> bool;

    fn relation(&self) -> Option<&NativeRelation>;

    fn is_enumerated(&self) -> bool {
        self.choices().is_some_and(|c| !c.is_empty())
    }

    fn has_default(&self) -> bool {
        self.default_value().is_some()
    }
}

/// A field read from the host framework
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeField {
    pub name: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_kind: Option<String>,
    #[serde(default)]
    pub null: bool,
    #[serde(default)]
    pub blank: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<NativeRelation>,
}

impl NativeField {
    /// Create a plain non-null field
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            choices: None,
            base_kind: None,
            null: false,
            blank: false,
            default: None,
            primary_key: false,
            relation: None,
        }
    }

    /// Auto-incremented primary key named `id`
    pub fn pk(kind: impl Into<String>) -> Self {
        Self {
            primary_key: true,
            ..Self::new("id", kind)
        }
    }

    /// Array storage field wrapping `base_kind`
    pub fn array(name: impl Into<String>, base_kind: impl Into<String>) -> Self {
        Self {
            base_kind: Some(base_kind.into()),
            ..Self::new(name, "ArrayField")
        }
    }

    /// Relation field targeting another model
    pub fn related(name: impl Into<String>, kind: RelationKind, target: impl Into<String>) -> Self {
        let native_kind = match kind {
            RelationKind::ForeignKey => "ForeignKey",
            RelationKind::OneToOne => "OneToOneField",
            RelationKind::OneToMany => "ManyToOneRel",
            RelationKind::ManyToMany => "ManyToManyField",
        };
        Self {
            relation: Some(NativeRelation {
                kind,
                target: target.into(),
                related_name: None,
            }),
            ..Self::new(name, native_kind)
        }
    }

    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.null = true;
        self.blank = true;
        self
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }
}

impl FieldDescriptor for NativeField {
    fn name(&self) -> &str {
        &self.name
    }

    fn native_kind(&self) -> &str {
        &self.kind
    }

    fn choices(&self) -> Option<&[String]> {
        self.choices.as_deref()
    }

    fn element_kind(&self) -> Option<&str> {
        self.base_kind.as_deref()
    }

    fn is_nullable(&self) -> bool {
        self.null
    }

    fn is_blank(&self) -> bool {
        self.blank
    }

    fn default_value(&self) -> Option<&serde_json::Value> {
        self.default.as_ref()
    }

    fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    fn relation(&self) -> Option<&NativeRelation> {
        self.relation.as_ref()
    }
}

/// A model read from the host framework
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeModel {
    pub name: String,
    #[serde(default)]
    pub app_label: String,
    pub fields: Vec<NativeField>,
}

impl NativeModel {
    pub fn new(name: impl Into<String>, app_label: impl Into<String>, fields: Vec<NativeField>) -> Self {
        Self {
            name: name.into(),
            app_label: app_label.into(),
            fields,
        }
    }

    /// The primary key field, if declared
    pub fn primary_key(&self) -> Option<&NativeField> {
        self.fields.iter().find(|f| f.primary_key)
    }

    pub fn field(&self, name: &str) -> Option<&NativeField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Enumerates the models known to the host framework
pub trait ModelIntrospector {
    /// All models in declaration order
    fn models(&self) -> Vec<NativeModel>;

    /// Database engine name reported to the admin panel
    fn database_type(&self) -> String;

    /// Version of the host ORM
    fn orm_version(&self) -> Result<String>;
}

/// Host description read from a JSON model manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticModels {
    pub database_type: String,
    #[serde(default)]
    pub orm_version: Option<String>,
    pub models: Vec<NativeModel>,
}

impl StaticModels {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

impl ModelIntrospector for StaticModels {
    fn models(&self) -> Vec<NativeModel> {
        self.models.clone()
    }

    fn database_type(&self) -> String {
        self.database_type.clone()
    }

    fn orm_version(&self) -> Result<String> {
        self.orm_version
            .clone()
            .ok_or_else(|| SchemaError::VersionLookup("no ORM version in manifest".to_string()))
    }
}
