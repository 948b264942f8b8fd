//! Native field kind to admin-panel type mapping

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::host::FieldDescriptor;

/// Scalar type tags understood by the admin panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    String,
    Number,
    Boolean,
    Date,
    DateOnly,
    Time,
    Json,
    Enum,
    #[serde(rename = "unknown")]
    Unknown,
}

impl ScalarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::String => "String",
            ScalarType::Number => "Number",
            ScalarType::Boolean => "Boolean",
            ScalarType::Date => "Date",
            ScalarType::DateOnly => "DateOnly",
            ScalarType::Time => "Time",
            ScalarType::Json => "Json",
            ScalarType::Enum => "Enum",
            ScalarType::Unknown => "unknown",
        }
    }
}

/// Type of a collection field: a scalar tag or a one-level array of one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExternalType {
    Scalar(ScalarType),
    /// Serialized as `["Number"]`
    Array([ScalarType; 1]),
}

impl ExternalType {
    pub const UNKNOWN: ExternalType = ExternalType::Scalar(ScalarType::Unknown);

    pub fn array_of(element: ScalarType) -> Self {
        ExternalType::Array([element])
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ExternalType::Array(_))
    }

    /// The scalar tag, or the element tag for arrays
    pub fn scalar(&self) -> ScalarType {
        match self {
            ExternalType::Scalar(s) => *s,
            ExternalType::Array([s]) => *s,
        }
    }
}

impl From<ScalarType> for ExternalType {
    fn from(scalar: ScalarType) -> Self {
        ExternalType::Scalar(scalar)
    }
}

impl fmt::Display for ExternalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalType::Scalar(s) => write!(f, "{}", s.as_str()),
            ExternalType::Array([s]) => write!(f, "[{}]", s.as_str()),
        }
    }
}

/// Native storage kind of homogeneous array fields
pub const ARRAY_KIND: &str = "ArrayField";

// Range kinds (IntegerRangeField, DateRangeField, ...) are intentionally absent.
const TYPE_TABLE: &[(&str, ScalarType)] = &[
    ("AutoField", ScalarType::String),
    ("BigAutoField", ScalarType::Number),
    ("BinaryField", ScalarType::String),
    ("BooleanField", ScalarType::Boolean),
    ("CharField", ScalarType::String),
    ("DateField", ScalarType::DateOnly),
    ("DateTimeField", ScalarType::Date),
    ("DecimalField", ScalarType::Number),
    ("DurationField", ScalarType::Number),
    ("FileField", ScalarType::String),
    ("FilePathField", ScalarType::String),
    ("FloatField", ScalarType::Number),
    ("IntegerField", ScalarType::Number),
    ("BigIntegerField", ScalarType::Number),
    ("IPAddressField", ScalarType::String),
    ("GenericIPAddressField", ScalarType::String),
    ("JSONField", ScalarType::Json),
    ("NullBooleanField", ScalarType::Boolean),
    ("OneToOneField", ScalarType::Number),
    ("PositiveBigIntegerField", ScalarType::Number),
    ("PositiveIntegerField", ScalarType::Number),
    ("PositiveSmallIntegerField", ScalarType::Number),
    ("SlugField", ScalarType::String),
    ("SmallAutoField", ScalarType::String),
    ("SmallIntegerField", ScalarType::Number),
    ("TextField", ScalarType::String),
    ("TimeField", ScalarType::Time),
    ("UUIDField", ScalarType::String),
    ("CICharField", ScalarType::String),
    ("CIEmailField", ScalarType::String),
    ("CITextField", ScalarType::String),
    ("HStoreField", ScalarType::Json),
];

/// Look up a native storage kind in the static table
pub fn lookup_kind(kind: &str) -> ScalarType {
    TYPE_TABLE
        .iter()
        .find(|(native, _)| *native == kind)
        .map(|(_, scalar)| *scalar)
        .unwrap_or(ScalarType::Unknown)
}

/// All native kinds the table knows about
pub fn known_kinds() -> impl Iterator<Item = (&'static str, ScalarType)> {
    TYPE_TABLE.iter().copied()
}

/// Resolve the admin-panel type of a field
///
/// Enumerated fields are always `Enum`. Array fields resolve their element
/// kind through the same table; nested arrays resolve to `["unknown"]`.
pub fn resolve(field: &dyn FieldDescriptor) -> ExternalType {
    if field.is_enumerated() {
        return ScalarType::Enum.into();
    }

    let kind = field.native_kind();
    if kind == ARRAY_KIND {
        let element = field.element_kind().map(lookup_kind).unwrap_or(ScalarType::Unknown);
        return ExternalType::array_of(element);
    }

    lookup_kind(kind).into()
}
