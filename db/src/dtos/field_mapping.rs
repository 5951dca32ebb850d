use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::MappingKind;

/// Graph property types a source column can be coerced into. Names are
/// matched exactly; anything else is `Other` and gets no conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PropertyType {
    String,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    Bool,
    Date,
    Datetime,
    Timestamp,
    #[serde(other)]
    Other,
}

/// Vertex ids are either fixed strings or 64-bit integers. Any declared type
/// other than `INT64` reads as `STRING`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VidType {
    Int64,
    #[default]
    #[serde(other)]
    String,
}

impl From<VidType> for PropertyType {
    fn from(vid_type: VidType) -> Self {
        match vid_type {
            VidType::String => PropertyType::String,
            VidType::Int64 => PropertyType::Int64,
        }
    }
}

/// A source column, given either as a bare name or as `{"name", "type"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    Name(String),
    Typed {
        name: String,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        vid_type: Option<VidType>,
    },
}

impl ColumnRef {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Typed { name, .. } => name,
        }
    }

    pub fn vid_type(&self) -> VidType {
        match self {
            Self::Name(_) => VidType::default(),
            Self::Typed { vid_type, .. } => vid_type.unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMapping {
    pub target_property: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<PropertyType>,
}

/// Keyed by source column, in declaration order.
pub type PropertyMappings = IndexMap<String, PropertyMapping>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMapping {
    pub vertex_id_column: ColumnRef,
    #[serde(default)]
    pub properties: PropertyMappings,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipMapping {
    pub source_vid_column: ColumnRef,
    pub destination_vid_column: ColumnRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank_column: Option<ColumnRef>,
    #[serde(default)]
    pub properties: PropertyMappings,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldMapping {
    Node(NodeMapping),
    Relationship(RelationshipMapping),
}

#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("invalid {kind:?} field mapping: {source}")]
    Invalid {
        kind: MappingKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("field mapping names an empty column for `{0}`")]
    EmptyColumn(&'static str),
}

impl FieldMapping {
    /// Interprets a task's stored `field_mappings` according to its mapping kind.
    pub fn parse(kind: MappingKind, value: &serde_json::Value) -> Result<Self, MappingError> {
        let invalid = |source| MappingError::Invalid { kind, source };

        let mapping = match kind {
            MappingKind::Node => {
                let node: NodeMapping = serde_json::from_value(value.clone()).map_err(invalid)?;
                require_column(&node.vertex_id_column, "vertex_id_column")?;
                Self::Node(node)
            }
            MappingKind::Relationship => {
                let edge: RelationshipMapping =
                    serde_json::from_value(value.clone()).map_err(invalid)?;
                require_column(&edge.source_vid_column, "source_vid_column")?;
                require_column(&edge.destination_vid_column, "destination_vid_column")?;
                Self::Relationship(edge)
            }
        };

        Ok(mapping)
    }

    pub fn kind(&self) -> MappingKind {
        match self {
            Self::Node(_) => MappingKind::Node,
            Self::Relationship(_) => MappingKind::Relationship,
        }
    }
}

fn require_column(column: &ColumnRef, field: &'static str) -> Result<(), MappingError> {
    if column.name().trim().is_empty() {
        return Err(MappingError::EmptyColumn(field));
    }

    Ok(())
}
