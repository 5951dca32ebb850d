use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;

use crate::dtos::{FieldMapping, MappingError, MappingKind};

#[derive(sqlx::FromRow, Clone, Debug, Serialize, Deserialize)]
pub struct PipelineTask {
    pub id: Uuid,
    pub pipeline_id: Uuid,
    pub name: String,
    #[sqlx(rename = "task_order")]
    pub order: i32,
    pub data_source_id: Uuid,
    /// Table or view name, interpolated verbatim into the extraction query.
    pub source_entity: String,
    /// Raw SQL predicate, interpolated verbatim after `WHERE`.
    pub filter_conditions: Option<String>,
    pub mapping_kind: MappingKind,
    pub target_label_or_type: String,
    pub field_mappings: serde_json::Value,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PipelineTask {
    pub fn field_mapping(&self) -> Result<FieldMapping, MappingError> {
        FieldMapping::parse(self.mapping_kind, &self.field_mappings)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewPipelineTask {
    pub pipeline_id: Uuid,
    pub name: String,
    pub order: i32,
    pub data_source_id: Uuid,
    pub source_entity: String,
    pub filter_conditions: Option<String>,
    pub mapping_kind: MappingKind,
    pub target_label_or_type: String,
    pub field_mappings: serde_json::Value,
    pub enabled: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PipelineTaskUpdate {
    pub name: Option<String>,
    pub order: Option<i32>,
    pub data_source_id: Option<Uuid>,
    pub source_entity: Option<String>,
    pub filter_conditions: Option<String>,
    pub mapping_kind: Option<MappingKind>,
    pub target_label_or_type: Option<String>,
    pub field_mappings: Option<serde_json::Value>,
    pub enabled: Option<bool>,
}
