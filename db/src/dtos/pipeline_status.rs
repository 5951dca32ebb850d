use serde::{Deserialize, Serialize};

#[derive(sqlx::Type, Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[sqlx(type_name = "pipeline_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    #[default]
    Draft,
    Active,
    Inactive,
}
