use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;

use crate::dtos::PipelineStatus;

#[derive(sqlx::FromRow, Clone, Debug, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Graph space every task of the pipeline writes into.
    pub target_space: String,
    pub status: PipelineStatus,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewPipeline {
    pub name: String,
    pub description: Option<String>,
    pub target_space: String,
    #[serde(default)]
    pub status: PipelineStatus,
    pub owner_id: Uuid,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PipelineUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub target_space: Option<String>,
    pub status: Option<PipelineStatus>,
}
