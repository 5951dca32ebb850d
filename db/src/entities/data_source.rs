use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;

use crate::dtos::{ConnectionParams, DataSourceKind};

#[derive(sqlx::FromRow, Clone, Debug, Serialize, Deserialize)]
pub struct DataSource {
    pub id: Uuid,
    pub name: String,
    pub kind: DataSourceKind,
    pub connection_params: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DataSource {
    pub fn connection_params(&self) -> Result<ConnectionParams, serde_json::Error> {
        serde_json::from_value(self.connection_params.clone())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewDataSource {
    pub name: String,
    pub kind: DataSourceKind,
    pub connection_params: serde_json::Value,
}
