use serde::{Deserialize, Serialize};

#[derive(sqlx::Type, Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[sqlx(type_name = "mapping_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MappingKind {
    Node,
    Relationship,
}
