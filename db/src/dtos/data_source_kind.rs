use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(sqlx::Type, Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[sqlx(type_name = "data_source_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DataSourceKind {
    #[serde(alias = "MySQL")]
    Mysql,
    #[serde(alias = "PostgreSQL")]
    Postgresql,
    #[serde(alias = "CSV")]
    Csv,
    #[serde(alias = "Excel")]
    Excel,
    #[serde(alias = "API")]
    Api,
}

impl DataSourceKind {
    /// Only relational sources can be queried for rows.
    pub fn is_extractable(self) -> bool {
        matches!(self, Self::Mysql | Self::Postgresql)
    }
}

impl fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mysql => "MySQL",
            Self::Postgresql => "PostgreSQL",
            Self::Csv => "CSV",
            Self::Excel => "Excel",
            Self::Api => "API",
        };

        f.write_str(name)
    }
}
