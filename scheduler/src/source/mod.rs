//! Row extraction from relational data sources.

use async_trait::async_trait;
use db::dtos::DataSourceKind;
use db::entities::DataSource;

use crate::value::Row;

mod mysql;
mod postgres;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("data source kind {0} does not support extraction")]
    Unsupported(DataSourceKind),

    #[error("invalid connection parameters: {0}")]
    InvalidParams(#[from] serde_json::Error),

    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// Runs a read query against a data source and returns its rows in order.
#[async_trait]
pub trait SourceConnector: Send + Sync {
    async fn fetch_rows(&self, source: &DataSource, query: &str) -> Result<Vec<Row>, SourceError>;
}

/// `SELECT * FROM <entity> [WHERE <filter>]`.
///
/// Both parts come from task configuration and are used verbatim. A blank
/// filter adds no `WHERE` clause.
pub fn extraction_query(entity: &str, filter: Option<&str>) -> String {
    match filter.map(str::trim).filter(|filter| !filter.is_empty()) {
        Some(filter) => format!("SELECT * FROM {entity} WHERE {filter}"),
        None => format!("SELECT * FROM {entity}"),
    }
}

/// Opens one connection per call to a MySQL or PostgreSQL source and closes
/// it once the rows are read.
#[derive(Clone, Copy, Debug, Default)]
pub struct SqlSourceConnector;

#[async_trait]
impl SourceConnector for SqlSourceConnector {
    async fn fetch_rows(&self, source: &DataSource, query: &str) -> Result<Vec<Row>, SourceError> {
        match source.kind {
            DataSourceKind::Mysql => mysql::fetch_rows(&source.connection_params()?, query).await,
            DataSourceKind::Postgresql => {
                postgres::fetch_rows(&source.connection_params()?, query).await
            }
            kind @ (DataSourceKind::Csv | DataSourceKind::Excel | DataSourceKind::Api) => {
                Err(SourceError::Unsupported(kind))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn query_without_filter() {
        assert_eq!(extraction_query("people", None), "SELECT * FROM people");
        assert_eq!(extraction_query("people", Some("  ")), "SELECT * FROM people");
    }

    #[test]
    fn query_with_filter_is_verbatim() {
        assert_eq!(
            extraction_query("crm.people", Some("age > 30 AND city = 'Oslo'")),
            "SELECT * FROM crm.people WHERE age > 30 AND city = 'Oslo'"
        );
    }

    #[tokio::test]
    async fn file_sources_are_unsupported() {
        let source = DataSource {
            id: Uuid::new_v4(),
            name: "export".to_string(),
            kind: DataSourceKind::Csv,
            connection_params: serde_json::json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let error = SqlSourceConnector
            .fetch_rows(&source, "SELECT 1")
            .await
            .unwrap_err();
        assert!(matches!(error, SourceError::Unsupported(DataSourceKind::Csv)));
    }
}
