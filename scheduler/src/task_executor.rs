use std::sync::Arc;

use async_trait::async_trait;
use db::dtos::{DataSourceKind, MappingError};
use db::entities::PipelineTask;
use db::{PipelineStore, StoreError};
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use crate::graph::{GraphError, GraphPool, GraphSession};
use crate::source::{extraction_query, SourceConnector, SourceError};
use crate::statement::build_statement;

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("task {0} does not exist")]
    Missing(Uuid),

    #[error("task {0} is disabled")]
    Disabled(Uuid),

    #[error("data source {0} does not exist")]
    MissingSource(Uuid),

    #[error("data source kind {0} does not support extraction")]
    UnsupportedSource(DataSourceKind),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("extraction failed: {0}")]
    Extraction(#[from] SourceError),

    #[error("failed to open graph session: {0}")]
    Session(#[source] GraphError),

    #[error("statement {index} failed: {source}")]
    Statement {
        index: usize,
        #[source]
        source: GraphError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Runs one task of a pipeline run.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    /// `true` when the task completed. Failures are logged, never returned.
    async fn execute_task(&self, task: &PipelineTask, run_id: Uuid, target_space: &str) -> bool;
}

pub struct TaskExecutor {
    store: Arc<dyn PipelineStore>,
    source: Arc<dyn SourceConnector>,
    graph: Arc<dyn GraphPool>,
}

impl TaskExecutor {
    pub fn new(
        store: Arc<dyn PipelineStore>,
        source: Arc<dyn SourceConnector>,
        graph: Arc<dyn GraphPool>,
    ) -> Self {
        Self {
            store,
            source,
            graph,
        }
    }

    /// Returns how many statements were executed.
    async fn run(&self, task_id: Uuid, target_space: &str) -> Result<usize, TaskError> {
        let task = self
            .store
            .get_task(task_id)
            .await?
            .ok_or(TaskError::Missing(task_id))?;

        if !task.enabled {
            return Err(TaskError::Disabled(task.id));
        }

        let source = self
            .store
            .get_data_source(task.data_source_id)
            .await?
            .ok_or(TaskError::MissingSource(task.data_source_id))?;

        if !source.kind.is_extractable() {
            return Err(TaskError::UnsupportedSource(source.kind));
        }

        let query = extraction_query(&task.source_entity, task.filter_conditions.as_deref());
        debug!("Extracting with: {query}");

        let rows = self.source.fetch_rows(&source, &query).await?;
        info!("Extracted {} rows from {}", rows.len(), source.name);

        if rows.is_empty() {
            return Ok(0);
        }

        let mapping = task.field_mapping()?;
        let statements: Vec<_> = rows
            .iter()
            .filter_map(|row| build_statement(row, &mapping, &task.target_label_or_type))
            .collect();

        if statements.is_empty() {
            info!("No statements produced for {} rows", rows.len());
            return Ok(0);
        }

        let mut session = self
            .graph
            .session(target_space)
            .await
            .map_err(TaskError::Session)?;

        let result = execute_all(session.as_mut(), &statements).await;
        session.release().await;

        result.map(|()| statements.len())
    }
}

async fn execute_all(
    session: &mut dyn GraphSession,
    statements: &[String],
) -> Result<(), TaskError> {
    for (index, statement) in statements.iter().enumerate() {
        if let Err(source) = session.execute(statement).await {
            error!("Statement failed: {statement}");
            return Err(TaskError::Statement { index, source });
        }
    }

    Ok(())
}

#[async_trait]
impl TaskRunner for TaskExecutor {
    async fn execute_task(&self, task: &PipelineTask, run_id: Uuid, target_space: &str) -> bool {
        let span = info_span!("task", %run_id, task_id = %task.id, order = task.order);

        async {
            info!("Starting task {}", task.name);

            match self.run(task.id, target_space).await {
                Ok(executed) => {
                    info!("Finished task {} with {executed} statements", task.name);
                    true
                }
                Err(error) => {
                    error!("Task {} failed: {error}", task.name);
                    false
                }
            }
        }
        .instrument(span)
        .await
    }
}
