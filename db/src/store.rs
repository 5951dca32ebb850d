//! Persistence contract for pipeline definitions and run records.
//!
//! The run engine only reads pipelines, tasks and data sources, and writes run
//! status transitions. The remaining operations exist for the surrounding
//! system that manages definitions.

use async_trait::async_trait;
use uuid::Uuid;

use crate::dtos::RunStatus;
use crate::entities::{
    DataSource, NewDataSource, NewPipeline, NewPipelineTask, Pipeline, PipelineRun, PipelineTask,
    PipelineTaskUpdate, PipelineUpdate,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{entity} {id} does not exist")]
    MissingReference { entity: &'static str, id: Uuid },

    /// Internal mutex was poisoned by a panicked thread.
    #[error("store lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage for pipelines, tasks, data sources and runs.
///
/// Implementations must be `Send + Sync` for use behind `Arc<dyn PipelineStore>`.
#[async_trait]
pub trait PipelineStore: Send + Sync {
    async fn get_pipeline(&self, id: Uuid) -> Result<Option<Pipeline>>;

    async fn list_pipelines(&self) -> Result<Vec<Pipeline>>;

    async fn create_pipeline(&self, pipeline: NewPipeline) -> Result<Pipeline>;

    /// Applies the provided fields; `None` fields keep their value.
    async fn update_pipeline(&self, id: Uuid, update: PipelineUpdate) -> Result<Option<Pipeline>>;

    /// Deleting a pipeline also deletes its tasks and runs.
    async fn delete_pipeline(&self, id: Uuid) -> Result<bool>;

    async fn get_task(&self, id: Uuid) -> Result<Option<PipelineTask>>;

    /// All tasks of a pipeline, enabled or not, ascending by `order` and then
    /// by creation.
    async fn list_tasks(&self, pipeline_id: Uuid) -> Result<Vec<PipelineTask>>;

    async fn create_task(&self, task: NewPipelineTask) -> Result<PipelineTask>;

    async fn update_task(&self, id: Uuid, update: PipelineTaskUpdate)
        -> Result<Option<PipelineTask>>;

    async fn delete_task(&self, id: Uuid) -> Result<bool>;

    async fn get_data_source(&self, id: Uuid) -> Result<Option<DataSource>>;

    async fn create_data_source(&self, data_source: NewDataSource) -> Result<DataSource>;

    async fn delete_data_source(&self, id: Uuid) -> Result<bool>;

    /// Creates a run in `pending` status.
    async fn create_run(&self, pipeline_id: Uuid, triggered_by: Option<Uuid>)
        -> Result<PipelineRun>;

    async fn get_run(&self, id: Uuid) -> Result<Option<PipelineRun>>;

    /// Newest first, optionally restricted to one pipeline.
    async fn list_runs(&self, pipeline_id: Option<Uuid>) -> Result<Vec<PipelineRun>>;

    /// Persists a status transition allowed by [`RunStatus::can_become`].
    ///
    /// Moving to `running` stamps `start_time` if it is unset; moving to a
    /// terminal status stamps `end_time`. A refused transition leaves the run
    /// untouched and returns it as stored, so callers compare the returned
    /// status with the one they asked for. Returns `Ok(None)` for an unknown
    /// run.
    async fn update_run_status(&self, id: Uuid, status: RunStatus) -> Result<Option<PipelineRun>>;

    async fn delete_run(&self, id: Uuid) -> Result<bool>;
}
