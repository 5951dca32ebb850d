//! Drives a run through its pipeline's tasks.
//!
//! Tasks run one at a time in ascending `order`. Before each task the run's
//! persisted status is read again, so a run marked `cancelled` stops at the
//! next task boundary. The first failed task ends the run.
//!
//! Only `pending` runs are executed. Status writes go through the store's
//! transition rule, so a cancellation that races the orchestrator is never
//! overwritten.

use std::sync::Arc;

use db::dtos::RunStatus;
use db::{PipelineStore, StoreError};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::task_executor::TaskRunner;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("run {0} does not exist")]
    MissingRun(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct RunOrchestrator {
    store: Arc<dyn PipelineStore>,
    tasks: Arc<dyn TaskRunner>,
}

impl RunOrchestrator {
    pub fn new(store: Arc<dyn PipelineStore>, tasks: Arc<dyn TaskRunner>) -> Self {
        Self { store, tasks }
    }

    pub fn store(&self) -> &Arc<dyn PipelineStore> {
        &self.store
    }

    /// Executes the run and returns its final status.
    ///
    /// Any error along the way ends the run as `failed`.
    pub async fn execute_run(&self, pipeline_id: Uuid, run_id: Uuid) -> RunStatus {
        let span = info_span!("run", %run_id, %pipeline_id);

        async {
            match self.drive(pipeline_id, run_id).await {
                Ok(status) => {
                    info!("Run finished with status {status}");
                    status
                }
                Err(error) => {
                    error!("Run aborted: {error}");

                    if let Err(error) = self.store.update_run_status(run_id, RunStatus::Failed).await
                    {
                        error!("Failed to mark run as failed: {error:?}");
                    }

                    RunStatus::Failed
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn drive(&self, pipeline_id: Uuid, run_id: Uuid) -> Result<RunStatus, RunError> {
        let run = self
            .store
            .get_run(run_id)
            .await?
            .ok_or(RunError::MissingRun(run_id))?;

        match run.status {
            RunStatus::Pending => {}
            RunStatus::Cancelled => {
                info!("Run was cancelled before it started");
                return Ok(RunStatus::Cancelled);
            }
            status => {
                warn!("Run is already {status}, not executing it again");
                return Ok(status);
            }
        }

        let started = self.transition(run_id, RunStatus::Running).await?;
        if started != RunStatus::Running {
            info!("Run became {started} before it started");
            return Ok(started);
        }

        let Some(pipeline) = self.store.get_pipeline(pipeline_id).await? else {
            warn!("Pipeline does not exist");
            return self.finish(run_id, RunStatus::Failed).await;
        };

        let tasks: Vec<_> = self
            .store
            .list_tasks(pipeline_id)
            .await?
            .into_iter()
            .filter(|task| task.enabled)
            .collect();

        if tasks.is_empty() {
            info!("Pipeline has no enabled tasks");
            return self.finish(run_id, RunStatus::Success).await;
        }

        let mut status = RunStatus::Success;

        for task in &tasks {
            if self.is_cancelled(run_id).await? {
                info!("Run cancelled before task {}", task.name);
                status = RunStatus::Cancelled;
                break;
            }

            if !self
                .tasks
                .execute_task(task, run_id, &pipeline.target_space)
                .await
            {
                warn!("Task {} failed, aborting run", task.name);
                status = RunStatus::Failed;
                break;
            }
        }

        // A cancellation that lands during the last task still wins.
        if self.is_cancelled(run_id).await? {
            status = RunStatus::Cancelled;
        }

        self.finish(run_id, status).await
    }

    async fn is_cancelled(&self, run_id: Uuid) -> Result<bool, RunError> {
        let run = self
            .store
            .get_run(run_id)
            .await?
            .ok_or(RunError::MissingRun(run_id))?;

        Ok(run.status == RunStatus::Cancelled)
    }

    /// Returns the status actually stored, which differs from `status` when
    /// the run had already finished.
    async fn transition(&self, run_id: Uuid, status: RunStatus) -> Result<RunStatus, RunError> {
        let run = self
            .store
            .update_run_status(run_id, status)
            .await?
            .ok_or(RunError::MissingRun(run_id))?;

        Ok(run.status)
    }

    async fn finish(&self, run_id: Uuid, status: RunStatus) -> Result<RunStatus, RunError> {
        let stored = self.transition(run_id, status).await?;
        if stored != status {
            info!("Run was already {stored}, keeping it");
        }

        Ok(stored)
    }
}
