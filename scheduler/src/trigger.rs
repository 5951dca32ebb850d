use std::sync::Arc;

use db::dtos::{PipelineStatus, RunStatus};
use db::entities::PipelineRun;
use db::StoreError;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::orchestrator::RunOrchestrator;

#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("pipeline {0} does not exist")]
    PipelineNotFound(Uuid),

    #[error("pipeline {id} is {status:?}, only active pipelines can run")]
    PipelineInactive { id: Uuid, status: PipelineStatus },

    #[error("run {0} does not exist")]
    RunNotFound(Uuid),

    #[error("run {id} already finished as {status}")]
    AlreadyFinished { id: Uuid, status: RunStatus },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A run that was accepted and is executing in the background.
pub struct TriggeredRun {
    /// The run as created, still `pending`.
    pub run: PipelineRun,
    pub handle: JoinHandle<RunStatus>,
}

/// Creates a pending run for an active pipeline and starts executing it
/// without waiting for it.
pub async fn trigger_run(
    orchestrator: &Arc<RunOrchestrator>,
    pipeline_id: Uuid,
    triggered_by: Option<Uuid>,
) -> Result<TriggeredRun, TriggerError> {
    let store = orchestrator.store();

    let pipeline = store
        .get_pipeline(pipeline_id)
        .await?
        .ok_or(TriggerError::PipelineNotFound(pipeline_id))?;

    if pipeline.status != PipelineStatus::Active {
        return Err(TriggerError::PipelineInactive {
            id: pipeline.id,
            status: pipeline.status,
        });
    }

    let run = store.create_run(pipeline.id, triggered_by).await?;
    info!(run_id = %run.id, %pipeline_id, "Run triggered");

    let orchestrator = Arc::clone(orchestrator);
    let run_id = run.id;
    let handle =
        tokio::spawn(async move { orchestrator.execute_run(pipeline_id, run_id).await });

    Ok(TriggeredRun { run, handle })
}

/// Marks a pending or running run as cancelled. A running run stops at its
/// next task boundary.
pub async fn cancel_run(
    orchestrator: &RunOrchestrator,
    run_id: Uuid,
) -> Result<PipelineRun, TriggerError> {
    let store = orchestrator.store();

    let run = store
        .get_run(run_id)
        .await?
        .ok_or(TriggerError::RunNotFound(run_id))?;

    if run.status.is_terminal() {
        return Err(TriggerError::AlreadyFinished {
            id: run.id,
            status: run.status,
        });
    }

    let run = store
        .update_run_status(run_id, RunStatus::Cancelled)
        .await?
        .ok_or(TriggerError::RunNotFound(run_id))?;

    // The run may have finished between the read and the write.
    if run.status != RunStatus::Cancelled {
        return Err(TriggerError::AlreadyFinished {
            id: run.id,
            status: run.status,
        });
    }
    info!(%run_id, "Run cancelled");

    Ok(run)
}
