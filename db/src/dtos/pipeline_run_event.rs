use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RunStatus;

/// Published on `pipeline.run.finished` when a run settles on its final status.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineRunFinished {
    pub run_id: Uuid,
    pub pipeline_id: Uuid,
    pub status: RunStatus,
}
