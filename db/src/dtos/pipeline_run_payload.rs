use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Received on `pipeline.run`.
///
/// With a `run_id` the pending run already exists and is executed as is;
/// without one a new run is created for the pipeline first.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineRunPayload {
    pub pipeline_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_by: Option<Uuid>,
}
