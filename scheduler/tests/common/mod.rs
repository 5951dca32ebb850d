#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use db::dtos::{DataSourceKind, MappingKind, PipelineStatus, RunStatus};
use db::entities::{DataSource, NewDataSource, NewPipeline, NewPipelineTask, Pipeline, PipelineTask};
use db::{MemoryStore, PipelineStore};
use scheduler::graph::{GraphError, GraphPool, GraphSession};
use scheduler::source::{SourceConnector, SourceError};
use scheduler::task_executor::TaskRunner;
use scheduler::value::{Row, Value};
use uuid::Uuid;

pub fn row(fields: &[(&str, Value)]) -> Row {
    fields
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

pub async fn pipeline(store: &MemoryStore, status: PipelineStatus) -> Pipeline {
    store
        .create_pipeline(NewPipeline {
            name: "people graph".to_string(),
            description: Some("crm people into the social space".to_string()),
            target_space: "social".to_string(),
            status,
            owner_id: Uuid::new_v4(),
        })
        .await
        .unwrap()
}

pub async fn data_source(store: &MemoryStore, kind: DataSourceKind) -> DataSource {
    store
        .create_data_source(NewDataSource {
            name: "crm".to_string(),
            kind,
            connection_params: serde_json::json!({
                "host": "crm.internal",
                "user": "reader",
                "database": "crm",
            }),
        })
        .await
        .unwrap()
}

pub fn person_task(pipeline_id: Uuid, data_source_id: Uuid, name: &str, order: i32) -> NewPipelineTask {
    NewPipelineTask {
        pipeline_id,
        name: name.to_string(),
        order,
        data_source_id,
        source_entity: "people".to_string(),
        filter_conditions: None,
        mapping_kind: MappingKind::Node,
        target_label_or_type: "Person".to_string(),
        field_mappings: serde_json::json!({
            "vertex_id_column": "id",
            "properties": {
                "name": {"target_property": "name", "type": "STRING"},
            }
        }),
        enabled: true,
    }
}

pub async fn task(
    store: &MemoryStore,
    pipeline_id: Uuid,
    name: &str,
    order: i32,
    enabled: bool,
) -> PipelineTask {
    let mut new_task = person_task(pipeline_id, Uuid::new_v4(), name, order);
    new_task.enabled = enabled;
    store.create_task(new_task).await.unwrap()
}

/// Serves fixed rows and records every query it was asked to run.
#[derive(Default)]
pub struct FakeSource {
    pub rows: Vec<Row>,
    pub fail: bool,
    pub queries: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceConnector for FakeSource {
    async fn fetch_rows(&self, _source: &DataSource, query: &str) -> Result<Vec<Row>, SourceError> {
        self.queries.lock().unwrap().push(query.to_string());

        if self.fail {
            return Err(SourceError::Query(sqlx::Error::PoolTimedOut));
        }

        Ok(self.rows.clone())
    }
}

#[derive(Default)]
struct GraphLog {
    spaces: Vec<String>,
    statements: Vec<String>,
    released: usize,
}

/// Accepts statements until the `fail_at`-th one (zero based, counted per
/// pool).
#[derive(Default)]
pub struct FakeGraph {
    pub fail_at: Option<usize>,
    log: Arc<Mutex<GraphLog>>,
}

impl FakeGraph {
    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::default()
        }
    }

    pub fn statements(&self) -> Vec<String> {
        self.log.lock().unwrap().statements.clone()
    }

    pub fn spaces(&self) -> Vec<String> {
        self.log.lock().unwrap().spaces.clone()
    }

    pub fn released(&self) -> usize {
        self.log.lock().unwrap().released
    }
}

#[async_trait]
impl GraphPool for FakeGraph {
    async fn session(&self, space: &str) -> Result<Box<dyn GraphSession>, GraphError> {
        self.log.lock().unwrap().spaces.push(space.to_string());

        Ok(Box::new(FakeSession {
            fail_at: self.fail_at,
            log: Arc::clone(&self.log),
        }))
    }
}

struct FakeSession {
    fail_at: Option<usize>,
    log: Arc<Mutex<GraphLog>>,
}

#[async_trait]
impl GraphSession for FakeSession {
    async fn execute(&mut self, statement: &str) -> Result<(), GraphError> {
        let mut log = self.log.lock().unwrap();

        if self.fail_at == Some(log.statements.len()) {
            return Err(GraphError::Rejected {
                code: -1005,
                message: "SemanticError: No schema found".to_string(),
            });
        }

        log.statements.push(statement.to_string());
        Ok(())
    }

    async fn release(&mut self) {
        self.log.lock().unwrap().released += 1;
    }
}

/// Records which tasks the orchestrator invoked, failing or cancelling on
/// request.
pub struct RecordingRunner {
    store: Arc<MemoryStore>,
    failing: HashSet<String>,
    cancel_after: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl RecordingRunner {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            failing: HashSet::new(),
            cancel_after: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self, task: &str) -> Self {
        self.failing.insert(task.to_string());
        self
    }

    pub fn cancel_after(mut self, task: &str) -> Self {
        self.cancel_after = Some(task.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskRunner for RecordingRunner {
    async fn execute_task(&self, task: &PipelineTask, run_id: Uuid, _target_space: &str) -> bool {
        self.calls.lock().unwrap().push(task.name.clone());

        if self.cancel_after.as_deref() == Some(task.name.as_str()) {
            self.store
                .update_run_status(run_id, RunStatus::Cancelled)
                .await
                .unwrap();
        }

        !self.failing.contains(&task.name)
    }
}
