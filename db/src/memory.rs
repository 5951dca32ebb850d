//! In-process [`PipelineStore`] used by tests and embedders that do not need
//! durable run history.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::dtos::RunStatus;
use crate::entities::{
    DataSource, NewDataSource, NewPipeline, NewPipelineTask, Pipeline, PipelineRun, PipelineTask,
    PipelineTaskUpdate, PipelineUpdate,
};
use crate::store::{PipelineStore, Result, StoreError};

#[derive(Default)]
struct Tables {
    pipelines: Vec<Pipeline>,
    tasks: Vec<PipelineTask>,
    data_sources: Vec<DataSource>,
    runs: Vec<PipelineRun>,
}

/// Rows are kept in insertion order, which doubles as creation order.
///
/// Only pipeline references are checked; a task may name a data source that
/// does not exist.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

#[async_trait]
impl PipelineStore for MemoryStore {
    async fn get_pipeline(&self, id: Uuid) -> Result<Option<Pipeline>> {
        let tables = self.lock()?;
        Ok(tables.pipelines.iter().find(|p| p.id == id).cloned())
    }

    async fn list_pipelines(&self) -> Result<Vec<Pipeline>> {
        Ok(self.lock()?.pipelines.clone())
    }

    async fn create_pipeline(&self, pipeline: NewPipeline) -> Result<Pipeline> {
        let now = Utc::now();
        let pipeline = Pipeline {
            id: Uuid::new_v4(),
            name: pipeline.name,
            description: pipeline.description,
            target_space: pipeline.target_space,
            status: pipeline.status,
            owner_id: pipeline.owner_id,
            created_at: now,
            updated_at: now,
        };

        self.lock()?.pipelines.push(pipeline.clone());
        Ok(pipeline)
    }

    async fn update_pipeline(&self, id: Uuid, update: PipelineUpdate) -> Result<Option<Pipeline>> {
        let mut tables = self.lock()?;
        let Some(pipeline) = tables.pipelines.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            pipeline.name = name;
        }
        if let Some(description) = update.description {
            pipeline.description = Some(description);
        }
        if let Some(target_space) = update.target_space {
            pipeline.target_space = target_space;
        }
        if let Some(status) = update.status {
            pipeline.status = status;
        }
        pipeline.updated_at = Utc::now();

        Ok(Some(pipeline.clone()))
    }

    async fn delete_pipeline(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.lock()?;
        let before = tables.pipelines.len();
        tables.pipelines.retain(|p| p.id != id);

        if tables.pipelines.len() == before {
            return Ok(false);
        }

        tables.tasks.retain(|t| t.pipeline_id != id);
        tables.runs.retain(|r| r.pipeline_id != id);
        Ok(true)
    }

    async fn get_task(&self, id: Uuid) -> Result<Option<PipelineTask>> {
        let tables = self.lock()?;
        Ok(tables.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks(&self, pipeline_id: Uuid) -> Result<Vec<PipelineTask>> {
        let tables = self.lock()?;
        let mut tasks: Vec<_> = tables
            .tasks
            .iter()
            .filter(|t| t.pipeline_id == pipeline_id)
            .cloned()
            .collect();

        // Stable: equal orders stay in creation order.
        tasks.sort_by_key(|t| t.order);
        Ok(tasks)
    }

    async fn create_task(&self, task: NewPipelineTask) -> Result<PipelineTask> {
        let mut tables = self.lock()?;

        if !tables.pipelines.iter().any(|p| p.id == task.pipeline_id) {
            return Err(StoreError::MissingReference {
                entity: "pipeline",
                id: task.pipeline_id,
            });
        }

        let now = Utc::now();
        let task = PipelineTask {
            id: Uuid::new_v4(),
            pipeline_id: task.pipeline_id,
            name: task.name,
            order: task.order,
            data_source_id: task.data_source_id,
            source_entity: task.source_entity,
            filter_conditions: task.filter_conditions,
            mapping_kind: task.mapping_kind,
            target_label_or_type: task.target_label_or_type,
            field_mappings: task.field_mappings,
            enabled: task.enabled,
            created_at: now,
            updated_at: now,
        };

        tables.tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task(
        &self,
        id: Uuid,
        update: PipelineTaskUpdate,
    ) -> Result<Option<PipelineTask>> {
        let mut tables = self.lock()?;
        let Some(task) = tables.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            task.name = name;
        }
        if let Some(order) = update.order {
            task.order = order;
        }
        if let Some(data_source_id) = update.data_source_id {
            task.data_source_id = data_source_id;
        }
        if let Some(source_entity) = update.source_entity {
            task.source_entity = source_entity;
        }
        if let Some(filter_conditions) = update.filter_conditions {
            task.filter_conditions = Some(filter_conditions);
        }
        if let Some(mapping_kind) = update.mapping_kind {
            task.mapping_kind = mapping_kind;
        }
        if let Some(target) = update.target_label_or_type {
            task.target_label_or_type = target;
        }
        if let Some(field_mappings) = update.field_mappings {
            task.field_mappings = field_mappings;
        }
        if let Some(enabled) = update.enabled {
            task.enabled = enabled;
        }
        task.updated_at = Utc::now();

        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.lock()?;
        let before = tables.tasks.len();
        tables.tasks.retain(|t| t.id != id);
        Ok(tables.tasks.len() != before)
    }

    async fn get_data_source(&self, id: Uuid) -> Result<Option<DataSource>> {
        let tables = self.lock()?;
        Ok(tables.data_sources.iter().find(|d| d.id == id).cloned())
    }

    async fn create_data_source(&self, data_source: NewDataSource) -> Result<DataSource> {
        let now = Utc::now();
        let data_source = DataSource {
            id: Uuid::new_v4(),
            name: data_source.name,
            kind: data_source.kind,
            connection_params: data_source.connection_params,
            created_at: now,
            updated_at: now,
        };

        self.lock()?.data_sources.push(data_source.clone());
        Ok(data_source)
    }

    async fn delete_data_source(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.lock()?;
        let before = tables.data_sources.len();
        tables.data_sources.retain(|d| d.id != id);
        Ok(tables.data_sources.len() != before)
    }

    async fn create_run(
        &self,
        pipeline_id: Uuid,
        triggered_by: Option<Uuid>,
    ) -> Result<PipelineRun> {
        let mut tables = self.lock()?;

        if !tables.pipelines.iter().any(|p| p.id == pipeline_id) {
            return Err(StoreError::MissingReference {
                entity: "pipeline",
                id: pipeline_id,
            });
        }

        let now = Utc::now();
        let run = PipelineRun {
            id: Uuid::new_v4(),
            pipeline_id,
            triggered_by,
            status: RunStatus::Pending,
            start_time: None,
            end_time: None,
            created_at: now,
            updated_at: now,
        };

        tables.runs.push(run.clone());
        Ok(run)
    }

    async fn get_run(&self, id: Uuid) -> Result<Option<PipelineRun>> {
        let tables = self.lock()?;
        Ok(tables.runs.iter().find(|r| r.id == id).cloned())
    }

    async fn list_runs(&self, pipeline_id: Option<Uuid>) -> Result<Vec<PipelineRun>> {
        let tables = self.lock()?;
        Ok(tables
            .runs
            .iter()
            .rev()
            .filter(|r| pipeline_id.map_or(true, |id| r.pipeline_id == id))
            .cloned()
            .collect())
    }

    async fn update_run_status(&self, id: Uuid, status: RunStatus) -> Result<Option<PipelineRun>> {
        let mut tables = self.lock()?;
        let Some(run) = tables.runs.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };

        if !run.status.can_become(status) {
            return Ok(Some(run.clone()));
        }

        let now = Utc::now();
        run.status = status;
        run.updated_at = now;

        if status == RunStatus::Running && run.start_time.is_none() {
            run.start_time = Some(now);
        }
        if status.is_terminal() {
            run.end_time = Some(now);
        }

        Ok(Some(run.clone()))
    }

    async fn delete_run(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.lock()?;
        let before = tables.runs.len();
        tables.runs.retain(|r| r.id != id);
        Ok(tables.runs.len() != before)
    }
}
