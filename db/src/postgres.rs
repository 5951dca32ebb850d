//! PostgreSQL implementation of [`PipelineStore`].

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tracing::debug;
use uuid::Uuid;

use crate::dtos::RunStatus;
use crate::entities::{
    DataSource, NewDataSource, NewPipeline, NewPipelineTask, Pipeline, PipelineRun, PipelineTask,
    PipelineTaskUpdate, PipelineUpdate,
};
use crate::store::{PipelineStore, Result};

#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl PipelineStore for PgStore {
    async fn get_pipeline(&self, id: Uuid) -> Result<Option<Pipeline>> {
        let pipeline = sqlx::query_as::<Postgres, Pipeline>("SELECT * FROM pipelines WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(pipeline)
    }

    async fn list_pipelines(&self) -> Result<Vec<Pipeline>> {
        let pipelines =
            sqlx::query_as::<Postgres, Pipeline>("SELECT * FROM pipelines ORDER BY created_at")
                .fetch_all(&self.pool)
                .await?;

        Ok(pipelines)
    }

    async fn create_pipeline(&self, pipeline: NewPipeline) -> Result<Pipeline> {
        let pipeline = sqlx::query_as::<Postgres, Pipeline>(
            r#"
            INSERT INTO
                pipelines (name, description, target_space, status, owner_id)
            VALUES
                ($1, $2, $3, $4, $5)
            RETURNING
                *
            "#,
        )
        .bind(pipeline.name)
        .bind(pipeline.description)
        .bind(pipeline.target_space)
        .bind(pipeline.status)
        .bind(pipeline.owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(pipeline)
    }

    async fn update_pipeline(&self, id: Uuid, update: PipelineUpdate) -> Result<Option<Pipeline>> {
        let pipeline = sqlx::query_as::<Postgres, Pipeline>(
            r#"
            UPDATE
                pipelines
            SET
                name = COALESCE($1, name),
                description = COALESCE($2, description),
                target_space = COALESCE($3, target_space),
                status = COALESCE($4, status),
                updated_at = CURRENT_TIMESTAMP
            WHERE
                id = $5
            RETURNING
                *
            "#,
        )
        .bind(update.name)
        .bind(update.description)
        .bind(update.target_space)
        .bind(update.status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(pipeline)
    }

    async fn delete_pipeline(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM pipelines WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_task(&self, id: Uuid) -> Result<Option<PipelineTask>> {
        let task =
            sqlx::query_as::<Postgres, PipelineTask>("SELECT * FROM pipeline_tasks WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(task)
    }

    async fn list_tasks(&self, pipeline_id: Uuid) -> Result<Vec<PipelineTask>> {
        let tasks = sqlx::query_as::<Postgres, PipelineTask>(
            r#"
            SELECT
                *
            FROM
                pipeline_tasks
            WHERE
                pipeline_id = $1
            ORDER BY
                task_order, created_at
            "#,
        )
        .bind(pipeline_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    async fn create_task(&self, task: NewPipelineTask) -> Result<PipelineTask> {
        let task = sqlx::query_as::<Postgres, PipelineTask>(
            r#"
            INSERT INTO
                pipeline_tasks (
                    pipeline_id, name, task_order, data_source_id, source_entity,
                    filter_conditions, mapping_kind, target_label_or_type, field_mappings, enabled
                )
            VALUES
                ($1, $2, $3, $4, $5, $6, $7, $8, $9::json, $10)
            RETURNING
                *
            "#,
        )
        .bind(task.pipeline_id)
        .bind(task.name)
        .bind(task.order)
        .bind(task.data_source_id)
        .bind(task.source_entity)
        .bind(task.filter_conditions)
        .bind(task.mapping_kind)
        .bind(task.target_label_or_type)
        .bind(task.field_mappings.to_string())
        .bind(task.enabled)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    async fn update_task(
        &self,
        id: Uuid,
        update: PipelineTaskUpdate,
    ) -> Result<Option<PipelineTask>> {
        let task = sqlx::query_as::<Postgres, PipelineTask>(
            r#"
            UPDATE
                pipeline_tasks
            SET
                name = COALESCE($1, name),
                task_order = COALESCE($2, task_order),
                data_source_id = COALESCE($3, data_source_id),
                source_entity = COALESCE($4, source_entity),
                filter_conditions = COALESCE($5, filter_conditions),
                mapping_kind = COALESCE($6, mapping_kind),
                target_label_or_type = COALESCE($7, target_label_or_type),
                field_mappings = COALESCE($8::json, field_mappings),
                enabled = COALESCE($9, enabled),
                updated_at = CURRENT_TIMESTAMP
            WHERE
                id = $10
            RETURNING
                *
            "#,
        )
        .bind(update.name)
        .bind(update.order)
        .bind(update.data_source_id)
        .bind(update.source_entity)
        .bind(update.filter_conditions)
        .bind(update.mapping_kind)
        .bind(update.target_label_or_type)
        .bind(update.field_mappings.map(|mappings| mappings.to_string()))
        .bind(update.enabled)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn delete_task(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM pipeline_tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_data_source(&self, id: Uuid) -> Result<Option<DataSource>> {
        let data_source =
            sqlx::query_as::<Postgres, DataSource>("SELECT * FROM data_sources WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(data_source)
    }

    async fn create_data_source(&self, data_source: NewDataSource) -> Result<DataSource> {
        let data_source = sqlx::query_as::<Postgres, DataSource>(
            r#"
            INSERT INTO
                data_sources (name, kind, connection_params)
            VALUES
                ($1, $2, $3::json)
            RETURNING
                *
            "#,
        )
        .bind(data_source.name)
        .bind(data_source.kind)
        .bind(data_source.connection_params.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(data_source)
    }

    async fn delete_data_source(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM data_sources WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_run(
        &self,
        pipeline_id: Uuid,
        triggered_by: Option<Uuid>,
    ) -> Result<PipelineRun> {
        let run = sqlx::query_as::<Postgres, PipelineRun>(
            r#"
            INSERT INTO
                pipeline_runs (pipeline_id, triggered_by, status)
            VALUES
                ($1, $2, $3)
            RETURNING
                *
            "#,
        )
        .bind(pipeline_id)
        .bind(triggered_by)
        .bind(RunStatus::Pending)
        .fetch_one(&self.pool)
        .await?;

        Ok(run)
    }

    async fn get_run(&self, id: Uuid) -> Result<Option<PipelineRun>> {
        let run =
            sqlx::query_as::<Postgres, PipelineRun>("SELECT * FROM pipeline_runs WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(run)
    }

    async fn list_runs(&self, pipeline_id: Option<Uuid>) -> Result<Vec<PipelineRun>> {
        let runs = sqlx::query_as::<Postgres, PipelineRun>(
            r#"
            SELECT
                *
            FROM
                pipeline_runs
            WHERE
                $1::uuid IS NULL OR pipeline_id = $1
            ORDER BY
                created_at DESC
            "#,
        )
        .bind(pipeline_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(runs)
    }

    async fn update_run_status(&self, id: Uuid, status: RunStatus) -> Result<Option<PipelineRun>> {
        let run = sqlx::query_as::<Postgres, PipelineRun>(
            r#"
            UPDATE
                pipeline_runs
            SET
                status = $1,
                start_time = CASE WHEN $2 THEN COALESCE(start_time, CURRENT_TIMESTAMP) ELSE start_time END,
                end_time = CASE WHEN $3 THEN CURRENT_TIMESTAMP ELSE end_time END,
                updated_at = CURRENT_TIMESTAMP
            WHERE
                id = $4
                AND (status = 'pending' OR (status = 'running' AND $3))
            RETURNING
                *
            "#,
        )
        .bind(status)
        .bind(status == RunStatus::Running)
        .bind(status.is_terminal())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match run {
            Some(run) => {
                debug!(run_id = %id, "Run status set to {status}");
                Ok(Some(run))
            }
            // Either the run is unknown or the transition was refused.
            None => self.get_run(id).await,
        }
    }

    async fn delete_run(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM pipeline_runs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
