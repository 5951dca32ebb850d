use std::sync::Arc;

use db::dtos::{PipelineRunFinished, PipelineRunPayload};
use db::{PgStore, PipelineStore, MIGRATOR};
use dotenvy::dotenv;
use futures::StreamExt;
use scheduler::config::Config;
use scheduler::graph::GatewayPool;
use scheduler::orchestrator::RunOrchestrator;
use scheduler::source::SqlSourceConnector;
use scheduler::task_executor::TaskExecutor;
use scheduler::trigger::trigger_run;
use scheduler::{logging, RUN_FINISHED_SUBJECT, RUN_SUBJECT};
use sqlx::postgres::PgPoolOptions;
use tokio::signal::ctrl_c;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> Result<(), async_nats::Error> {
    dotenv().ok();

    let config = Config::from_env()?;
    logging::init(config.loki_url.as_deref())?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    if config.run_migrations {
        MIGRATOR.run(&pool).await?;
        info!("Database migrations applied");
    }

    let store: Arc<dyn PipelineStore> = Arc::new(PgStore::new(pool));

    let graph = Arc::new(GatewayPool::new(config.graph.clone()));
    graph.init().await?;

    let executor = Arc::new(TaskExecutor::new(
        Arc::clone(&store),
        Arc::new(SqlSourceConnector),
        graph.clone(),
    ));
    let orchestrator = Arc::new(RunOrchestrator::new(store, executor));

    let nats_client = async_nats::connect(config.nats_url.as_str()).await?;
    let mut run_subscriber = nats_client.subscribe(RUN_SUBJECT).await?;
    info!("Waiting for runs on {RUN_SUBJECT}");

    let consumer = tokio::spawn(async move {
        while let Some(message) = run_subscriber.next().await {
            let payload = match serde_json::from_slice::<PipelineRunPayload>(&message.payload) {
                Ok(payload) => payload,
                Err(error) => {
                    error!("Failed to deserialize message payload: {error:?}");
                    continue;
                }
            };

            let orchestrator = Arc::clone(&orchestrator);
            let nats_client = nats_client.clone();

            tokio::spawn(async move {
                let pipeline_id = payload.pipeline_id;

                let (run_id, status) = match payload.run_id {
                    Some(run_id) => (run_id, orchestrator.execute_run(pipeline_id, run_id).await),
                    None => {
                        let triggered =
                            match trigger_run(&orchestrator, pipeline_id, payload.triggered_by)
                                .await
                            {
                                Ok(triggered) => triggered,
                                Err(error) => {
                                    error!("Failed to trigger run for pipeline {pipeline_id}: {error}");
                                    return;
                                }
                            };

                        match triggered.handle.await {
                            Ok(status) => (triggered.run.id, status),
                            Err(error) => {
                                error!("Run {} panicked: {error:?}", triggered.run.id);
                                return;
                            }
                        }
                    }
                };

                // A redelivered message for a run still in flight elsewhere.
                if !status.is_terminal() {
                    return;
                }

                let event = PipelineRunFinished {
                    run_id,
                    pipeline_id,
                    status,
                };

                let payload = match serde_json::to_vec(&event) {
                    Ok(payload) => payload,
                    Err(error) => {
                        error!("Failed to serialize run finished event: {error:?}");
                        return;
                    }
                };

                if let Err(error) = nats_client
                    .publish(RUN_FINISHED_SUBJECT, payload.into())
                    .await
                {
                    error!("Failed to publish run finished event: {error:?}");
                } else {
                    debug!("Published {RUN_FINISHED_SUBJECT} for run {run_id}");
                }
            });
        }
    });

    ctrl_c().await?;

    consumer.abort();
    graph.shutdown();

    Ok(())
}
