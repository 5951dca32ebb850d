mod common;

use std::sync::Arc;

use common::{pipeline, task, RecordingRunner};
use db::dtos::{PipelineStatus, RunStatus};
use db::{MemoryStore, PipelineStore};
use scheduler::orchestrator::RunOrchestrator;
use scheduler::trigger::cancel_run;
use uuid::Uuid;

fn orchestrator(store: &Arc<MemoryStore>, runner: &Arc<RecordingRunner>) -> RunOrchestrator {
    RunOrchestrator::new(store.clone(), runner.clone())
}

#[tokio::test]
async fn pipeline_without_enabled_tasks_succeeds_immediately() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(&store, PipelineStatus::Active).await;
    task(&store, pipeline.id, "disabled", 1, false).await;
    let run = store.create_run(pipeline.id, None).await.unwrap();

    let runner = Arc::new(RecordingRunner::new(store.clone()));
    let status = orchestrator(&store, &runner)
        .execute_run(pipeline.id, run.id)
        .await;

    assert_eq!(status, RunStatus::Success);
    assert!(runner.calls().is_empty());

    let run = store.get_run(run.id).await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Success);
    assert!(run.start_time.is_some());
    assert!(run.end_time.is_some());
}

#[tokio::test]
async fn tasks_run_by_order_then_creation() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(&store, PipelineStatus::Active).await;
    task(&store, pipeline.id, "edges", 2, true).await;
    task(&store, pipeline.id, "people", 1, true).await;
    task(&store, pipeline.id, "companies", 1, true).await;
    let run = store.create_run(pipeline.id, None).await.unwrap();

    let runner = Arc::new(RecordingRunner::new(store.clone()));
    let status = orchestrator(&store, &runner)
        .execute_run(pipeline.id, run.id)
        .await;

    assert_eq!(status, RunStatus::Success);
    assert_eq!(runner.calls(), ["people", "companies", "edges"]);
}

#[tokio::test]
async fn first_failed_task_aborts_the_run() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(&store, PipelineStatus::Active).await;
    task(&store, pipeline.id, "first", 1, true).await;
    task(&store, pipeline.id, "second", 2, true).await;
    task(&store, pipeline.id, "third", 3, true).await;
    let run = store.create_run(pipeline.id, None).await.unwrap();

    let runner = Arc::new(RecordingRunner::new(store.clone()).failing("second"));
    let status = orchestrator(&store, &runner)
        .execute_run(pipeline.id, run.id)
        .await;

    assert_eq!(status, RunStatus::Failed);
    assert_eq!(runner.calls(), ["first", "second"]);

    let run = store.get_run(run.id).await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.end_time.is_some());
}

#[tokio::test]
async fn cancellation_is_observed_at_the_next_task() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(&store, PipelineStatus::Active).await;
    task(&store, pipeline.id, "first", 1, true).await;
    task(&store, pipeline.id, "second", 2, true).await;
    let run = store.create_run(pipeline.id, None).await.unwrap();

    let runner = Arc::new(RecordingRunner::new(store.clone()).cancel_after("first"));
    let status = orchestrator(&store, &runner)
        .execute_run(pipeline.id, run.id)
        .await;

    assert_eq!(status, RunStatus::Cancelled);
    assert_eq!(runner.calls(), ["first"]);

    let run = store.get_run(run.id).await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Cancelled);
    assert!(run.end_time.is_some());
}

#[tokio::test]
async fn cancellation_during_the_last_task_overrides_success() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(&store, PipelineStatus::Active).await;
    task(&store, pipeline.id, "only", 1, true).await;
    let run = store.create_run(pipeline.id, None).await.unwrap();

    let runner = Arc::new(RecordingRunner::new(store.clone()).cancel_after("only"));
    let status = orchestrator(&store, &runner)
        .execute_run(pipeline.id, run.id)
        .await;

    assert_eq!(status, RunStatus::Cancelled);
    assert_eq!(runner.calls(), ["only"]);
}

#[tokio::test]
async fn run_cancelled_while_pending_never_starts() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(&store, PipelineStatus::Active).await;
    task(&store, pipeline.id, "only", 1, true).await;
    let run = store.create_run(pipeline.id, None).await.unwrap();

    let runner = Arc::new(RecordingRunner::new(store.clone()));
    let orchestrator = orchestrator(&store, &runner);
    cancel_run(&orchestrator, run.id).await.unwrap();

    let status = orchestrator.execute_run(pipeline.id, run.id).await;

    assert_eq!(status, RunStatus::Cancelled);
    assert!(runner.calls().is_empty());

    let run = store.get_run(run.id).await.unwrap().unwrap();
    assert!(run.start_time.is_none());
    assert!(run.end_time.is_some());
}

#[tokio::test]
async fn unknown_pipeline_fails_the_run() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(&store, PipelineStatus::Active).await;
    task(&store, pipeline.id, "only", 1, true).await;
    let run = store.create_run(pipeline.id, None).await.unwrap();

    let runner = Arc::new(RecordingRunner::new(store.clone()));
    let status = orchestrator(&store, &runner)
        .execute_run(Uuid::new_v4(), run.id)
        .await;

    assert_eq!(status, RunStatus::Failed);
    assert!(runner.calls().is_empty());

    let run = store.get_run(run.id).await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.end_time.is_some());
}

#[tokio::test]
async fn unknown_run_reports_failure() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(&store, PipelineStatus::Active).await;

    let runner = Arc::new(RecordingRunner::new(store.clone()));
    let status = orchestrator(&store, &runner)
        .execute_run(pipeline.id, Uuid::new_v4())
        .await;

    assert_eq!(status, RunStatus::Failed);
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn finished_runs_are_not_executed_again() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(&store, PipelineStatus::Active).await;
    task(&store, pipeline.id, "only", 1, true).await;

    let runner = Arc::new(RecordingRunner::new(store.clone()).failing("only"));
    let orchestrator = orchestrator(&store, &runner);

    let run = store.create_run(pipeline.id, None).await.unwrap();
    assert_eq!(
        orchestrator.execute_run(pipeline.id, run.id).await,
        RunStatus::Failed
    );
    let finished = store.get_run(run.id).await.unwrap().unwrap();

    // Redelivery of the same run.
    assert_eq!(
        orchestrator.execute_run(pipeline.id, run.id).await,
        RunStatus::Failed
    );
    assert_eq!(runner.calls(), ["only"]);

    let replayed = store.get_run(run.id).await.unwrap().unwrap();
    assert_eq!(replayed.start_time, finished.start_time);
    assert_eq!(replayed.end_time, finished.end_time);
}

#[tokio::test]
async fn running_runs_are_left_to_their_owner() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(&store, PipelineStatus::Active).await;
    task(&store, pipeline.id, "only", 1, true).await;
    let run = store.create_run(pipeline.id, None).await.unwrap();
    store
        .update_run_status(run.id, RunStatus::Running)
        .await
        .unwrap();

    let runner = Arc::new(RecordingRunner::new(store.clone()));
    let status = orchestrator(&store, &runner)
        .execute_run(pipeline.id, run.id)
        .await;

    assert_eq!(status, RunStatus::Running);
    assert!(runner.calls().is_empty());

    let run = store.get_run(run.id).await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Running);
    assert!(run.end_time.is_none());
}

#[tokio::test]
async fn cancelled_run_is_not_failed_by_a_later_task_failure() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(&store, PipelineStatus::Active).await;
    task(&store, pipeline.id, "only", 1, true).await;
    let run = store.create_run(pipeline.id, None).await.unwrap();

    let runner = Arc::new(
        RecordingRunner::new(store.clone())
            .cancel_after("only")
            .failing("only"),
    );
    let status = orchestrator(&store, &runner)
        .execute_run(pipeline.id, run.id)
        .await;

    assert_eq!(status, RunStatus::Cancelled);
    let run = store.get_run(run.id).await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Cancelled);
}
