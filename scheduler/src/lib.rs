pub mod coerce;
pub mod config;
pub mod graph;
pub mod logging;
pub mod orchestrator;
pub mod source;
pub mod statement;
pub mod task_executor;
pub mod trigger;
pub mod value;

pub static RUN_SUBJECT: &str = "pipeline.run";
pub static RUN_FINISHED_SUBJECT: &str = "pipeline.run.finished";
