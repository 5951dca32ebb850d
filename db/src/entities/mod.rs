mod data_source;
mod pipeline;
mod pipeline_run;
mod pipeline_task;

pub use data_source::*;
pub use pipeline::*;
pub use pipeline_run::*;
pub use pipeline_task::*;
