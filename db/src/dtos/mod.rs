mod connection_params;
mod data_source_kind;
mod field_mapping;
mod mapping_kind;
mod pipeline_run_event;
mod pipeline_run_payload;
mod pipeline_status;
mod run_status;

pub use connection_params::*;
pub use data_source_kind::*;
pub use field_mapping::*;
pub use mapping_kind::*;
pub use pipeline_run_event::*;
pub use pipeline_run_payload::*;
pub use pipeline_status::*;
pub use run_status::*;
