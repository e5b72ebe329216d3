//! Pipeline model
//!
//! - `job` - Job and JobCommand
//! - `stage` - Stage and StageMode
//! - `graph` - Pipeline with stage dependencies and order resolution
//! - `error` - Construction and scheduling errors

pub mod error;
pub mod graph;
pub mod job;
pub mod stage;

pub use error::{PipelineError, StuckStage, UnsatisfiableDependencyError};
pub use graph::Pipeline;
pub use job::{Job, JobCommand};
pub use stage::{Stage, StageMode};
