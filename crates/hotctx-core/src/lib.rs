//! Configuration and command orchestration for the hot context builder.

pub mod config;
pub mod pipeline;

pub use config::Config;
pub use pipeline::{Command, Outcome, Pipeline, PipelineError, PipelineState};
