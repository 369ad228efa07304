// Staged generation pipeline: render → generate → extract → validate, per stage.
// Pipelines are built once at startup and shared read-only; every run owns its context.
// All generation goes through the injected TextGenerator — never a concrete client.

pub mod builder;
pub mod cancel;
pub mod context;
pub mod error;
pub mod extract;
pub mod orchestrator;
pub mod schema;
pub mod stage;
pub mod template;

// Re-export the public API consumed by analysis and handlers.
pub use builder::Pipeline;
pub use context::PipelineContext;
pub use error::{FailureKind, PipelineError, StageFailure, WiringError};
pub use orchestrator::{Orchestrator, RunOptions, RunReport};
pub use schema::SchemaContract;
pub use stage::Stage;
