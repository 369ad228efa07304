// Resume analysis: stage prompts, pipeline wiring, typed artifacts, service, HTTP handlers.
// All generation goes through the pipeline orchestrator; nothing here calls an LLM directly.

pub mod artifacts;
pub mod handlers;
pub mod pipelines;
pub mod prompts;
pub mod service;
