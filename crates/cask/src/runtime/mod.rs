//! Host-side container lifecycle: parameter channel, process launcher,
//! namespace synchronization, and the run orchestrator.

pub mod launcher;
pub mod orchestrator;
pub mod spec;
pub mod sync;

pub use orchestrator::RunPhase;
pub use spec::ContainerSpec;
pub use sync::RetryPolicy;
