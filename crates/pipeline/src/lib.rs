//! Flight-plan approval pipeline.
//!
//! Holds submitted plans in the [`PendingRegistry`] until an operator decides
//! on them, then hands approved plans to the [`DispatchWorker`] for
//! transmission to a ground station.
//!
//! Everything outside the registry (artifact storage, compilation, the
//! ground-station link) is reached through the traits in [`collaborators`].

pub mod artifacts;
pub mod collaborators;
pub mod compiler;
pub mod decision;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod submission;

pub use decision::{Decision, DecisionHandler};
pub use dispatch::{DispatchJob, DispatchQueue, DispatchWorker};
pub use error::{DispatchError, PipelineError};
pub use registry::{PendingEntry, PendingRegistry};
pub use submission::SubmissionHandler;
