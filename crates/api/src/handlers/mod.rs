//! Request handlers.
//!
//! Handlers authenticate the caller, delegate to the pipeline handlers held in
//! [`AppState`](crate::state::AppState), and map errors via
//! [`AppError`](crate::error::AppError).

pub mod scheduling;
