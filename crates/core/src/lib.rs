//! Uplink domain types shared by the pipeline and API crates.
//!
//! Zero internal dependencies: everything here is plain data, validation,
//! and vocabulary constants.

pub mod audit;
pub mod error;
pub mod flight_plan;
pub mod frame;
pub mod hashing;
pub mod types;
