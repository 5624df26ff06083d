#![forbid(unsafe_code)]

pub mod agent;
pub mod approval;
pub mod common;
pub mod notification;
pub mod review;
pub mod script;
pub mod subrequest;

pub use common::{ContractViolation, MonotonicTimeNs, SchemaVersion, Validate};
