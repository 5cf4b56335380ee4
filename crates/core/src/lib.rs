// crates/core/src/lib.rs
pub mod capture;
pub mod chromium;
pub mod config;
pub mod job;
pub mod manager;
pub mod request;

pub use capture::*;
pub use chromium::*;
pub use config::*;
pub use job::{DeleteOutcome, JobSnapshot, JobStatus, ManagerStats, StatusCounts};
pub use manager::*;
pub use request::*;
