//! # Job abstractions.
//!
//! This module provides the job-related types:
//! - [`Job`] - trait for a per-message transformation
//! - [`JobFn`] - closure-backed job implementation

mod job;
mod job_fn;

pub use job::Job;
pub use job_fn::JobFn;
