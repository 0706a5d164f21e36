//! # Job abstraction.
//!
//! A [`Job`] declares the type it decodes messages into and how to turn one
//! decoded input into one output. The pool shares a single job across all
//! workers, so implementations must be safe for concurrent use.

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::JobError;

/// # Per-message transformation.
///
/// - [`new_in_message`](Job::new_in_message) returns a **fresh** input value on
///   every call; the codec decodes into it in place.
/// - [`execute`](Job::execute) maps one decoded input to one output.
///
/// The pool never cancels an `execute` call in progress. A job that must honor
/// shutdown deadlines has to bound its own latency.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use workvisor::{Job, JobError};
///
/// struct Double;
///
/// #[async_trait]
/// impl Job for Double {
///     type In = u64;
///     type Out = u64;
///
///     fn new_in_message(&self) -> u64 { 0 }
///
///     async fn execute(&self, input: u64) -> Result<u64, JobError> {
///         input.checked_mul(2).ok_or_else(|| JobError::fail("overflow"))
///     }
/// }
/// ```
#[async_trait]
pub trait Job: Send + Sync + 'static {
    /// Decode target.
    type In: DeserializeOwned + Send + 'static;
    /// Execution result, handed to the codec for encoding.
    type Out: Serialize + Send + 'static;

    /// Returns a fresh, empty input value.
    fn new_in_message(&self) -> Self::In;

    /// Transforms one decoded input into an output.
    async fn execute(&self, input: Self::In) -> Result<Self::Out, JobError>;
}
