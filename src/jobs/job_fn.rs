//! # Function-backed job (`JobFn`)
//!
//! [`JobFn`] wraps a closure `F: Fn(In) -> Fut`, producing a fresh future per
//! message. Input values are created with [`Default`].
//!
//! ## Concurrency semantics
//! - Every call to `execute` creates a **new** future that owns its input.
//! - The closure is shared by all workers (`Fn`, not `FnMut`); if shared state is
//!   needed, capture an `Arc<...>` explicitly.
//!
//! ## Example
//! ```rust
//! use workvisor::{JobError, JobFn};
//!
//! let job = JobFn::<String, String, _>::arc(|name: String| async move {
//!     if name.is_empty() {
//!         return Err(JobError::fail("empty name"));
//!     }
//!     Ok::<_, JobError>(format!("hello, {name}"))
//! });
//! # let _ = job;
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::JobError;
use crate::jobs::job::Job;

/// Function-backed job implementation.
pub struct JobFn<I, O, F> {
    f: F,
    _types: PhantomData<fn(I) -> O>,
}

impl<I, O, F> JobFn<I, O, F> {
    /// Creates a new function-backed job.
    ///
    /// Prefer [`JobFn::arc`] when the job goes straight into a pool.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _types: PhantomData,
        }
    }

    /// Creates the job and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<I, O, F, Fut> Job for JobFn<I, O, F>
where
    I: DeserializeOwned + Default + Send + 'static,
    O: Serialize + Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, JobError>> + Send + 'static,
{
    type In = I;
    type Out = O;

    fn new_in_message(&self) -> I {
        I::default()
    }

    async fn execute(&self, input: I) -> Result<O, JobError> {
        (self.f)(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_in_message_is_default() {
        let job = JobFn::new(|v: Vec<u8>| async move { Ok::<_, JobError>(v.len()) });
        assert!(job.new_in_message().is_empty());
        assert_eq!(job.execute(vec![1, 2, 3]).await, Ok(3));
    }

    #[tokio::test]
    async fn test_error_is_passed_through() {
        let job = JobFn::new(|_: u8| async move { Err::<u8, _>(JobError::fail("nope")) });
        assert_eq!(job.execute(7).await, Err(JobError::fail("nope")));
    }
}
