//! Error types used by the worker pool and its collaborators.
//!
//! This module defines:
//!
//! - [`RuntimeError`]: errors raised by the pool runtime itself (the only ones returned from `run`).
//! - [`BrokerError`]: subscription and publish failures reported by a [`Broker`](crate::Broker).
//! - [`CodecError`]: decode/encode failures reported by a [`Codec`](crate::Codec).
//! - [`JobError`]: failures raised by a [`Job`](crate::Job) execution.
//! - [`StageError`]: per-message pipeline failure, tagging which stage failed.
//!
//! All types provide `as_label` (stable snake_case) for logs/metrics. The
//! broker, codec and job errors also provide `as_message`, which becomes the `reason` of
//! stage-failure events.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the pool runtime.
///
/// These cross the [`Pool::run`](crate::Pool::run) boundary. Per-message failures never do.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The subscription stream could not be established; no worker was started.
    #[error("broker: {0}")]
    Subscription(#[source] BrokerError),

    /// Installing the OS signal listener failed.
    #[error("signal listener: {0}")]
    Signal(#[source] std::io::Error),

    /// Shutdown grace period was exceeded; remaining workers were aborted.
    #[error("shutdown timeout {grace:?} exceeded; stuck workers: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Ids of workers that were not observed as stopped in time.
        stuck: Vec<u8>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use workvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![2] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Subscription(_) => "runtime_subscription",
            RuntimeError::Signal(_) => "runtime_signal",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// # Errors produced by a broker.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// The inbound stream could not be established.
    #[error("subscribe failed: {error}")]
    Subscribe {
        /// The underlying error message.
        error: String,
    },

    /// Output bytes could not be delivered downstream.
    #[error("publish failed: {error}")]
    Publish {
        /// The underlying error message.
        error: String,
    },
}

impl BrokerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BrokerError::Subscribe { .. } => "broker_subscribe",
            BrokerError::Publish { .. } => "broker_publish",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BrokerError::Subscribe { error } => format!("subscribe: {error}"),
            BrokerError::Publish { error } => format!("publish: {error}"),
        }
    }
}

/// # Errors produced by a codec.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Payload bytes could not be decoded into the target value.
    #[error("decode failed: {error}")]
    Decode {
        /// The underlying error message.
        error: String,
    },

    /// A value could not be encoded into bytes.
    #[error("encode failed: {error}")]
    Encode {
        /// The underlying error message.
        error: String,
    },
}

impl CodecError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CodecError::Decode { .. } => "codec_decode",
            CodecError::Encode { .. } => "codec_encode",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            CodecError::Decode { error } => format!("decode: {error}"),
            CodecError::Encode { error } => format!("encode: {error}"),
        }
    }
}

/// # Errors produced by job execution.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// Job logic rejected or failed to process the input.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },
}

impl JobError {
    /// Shorthand for [`JobError::Fail`].
    ///
    /// # Example
    /// ```
    /// use workvisor::JobError;
    ///
    /// let err = JobError::fail("boom");
    /// assert_eq!(err.to_string(), "execution failed: boom");
    /// ```
    pub fn fail(error: impl Into<String>) -> Self {
        JobError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            JobError::Fail { .. } => "job_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            JobError::Fail { error } => format!("error: {error}"),
        }
    }
}

/// # Per-message pipeline failure.
///
/// Tags the stage that failed. Decode, execute and encode failures drop the
/// message without acknowledging it; a publish failure is reported but the
/// message is still acknowledged.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// Payload could not be decoded into the job input.
    #[error("decode {type_name}: {source}")]
    Decode {
        /// Type name of the decode target.
        type_name: &'static str,
        /// Codec failure.
        source: CodecError,
    },

    /// Job execution failed.
    #[error("execute: {0}")]
    Execute(#[source] JobError),

    /// Job output could not be encoded.
    #[error("encode {type_name}: {source}")]
    Encode {
        /// Type name of the job output.
        type_name: &'static str,
        /// Codec failure.
        source: CodecError,
    },

    /// Encoded output could not be published.
    #[error("publish: {0}")]
    Publish(#[source] BrokerError),
}

impl StageError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use workvisor::{JobError, StageError};
    ///
    /// let err = StageError::Execute(JobError::fail("boom"));
    /// assert_eq!(err.as_label(), "stage_execute");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StageError::Decode { .. } => "stage_decode",
            StageError::Execute(_) => "stage_execute",
            StageError::Encode { .. } => "stage_encode",
            StageError::Publish(_) => "stage_publish",
        }
    }

    /// Returns the type name attached to the failure, if any.
    pub fn type_name(&self) -> Option<&'static str> {
        match self {
            StageError::Decode { type_name, .. } | StageError::Encode { type_name, .. } => {
                Some(*type_name)
            }
            _ => None,
        }
    }

    /// Indicates whether the message is still acknowledged after this failure.
    ///
    /// Only [`StageError::Publish`] keeps the acknowledgement.
    pub fn acknowledges(&self) -> bool {
        matches!(self, StageError::Publish(_))
    }
}

/// Extracts a readable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_publish_failure_acknowledges() {
        let decode = StageError::Decode {
            type_name: "u32",
            source: CodecError::Decode {
                error: "bad".into(),
            },
        };
        let publish = StageError::Publish(BrokerError::Publish {
            error: "down".into(),
        });

        assert!(!decode.acknowledges());
        assert!(!StageError::Execute(JobError::fail("x")).acknowledges());
        assert!(publish.acknowledges());
    }

    #[test]
    fn test_type_name_only_on_codec_stages() {
        let encode = StageError::Encode {
            type_name: "alloc::string::String",
            source: CodecError::Encode {
                error: "bad".into(),
            },
        };
        assert_eq!(encode.type_name(), Some("alloc::string::String"));
        assert_eq!(StageError::Execute(JobError::fail("x")).type_name(), None);
    }

    #[test]
    fn test_subscription_error_display_carries_broker_prefix() {
        let err = RuntimeError::Subscription(BrokerError::Subscribe {
            error: "refused".into(),
        });
        assert_eq!(err.to_string(), "broker: subscribe failed: refused");
        assert_eq!(err.as_label(), "runtime_subscription");
    }
}
