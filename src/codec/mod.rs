//! # Byte-level serialization.
//!
//! [`Codec`] converts between payload bytes and typed values. The pool holds one
//! codec shared by all workers, so implementations must be safe for concurrent
//! use (they are typically stateless).
//!
//! ## Contents
//! - [`Codec`] encode/decode contract
//! - [`JsonCodec`] `serde_json` implementation (feature `json`, on by default)

#[cfg(feature = "json")]
mod json;

#[cfg(feature = "json")]
pub use json::JsonCodec;

use serde::{Serialize, de::DeserializeOwned};

use crate::error::CodecError;

/// Encode/decode contract for arbitrary serde types.
pub trait Codec: Send + Sync + 'static {
    /// Fills `target` from `bytes`.
    ///
    /// Serde-based codecs replace `target` wholesale, so the value returned by
    /// [`Job::new_in_message`](crate::Job::new_in_message) only fixes the type.
    /// Fields missing from the payload fail the decode unless the input type
    /// marks them `#[serde(default)]` (or `Option`).
    ///
    /// Fails with [`CodecError::Decode`] on malformed input; `target` is left
    /// unspecified in that case.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8], target: &mut T) -> Result<(), CodecError>;

    /// Encodes `value` into bytes.
    ///
    /// Fails with [`CodecError::Encode`].
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError>;
}
