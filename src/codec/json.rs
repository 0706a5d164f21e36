//! # JSON codec backed by `serde_json`.

use serde::{Serialize, de::DeserializeOwned};

use crate::codec::Codec;
use crate::error::CodecError;

/// Stateless JSON codec.
///
/// # Example
/// ```
/// use workvisor::{Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&vec![1u8, 2, 3]).unwrap();
/// assert_eq!(bytes, b"[1,2,3]");
///
/// let mut back: Vec<u8> = Vec::new();
/// codec.decode(&bytes, &mut back).unwrap();
/// assert_eq!(back, vec![1, 2, 3]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8], target: &mut T) -> Result<(), CodecError> {
        *target = serde_json::from_slice(bytes).map_err(|e| CodecError::Decode {
            error: e.to_string(),
        })?;
        Ok(())
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::Encode {
            error: e.to_string(),
        })
    }
}
