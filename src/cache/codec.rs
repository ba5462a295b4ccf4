//! The one place cached values are turned into bytes and back.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CodecError {
    #[error("Cache value encode failed: {0}")]
    Encode(String),

    #[error("Cache value decode failed: {0}")]
    Decode(String),
}

/// Encode/decode pair used for every cache value.
///
/// The cache itself only ever sees bytes, so swapping the format means
/// swapping the codec handed to the coordinator.
pub trait CacheCodec: Send + Sync + 'static {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

/// JSON values, as the storefront has always cached them.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl CacheCodec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LatLong;

    #[test]
    fn test_garbage_is_a_decode_error() {
        let err = JsonCodec.decode::<LatLong>(b"not json").unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }

    #[test]
    fn test_floats_survive_exactly() {
        let point = LatLong::new(51.500_123_456_789, -0.123_987_654_321);
        let bytes = JsonCodec.encode(&point).unwrap();
        assert_eq!(JsonCodec.decode::<LatLong>(&bytes).unwrap(), point);
    }
}
