//! Record codec: LZ4 frame compression and deterministic JSON encoding.
//!
//! Every page and error body stored in a container goes through the same
//! lossless LZ4 frame transform. LZ4 keeps decompression cheap, which
//! matters because the rendering side decompresses every stored part on
//! every read.

use std::io::{Read, Write};

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while encoding or decoding part bodies.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("LZ4 frame error: {0}")]
    Lz4(#[from] lz4_flex::frame::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Compress bytes with the LZ4 frame format.
pub fn compress(bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = lz4_flex::frame::FrameEncoder::new(Vec::new());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

/// Decompress an LZ4 frame back to its original bytes.
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut decoder = lz4_flex::frame::FrameDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Encode a value as compact JSON bytes.
///
/// Map-typed fields in our models are `BTreeMap`s, so equal values always
/// encode to equal bytes. Error dedup relies on this.
pub fn json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_trip() {
        let original = b"{\"statuses\": []}".repeat(50);
        let packed = compress(&original).unwrap();
        assert_ne!(packed, original);
        assert_eq!(decompress(&packed).unwrap(), original);
    }

    #[test]
    fn test_empty_round_trip() {
        let packed = compress(b"").unwrap();
        assert_eq!(decompress(&packed).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_decompress_garbage_fails() {
        assert!(decompress(b"definitely not an lz4 frame").is_err());
    }

    #[test]
    fn test_json_bytes_compact() {
        let value = serde_json::json!({"id": 1});
        assert_eq!(json_bytes(&value).unwrap(), b"{\"id\":1}");
    }
}
