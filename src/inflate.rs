use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::{Error, Result};

/// Upper bound on decompressed output. Deflate amplifies; a small hostile
/// payload must not be allowed to unpack into an unbounded buffer.
pub const MAX_INFLATED_SIZE: usize = 64 * 1024 * 1024;

/// Inflate a zlib stream to raw bytes.
pub fn inflate_bytes(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut decoder = ZlibDecoder::new(data).take(MAX_INFLATED_SIZE as u64 + 1);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::DecompressionFailed(format!("zlib error: {e}")))?;

    if out.len() > MAX_INFLATED_SIZE {
        return Err(Error::PayloadTooLarge { len: out.len(), max: MAX_INFLATED_SIZE });
    }

    Ok(out)
}

/// Inflate a zlib stream and decode the result as UTF-8 text.
pub fn inflate(data: &[u8]) -> Result<String> {
    String::from_utf8(inflate_bytes(data)?)
        .map_err(|_| Error::DecompressionFailed("inflated data is not valid UTF-8".into()))
}

/// Inflate a zlib stream handed over as text.
///
/// Some firmwares pass the compressed bytes around hex-encoded; an
/// even-length all-hex-digit string is decoded as hex first. Anything else
/// is taken as raw byte values (Latin-1), so characters above U+00FF cannot
/// be part of a valid stream.
pub fn inflate_text(text: &str) -> Result<String> {
    let stripped = text.trim();
    let bytes = match decode_hex_text(stripped) {
        Some(bytes) => bytes,
        None => latin1_bytes(stripped).ok_or_else(|| {
            Error::DecompressionFailed("text contains characters outside Latin-1".into())
        })?,
    };
    inflate(&bytes)
}

/// Decode `text` as hex if it looks like a hex-encoded byte sequence
/// (non-empty, even length, hex digits only).
pub(crate) fn decode_hex_text(text: &str) -> Option<Vec<u8>> {
    let stripped = text.trim();
    if stripped.is_empty() || stripped.len() % 2 != 0 {
        return None;
    }
    if !stripped.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    hex::decode(stripped).ok()
}

/// Byte-preserving encoding of `text`: every char maps to its codepoint as
/// one byte. `None` if any char is above U+00FF.
pub(crate) fn latin1_bytes(text: &str) -> Option<Vec<u8>> {
    text.chars().map(|c| u8::try_from(c as u32).ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn deflate(text: &str) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_inflate_bytes() {
        let compressed = deflate("{\"width\":8}");
        assert_eq!(inflate(&compressed).unwrap(), "{\"width\":8}");
    }

    #[test]
    fn test_inflate_text_hex() {
        let compressed = deflate("hello maps");
        let hex_text = hex::encode(&compressed);
        assert_eq!(inflate_text(&hex_text).unwrap(), "hello maps");

        // Uppercase hex and surrounding whitespace are tolerated.
        let padded = format!("  {}\n", hex_text.to_uppercase());
        assert_eq!(inflate_text(&padded).unwrap(), "hello maps");
    }

    #[test]
    fn test_inflate_text_latin1() {
        let compressed = deflate("raw bytes");
        // A zlib stream never looks like hex (it starts with 0x78), so the
        // byte-preserving path is taken.
        let text: String = compressed.iter().map(|&b| b as char).collect();
        assert_eq!(inflate_text(&text).unwrap(), "raw bytes");
    }

    #[test]
    fn test_inflate_text_rejects_wide_chars() {
        assert!(matches!(
            inflate_text("snowman \u{2603}"),
            Err(Error::DecompressionFailed(_))
        ));
    }

    #[test]
    fn test_inflate_corrupt_stream() {
        assert!(matches!(
            inflate(&[0x78, 0x9C, 0xFF, 0xFF, 0xFF]),
            Err(Error::DecompressionFailed(_))
        ));
    }

    #[test]
    fn test_decode_hex_text_detection() {
        assert_eq!(decode_hex_text("abcd"), Some(vec![0xAB, 0xCD]));
        assert_eq!(decode_hex_text("abc"), None); // odd length
        assert_eq!(decode_hex_text("zzzz"), None); // not hex
        assert_eq!(decode_hex_text(""), None);
    }
}
