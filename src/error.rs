#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("decryption failed: check model key, device id and input map data")]
    DecryptionFailed,

    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("map payload is a string but not valid JSON: {0}")]
    MalformedPayload(String),

    #[error("unsupported map payload type: {0}")]
    UnsupportedInputType(&'static str),

    #[error("embedded map data is corrupt: {0}")]
    MapDataCorrupt(String),

    #[error("payload too large: {len} bytes (max {max})")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("pixel buffer too short: need {need} bytes, have {have}")]
    PixelBufferSize { need: usize, have: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
