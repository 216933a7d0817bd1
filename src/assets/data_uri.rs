use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::errors::{AssetError, EngineError};

/// Decoded payload of a `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

#[must_use]
pub fn is_data_uri(uri: &str) -> bool {
    uri.starts_with("data:")
}

/// Decodes `data:[<mime>][;base64],<payload>`.
///
/// Non-base64 payloads are taken as raw bytes.
pub fn decode_data_uri(uri: &str) -> Result<DataUri, EngineError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| AssetError::InvalidDataUri("missing 'data:' prefix".to_owned()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AssetError::InvalidDataUri("missing ',' separator".to_owned()))?;

    let (mime, is_base64) = match header.strip_suffix(";base64") {
        Some(mime) => (mime, true),
        None => (header, false),
    };

    let data = if is_base64 {
        STANDARD.decode(payload.trim())?
    } else {
        payload.as_bytes().to_vec()
    };

    Ok(DataUri {
        mime_type: (!mime.is_empty()).then(|| mime.to_owned()),
        data,
    })
}
