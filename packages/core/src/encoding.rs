//! Inline encoding of file content as `data:` URLs

use base64::{engine::general_purpose::STANDARD, Engine};

/// MIME type used when the environment reports none
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Encode `bytes` as `data:<mime>;base64,<payload>`
pub fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    let mime_type = if mime_type.is_empty() {
        DEFAULT_MIME_TYPE
    } else {
        mime_type
    };

    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}
