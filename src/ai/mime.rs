//! MIME and file-extension helpers for uploaded and generated images.

/// File extensions accepted for source uploads.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

pub fn extension_allowed(extension: &str) -> bool {
    ALLOWED_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str())
}

/// Maps a MIME type to the extension a staged file should carry.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    // Strip parameters such as "; charset=binary"
    let essence = mime.split(';').next().unwrap_or(mime).trim();
    match essence {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Sniffs the MIME type of raw image bytes from their magic numbers.
pub fn detect_image_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, 0x50, 0x4E, 0x47, ..] => "image/png",
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => "image/webp",
        _ => {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), falling back to image/png",
                &bytes[..bytes.len().min(4)]
            );
            "image/png"
        }
    }
}
