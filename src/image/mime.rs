/// Sniff the content type from a file signature. Only the formats the
/// processor can decode are recognised.
pub fn detect_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        _ => {
            tracing::debug!(
                "Unrecognized image signature (first 4 bytes: {:02X?})",
                &bytes[..bytes.len().min(4)]
            );
            None
        }
    }
}
