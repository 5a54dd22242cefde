//! MIME types for packaged assets.

/// Fallback for extensions missing from the table.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// MIME type for a file extension (without the dot, any case).
///
/// EPUB 2 content documents are always XHTML, so `.html` maps to
/// `application/xhtml+xml` as well.
pub fn mime_from_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "html" | "xhtml" => "application/xhtml+xml",
        "css" => "text/css",
        "txt" => "text/plain",
        "xml" => "text/xml",
        "js" => "application/javascript",

        "gif" => "image/gif",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "svg" => "image/svg+xml",

        "otf" => "application/x-font-otf",
        "ttf" => "application/x-font-ttf",

        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "mp4" => "audio/mp4",
        "m4v" => "video/mpeg4",
        "qt" => "video/quicktime",
        "webm" => "video/webm",

        _ => OCTET_STREAM,
    }
}

/// Media whose bytes are already compressed; deflating them again only
/// costs time.
pub fn is_precompressed_media(media_type: &str) -> bool {
    matches!(
        media_type,
        "image/png"
            | "image/jpeg"
            | "image/gif"
            | "audio/mpeg"
            | "audio/ogg"
            | "audio/mp4"
            | "video/mpeg4"
            | "video/quicktime"
            | "video/webm"
    )
}
