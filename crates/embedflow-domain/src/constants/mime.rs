//! MIME type classification for status queries.

/// Content types recognized as unprocessed images.
pub const IMAGE_FILE_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/tiff",
];

/// Content type of an image that has been processed to base64 text.
pub const PROCESSED_IMAGE_CONTENT_TYPE: &str = "text/plain";

/// Returns `true` if the content type names an unprocessed image.
#[must_use]
pub fn is_image_mime(content_type: &str) -> bool {
    IMAGE_FILE_TYPES.contains(&content_type)
}
