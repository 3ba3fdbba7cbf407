use crate::models::ImageMime;
use image::ImageFormat;

/// Guess the raster format from the leading bytes of a decoded payload.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<ImageMime> {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => Some(ImageMime::Png),
        Ok(ImageFormat::Jpeg) => Some(ImageMime::Jpeg),
        Ok(ImageFormat::Gif) => Some(ImageMime::Gif),
        Ok(ImageFormat::WebP) => Some(ImageMime::Webp),
        _ => None,
    }
}

/// Log when the declared format disagrees with the bytes. Never rejects.
pub fn warn_on_mismatch(declared: ImageMime, bytes: &[u8]) {
    match sniff_image_mime(bytes) {
        Some(sniffed) if sniffed == declared => {}
        Some(sniffed) => tracing::warn!(
            "Declared image format {:?} but payload looks like {:?}",
            declared,
            sniffed
        ),
        None => tracing::warn!(
            "Unrecognized image signature for declared {:?} (first 4 bytes: {:02X?})",
            declared,
            &bytes[..bytes.len().min(4)]
        ),
    }
}
