//! Artifact normalization.
//!
//! Turns the raw bytes of a fetched artifact into an [`ArtifactPayload`].
//! Still images are decoded and re-encoded into the requested format;
//! video-like files are passed through byte-for-byte.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::DynamicImage;

use crate::artifact::{mime_for_extension, ArtifactKind, ArtifactRef};
use crate::output::{format_file_size, ArtifactPayload, MediaType};
use crate::settings::{ImageOptions, OutputFormat};

/// Errors from decoding or re-encoding a still image.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode image as {format}: {source}")]
    Encode {
        format: &'static str,
        #[source]
        source: image::ImageError,
    },
}

/// Normalize one fetched artifact according to its inferred kind.
pub fn normalize(
    artifact: &ArtifactRef,
    bytes: &[u8],
    options: &ImageOptions,
) -> Result<ArtifactPayload, NormalizeError> {
    match artifact.kind() {
        ArtifactKind::Image => transcode_image(artifact, bytes, options),
        ArtifactKind::VideoLike(ext) => Ok(pass_through(artifact, bytes, ext)),
    }
}

/// Decode a still image and re-encode it as JPEG or PNG.
pub fn transcode_image(
    artifact: &ArtifactRef,
    bytes: &[u8],
    options: &ImageOptions,
) -> Result<ArtifactPayload, NormalizeError> {
    let image = image::load_from_memory(bytes).map_err(NormalizeError::Decode)?;
    let encoded = encode(&image, options)?;

    Ok(ArtifactPayload {
        filename: artifact.filename.clone(),
        category: artifact.category.clone(),
        subfolder: artifact.subfolder.clone(),
        data: BASE64.encode(&encoded),
        media_type: MediaType::Image,
        file_size: format_file_size(encoded.len()),
        file_extension: options.format.as_str().to_string(),
        mime_type: options.format.mime_type(),
    })
}

/// Wrap video/animation bytes unchanged, deriving the MIME type from `ext`.
pub fn pass_through(artifact: &ArtifactRef, bytes: &[u8], ext: String) -> ArtifactPayload {
    let mime = mime_for_extension(&ext);

    ArtifactPayload {
        filename: artifact.filename.clone(),
        category: artifact.category.clone(),
        subfolder: artifact.subfolder.clone(),
        data: BASE64.encode(bytes),
        media_type: MediaType::from_mime(mime),
        file_size: format_file_size(bytes.len()),
        file_extension: ext,
        mime_type: mime.to_string(),
    }
}

fn encode(image: &DynamicImage, options: &ImageOptions) -> Result<Vec<u8>, NormalizeError> {
    let mut buf = Vec::new();
    let format = options.format;

    let result = match format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut buf, options.jpeg_quality);
            rgb.write_with_encoder(encoder)
        }
        OutputFormat::Png => image.write_with_encoder(PngEncoder::new(&mut buf)),
    };

    result.map_err(|source| NormalizeError::Encode {
        format: format.as_str(),
        source,
    })?;
    Ok(buf)
}
