use super::{MetadataStripper, StripError};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// Re-encodes pixel data only. EXIF, XMP, ICC and text chunks are not carried over.
#[derive(Debug, Clone, Copy)]
pub struct ImageStripper {
    pub jpeg_quality: u8,
}

impl Default for ImageStripper {
    fn default() -> Self {
        Self { jpeg_quality: 95 }
    }
}

impl MetadataStripper for ImageStripper {
    fn strip(&self, input: &Path, output: &Path) -> Result<(), StripError> {
        let img = image::open(input)?;
        let format = ImageFormat::from_path(output).or_else(|_| ImageFormat::from_path(input))?;

        let mut buf = Cursor::new(Vec::new());
        match format {
            ImageFormat::Jpeg => {
                // JPEG has no alpha channel.
                let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
                rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality))?;
            }
            other => img.write_to(&mut buf, other)?,
        }

        fs::write(output, buf.into_inner()).map_err(|e| StripError::io(output, e))
    }
}
