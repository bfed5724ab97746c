// pgm.rs - Binary greyscale (P5) boards on disk, through the `image` crate's PNM codec

use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::{ExtendedColorType, ImageEncoder, ImageError, ImageFormat};

use crate::error::GolError;

/// A greyscale image, one byte per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl Image {
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Self {
        assert_eq!(pixels.len(), width * height, "pixel count must match image size");
        Self { width, height, pixels }
    }
}

fn image_error(name: &str, reason: impl ToString) -> GolError {
    GolError::Image {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

/// Encodes as P5 with maxval 255. `name` is only used in error messages.
pub fn encode(name: &str, image: &Image) -> Result<Vec<u8>, GolError> {
    let width = u32::try_from(image.width).map_err(|e| image_error(name, e))?;
    let height = u32::try_from(image.height).map_err(|e| image_error(name, e))?;

    let mut out = Vec::with_capacity(image.pixels.len() + 32);
    PnmEncoder::new(&mut out)
        .with_subtype(PnmSubtype::Graymap(SampleEncoding::Binary))
        .write_image(&image.pixels, width, height, ExtendedColorType::L8)
        .map_err(|e: ImageError| image_error(name, e))?;
    Ok(out)
}

/// Parses a PNM graymap into 8-bit samples. `name` is only used in error messages.
pub fn decode(name: &str, bytes: &[u8]) -> Result<Image, GolError> {
    let grey = image::load_from_memory_with_format(bytes, ImageFormat::Pnm)
        .map_err(|e| image_error(name, e))?
        .into_luma8();
    let (width, height) = (grey.width() as usize, grey.height() as usize);
    Ok(Image::new(width, height, grey.into_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode() {
        let image = Image::new(3, 2, vec![0, 255, 0, 255, 255, 0]);
        let bytes = encode("t", &image).unwrap();
        assert!(bytes.starts_with(b"P5"));
        assert_eq!(decode("t", &bytes).unwrap(), image);
    }

    #[test]
    fn header_comments_are_skipped() {
        let mut bytes = b"P5\n# created by hand\n2 2\n255\n".to_vec();
        bytes.extend_from_slice(&[255, 0, 0, 255]);
        let image = decode("commented", &bytes).unwrap();
        assert_eq!((image.width, image.height), (2, 2));
        assert_eq!(image.pixels, vec![255, 0, 0, 255]);
    }

    #[test]
    fn rejects_non_pnm_bytes() {
        let err = decode("text", b"hello, world").unwrap_err();
        assert!(matches!(err, GolError::Image { ref name, .. } if name == "text"));
    }

    #[test]
    fn rejects_short_raster() {
        let err = decode("short", b"P5\n4 4\n255\n\x00\x00").unwrap_err();
        assert!(matches!(err, GolError::Image { .. }));
    }

    #[test]
    fn oversized_header_is_an_error() {
        let err = decode("huge", b"P5 4294967296 4294967296 255\n\0").unwrap_err();
        assert!(matches!(err, GolError::Image { .. }));

        let err = decode("wide", b"P5 4294967295 4294967295 255\n\0").unwrap_err();
        assert!(matches!(err, GolError::Image { .. }));
    }
}
