//! PNG + base64 encoding of rendered pages.

use crate::pdf::RasterBuffer;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

/// A lossless PNG encoding of a page and its base64 text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    bytes: Vec<u8>,
    base64: String,
}

impl EncodedImage {
    pub const MIME_TYPE: &'static str = "image/png";

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn base64(&self) -> &str {
        &self.base64
    }

    /// `data:image/png;base64,...`, ready for an `src` attribute.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", Self::MIME_TYPE, self.base64)
    }
}

/// Encodes `buffer` as an RGBA8 PNG.
pub fn encode(buffer: &RasterBuffer) -> EncodedImage {
    let mut bytes = Vec::new();
    // Writes into a Vec only fail on a size mismatch, which RasterBuffer rules out.
    PngEncoder::new(&mut bytes)
        .write_image(
            buffer.pixels(),
            buffer.width(),
            buffer.height(),
            ExtendedColorType::Rgba8,
        )
        .expect("RasterBuffer length matches its dimensions");

    let base64 = STANDARD.encode(&bytes);
    EncodedImage { bytes, base64 }
}
