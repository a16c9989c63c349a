//! Page rasterization.
//!
//! [`PageRenderer`] opens one page from a session, sizes an output buffer with
//! the scaler, renders into it and closes the page again before returning.

use super::engine::{EngineError, EnginePage, PdfEngine, RenderMode};
use super::scaler::{compute_scaled_size, Scale};
use super::session::PdfSession;
use image::RgbaImage;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while rendering a single page.
///
/// A failed page leaves the session and any other rendered pages intact.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid page index: {index} (document has {page_count} pages)")]
    InvalidPage { index: u32, page_count: u32 },

    #[error("No document loaded")]
    SessionClosed,

    #[error("Rendering page {index} failed: {source}")]
    Engine {
        index: u32,
        #[source]
        source: EngineError,
    },

    #[error("Failed to allocate a {width}x{height} raster buffer")]
    Allocation { width: u32, height: u32 },
}

impl Serialize for RenderError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// A width x height grid of RGBA8 pixels, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterBuffer {
    /// Allocates a transparent buffer. Both dimensions must be at least 1.
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        let alloc_error = RenderError::Allocation { width, height };
        if width == 0 || height == 0 {
            return Err(alloc_error);
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or(RenderError::Allocation { width, height })?;

        let mut pixels = Vec::new();
        pixels.try_reserve_exact(len).map_err(|_| alloc_error)?;
        pixels.resize(len, 0);

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Wraps existing RGBA8 data. Returns `None` if the length does not match.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        (pixels.len() == expected).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// RGBA value at (`x`, `y`).
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.pixels[offset..offset + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Fills every pixel with `rgba`.
    pub fn fill(&mut self, rgba: [u8; 4]) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Copies an image of identical dimensions into the buffer.
    pub fn copy_from_image(&mut self, image: &RgbaImage) -> bool {
        if image.dimensions() != (self.width, self.height) {
            return false;
        }
        self.pixels.copy_from_slice(image.as_raw());
        true
    }
}

/// Renders session pages at a fixed density and zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRenderer {
    scale: Scale,
    mode: RenderMode,
}

impl PageRenderer {
    /// `density` is the display's pixels per point, `zoom` the user zoom factor
    /// (1.0 for the natural size).
    pub fn new(density: f32, zoom: f32, mode: RenderMode) -> Self {
        Self {
            scale: Scale::uniform(density, zoom),
            mode,
        }
    }

    /// Renders page `index` of `session` into a new buffer.
    ///
    /// The page handle is opened and closed within this call, on success and
    /// on every failure path.
    pub fn render<'e, E: PdfEngine + 'e>(
        &self,
        session: &PdfSession<'e, E>,
        index: u32,
    ) -> Result<RasterBuffer, RenderError> {
        let page = session.open_page(index)?;

        let size = page.size();
        let (width, height) = compute_scaled_size(size.width, size.height, self.scale);
        let mut buffer = RasterBuffer::new(width, height)?;

        let rendered = page.render(&mut buffer, &self.scale.transform(), self.mode);
        drop(page);
        rendered.map_err(|source| RenderError::Engine { index, source })?;

        debug!(
            page = index,
            width,
            height,
            points_width = size.width,
            points_height = size.height,
            "rendered page"
        );
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::engine::Transform;
    use crate::pdf::testing::{FakeEngine, FakePage};
    use crate::pdf::PdfSource;

    fn open_session<'e>(
        engine: &'e FakeEngine,
        dir: &tempfile::TempDir,
    ) -> PdfSession<'e, FakeEngine> {
        let path = FakeEngine::write_pdf(dir.path(), "doc.pdf");
        PdfSession::open(engine, &PdfSource::Path(path), "webview.pdf").unwrap()
    }

    #[test]
    fn renders_at_density_scale() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FakeEngine::new(vec![FakePage::new(612.0, 792.0)]);
        let session = open_session(&engine, &dir);

        let renderer = PageRenderer::new(2.0, 1.0, RenderMode::Display);
        let buffer = renderer.render(&session, 0).unwrap();

        assert_eq!((buffer.width(), buffer.height()), (1224, 1584));
        assert_eq!(buffer.pixel(0, 0), Some(FakePage::DEFAULT_COLOR));
        assert_eq!(engine.stats().last_mode(), Some(RenderMode::Display));
        assert_eq!(engine.stats().last_transform(), Some(Transform::scale(2.0, 2.0)));
    }

    #[test]
    fn page_is_closed_after_success_and_failure() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FakeEngine::new(vec![
            FakePage::new(100.0, 100.0),
            FakePage::new(100.0, 100.0).failing(),
        ]);
        let session = open_session(&engine, &dir);
        let renderer = PageRenderer::new(1.0, 1.0, RenderMode::Display);

        renderer.render(&session, 0).unwrap();
        assert_eq!(engine.stats().open_pages(), 0);

        let err = renderer.render(&session, 1).unwrap_err();
        assert!(matches!(err, RenderError::Engine { index: 1, .. }));
        assert_eq!(engine.stats().open_pages(), 0);
        assert_eq!(engine.stats().pages_opened(), 2);
        assert_eq!(engine.stats().max_open_pages(), 1);
    }

    #[test]
    fn failure_does_not_poison_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FakeEngine::new(vec![
            FakePage::new(50.0, 50.0).failing(),
            FakePage::new(50.0, 50.0).color([10, 20, 30, 255]),
        ]);
        let session = open_session(&engine, &dir);
        let renderer = PageRenderer::new(1.0, 1.0, RenderMode::Display);

        assert!(renderer.render(&session, 0).is_err());
        let buffer = renderer.render(&session, 1).unwrap();
        assert_eq!(buffer.pixel(49, 49), Some([10, 20, 30, 255]));
        assert!(session.is_open());
    }

    #[test]
    fn rejects_out_of_range_index() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FakeEngine::new(vec![FakePage::new(10.0, 10.0)]);
        let session = open_session(&engine, &dir);
        let renderer = PageRenderer::new(1.0, 1.0, RenderMode::Display);

        let err = renderer.render(&session, 1).unwrap_err();
        assert!(matches!(
            err,
            RenderError::InvalidPage {
                index: 1,
                page_count: 1
            }
        ));
        assert_eq!(engine.stats().pages_opened(), 0);
    }

    #[test]
    fn closed_session_cannot_render() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FakeEngine::new(vec![FakePage::new(10.0, 10.0)]);
        let mut session = open_session(&engine, &dir);
        session.close();

        let renderer = PageRenderer::new(1.0, 1.0, RenderMode::Display);
        assert!(matches!(
            renderer.render(&session, 0),
            Err(RenderError::SessionClosed)
        ));
        assert_eq!(engine.stats().pages_opened(), 0);
    }

    #[test]
    fn passes_print_mode_through() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FakeEngine::new(vec![FakePage::new(10.0, 10.0)]);
        let session = open_session(&engine, &dir);

        PageRenderer::new(1.0, 1.0, RenderMode::Print)
            .render(&session, 0)
            .unwrap();
        assert_eq!(engine.stats().last_mode(), Some(RenderMode::Print));
    }

    #[test]
    fn buffer_allocation_checks_dimensions() {
        assert!(matches!(
            RasterBuffer::new(0, 10),
            Err(RenderError::Allocation { width: 0, height: 10 })
        ));
        assert!(RasterBuffer::new(u32::MAX, u32::MAX).is_err());

        let buffer = RasterBuffer::new(3, 2).unwrap();
        assert_eq!(buffer.pixels().len(), 24);
        assert_eq!(buffer.pixel(2, 1), Some([0, 0, 0, 0]));
        assert_eq!(buffer.pixel(3, 0), None);
    }

    #[test]
    fn from_rgba_requires_matching_length() {
        assert!(RasterBuffer::from_rgba(2, 2, vec![0; 16]).is_some());
        assert!(RasterBuffer::from_rgba(2, 2, vec![0; 15]).is_none());
        assert!(RasterBuffer::from_rgba(0, 2, Vec::new()).is_none());
    }

    #[test]
    fn copies_images_of_matching_size() {
        let mut buffer = RasterBuffer::new(2, 2).unwrap();
        let image = RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 4]));
        assert!(buffer.copy_from_image(&image));
        assert_eq!(buffer.pixel(1, 1), Some([1, 2, 3, 4]));

        let wrong = RgbaImage::new(3, 2);
        assert!(!buffer.copy_from_image(&wrong));
    }
}
