//! PDFium backend.
//!
//! The shared library is bound at runtime, so building and testing the crate
//! never needs PDFium installed; only `PdfiumEngine::bind` does.

use super::engine::{
    EngineDocument, EngineError, EnginePage, PageSize, PdfEngine, RenderMode, Transform,
};
use super::renderer::RasterBuffer;
use image::imageops::{self, FilterType};
use pdfium_render::prelude::*;
use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

static LOGGED_SUCCESS: AtomicBool = AtomicBool::new(false);

fn log_bound(from: &str) {
    if !LOGGED_SUCCESS.swap(true, Ordering::Relaxed) {
        info!(library = from, "bound PDFium");
    }
}

/// Renders through a dynamically loaded PDFium library.
pub struct PdfiumEngine {
    pdfium: Pdfium,
}

impl PdfiumEngine {
    /// Binds PDFium, trying in order: `library` if given, the library next to
    /// the current executable, the system library, then the bare platform
    /// library name.
    pub fn bind(library: Option<&Path>) -> Result<Self, EngineError> {
        if let Some(path) = library {
            match Pdfium::bind_to_library(path) {
                Ok(bindings) => {
                    log_bound(&path.display().to_string());
                    return Ok(Self::from_bindings(bindings));
                }
                Err(e) => debug!(path = %path.display(), error = %e, "configured PDFium failed"),
            }
        }

        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            let bundled = Pdfium::pdfium_platform_library_name_at_path(&exe_dir);
            if bundled.exists() {
                match Pdfium::bind_to_library(&bundled) {
                    Ok(bindings) => {
                        log_bound(&bundled.display().to_string());
                        return Ok(Self::from_bindings(bindings));
                    }
                    Err(e) => debug!(path = %bundled.display(), error = %e, "bundled PDFium failed"),
                }
            }
        }

        match Pdfium::bind_to_system_library() {
            Ok(bindings) => {
                log_bound("system");
                return Ok(Self::from_bindings(bindings));
            }
            Err(e) => debug!(error = %e, "system PDFium failed"),
        }

        let platform_name = Pdfium::pdfium_platform_library_name();
        if let Ok(bindings) = Pdfium::bind_to_library(&platform_name) {
            log_bound(&platform_name.to_string_lossy());
            return Ok(Self::from_bindings(bindings));
        }

        Err(EngineError::Init(
            "Could not load the PDFium library. Set `pdfium_library` or install PDFium."
                .to_string(),
        ))
    }

    fn from_bindings(bindings: Box<dyn PdfiumLibraryBindings>) -> Self {
        Self {
            pdfium: Pdfium::new(bindings),
        }
    }
}

impl PdfEngine for PdfiumEngine {
    type Document<'e> = PdfiumDocument<'e>;

    fn open(&self, file: File) -> Result<PdfiumDocument<'_>, EngineError> {
        let document = self
            .pdfium
            .load_pdf_from_reader(file, None)
            .map_err(|e| EngineError::Load(e.to_string()))?;
        Ok(PdfiumDocument { document })
    }
}

pub struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl<'a> EngineDocument for PdfiumDocument<'a> {
    type Page<'p> = PdfiumPage<'a> where Self: 'p;

    fn page_count(&self) -> u32 {
        self.document.pages().len() as u32
    }

    fn open_page(&self, index: u32) -> Result<PdfiumPage<'a>, EngineError> {
        let page_index = u16::try_from(index).map_err(|_| EngineError::InvalidPage(index))?;
        let page = self
            .document
            .pages()
            .get(page_index)
            .map_err(|_| EngineError::InvalidPage(index))?;
        Ok(PdfiumPage { page })
    }
}

pub struct PdfiumPage<'a> {
    page: PdfPage<'a>,
}

impl EnginePage for PdfiumPage<'_> {
    fn size(&self) -> PageSize {
        PageSize {
            width: self.page.width().value,
            height: self.page.height().value,
        }
    }

    fn render(
        &self,
        buffer: &mut RasterBuffer,
        transform: &Transform,
        mode: RenderMode,
    ) -> Result<(), EngineError> {
        let (width, height) = (buffer.width(), buffer.height());
        debug!(width, height, scale_x = transform.scale_x, scale_y = transform.scale_y, "PDFium render");

        // Full page, no rotation: the target size already carries the scale.
        let config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_target_height(height as i32)
            .rotate(PdfPageRenderRotation::None, false)
            .set_clear_color(PdfColor::WHITE)
            .render_form_data(true)
            .render_annotations(true)
            .use_print_quality(mode == RenderMode::Print);

        let bitmap = self
            .page
            .render_with_config(&config)
            .map_err(|e| EngineError::Render(e.to_string()))?;

        let mut image = bitmap.as_image().to_rgba8();
        if image.dimensions() != (width, height) {
            image = imageops::resize(&image, width, height, FilterType::Triangle);
        }
        if !buffer.copy_from_image(&image) {
            return Err(EngineError::Render(format!(
                "PDFium produced a {}x{} bitmap for a {width}x{height} buffer",
                image.width(),
                image.height()
            )));
        }
        Ok(())
    }
}
