//! Host-facing viewer: turns a PDF source into markup on a display surface.

use crate::assembler::{AssembleError, CancelToken, DocumentAssembler, ViewerDocument};
use crate::config::{ConfigError, DisplaySettings, ViewerConfig};
use crate::encoder;
use crate::pdf::{
    EngineError, OpenError, PageRenderer, PdfEngine, PdfSession, PdfSource, PdfiumEngine,
    RenderError,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const HTML_MIME_TYPE: &str = "text/html";
pub const HTML_ENCODING: &str = "UTF-8";

/// Errors surfaced to the host.
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Failed to open PDF: {0}")]
    Open(#[from] OpenError),

    #[error(transparent)]
    Assemble(#[from] AssembleError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Display surface error: {0}")]
    Surface(#[from] SurfaceError),

    #[error("Failed to initialize PDF engine: {0}")]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Serialize for ViewerError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("Unsupported content: {0}")]
    Unsupported(String),

    #[error("Failed to write content: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the assembled markup is shown.
pub trait DisplaySurface {
    fn apply_settings(&mut self, _settings: &DisplaySettings) {}

    /// Replaces the surface content with `data`.
    fn load_data_with_base_url(
        &mut self,
        base_url: Option<&str>,
        data: &str,
        mime_type: &str,
        encoding: &str,
    ) -> Result<(), SurfaceError>;
}

/// Writes the markup to a file, for hosts without an embedded browser.
#[derive(Debug, Clone)]
pub struct HtmlFileSurface {
    path: PathBuf,
    settings: DisplaySettings,
}

impl HtmlFileSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            settings: DisplaySettings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &DisplaySettings {
        &self.settings
    }
}

impl DisplaySurface for HtmlFileSurface {
    fn apply_settings(&mut self, settings: &DisplaySettings) {
        self.settings = settings.clone();
    }

    fn load_data_with_base_url(
        &mut self,
        _base_url: Option<&str>,
        data: &str,
        mime_type: &str,
        encoding: &str,
    ) -> Result<(), SurfaceError> {
        if mime_type != HTML_MIME_TYPE || !encoding.eq_ignore_ascii_case(HTML_ENCODING) {
            return Err(SurfaceError::Unsupported(format!("{mime_type}; charset={encoding}")));
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// Outcome of loading a PDF into the viewer.
#[derive(Debug, Serialize)]
pub struct LoadReport {
    pub page_count: u32,
    pub rendered: Vec<u32>,
    pub failed: Vec<FailedPage>,
    pub html_bytes: usize,
}

#[derive(Debug, Serialize)]
pub struct FailedPage {
    pub index: u32,
    pub error: String,
}

impl From<&ViewerDocument> for LoadReport {
    fn from(document: &ViewerDocument) -> Self {
        Self {
            page_count: document.page_count(),
            rendered: document.cards().to_vec(),
            failed: document
                .failures()
                .iter()
                .map(|f| FailedPage {
                    index: f.index,
                    error: f.error.to_string(),
                })
                .collect(),
            html_bytes: document.html().len(),
        }
    }
}

/// Renders PDFs with an engine and shows them on a display surface.
pub struct PdfViewer<E: PdfEngine, S: DisplaySurface> {
    engine: E,
    surface: S,
    config: ViewerConfig,
    cancel: CancelToken,
}

impl<S: DisplaySurface> PdfViewer<PdfiumEngine, S> {
    /// Binds PDFium (honouring `config.pdfium_library`) and creates a viewer.
    pub fn with_pdfium(surface: S, config: ViewerConfig) -> Result<Self, ViewerError> {
        config.validate()?;
        let engine = PdfiumEngine::bind(config.pdfium_library.as_deref())?;
        Self::new(engine, surface, config)
    }
}

impl<E: PdfEngine, S: DisplaySurface> PdfViewer<E, S> {
    /// Creates a viewer; `config` is validated first.
    pub fn new(engine: E, mut surface: S, config: ViewerConfig) -> Result<Self, ViewerError> {
        config.validate()?;
        surface.apply_settings(&config.display);
        Ok(Self {
            engine,
            surface,
            config,
            cancel: CancelToken::new(),
        })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Token that cancels the current and later loads until reset.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Renders `source` and hands the resulting markup to the surface.
    pub fn load_pdf(&mut self, source: &PdfSource) -> Result<LoadReport, ViewerError> {
        let config = &self.config;
        let mut session = PdfSession::open(&self.engine, source, &config.cache_file_name)
            .map_err(|e| {
                warn!(error = %e, ?source, "could not open PDF");
                e
            })?;

        let renderer = PageRenderer::new(config.density, config.zoom, config.render_mode);
        let document = DocumentAssembler::new(renderer, config.effective_numbering())
            .lenient(config.lenient)
            .with_cancel(self.cancel.clone())
            .assemble(&session);
        session.close();
        let document = document?;

        let report = LoadReport::from(&document);
        self.surface.load_data_with_base_url(
            None,
            document.html(),
            HTML_MIME_TYPE,
            HTML_ENCODING,
        )?;

        info!(
            pages = report.page_count,
            rendered = report.rendered.len(),
            failed = report.failed.len(),
            "loaded PDF into viewer"
        );
        Ok(report)
    }

    /// Renders a single page, outside of document assembly.
    pub fn render_page(&self, source: &PdfSource, index: u32) -> Result<Vec<u8>, ViewerError> {
        let config = &self.config;
        let session = PdfSession::open(&self.engine, source, &config.cache_file_name)?;
        let buffer = PageRenderer::new(config.density, config.zoom, config.render_mode)
            .render(&session, index)?;
        Ok(encoder::encode(&buffer).bytes().to_vec())
    }
}
