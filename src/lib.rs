// PDF WebView - page-image document builder
//
// Renders every page of a PDF to a bitmap through PDFium, encodes the pages
// as PNG data URIs and assembles them into one scrollable HTML document for
// an embedded browser surface.

pub mod assembler;
pub mod config;
pub mod encoder;
pub mod pdf;
pub mod viewer;

pub use assembler::{AssembleError, CancelToken, DocumentAssembler, PageFailure, ViewerDocument};
pub use config::{ConfigError, DisplaySettings, PageNumbering, ViewerConfig};
pub use encoder::{encode, EncodedImage};
pub use pdf::{
    compute_size, OpenError, PageRenderer, PdfEngine, PdfSession, PdfSource, PdfiumEngine,
    RasterBuffer, RenderError, RenderMode,
};
pub use viewer::{DisplaySurface, HtmlFileSurface, LoadReport, PdfViewer, SurfaceError, ViewerError};
