//! PDF access and page rasterization.
//!
//! This module provides:
//! - The decoding-engine capability and its PDFium implementation
//! - Session lifecycle (source materialization, open, close)
//! - Density-aware page sizing and rendering

mod engine;
mod pdfium;
mod renderer;
mod scaler;
mod session;
mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::*;
pub use pdfium::{PdfiumDocument, PdfiumEngine, PdfiumPage};
pub use renderer::*;
pub use scaler::*;
pub use session::*;
pub use source::*;
