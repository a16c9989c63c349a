//! The decoding-engine capability the rest of the crate renders through.
//!
//! A backend opens a document from a read-only file handle, reports its page
//! count, opens one page at a time and renders a page into a caller-owned
//! [`RasterBuffer`]. Releasing a page or a document is dropping it.

use super::renderer::RasterBuffer;
use serde::{Deserialize, Serialize};
use std::fs::File;
use thiserror::Error;

/// Errors reported by a decoding backend.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to initialize PDF engine: {0}")]
    Init(String),

    #[error("Failed to load PDF: {0}")]
    Load(String),

    #[error("Invalid page index: {0}")]
    InvalidPage(u32),

    #[error("Rendering failed: {0}")]
    Render(String),
}

impl Serialize for EngineError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Intrinsic page size in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

/// Identity-plus-scale page transform. No rotation, no cropping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale_x: f32,
    pub scale_y: f32,
}

impl Transform {
    pub fn scale(scale_x: f32, scale_y: f32) -> Self {
        Self { scale_x, scale_y }
    }
}

/// Rendering quality requested from the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Screen output.
    #[default]
    Display,
    /// Printer output; slower, and some backends render annotations differently.
    Print,
}

/// A PDF decoding backend.
pub trait PdfEngine {
    type Document<'e>: EngineDocument
    where
        Self: 'e;

    /// Opens a document from a read-only file handle. The handle is owned by
    /// the returned document and closed with it.
    fn open(&self, file: File) -> Result<Self::Document<'_>, EngineError>;
}

/// An open document handle.
pub trait EngineDocument {
    type Page<'p>: EnginePage
    where
        Self: 'p;

    fn page_count(&self) -> u32;

    /// Opens page `index`. The page is closed when the returned value drops.
    fn open_page(&self, index: u32) -> Result<Self::Page<'_>, EngineError>;
}

/// An open page handle.
pub trait EnginePage {
    fn size(&self) -> PageSize;

    /// Renders the full page into `buffer`, scaled by `transform`.
    fn render(
        &self,
        buffer: &mut RasterBuffer,
        transform: &Transform,
        mode: RenderMode,
    ) -> Result<(), EngineError>;
}
