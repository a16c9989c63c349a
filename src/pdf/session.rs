//! Lifecycle of an opened PDF: the read-only file handle and the engine's
//! document handle are acquired together and released together.

use super::engine::{EngineDocument, EngineError, PdfEngine};
use super::renderer::RenderError;
use super::source::PdfSource;
use serde::Serialize;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur while opening a session.
#[derive(Error, Debug)]
pub enum OpenError {
    #[error("Failed to open resource {id}: {source}")]
    Resource {
        id: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to copy resource {id} to {}: {source}", path.display())]
    Materialize {
        id: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to open {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl Serialize for OpenError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// An opened PDF.
///
/// Either both handles are held or neither is. Dropping the session closes it.
pub struct PdfSession<'e, E: PdfEngine + 'e> {
    document: Option<E::Document<'e>>,
    file: Option<File>,
    path: PathBuf,
    page_count: u32,
}

impl<'e, E: PdfEngine + 'e> PdfSession<'e, E> {
    /// Opens `source` with `engine`.
    ///
    /// Resource sources are first copied to `cache_file_name` inside their
    /// cache directory. On failure every handle acquired so far is released.
    pub fn open(
        engine: &'e E,
        source: &PdfSource,
        cache_file_name: &str,
    ) -> Result<Self, OpenError> {
        let path = source.materialize(cache_file_name)?;

        let file_error = |source| OpenError::File {
            path: path.clone(),
            source,
        };
        let file = File::open(&path).map_err(file_error)?;
        let engine_file = file.try_clone().map_err(file_error)?;

        let document = engine.open(engine_file)?;
        let page_count = document.page_count();

        info!(path = %path.display(), page_count, "opened PDF session");
        Ok(Self {
            document: Some(document),
            file: Some(file),
            path,
            page_count,
        })
    }

    /// Number of pages reported by the engine when the session was opened.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn is_open(&self) -> bool {
        self.document.is_some()
    }

    /// Filesystem path the document was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens page `index`. The page is closed when the returned handle drops.
    pub fn open_page(
        &self,
        index: u32,
    ) -> Result<<E::Document<'e> as EngineDocument>::Page<'_>, RenderError> {
        let document = self.document.as_ref().ok_or(RenderError::SessionClosed)?;
        if index >= self.page_count {
            return Err(RenderError::InvalidPage {
                index,
                page_count: self.page_count,
            });
        }
        document
            .open_page(index)
            .map_err(|source| RenderError::Engine { index, source })
    }

    /// Releases the document handle, then the file handle.
    ///
    /// Closing an already-closed session does nothing.
    pub fn close(&mut self) {
        let had_document = self.document.take().is_some();
        let had_file = self.file.take().is_some();
        if had_document || had_file {
            debug!(path = %self.path.display(), "closed PDF session");
        }
    }
}

impl<'e, E: PdfEngine + 'e> Drop for PdfSession<'e, E> {
    fn drop(&mut self) {
        self.close();
    }
}
