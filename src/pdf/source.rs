//! Where a PDF comes from, and how it reaches the filesystem.

use super::session::OpenError;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Bundled, read-only resources addressed by identifier.
pub trait ResourceProvider: Send + Sync {
    /// Opens resource `id`. A missing resource is `io::ErrorKind::NotFound`.
    fn open_resource(&self, id: &str) -> io::Result<Box<dyn Read + '_>>;
}

/// Resources stored as files directly under a directory.
#[derive(Debug, Clone)]
pub struct DirResources {
    root: PathBuf,
}

impl DirResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceProvider for DirResources {
    fn open_resource(&self, id: &str) -> io::Result<Box<dyn Read + '_>> {
        // Identifiers are plain file names, never paths.
        if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("invalid resource id: {id:?}"),
            ));
        }
        let file = File::open(self.root.join(id))?;
        Ok(Box::new(file))
    }
}

/// Resources held in memory, e.g. from `include_bytes!`.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedResources {
    entries: HashMap<String, Cow<'static, [u8]>>,
}

impl EmbeddedResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: impl Into<String>, bytes: impl Into<Cow<'static, [u8]>>) -> Self {
        self.insert(id, bytes);
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, bytes: impl Into<Cow<'static, [u8]>>) {
        self.entries.insert(id.into(), bytes.into());
    }
}

impl ResourceProvider for EmbeddedResources {
    fn open_resource(&self, id: &str) -> io::Result<Box<dyn Read + '_>> {
        let bytes = self.entries.get(id).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no embedded resource {id:?}"))
        })?;
        Ok(Box::new(Cursor::new(bytes.as_ref())))
    }
}

/// A PDF supplied by the host.
#[derive(Clone)]
pub enum PdfSource {
    /// A PDF already on the filesystem.
    Path(PathBuf),
    /// A bundled resource, copied into `cache_dir` before opening.
    Resource {
        provider: Arc<dyn ResourceProvider>,
        id: String,
        cache_dir: PathBuf,
    },
}

impl fmt::Debug for PdfSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Resource { id, cache_dir, .. } => f
                .debug_struct("Resource")
                .field("id", id)
                .field("cache_dir", cache_dir)
                .finish_non_exhaustive(),
        }
    }
}

impl PdfSource {
    pub fn resource(
        provider: Arc<dyn ResourceProvider>,
        id: impl Into<String>,
        cache_dir: impl Into<PathBuf>,
    ) -> Self {
        Self::Resource {
            provider,
            id: id.into(),
            cache_dir: cache_dir.into(),
        }
    }

    /// Resolves a launch argument to a PDF on disk.
    ///
    /// Accepts a plain path, a `file://` URL, or a percent-encoded path.
    pub fn from_arg(arg: &str) -> Option<Self> {
        if arg.starts_with('-') {
            return None;
        }

        if is_pdf_file(Path::new(arg)) {
            return Some(Self::Path(PathBuf::from(arg)));
        }

        if arg.starts_with("file://") {
            if let Some(path) = url::Url::parse(arg)
                .ok()
                .and_then(|url| url.to_file_path().ok())
            {
                if is_pdf_file(&path) {
                    return Some(Self::Path(path));
                }
            }
        }

        if let Ok(decoded) = urlencoding::decode(arg) {
            if decoded != arg && is_pdf_file(Path::new(decoded.as_ref())) {
                return Some(Self::Path(PathBuf::from(decoded.into_owned())));
            }
        }

        None
    }

    /// Makes the PDF readable from the filesystem and returns its path.
    ///
    /// Resources are written to `<cache_dir>/<cache_file_name>`, replacing
    /// whatever a previous (possibly interrupted) copy left there. The cache
    /// file is not touched if the resource cannot be opened.
    pub fn materialize(&self, cache_file_name: &str) -> Result<PathBuf, OpenError> {
        match self {
            Self::Path(path) => Ok(path.clone()),
            Self::Resource {
                provider,
                id,
                cache_dir,
            } => {
                let mut reader =
                    provider
                        .open_resource(id)
                        .map_err(|source| OpenError::Resource {
                            id: id.clone(),
                            source,
                        })?;

                let target = cache_dir.join(cache_file_name);
                let copy_error = |source| OpenError::Materialize {
                    id: id.clone(),
                    path: target.clone(),
                    source,
                };

                fs::create_dir_all(cache_dir).map_err(copy_error)?;
                let mut out = File::create(&target).map_err(copy_error)?;
                let copied = io::copy(&mut reader, &mut out).map_err(copy_error)?;
                out.flush().map_err(copy_error)?;

                debug!(resource = %id, bytes = copied, path = %target.display(), "materialized resource");
                Ok(target)
            }
        }
    }
}

/// Check if a path is an existing file with a `.pdf` extension.
fn is_pdf_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false)
}
