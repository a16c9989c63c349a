//! Scripted in-memory engine for tests. Counts open documents and pages so
//! tests can check that handles are released.

use super::engine::{
    EngineDocument, EngineError, EnginePage, PageSize, PdfEngine, RenderMode, Transform,
};
use super::renderer::RasterBuffer;
use std::cell::Cell;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

/// File contents the fake engine accepts as a PDF.
pub(crate) const FAKE_PDF: &[u8] = b"%PDF-1.4\n% fake document\n%%EOF\n";

#[derive(Debug, Clone)]
pub(crate) struct FakePage {
    size: PageSize,
    color: [u8; 4],
    fail_open: bool,
    fail_render: bool,
}

impl FakePage {
    pub(crate) const DEFAULT_COLOR: [u8; 4] = [255, 255, 255, 255];

    pub(crate) fn new(width: f32, height: f32) -> Self {
        Self {
            size: PageSize { width, height },
            color: Self::DEFAULT_COLOR,
            fail_open: false,
            fail_render: false,
        }
    }

    pub(crate) fn color(mut self, rgba: [u8; 4]) -> Self {
        self.color = rgba;
        self
    }

    /// Rendering this page fails.
    pub(crate) fn failing(mut self) -> Self {
        self.fail_render = true;
        self
    }

    /// Opening this page fails.
    pub(crate) fn unopenable(mut self) -> Self {
        self.fail_open = true;
        self
    }
}

#[derive(Debug, Default)]
pub(crate) struct Stats {
    open_documents: Cell<u32>,
    documents_released: Cell<u32>,
    open_pages: Cell<u32>,
    max_open_pages: Cell<u32>,
    pages_opened: Cell<u32>,
    last_mode: Cell<Option<RenderMode>>,
    last_transform: Cell<Option<Transform>>,
}

impl Stats {
    pub(crate) fn open_documents(&self) -> u32 {
        self.open_documents.get()
    }

    pub(crate) fn documents_released(&self) -> u32 {
        self.documents_released.get()
    }

    pub(crate) fn open_pages(&self) -> u32 {
        self.open_pages.get()
    }

    pub(crate) fn max_open_pages(&self) -> u32 {
        self.max_open_pages.get()
    }

    pub(crate) fn pages_opened(&self) -> u32 {
        self.pages_opened.get()
    }

    pub(crate) fn last_mode(&self) -> Option<RenderMode> {
        self.last_mode.get()
    }

    pub(crate) fn last_transform(&self) -> Option<Transform> {
        self.last_transform.get()
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeEngine {
    pages: Vec<FakePage>,
    stats: Stats,
}

impl FakeEngine {
    pub(crate) fn new(pages: Vec<FakePage>) -> Self {
        Self {
            pages,
            stats: Stats::default(),
        }
    }

    pub(crate) fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Writes a file the fake engine will open and returns its path.
    pub(crate) fn write_pdf(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, FAKE_PDF).unwrap();
        path
    }
}

impl PdfEngine for FakeEngine {
    type Document<'e> = FakeDocument<'e>;

    fn open(&self, mut file: File) -> Result<FakeDocument<'_>, EngineError> {
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| EngineError::Load(e.to_string()))?;
        if !contents.starts_with(b"%PDF") {
            return Err(EngineError::Load("missing %PDF header".into()));
        }

        let stats = &self.stats;
        stats.open_documents.set(stats.open_documents.get() + 1);
        Ok(FakeDocument {
            engine: self,
            _file: file,
        })
    }
}

pub(crate) struct FakeDocument<'e> {
    engine: &'e FakeEngine,
    _file: File,
}

impl Drop for FakeDocument<'_> {
    fn drop(&mut self) {
        let stats = &self.engine.stats;
        stats.open_documents.set(stats.open_documents.get() - 1);
        stats.documents_released.set(stats.documents_released.get() + 1);
    }
}

impl<'e> EngineDocument for FakeDocument<'e> {
    type Page<'p> = FakePageHandle<'e> where Self: 'p;

    fn page_count(&self) -> u32 {
        self.engine.pages.len() as u32
    }

    fn open_page(&self, index: u32) -> Result<FakePageHandle<'e>, EngineError> {
        let page = self
            .engine
            .pages
            .get(index as usize)
            .ok_or(EngineError::InvalidPage(index))?;
        if page.fail_open {
            return Err(EngineError::Load(format!("page {index} is damaged")));
        }

        let stats = &self.engine.stats;
        let open = stats.open_pages.get() + 1;
        stats.open_pages.set(open);
        stats.max_open_pages.set(stats.max_open_pages.get().max(open));
        stats.pages_opened.set(stats.pages_opened.get() + 1);

        Ok(FakePageHandle {
            page,
            stats: &self.engine.stats,
        })
    }
}

pub(crate) struct FakePageHandle<'e> {
    page: &'e FakePage,
    stats: &'e Stats,
}

impl Drop for FakePageHandle<'_> {
    fn drop(&mut self) {
        self.stats.open_pages.set(self.stats.open_pages.get() - 1);
    }
}

impl EnginePage for FakePageHandle<'_> {
    fn size(&self) -> PageSize {
        self.page.size
    }

    fn render(
        &self,
        buffer: &mut RasterBuffer,
        transform: &Transform,
        mode: RenderMode,
    ) -> Result<(), EngineError> {
        self.stats.last_mode.set(Some(mode));
        self.stats.last_transform.set(Some(*transform));
        if self.page.fail_render {
            return Err(EngineError::Render("corrupt content stream".into()));
        }
        buffer.fill(self.page.color);
        Ok(())
    }
}
