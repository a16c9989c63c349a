//! Builds the viewer document: one image card per page, in page order.

use crate::config::PageNumbering;
use crate::encoder;
use crate::pdf::{PageRenderer, PdfEngine, PdfSession, RenderError};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

const STYLE: &str = concat!(
    ".card {",
    "  border-radius: 8px;",
    "  box-shadow: 0 4px 8px rgba(0, 0, 0, 0.2);",
    "  margin: 8px;",
    "  position: relative;",
    "}",
    ".page-number {",
    "  position: absolute;",
    "  top: 0;",
    "  right: 0;",
    "  background-color: rgba(0, 0, 0, 0.5);",
    "  color: white;",
    "  padding: 2px 6px;",
    "  border-top-left-radius: 4px;",
    "}",
);

const PAGE_NUMBER_SCRIPT: &str = concat!(
    "function addPageNumbers() {",
    "  var imgs = document.getElementsByTagName('img');",
    "  for (var i = 0; i < imgs.length; i++) {",
    "    var label = document.createElement('div');",
    "    label.className = 'page-number';",
    "    label.textContent = 'Page ' + (i + 1);",
    "    imgs[i].parentNode.appendChild(label);",
    "  }",
    "}",
);

/// Errors that abort assembly.
#[derive(Error, Debug)]
pub enum AssembleError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Assembly cancelled after {completed} pages")]
    Cancelled { completed: u32 },
}

/// Cooperative cancellation, checked between pages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clears a previous cancellation so the token can be reused.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A page that was left out of the document.
#[derive(Debug, Serialize)]
pub struct PageFailure {
    pub index: u32,
    pub error: RenderError,
}

/// The assembled HTML and what went into it.
#[derive(Debug)]
pub struct ViewerDocument {
    html: String,
    page_count: u32,
    cards: Vec<u32>,
    failures: Vec<PageFailure>,
}

impl ViewerDocument {
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn into_html(self) -> String {
        self.html
    }

    /// Page count of the session the document was built from.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Indices of the pages that have a card, in document order.
    pub fn cards(&self) -> &[u32] {
        &self.cards
    }

    pub fn failures(&self) -> &[PageFailure] {
        &self.failures
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Renders every page of a session and assembles the viewer document.
#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    renderer: PageRenderer,
    numbering: PageNumbering,
    lenient: bool,
    cancel: Option<CancelToken>,
}

impl DocumentAssembler {
    pub fn new(renderer: PageRenderer, numbering: PageNumbering) -> Self {
        Self {
            renderer,
            numbering,
            lenient: true,
            cancel: None,
        }
    }

    /// In lenient mode (the default) failed pages are logged and skipped;
    /// otherwise the first failure aborts assembly.
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Renders pages `0..page_count` in order and builds the document.
    ///
    /// The whole document is held in memory and returned once complete.
    pub fn assemble<'e, E: PdfEngine + 'e>(
        &self,
        session: &PdfSession<'e, E>,
    ) -> Result<ViewerDocument, AssembleError> {
        let page_count = session.page_count();
        let mut html = String::new();
        self.open_document(&mut html);

        let mut cards = Vec::with_capacity(page_count as usize);
        let mut failures = Vec::new();

        for index in 0..page_count {
            if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                info!(completed = index, page_count, "assembly cancelled");
                return Err(AssembleError::Cancelled { completed: index });
            }

            match self.renderer.render(session, index) {
                Ok(buffer) => {
                    let image = encoder::encode(&buffer);
                    drop(buffer);
                    self.push_card(&mut html, index, &image.data_uri());
                    cards.push(index);
                }
                Err(error) if self.lenient => {
                    warn!(page = index, %error, "skipping page that failed to render");
                    failures.push(PageFailure { index, error });
                }
                Err(error) => return Err(error.into()),
            }
        }

        html.push_str("</body></html>");

        if !failures.is_empty() {
            let missing: Vec<u32> = failures.iter().map(|f| f.index).collect();
            warn!(?missing, page_count, "document is missing pages");
        }
        info!(page_count, cards = cards.len(), bytes = html.len(), "assembled document");

        Ok(ViewerDocument {
            html,
            page_count,
            cards,
            failures,
        })
    }

    fn open_document(&self, html: &mut String) {
        html.push_str("<html><head><style>");
        html.push_str(STYLE);
        html.push_str("</style>");
        if self.numbering == PageNumbering::Script {
            html.push_str("<script>");
            html.push_str(PAGE_NUMBER_SCRIPT);
            html.push_str("</script></head><body onload=\"addPageNumbers()\">");
        } else {
            html.push_str("</head><body>");
        }
    }

    fn push_card(&self, html: &mut String, index: u32, src: &str) {
        html.push_str("<div class=\"card\">");
        html.push_str("<img style=\"width: 100%; height: auto;\" src=\"");
        html.push_str(src);
        html.push_str("\"/>");
        if self.numbering == PageNumbering::Inline {
            html.push_str("<div class=\"page-number\">Page ");
            html.push_str(&(index + 1).to_string());
            html.push_str("</div>");
        }
        html.push_str("</div>");
    }
}
