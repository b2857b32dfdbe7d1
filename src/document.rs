//! Document viewer state: page, zoom, and the serialized render queue.
//!
//! Rendering itself happens outside the crate. This module only decides which
//! render to issue next: one render is in flight at a time, and requests made
//! meanwhile collapse into a single queued page (the latest one wins).

use serde::Serialize;
use thiserror::Error;

pub const ZOOM_STEP: f64 = 1.2;
pub const DEFAULT_SCALE: f64 = 1.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("the document has no pages")]
    NoPages,
    #[error("{0}")]
    Backend(String),
}

/// A render the host should perform now.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RenderRequest {
    /// 1-based page number.
    pub page: u32,
    pub scale: f64,
}

#[derive(Debug)]
pub struct DocumentViewer {
    page_count: Option<u32>,
    page: u32,
    scale: f64,
    rendering: bool,
    pending_page: Option<u32>,
}

impl Default for DocumentViewer {
    fn default() -> Self {
        Self {
            page_count: None,
            page: 1,
            scale: DEFAULT_SCALE,
            rendering: false,
            pending_page: None,
        }
    }
}

impl DocumentViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.page_count.is_some()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_count(&self) -> Option<u32> {
        self.page_count
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering
    }

    pub fn pending_page(&self) -> Option<u32> {
        self.pending_page
    }

    /// A new document finished loading; start on page 1.
    pub fn load(&mut self, page_count: u32) -> Result<RenderRequest, DocumentError> {
        if page_count == 0 {
            return Err(DocumentError::NoPages);
        }
        self.page_count = Some(page_count);
        self.page = 1;
        self.rendering = false;
        self.pending_page = None;
        log::info!("document loaded with {page_count} pages");
        Ok(self.begin_render(1))
    }

    pub fn next_page(&mut self) -> Option<RenderRequest> {
        let count = self.page_count?;
        if self.page >= count {
            return None;
        }
        self.page += 1;
        self.request_render(self.page)
    }

    pub fn prev_page(&mut self) -> Option<RenderRequest> {
        self.page_count?;
        if self.page <= 1 {
            return None;
        }
        self.page -= 1;
        self.request_render(self.page)
    }

    pub fn zoom_in(&mut self) -> Option<RenderRequest> {
        self.page_count?;
        self.scale *= ZOOM_STEP;
        self.request_render(self.page)
    }

    pub fn zoom_out(&mut self) -> Option<RenderRequest> {
        self.page_count?;
        self.scale /= ZOOM_STEP;
        self.request_render(self.page)
    }

    /// Ask for `page` to be drawn. Returns the render to start now, or `None`
    /// if one is in flight (the page is queued, replacing any older request).
    pub fn request_render(&mut self, page: u32) -> Option<RenderRequest> {
        if self.rendering {
            self.pending_page = Some(page);
            return None;
        }
        Some(self.begin_render(page))
    }

    /// The in-flight render finished (or failed). Returns the queued render to
    /// start next, if any.
    pub fn render_finished(&mut self) -> Option<RenderRequest> {
        self.rendering = false;
        let page = self.pending_page.take()?;
        Some(self.begin_render(page))
    }

    /// "Page 3 / 12", or `None` with no document.
    pub fn page_label(&self) -> Option<String> {
        self.page_count
            .map(|count| format!("Page {} / {}", self.page, count))
    }

    pub fn zoom_label(&self) -> String {
        format!("{}%", (self.scale * 100.0).round() as i64)
    }

    fn begin_render(&mut self, page: u32) -> RenderRequest {
        self.rendering = true;
        RenderRequest {
            page,
            scale: self.scale,
        }
    }
}
