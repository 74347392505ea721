use std::ops::Range;

/// One-based index of the next window to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageCursor(usize);

impl PageCursor {
    pub fn first() -> Self {
        PageCursor(1)
    }

    pub fn at(page: usize) -> Self {
        PageCursor(page.max(1))
    }

    pub fn page(self) -> usize {
        self.0
    }

    #[must_use]
    pub fn advance(self) -> Self {
        PageCursor(self.0.saturating_add(1))
    }

    /// Index range `[(p-1)*size, p*size)` into the posts collection.
    pub fn bounds(self, page_size: usize) -> Range<usize> {
        let start = (self.0 - 1).saturating_mul(page_size);
        start..start.saturating_add(page_size)
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollMetrics {
    pub viewport_height: usize,
    pub offset: usize,
    pub document_height: usize,
}

impl ScrollMetrics {
    pub fn at_bottom(&self) -> bool {
        self.viewport_height.saturating_add(self.offset) >= self.document_height
    }
}

/// Decides when the next load cycle starts. At most one cycle is in flight;
/// triggers that arrive meanwhile are dropped.
#[derive(Debug, Default)]
pub struct ScrollController {
    cursor: PageCursor,
    in_flight: bool,
    ignored: u64,
}

impl ScrollController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn ignored_triggers(&self) -> u64 {
        self.ignored
    }

    /// Handles one scroll event. Returns the page to load when the viewport
    /// reached the end of the document and no cycle is outstanding.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics) -> Option<PageCursor> {
        if !metrics.at_bottom() {
            return None;
        }
        self.begin()
    }

    pub fn begin(&mut self) -> Option<PageCursor> {
        if self.in_flight {
            self.ignored = self.ignored.saturating_add(1);
            return None;
        }
        self.in_flight = true;
        Some(self.cursor)
    }

    /// Stores the cursor returned by a finished cycle.
    pub fn finish(&mut self, next: PageCursor) {
        self.cursor = next;
        self.in_flight = false;
    }

    /// Releases the in-flight slot without moving the cursor.
    pub fn abandon(&mut self) {
        self.in_flight = false;
    }
}
