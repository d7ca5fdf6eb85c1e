/// Client-side pagination of a loaded list.
///
/// Page numbers are 1-based. An empty list still has one page, so the
/// label never reads "de 0".
#[derive(Debug, Clone)]
pub struct Pagination<T> {
    items: Vec<T>,
    page: usize,
    page_size: usize,
}

impl<T> Pagination<T> {
    pub fn new(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Replace the list and go back to page 1.
    pub fn reset(&mut self, items: Vec<T>) {
        self.items = items;
        self.page = 1;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        self.items.len().div_ceil(self.page_size).max(1)
    }

    /// Items on the current page.
    pub fn current(&self) -> &[T] {
        let start = (self.page - 1) * self.page_size;
        let end = (start + self.page_size).min(self.items.len());
        self.items.get(start..end).unwrap_or(&[])
    }

    /// Advance one page. Returns `false` on the last page.
    pub fn next(&mut self) -> bool {
        if self.page < self.page_count() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    /// Go back one page. Returns `false` on the first page.
    pub fn prev(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to `page`, clamped to the valid range.
    pub fn go_to(&mut self, page: usize) {
        self.page = page.clamp(1, self.page_count());
    }

    pub fn label(&self) -> String {
        format!("Página {} de {}", self.page, self.page_count())
    }
}
