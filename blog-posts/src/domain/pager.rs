use serde::{Deserialize, Serialize};

pub const DEFAULT_ITEMS_PER_PAGE: usize = 10;

/// Page window over a listing. Listing operations call [`Pager::configure`]
/// with the size of the full result set, which fixes the page count and
/// clamps `current_page` into range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pager {
    pub current_page: usize,
    pub items_per_page: usize,
    pub total: usize,
    pub total_pages: usize,
    pub newer: usize,
    pub older: usize,
    pub show_newer: bool,
    pub show_older: bool,
}

impl Pager {
    pub fn new(current_page: usize, items_per_page: usize) -> Self {
        let items_per_page = if items_per_page == 0 {
            DEFAULT_ITEMS_PER_PAGE
        } else {
            items_per_page
        };
        let mut pager = Self {
            current_page: current_page.max(1),
            items_per_page,
            total: 0,
            total_pages: 0,
            newer: 0,
            older: 0,
            show_newer: false,
            show_older: false,
        };
        pager.update_navigation();
        pager
    }

    pub fn configure(&mut self, total: usize) {
        if self.items_per_page == 0 {
            self.items_per_page = DEFAULT_ITEMS_PER_PAGE;
        }
        self.total = total;
        self.total_pages = total.div_ceil(self.items_per_page);
        self.current_page = self.current_page.clamp(1, self.total_pages.max(1));
        self.update_navigation();
    }

    pub fn skip(&self) -> usize {
        (self.current_page.max(1) - 1).saturating_mul(self.items_per_page)
    }

    /// Configures the pager with the length of `items` and returns the
    /// items of the current page.
    pub fn window<T>(&mut self, items: Vec<T>) -> Vec<T> {
        self.configure(items.len());
        items
            .into_iter()
            .skip(self.skip())
            .take(self.items_per_page)
            .collect()
    }

    fn update_navigation(&mut self) {
        self.newer = self.current_page.saturating_sub(1);
        self.older = self.current_page.saturating_add(1);
        self.show_newer = self.current_page > 1;
        self.show_older = self.current_page < self.total_pages;
    }
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(1, DEFAULT_ITEMS_PER_PAGE)
    }
}
