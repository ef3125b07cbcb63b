use serde::{Deserialize, Serialize};

pub const MAX_PAGE_SIZE: usize = 100;

// Define pagination query parameters
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

pub fn default_page() -> usize {
    1
}

pub fn default_page_size() -> usize {
    20
}

impl PaginationParams {
    /// Slices one page out of an already ordered result set.
    pub fn paginate<T>(&self, items: Vec<T>) -> (Vec<T>, Pagination) {
        let page = self.page.max(1);
        let page_size = self.page_size.clamp(1, MAX_PAGE_SIZE);
        let total = items.len();

        let page_items = items
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();

        let pagination = Pagination {
            current: page,
            pages: total.div_ceil(page_size),
            total,
        };

        (page_items, pagination)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current: usize,
    pub pages: usize,
    pub total: usize,
}
