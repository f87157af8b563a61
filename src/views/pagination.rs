//! Page arithmetic for listing pages.
//!
//! Page 1 lives at `base`, page `n` at `"{n}/{base}"`. Links between pages
//! are relative to the current page's directory: from page 2 the first page
//! is `""`, from page 3 it is `"2/"`.

use serde::Serialize;
use url::Url;

use crate::error::{KilnError, Result};

/// Page geometry for one listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    total_items: usize,
    page_size: usize,
}

/// Everything a listing page needs to link to its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageContext {
    pub page: usize,
    pub number_of_pages: usize,
    pub current: String,
    pub previous: Option<String>,
    pub next: Option<String>,
}

impl Paginator {
    pub fn new(total_items: usize, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(KilnError::Pagination("page size must be positive".to_string()));
        }
        Ok(Self { total_items, page_size })
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn number_of_pages(&self) -> usize {
        self.total_items.div_ceil(self.page_size)
    }

    /// Index range of `page`'s items in the full listing.
    pub fn item_range(&self, page: usize) -> Result<std::ops::Range<usize>> {
        self.check_page(page)?;
        let start = ((page - 1) * self.page_size).min(self.total_items);
        let end = (start + self.page_size).min(self.total_items);
        Ok(start..end)
    }

    pub fn current_file_name(&self, page: usize, base: &str) -> Result<String> {
        self.check_page(page)?;
        let name = if page == 1 {
            base.to_string()
        } else {
            format!("{}/{}", page, base)
        };
        validate_fragment(&name)?;
        Ok(name)
    }

    pub fn previous_file_name(&self, page: usize) -> Result<Option<String>> {
        self.check_page(page)?;
        let name = match page {
            1 => return Ok(None),
            2 => String::new(),
            n => format!("{}/", n - 1),
        };
        validate_fragment(&name)?;
        Ok(Some(name))
    }

    pub fn next_file_name(&self, page: usize) -> Result<Option<String>> {
        self.check_page(page)?;
        if page >= self.number_of_pages() {
            return Ok(None);
        }
        let name = format!("{}/", page + 1);
        validate_fragment(&name)?;
        Ok(Some(name))
    }

    pub fn page_context(&self, page: usize, base: &str) -> Result<PageContext> {
        Ok(PageContext {
            page,
            number_of_pages: self.number_of_pages(),
            current: self.current_file_name(page, base)?,
            previous: self.previous_file_name(page)?,
            next: self.next_file_name(page)?,
        })
    }

    /// An empty listing still has a first page.
    fn check_page(&self, page: usize) -> Result<()> {
        let last = self.number_of_pages().max(1);
        if page == 0 || page > last {
            return Err(KilnError::Pagination(format!(
                "page {} out of range 1..={}",
                page, last
            )));
        }
        Ok(())
    }
}

/// Require a relative reference that resolves under a directory.
fn validate_fragment(fragment: &str) -> Result<()> {
    match Url::parse(fragment) {
        Ok(_) => {
            return Err(KilnError::Pagination(format!(
                "'{}' is an absolute URL, expected a relative path",
                fragment
            )));
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => {}
        Err(e) => {
            return Err(KilnError::Pagination(format!("'{}': {}", fragment, e)));
        }
    }
    if fragment.starts_with('/') || fragment.contains('\\') {
        return Err(KilnError::Pagination(format!(
            "'{}' must be relative to the listing directory",
            fragment
        )));
    }
    let base = Url::parse("http://listing.invalid/section/")
        .map_err(|e| KilnError::Pagination(e.to_string()))?;
    base.join(fragment)
        .map(|_| ())
        .map_err(|e| KilnError::Pagination(format!("'{}': {}", fragment, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_arithmetic() {
        let p = Paginator::new(5, 2).unwrap();
        assert_eq!(p.number_of_pages(), 3);
        assert_eq!(p.current_file_name(1, "index.html").unwrap(), "index.html");
        assert_eq!(p.current_file_name(2, "index.html").unwrap(), "2/index.html");
        assert_eq!(p.previous_file_name(1).unwrap(), None);
        assert_eq!(p.previous_file_name(2).unwrap().as_deref(), Some(""));
        assert_eq!(p.previous_file_name(3).unwrap().as_deref(), Some("2/"));
        assert_eq!(p.next_file_name(3).unwrap(), None);
        assert_eq!(p.next_file_name(2).unwrap().as_deref(), Some("3/"));
    }

    #[test]
    fn test_page_counts() {
        assert_eq!(Paginator::new(4, 2).unwrap().number_of_pages(), 2);
        assert_eq!(Paginator::new(1, 10).unwrap().number_of_pages(), 1);
        assert_eq!(Paginator::new(0, 10).unwrap().number_of_pages(), 0);
    }

    #[test]
    fn test_item_ranges() {
        let p = Paginator::new(5, 2).unwrap();
        assert_eq!(p.item_range(1).unwrap(), 0..2);
        assert_eq!(p.item_range(3).unwrap(), 4..5);
        assert_eq!(Paginator::new(0, 3).unwrap().item_range(1).unwrap(), 0..0);
    }

    #[test]
    fn test_page_context() {
        let ctx = Paginator::new(25, 10).unwrap().page_context(2, "index.html").unwrap();
        assert_eq!(
            ctx,
            PageContext {
                page: 2,
                number_of_pages: 3,
                current: "2/index.html".to_string(),
                previous: Some(String::new()),
                next: Some("3/".to_string()),
            }
        );
    }

    #[test]
    fn test_malformed_input_is_rejected() {
        assert!(matches!(Paginator::new(5, 0), Err(KilnError::Pagination(_))));

        let p = Paginator::new(5, 2).unwrap();
        assert!(matches!(p.current_file_name(0, "index.html"), Err(KilnError::Pagination(_))));
        assert!(p.next_file_name(4).is_err());
        assert!(p.current_file_name(1, "https://example.com/index.html").is_err());
        assert!(p.current_file_name(1, "/index.html").is_err());
        assert!(p.current_file_name(2, "index.html").is_ok());
    }
}
