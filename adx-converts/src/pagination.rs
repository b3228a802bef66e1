//! Pagination for the convert list endpoint
//!
//! Pages are 0-indexed and hold [`PAGE_SIZE`] songs. Omitting the page
//! returns the whole list; a page past the end is empty.

use thiserror::Error;

/// Songs per page
pub const PAGE_SIZE: usize = 25;

/// Invalid `page` query parameter
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("page is not a number")]
    NotANumber,

    #[error("page is negative")]
    Negative,
}

/// Parse the raw `page` query value
///
/// `None` and the empty string both mean "no pagination". Any number is
/// accepted and rounded down, so `1.5` and `1e0` both select page 1.
pub fn parse_page(raw: Option<&str>) -> Result<Option<usize>, PageError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };

    let page: f64 = raw.parse().map_err(|_| PageError::NotANumber)?;
    if page.is_nan() {
        return Err(PageError::NotANumber);
    }
    if page < 0.0 {
        return Err(PageError::Negative);
    }
    // Saturating cast: infinity lands past the end of any list
    Ok(Some(page.floor() as usize))
}

/// Slice out page `page` of `items`, or all of them when `page` is `None`
pub fn paginate<T>(items: &[T], page: Option<usize>) -> &[T] {
    let Some(page) = page else {
        return items;
    };

    let start = page.saturating_mul(PAGE_SIZE).min(items.len());
    let end = start.saturating_add(PAGE_SIZE).min(items.len());
    &items[start..end]
}
