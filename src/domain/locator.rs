//! Page-locator resolution.

use crate::domain::entities::{PageHandle, PageLocator};

/// Resolve a bookmark destination to a 1-based page number.
///
/// Direct page numbers are returned unchanged. An object reference resolves to
/// the first page whose content stream object number is not lower than the
/// reference. That only holds while the producer of the document allocates
/// object numbers in page order, which most writers do but nothing guarantees.
///
/// Returns `None` when no page qualifies.
pub fn resolve(locator: PageLocator, pages: &[PageHandle]) -> Option<u32> {
    match locator {
        PageLocator::Page(number) => Some(number),
        PageLocator::Reference(id) => pages
            .iter()
            .find(|page| page.content_id.is_some_and(|content| content >= id))
            .map(|page| page.number),
    }
}
