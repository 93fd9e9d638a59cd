use chrono::{DateTime, Utc};

use crate::PageMeta;

/// True iff some page was modified strictly after `published_at`.
///
/// Without a parseable reference timestamp nothing can be proven stale, and a
/// page whose own timestamp does not parse is treated as unchanged.
pub fn has_unpublished_changes(pages: &[PageMeta], published_at: Option<&str>) -> bool {
    let Some(reference) = published_at.and_then(parse_timestamp) else {
        return false;
    };
    pages
        .iter()
        .filter_map(|page| parse_timestamp(&page.updated_at))
        .any(|updated| updated > reference)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}
