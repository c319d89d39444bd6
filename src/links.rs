//! Wikipedia link matching and title extraction.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::AnnotateError;

/// Links to Wikipedia pages, with or without scheme.
static WIKI_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:https?://)?\S+\.wikipedia\.org\S*").unwrap());

/// The `wiki/<title>` path segment with its optional `#anchor`.
/// The marker has to start a path component, so `/notwiki/Foo` is rejected.
static WIKI_PAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/wiki/[^\s#]+(?:#\S+)?").unwrap());

/// A page title extracted from a link. The identifier is taken verbatim from
/// the URL path: no percent-decoding, no normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReference {
    pub identifier: String,
    pub anchor: Option<String>,
}

/// All Wikipedia-looking links in `text`, left to right.
pub fn find_links(text: &str) -> impl Iterator<Item = &str> {
    WIKI_URL.find_iter(text).map(|m| m.as_str())
}

/// Derive the page title (and anchor, if any) from a single link.
pub fn extract_reference(link: &str) -> Result<PageReference, AnnotateError> {
    let segment = WIKI_PAGE
        .find(link)
        .map(|m| m.as_str().trim_start_matches('/'))
        .ok_or_else(|| AnnotateError::extraction(link))?;

    let parts: Vec<&str> = segment.split('#').collect();
    let (title, anchor) = match parts.as_slice() {
        [title] => (*title, None),
        [title, anchor] => (*title, Some(anchor.to_string())),
        _ => return Err(AnnotateError::extraction(link)),
    };

    let identifier = title.strip_prefix("wiki/").unwrap_or(title);

    Ok(PageReference {
        identifier: identifier.to_string(),
        anchor,
    })
}
