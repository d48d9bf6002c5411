//! Limit/offset pagination of listings.
//!
//! Pagination only kicks in when the client asks for it with a positive `limit`;
//! otherwise the listing is returned as a plain array.

use axum::http::Uri;
use serde::{Deserialize, Serialize};
use yatube_db::store::Page;

const LIMIT_PARAM: &str = "limit";
const OFFSET_PARAM: &str = "offset";

/// Raw `limit` and `offset` query parameters. They are kept as strings so that
/// malformed values fall back to defaults instead of failing the request.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct PageParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl PageParams {
    /// The requested window, or `None` when no valid positive limit was given.
    #[must_use]
    pub fn page(&self) -> Option<Page> {
        let limit = self
            .limit
            .as_deref()
            .and_then(parse_count)
            .filter(|limit| *limit > 0)?;
        let offset = self.offset.as_deref().and_then(parse_count).unwrap_or(0);

        Some(Page { limit, offset })
    }
}

fn parse_count(value: &str) -> Option<u64> {
    value.trim().parse().ok()
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Paginated<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    /// Wraps one page of `results` out of `count` items. Links keep every other
    /// query parameter of `uri`.
    #[must_use]
    pub fn new(page: Page, uri: &Uri, count: u64, results: Vec<T>) -> Self {
        let next = (page.offset.saturating_add(page.limit) < count)
            .then(|| page_link(uri, page.limit, Some(page.offset + page.limit)));

        let previous = match page.offset {
            0 => None,
            offset if offset <= page.limit => Some(page_link(uri, page.limit, None)),
            offset => Some(page_link(uri, page.limit, Some(offset - page.limit))),
        };

        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

/// Either a bare listing or one page of it.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
#[serde(untagged)]
pub enum Listing<T> {
    All(Vec<T>),
    Page(Paginated<T>),
}

fn page_link(uri: &Uri, limit: u64, offset: Option<u64>) -> String {
    let mut pairs: Vec<String> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split_once('=').map_or(*pair, |(key, _)| key);
            key != LIMIT_PARAM && key != OFFSET_PARAM
        })
        .map(str::to_owned)
        .collect();

    pairs.push(format!("{LIMIT_PARAM}={limit}"));
    if let Some(offset) = offset {
        pairs.push(format!("{OFFSET_PARAM}={offset}"));
    }
    pairs.sort();

    format!("{}?{}", uri.path(), pairs.join("&"))
}
