use axum::http::Uri;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{TaskError, TaskResult};

/// Number of items per page. A deployment constant, not a request parameter.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Pagination envelope wrapping every list response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Page<T> {
    /// Total matches after filtering, before pagination
    pub count: u64,
    /// Link to the next page, if any
    pub next: Option<String>,
    /// Link to the previous page, if any
    pub previous: Option<String>,
    /// The current page of results
    pub results: Vec<T>,
}

/// A validated page number (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u64,
}

impl PageRequest {
    /// Parse the `page` query value. Absent means page 1; non-numeric or
    /// zero values are rejected as an unknown page.
    pub fn from_param(raw: Option<&str>) -> TaskResult<Self> {
        let number = match raw {
            None => 1,
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or(TaskError::InvalidPage)?,
        };

        Ok(Self { number })
    }

    pub fn offset(&self) -> u64 {
        (self.number - 1) * DEFAULT_PAGE_SIZE
    }

    pub fn limit(&self) -> u64 {
        DEFAULT_PAGE_SIZE
    }
}

/// Total number of pages for a result set. Page 1 always exists, even for
/// an empty result set.
fn total_pages(count: u64) -> u64 {
    count.div_ceil(DEFAULT_PAGE_SIZE).max(1)
}

impl<T> Page<T> {
    /// Assemble the envelope, rejecting page numbers past the last page.
    ///
    /// `next`/`previous` links are derived from the request URI with the
    /// `page` parameter substituted.
    pub fn build(results: Vec<T>, count: u64, page: PageRequest, uri: &Uri) -> TaskResult<Self> {
        let pages = total_pages(count);
        if page.number > pages {
            return Err(TaskError::InvalidPage);
        }

        let next = (page.number < pages).then(|| page_link(uri, page.number + 1));
        let previous = (page.number > 1).then(|| page_link(uri, page.number - 1));

        Ok(Self {
            count,
            next,
            previous,
            results,
        })
    }
}

/// Rewrite the request URI with a different `page` value.
///
/// The `page` parameter is omitted entirely for page 1, so the first-page
/// link is the bare filtered URL.
fn page_link(uri: &Uri, page: u64) -> String {
    let path = uri.path();

    let mut params: Vec<(String, String)> = uri.query().map(parse_query).unwrap_or_default();
    params.retain(|(key, _)| key != "page");
    if page > 1 {
        params.push(("page".to_string(), page.to_string()));
    }

    if params.is_empty() {
        path.to_string()
    } else {
        let query = params
            .iter()
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", path, query)
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (decode(key), decode(value)),
            None => (decode(pair), String::new()),
        })
        .collect()
}

fn decode(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}
