//! List pagination.
//!
//! Products page by number (`?page=&page_size=`); every other list uses
//! `?limit=&offset=`. Both render `{count, next, previous, results}` with
//! absolute `next`/`previous` links.

use axum::http::Uri;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

const INVALID_PAGE: &str = "Invalid page.";

/// A paginated response body.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    /// Re-map the results, keeping counts and links.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

/// The absolute URL of the current request, used to build page links.
#[derive(Debug, Clone)]
pub struct PageUrl(Option<Url>);

impl PageUrl {
    #[must_use]
    pub fn new(base_url: &str, uri: &Uri) -> Self {
        let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
        Self(Url::parse(&format!("{base_url}{path_and_query}")).ok())
    }

    /// This URL with `set` applied and `remove` dropped from the query.
    fn with(&self, set: &[(&str, i64)], remove: &[&str]) -> Option<String> {
        let mut url = self.0.clone()?;
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| !remove.contains(&k.as_ref()) && !set.iter().any(|(s, _)| s == k))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            pairs.extend_pairs(kept);
            for (key, value) in set {
                pairs.append_pair(key, &value.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Some(url.to_string())
    }
}

/// Raw `?page=&page_size=` parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// A validated page-number request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// Parse the query. A bad `page_size` falls back to the default; a bad `page` is a 404.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound("Invalid page.")` for a non-numeric or non-positive page.
    pub fn from_params(params: &PageParams) -> Result<Self> {
        let page = match params.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some("last") => i64::MAX,
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|p| *p >= 1)
                .ok_or_else(|| AppError::NotFound(INVALID_PAGE.to_string()))?,
        };
        Ok(Self {
            page,
            page_size: parse_size(params.page_size.as_deref()),
        })
    }

    /// Number of pages for `count` rows; an empty list still has one page.
    #[must_use]
    pub const fn page_count(&self, count: i64) -> i64 {
        if count <= 0 {
            1
        } else {
            (count + self.page_size - 1) / self.page_size
        }
    }

    /// Whether `?page=last` was requested.
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.page == i64::MAX
    }

    /// Resolve `last` once the row count is known.
    #[must_use]
    pub const fn resolve(self, count: i64) -> Self {
        if self.is_last() {
            Self {
                page: self.page_count(count),
                page_size: self.page_size,
            }
        } else {
            self
        }
    }

    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page.saturating_sub(1)).saturating_mul(self.page_size)
    }

    /// Wrap one page of results.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound("Invalid page.")` when the page is past the end.
    pub fn paginate<T>(self, results: Vec<T>, count: i64, url: &PageUrl) -> Result<Paginated<T>> {
        let pages = self.page_count(count);
        if self.page > pages {
            return Err(AppError::NotFound(INVALID_PAGE.to_string()));
        }
        let next = (self.page < pages).then(|| url.with(&[("page", self.page + 1)], &[]));
        let previous = (self.page > 1).then(|| {
            if self.page == 2 {
                url.with(&[], &["page"])
            } else {
                url.with(&[("page", self.page - 1)], &[])
            }
        });
        Ok(Paginated {
            count,
            next: next.flatten(),
            previous: previous.flatten(),
            results,
        })
    }
}

/// Raw `?limit=&offset=` parameters.
#[derive(Debug, Default, Deserialize)]
pub struct LimitOffsetParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// A validated limit/offset request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitOffset {
    pub limit: i64,
    pub offset: i64,
}

impl LimitOffset {
    /// Parse the query; invalid values fall back to defaults.
    #[must_use]
    pub fn from_params(params: &LimitOffsetParams) -> Self {
        let offset = params
            .offset
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|o| *o >= 0)
            .unwrap_or(0);
        Self {
            limit: parse_size(params.limit.as_deref()),
            offset,
        }
    }

    /// Wrap one window of results.
    #[must_use]
    pub fn paginate<T>(self, results: Vec<T>, count: i64, url: &PageUrl) -> Paginated<T> {
        let next = self
            .offset
            .checked_add(self.limit)
            .filter(|end| *end < count)
            .and_then(|end| url.with(&[("limit", self.limit), ("offset", end)], &[]));
        let previous = (self.offset > 0).then(|| {
            if self.offset <= self.limit {
                url.with(&[("limit", self.limit)], &["offset"])
            } else {
                url.with(&[("limit", self.limit), ("offset", self.offset - self.limit)], &[])
            }
        });
        Paginated {
            count,
            next,
            previous: previous.flatten(),
            results,
        }
    }
}

fn parse_size(raw: Option<&str>) -> i64 {
    raw.and_then(|r| r.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .map_or(DEFAULT_PAGE_SIZE, |n| n.min(MAX_PAGE_SIZE))
}
