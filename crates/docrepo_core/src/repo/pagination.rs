//! Pagination input normalization and the paginated result envelope.
//!
//! # Invariants
//! - `take >= 1`, `page >= 1`, `skip == (page - 1) * take`.
//! - `search` is `None` or a non-blank term.

use crate::config::DEFAULT_PAGE_SIZE;
use crate::repo::error::{RepoError, RepoResult};
use serde::{Deserialize, Serialize};

const DEFAULT_PAGE: &str = "1";

/// Raw, unparsed pagination input as received from a transport layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPagination {
    pub limit: Option<String>,
    pub page: Option<String>,
    pub search: Option<String>,
}

/// Normalized pagination parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationParams {
    pub take: u64,
    pub page: u64,
    pub skip: u64,
    pub search: Option<String>,
}

impl PaginationParams {
    /// Typed constructor.
    ///
    /// # Errors
    /// - `InvalidArgument` when `take` or `page` is zero.
    pub fn new(take: u64, page: u64) -> RepoResult<Self> {
        if take == 0 {
            return Err(RepoError::InvalidArgument(
                "limit must be a positive integer".to_string(),
            ));
        }
        if page == 0 {
            return Err(RepoError::InvalidArgument(
                "page must be a positive integer".to_string(),
            ));
        }
        let skip = (page - 1).checked_mul(take).ok_or_else(|| {
            RepoError::InvalidArgument(format!("page {page} with limit {take} is out of range"))
        })?;
        Ok(Self {
            take,
            page,
            skip,
            search: None,
        })
    }

    /// Returns a copy carrying `search`; blank terms clear it.
    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search
            .map(|term| term.trim().to_string())
            .filter(|term| !term.is_empty());
        self
    }

    /// Parses raw input with the default limit of 20.
    pub fn from_raw(raw: RawPagination) -> RepoResult<Self> {
        Self::from_raw_with_default_limit(raw, u64::from(DEFAULT_PAGE_SIZE))
    }

    /// Parses raw input; a missing page is `"1"`, a missing limit is
    /// `default_limit`.
    ///
    /// # Errors
    /// - `InvalidArgument` for non-numeric, zero or negative values.
    pub fn from_raw_with_default_limit(raw: RawPagination, default_limit: u64) -> RepoResult<Self> {
        let take = match raw.limit.as_deref() {
            Some(limit) => parse_positive("limit", limit)?,
            None => default_limit,
        };
        let page = parse_positive("page", raw.page.as_deref().unwrap_or(DEFAULT_PAGE))?;
        Ok(Self::new(take, page)?.with_search(raw.search))
    }

    /// Whether a non-blank search term is present.
    pub fn has_search(&self) -> bool {
        self.search.is_some()
    }
}

fn parse_positive(name: &str, raw: &str) -> RepoResult<u64> {
    let value: i64 = raw.trim().parse().map_err(|_| {
        RepoError::InvalidArgument(format!("{name} must be a positive integer, got `{raw}`"))
    })?;
    if value <= 0 {
        return Err(RepoError::InvalidArgument(format!(
            "{name} must be a positive integer, got `{raw}`"
        )));
    }
    Ok(value as u64)
}

/// One page of results plus the size of the whole filtered set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub total: u64,
    pub data: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::{PaginationParams, RawPagination};
    use crate::repo::error::RepoError;

    #[test]
    fn defaults_to_first_page_of_twenty() {
        let params = PaginationParams::from_raw(RawPagination::default()).unwrap();
        assert_eq!(params.take, 20);
        assert_eq!(params.page, 1);
        assert_eq!(params.skip, 0);
        assert_eq!(params.search, None);
    }

    #[test]
    fn skip_is_page_offset_times_take() {
        let params = PaginationParams::from_raw(RawPagination {
            limit: Some("10".to_string()),
            page: Some("3".to_string()),
            search: Some("  ann ".to_string()),
        })
        .unwrap();
        assert_eq!(params.skip, 20);
        assert_eq!(params.search.as_deref(), Some("ann"));
    }

    #[test]
    fn rejects_non_numeric_and_non_positive_values() {
        for (limit, page) in [("abc", "1"), ("10", "x"), ("0", "1"), ("10", "-2")] {
            let result = PaginationParams::from_raw(RawPagination {
                limit: Some(limit.to_string()),
                page: Some(page.to_string()),
                search: None,
            });
            assert!(
                matches!(result, Err(RepoError::InvalidArgument(_))),
                "limit={limit} page={page}"
            );
        }
    }

    #[test]
    fn blank_search_is_absent() {
        let params = PaginationParams::new(5, 1)
            .unwrap()
            .with_search(Some("   ".to_string()));
        assert!(!params.has_search());
    }
}
