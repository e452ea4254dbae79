//! Listing contract shared by product and order listings.
//!
//! A listing is a page window over a result set ordered by one allow-listed
//! column (ties broken by id, ascending), plus the total number of matching
//! rows so clients can paginate.

use core::fmt::Debug;
use core::ops::Range;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Page size used when the client does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size a client may request. Larger values are rejected, for
/// every entity alike.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    /// SQL keyword for this direction.
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(DomainError::validation(format!(
                "sort_order must be one of: asc, desc (got '{other}')"
            ))),
        }
    }
}

/// An allow-listed sort column for one entity.
///
/// `as_str` doubles as the column name in the relational schema, so only
/// values from `ALL` ever reach a query.
pub trait SortField: Copy + Default + Eq + Debug + Send + Sync + 'static {
    /// Every accepted value, in documentation order.
    const ALL: &'static [Self];

    fn as_str(self) -> &'static str;

    /// Text columns compare byte-wise in every backend.
    fn is_text(self) -> bool {
        false
    }

    /// Parse a client-supplied column name. Unknown names are a validation
    /// error; they never fall back to the default.
    fn parse(raw: &str) -> DomainResult<Self> {
        let raw = raw.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == raw)
            .ok_or_else(|| {
                let allowed = Self::ALL
                    .iter()
                    .map(|f| f.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                DomainError::validation(format!("sort_by must be one of: {allowed} (got '{raw}')"))
            })
    }
}

/// 1-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> DomainResult<Self> {
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);

        if page == 0 {
            return Err(DomainError::validation("page must be >= 1"));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(DomainError::validation(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of rows skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }

    /// Index range of this page within a result set of `len` rows. Pages past
    /// the end yield an empty range.
    pub fn window(&self, len: usize) -> Range<usize> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX).min(len);
        let end = start.saturating_add(self.page_size as usize).min(len);
        start..end
    }
}

/// Fully validated listing request for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery<S: SortField> {
    pub page: PageRequest,
    pub sort_by: S,
    pub sort_order: SortOrder,
}

impl<S: SortField> Default for ListQuery<S> {
    fn default() -> Self {
        Self {
            page: PageRequest::default(),
            sort_by: S::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl<S: SortField> ListQuery<S> {
    /// Build a listing request from raw query-string values.
    pub fn parse(
        page: Option<u32>,
        page_size: Option<u32>,
        sort_by: Option<&str>,
        sort_order: Option<&str>,
    ) -> DomainResult<Self> {
        Ok(Self {
            page: PageRequest::new(page, page_size)?,
            sort_by: sort_by.map(S::parse).transpose()?.unwrap_or_default(),
            sort_order: sort_order.map(str::parse::<SortOrder>).transpose()?.unwrap_or_default(),
        })
    }
}

/// One page of results plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    /// Number of rows matching the listing across all pages.
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page(),
            page_size: request.page_size(),
            total,
            total_pages: total.div_ceil(request.limit()),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    enum Col {
        #[default]
        Id,
        Name,
    }

    impl SortField for Col {
        const ALL: &'static [Self] = &[Col::Id, Col::Name];

        fn as_str(self) -> &'static str {
            match self {
                Col::Id => "id",
                Col::Name => "name",
            }
        }
    }

    #[test]
    fn defaults_apply_when_nothing_is_supplied() {
        let q = ListQuery::<Col>::parse(None, None, None, None).unwrap();
        assert_eq!(q.page.page(), 1);
        assert_eq!(q.page.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(q.sort_by, Col::Id);
        assert_eq!(q.sort_order, SortOrder::Asc);
    }

    #[test]
    fn unknown_sort_column_is_rejected() {
        let err = ListQuery::<Col>::parse(None, None, Some("password"), None).unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("id, name")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn sort_order_is_case_insensitive_but_closed() {
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn page_bounds_are_validated() {
        assert!(PageRequest::new(Some(0), None).is_err());
        assert!(PageRequest::new(None, Some(0)).is_err());
        assert!(PageRequest::new(None, Some(MAX_PAGE_SIZE + 1)).is_err());
        assert!(PageRequest::new(None, Some(MAX_PAGE_SIZE)).is_ok());
    }

    #[test]
    fn windows_over_three_rows() {
        let p1 = PageRequest::new(Some(1), Some(2)).unwrap();
        let p2 = PageRequest::new(Some(2), Some(2)).unwrap();
        let p3 = PageRequest::new(Some(3), Some(2)).unwrap();
        assert_eq!(p1.window(3), 0..2);
        assert_eq!(p2.window(3), 2..3);
        assert!(p3.window(3).is_empty());
    }

    #[test]
    fn page_metadata_counts_pages() {
        let req = PageRequest::new(Some(3), Some(2)).unwrap();
        let page: Page<u8> = Page::new(vec![], req, 3);
        assert_eq!(page.total_pages, 2);
        assert!(page.items.is_empty());

        let empty: Page<u8> = Page::new(vec![], PageRequest::default(), 0);
        assert_eq!(empty.total_pages, 0);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Consecutive pages tile the result set: no overlap, no gaps.
            #[test]
            fn consecutive_windows_tile_the_result_set(
                len in 0usize..500,
                page_size in 1u32..=MAX_PAGE_SIZE,
            ) {
                let mut next = 0usize;
                let pages = len.div_ceil(page_size as usize) + 1;
                for page in 1..=pages as u32 {
                    let w = PageRequest::new(Some(page), Some(page_size)).unwrap().window(len);
                    if w.is_empty() {
                        prop_assert_eq!(next, len);
                    } else {
                        prop_assert_eq!(w.start, next);
                        prop_assert!(w.len() <= page_size as usize);
                        next = w.end;
                    }
                }
                prop_assert_eq!(next, len);
            }
        }
    }
}
