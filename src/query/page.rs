//! Pagination and sort parameters.

use super::filter::AttributePath;
use crate::error::{ScimError, ScimResult};

use std::fmt;
use std::str::FromStr;

/// Requested page of a query result. `start_index` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParameters {
    pub start_index: usize,
    /// `None` means "use the service default"
    pub count: Option<usize>,
}

impl Default for PageParameters {
    fn default() -> Self {
        Self {
            start_index: 1,
            count: None,
        }
    }
}

impl PageParameters {
    pub fn new(start_index: usize, count: Option<usize>) -> Self {
        Self {
            start_index: start_index.max(1),
            count,
        }
    }

    /// Build from raw request values. A start index below 1 is treated as 1
    /// and a negative count as 0.
    pub fn from_request(start_index: Option<i64>, count: Option<i64>) -> Self {
        let start_index = start_index.unwrap_or(1).max(1) as usize;
        let count = count.map(|c| c.max(0) as usize);
        Self { start_index, count }
    }

    /// Fill in the default page size when none was requested.
    pub fn with_default_count(mut self, default_count: Option<usize>) -> Self {
        if self.count.is_none() {
            self.count = default_count;
        }
        self
    }

    /// The slice of `items` this page covers. Starting past the end yields
    /// an empty slice; a start index of 0 reads as 1.
    ///
    /// ```rust
    /// use scim_directory::query::PageParameters;
    ///
    /// let items: Vec<u32> = (1..=10).collect();
    /// assert_eq!(PageParameters::new(1, Some(3)).slice(&items), &[1, 2, 3]);
    /// assert!(PageParameters::new(11, Some(3)).slice(&items).is_empty());
    /// ```
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.start_index.saturating_sub(1).min(items.len());
        let end = match self.count {
            Some(count) => start.saturating_add(count).min(items.len()),
            None => items.len(),
        };
        &items[start..end]
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortOrder {
    type Err = ScimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "ascending" => Ok(Self::Ascending),
            "descending" => Ok(Self::Descending),
            other => Err(ScimError::invalid_request(format!(
                "Invalid sortOrder '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => f.write_str("ascending"),
            Self::Descending => f.write_str("descending"),
        }
    }
}

/// `sortBy` / `sortOrder` of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortParameters {
    pub sort_by: AttributePath,
    pub order: SortOrder,
}

impl SortParameters {
    pub fn new(sort_by: AttributePath, order: SortOrder) -> Self {
        Self { sort_by, order }
    }

    /// Parse raw `sortBy` and optional `sortOrder` values.
    pub fn parse(sort_by: &str, sort_order: Option<&str>) -> ScimResult<Self> {
        Ok(Self {
            sort_by: AttributePath::parse(sort_by)?,
            order: sort_order.map(SortOrder::from_str).transpose()?.unwrap_or_default(),
        })
    }

    pub fn is_descending(&self) -> bool {
        self.order == SortOrder::Descending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages() {
        let items: Vec<u32> = (1..=10).collect();
        assert_eq!(PageParameters::new(4, Some(3)).slice(&items), &[4, 5, 6]);
        assert_eq!(PageParameters::new(10, Some(3)).slice(&items), &[10]);
        assert_eq!(PageParameters::new(1, None).slice(&items).len(), 10);
        assert!(PageParameters::new(1, Some(0)).slice(&items).is_empty());
    }

    #[test]
    fn test_zero_start_index_reads_from_first_item() {
        let items: Vec<u32> = (1..=5).collect();
        let page = PageParameters {
            start_index: 0,
            count: Some(2),
        };
        assert_eq!(page.slice(&items), &[1, 2]);
        assert_eq!(PageParameters { start_index: 0, count: None }.slice(&items).len(), 5);
    }

    #[test]
    fn test_from_request_clamps() {
        let page = PageParameters::from_request(Some(0), Some(-5));
        assert_eq!(page.start_index, 1);
        assert_eq!(page.count, Some(0));

        let page = PageParameters::from_request(None, None).with_default_count(Some(100));
        assert_eq!(page, PageParameters::new(1, Some(100)));
    }

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!("Descending".parse::<SortOrder>().unwrap(), SortOrder::Descending);
        assert_eq!("".parse::<SortOrder>().unwrap(), SortOrder::Ascending);
        assert!("sideways".parse::<SortOrder>().is_err());

        let sort = SortParameters::parse("meta.created", None).unwrap();
        assert!(!sort.is_descending());
        assert_eq!(sort.sort_by.sub_attribute.as_deref(), Some("created"));
    }
}
