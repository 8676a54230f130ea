//! @ai:module:intent Typed pagination and time-range parameters for run queries
//! @ai:module:layer domain
//! @ai:module:public_api PageRequest, TimeRange
//! @ai:module:stateless true

use crate::config::PagingConfig;
use crate::error::{Result, TrackerError};
use chrono::{DateTime, Utc};

/// @ai:intent Zero-based page index plus page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    /// @ai:intent Build a page request from optional parameters
    /// @ai:pre size, when given, is > 0
    /// @ai:post size <= paging.max_page_size
    /// @ai:effects pure
    pub fn from_params(page: Option<u32>, size: Option<u32>, paging: &PagingConfig) -> Result<Self> {
        let size = size.unwrap_or(paging.default_page_size);

        if size == 0 {
            return Err(TrackerError::Validation(
                "page size must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            page: page.unwrap_or(0),
            size: size.min(paging.max_page_size.max(1)),
        })
    }

    /// @ai:intent Row offset of the first element on this page
    /// @ai:effects pure
    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }

    /// @ai:effects pure
    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 0, size: 20 }
    }
}

/// @ai:intent Inclusive range on run start time; a missing bound is unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// @ai:intent Build a range, rejecting from > to
    /// @ai:effects pure
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Result<Self> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(TrackerError::Validation(format!(
                    "range start {} is after range end {}",
                    from.to_rfc3339(),
                    to.to_rfc3339()
                )));
            }
        }

        Ok(Self { from, to })
    }

    /// @ai:intent Range with no bounds
    /// @ai:effects pure
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// @ai:effects pure
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| ts >= from) && self.to.map_or(true, |to| ts <= to)
    }
}
