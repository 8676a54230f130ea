//! @ai:module:intent Decoding of query parameters and request bodies at the HTTP boundary
//! @ai:module:layer presentation
//! @ai:module:public_api RangeParams, PageParams, parse_timestamp, parse_measurements
//! @ai:module:stateless true

use crate::config::PagingConfig;
use crate::error::{Result, TrackerError};
use crate::model::{Measurement, PageRequest, TimeRange};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

/// @ai:intent Raw `page`/`size` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub size: Option<String>,
}

impl PageParams {
    /// @ai:intent Validate into a typed page request
    /// @ai:effects pure
    pub fn to_page(&self, paging: &PagingConfig) -> Result<PageRequest> {
        let page = parse_number("page", self.page.as_deref())?;
        let size = parse_number("size", self.size.as_deref())?;
        PageRequest::from_params(page, size, paging)
    }
}

/// @ai:intent Raw `from`/`to`/`page`/`size` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
}

impl RangeParams {
    /// @ai:intent Validate into a typed time range
    /// @ai:effects pure
    pub fn to_range(&self) -> Result<TimeRange> {
        let from = self.from.as_deref().map(parse_timestamp).transpose()?;
        let to = self.to.as_deref().map(parse_timestamp).transpose()?;
        TimeRange::new(from, to)
    }

    /// @ai:effects pure
    pub fn to_page(&self, paging: &PagingConfig) -> Result<PageRequest> {
        PageParams {
            page: self.page.clone(),
            size: self.size.clone(),
        }
        .to_page(paging)
    }
}

fn parse_number(what: &str, value: Option<&str>) -> Result<Option<u32>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v.parse::<u32>().map(Some).map_err(|_| {
            TrackerError::Validation(format!("{} must be a non-negative integer, got {}", what, v))
        }),
    }
}

/// @ai:intent Parse an ISO-8601 date-time into UTC
///
/// Accepts RFC 3339 with an offset, a trailing `[Zone]` suffix, and offset-less
/// values (read as UTC). A `+` decoded to a space by form decoding is restored.
/// @ai:effects pure
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let mut value = raw.trim().replace(' ', "+");

    if let Some(bracket) = value.find('[') {
        value.truncate(bracket);
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(&value) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(&value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| TrackerError::Validation(format!("invalid ISO-8601 date-time: {}", raw)))
}

/// @ai:intent Decode a JSON array of measurements from a request body
/// @ai:effects pure
pub fn parse_measurements(body: &[u8]) -> Result<Vec<Measurement>> {
    serde_json::from_slice(body)
        .map_err(|e| TrackerError::Validation(format!("invalid measurements payload: {}", e)))
}
