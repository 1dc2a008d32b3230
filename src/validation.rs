//! Client-side form checks run before any mutation is sent.

use crate::error::{ApiError, ApiResult};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static HTTP_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid URL regex"));

/// A form that can be checked locally before it is submitted.
///
/// Implementations run the derived `validator` rules first, then any cross-field rule.
pub trait FormCheck {
    fn check(&self) -> ApiResult<()>;
}

pub fn ensure_end_after_start(start: NaiveDate, end: NaiveDate) -> ApiResult<()> {
    if end > start {
        Ok(())
    } else {
        Err(ApiError::Validation(
            "End date must be after start date".to_string(),
        ))
    }
}

pub fn ensure_http_url(url: &str) -> ApiResult<()> {
    if HTTP_URL.is_match(url.trim()) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "'{}' is not a valid http(s) link",
            url
        )))
    }
}

pub fn ensure_not_blank(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        Err(ApiError::Validation(format!("{} is required", field)))
    } else {
        Ok(())
    }
}
