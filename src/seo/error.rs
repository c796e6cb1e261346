//! Per-route SEO validation errors.
//!
//! These never abort a compile: the caller reports them and falls back to
//! the global defaults for the affected route.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeoError {
    #[error("`{field}` must be within 0.0..=1.0, got {value}")]
    OutOfRange { field: &'static str, value: f32 },

    #[error("`{0}` is not a valid date (expected YYYY-MM-DD or RFC 3339)")]
    InvalidDate(String),

    #[error("`{0}` is not a valid change frequency")]
    InvalidChangeFrequency(String),

    #[error("malformed sidecar: {0}")]
    Malformed(String),
}

/// Check that a numeric field lies within `0.0..=1.0`.
pub fn check_unit_interval(field: &'static str, value: f32) -> Result<f32, SeoError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(SeoError::OutOfRange { field, value })
    }
}
