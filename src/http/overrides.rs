//! Development-only query parameters that simulate a release.
//!
//! `progress` pins the released percentage and takes precedence over the clock.
//! `releaseStart` and `releaseEnd` replace the stored window and must come together.
//! Any malformed parameter rejects the whole request.

use chrono::DateTime;
use rouille::Request;
use thiserror::Error;

use crate::domain::{metadata::Timestamp, window::ReleaseWindow};

pub const PROGRESS: &str = "progress";
pub const RELEASE_START: &str = "releaseStart";
pub const RELEASE_END: &str = "releaseEnd";

#[derive(Debug, Error, PartialEq)]
pub enum OverrideError {
    #[error("progress must be a number between 0 and 100, got '{0}'")]
    InvalidProgress(String),

    #[error("releaseStart and releaseEnd must be given together")]
    IncompleteWindow,

    #[error("{param} is not an ISO-8601 timestamp: '{value}'")]
    InvalidTimestamp { param: &'static str, value: String },

    #[error("releaseEnd must be after releaseStart")]
    InvalidWindow,
}

#[derive(Debug, Default, PartialEq)]
pub struct Overrides {
    pub progress: Option<f64>,
    pub window: Option<ReleaseWindow>,
}

impl Overrides {
    pub fn from_request(request: &Request) -> Result<Self, OverrideError> {
        Self::parse(
            request.get_param(PROGRESS).as_deref(),
            request.get_param(RELEASE_START).as_deref(),
            request.get_param(RELEASE_END).as_deref(),
        )
    }

    pub fn parse(
        progress: Option<&str>,
        release_start: Option<&str>,
        release_end: Option<&str>,
    ) -> Result<Self, OverrideError> {
        let progress = progress.map(parse_progress).transpose()?;

        let window = match (release_start, release_end) {
            (None, None) => None,
            (Some(start), Some(end)) => {
                let start = parse_timestamp(RELEASE_START, start)?;
                let end = parse_timestamp(RELEASE_END, end)?;
                Some(ReleaseWindow::new(start, end).map_err(|_| OverrideError::InvalidWindow)?)
            }
            _ => return Err(OverrideError::IncompleteWindow),
        };

        Ok(Self { progress, window })
    }

    /// Whether the request carries any override parameter at all
    pub fn present_in(request: &Request) -> bool {
        [PROGRESS, RELEASE_START, RELEASE_END]
            .iter()
            .any(|param| request.get_param(param).is_some())
    }
}

fn parse_progress(value: &str) -> Result<f64, OverrideError> {
    match value.trim().parse::<f64>() {
        Ok(percent) if (0.0..=100.0).contains(&percent) => Ok(percent),
        _ => Err(OverrideError::InvalidProgress(value.to_string())),
    }
}

fn parse_timestamp(param: &'static str, value: &str) -> Result<Timestamp, OverrideError> {
    let mut value = value.trim().to_string();
    // an unencoded '+' in a `±HH:MM` offset arrives as a space
    if let Some(offset) = value.len().checked_sub(6) {
        let tail = value.as_bytes();
        if offset > 10 && tail[offset] == b' ' && tail[offset + 3] == b':' {
            value.replace_range(offset..offset + 1, "+");
        }
    }
    // RFC 3339 allows a space between date and time
    if value.as_bytes().get(10) == Some(&b' ') {
        value.replace_range(10..11, "T");
    }
    DateTime::parse_from_rfc3339(&value)
        .map_err(|_| OverrideError::InvalidTimestamp { param, value })
}
