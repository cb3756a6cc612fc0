use chrono::Duration;

use super::{error::MetadataError, metadata::Timestamp};

/// Interval during which the album is progressively revealed. Always non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseWindow {
    start: Timestamp,
    end: Timestamp,
}

impl ReleaseWindow {
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, MetadataError> {
        if end <= start {
            return Err(MetadataError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Instant at which `percent` of the window has elapsed.
    pub fn instant_at(&self, percent: f64) -> Timestamp {
        let percent = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };
        let offset_ms = (self.duration().num_milliseconds() as f64 * percent / 100.0).round();
        self.start + Duration::milliseconds(offset_ms as i64)
    }
}
