use crate::domain::{metadata::Timestamp, window::ReleaseWindow};

use super::error::ReleaseError;

/// Cache directive for the steady states before and after the release window.
pub const STEADY_CACHE_CONTROL: &str = "public, max-age=604800, must-revalidate";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Share of the album released, in `[0, 100]`
    pub percent_released: f64,
    /// Seconds until the released segment count may next change.
    /// `None` when it cannot change anymore by waiting (or has been pinned).
    pub refresh_in_seconds: Option<u64>,
}

impl Progress {
    /// Progress that is not tied to the clock
    pub fn pinned(percent_released: f64) -> Self {
        Self {
            percent_released,
            refresh_in_seconds: None,
        }
    }

    /// Shortens the refresh interval so the response expires no later than `deadline` seconds.
    /// Steady states keep their long-lived directive.
    pub fn expiring_within(self, deadline: Option<u64>) -> Self {
        let refresh_in_seconds = match (self.refresh_in_seconds, deadline) {
            (Some(refresh), Some(deadline)) => Some(refresh.min(deadline)),
            (refresh, _) => refresh,
        };
        Self {
            refresh_in_seconds,
            ..self
        }
    }

    /// Value of the `Cache-Control` header for a response computed at this progress.
    pub fn cache_control(&self) -> String {
        match self.refresh_in_seconds {
            Some(seconds) => format!("public, max-age={seconds}"),
            None => STEADY_CACHE_CONTROL.to_string(),
        }
    }
}

/// Computes how far into the release `now` is.
///
/// The window is split into `segment_count` equal ticks, and the refresh interval is the
/// time left until the next tick boundary, rounded up to whole seconds.
pub fn compute_progress(
    now: Timestamp,
    release_start: Timestamp,
    release_end: Timestamp,
    segment_count: usize,
) -> Result<Progress, ReleaseError> {
    if segment_count == 0 {
        return Err(ReleaseError::NoSegments);
    }
    let window = ReleaseWindow::new(release_start, release_end)?;

    if now <= window.start() {
        return Ok(Progress::pinned(0.0));
    }
    if now >= window.end() {
        return Ok(Progress::pinned(100.0));
    }

    // both are positive here: start < now < end
    let elapsed_ms = (now - window.start()).num_milliseconds().max(0) as u64;
    let window_ms = window.duration().num_milliseconds().max(1) as u64;

    let percent_released = 100.0 * elapsed_ms as f64 / window_ms as f64;

    let release_interval = window_ms.div_ceil(segment_count as u64);
    let until_next_tick = release_interval - elapsed_ms % release_interval;
    let refresh_in_seconds = until_next_tick.div_ceil(1000);

    log::trace!(
        "progress {percent_released:.4}% (tick {release_interval} ms, next in {until_next_tick} ms)"
    );

    Ok(Progress {
        percent_released,
        refresh_in_seconds: Some(refresh_in_seconds),
    })
}
