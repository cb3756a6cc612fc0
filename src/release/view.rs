use crate::domain::{
    metadata::{CompleteMetadata, PartialMetadata, Timestamp},
    window::ReleaseWindow,
};

use super::{
    error::ReleaseError,
    links::{gate_links, next_link_reveal},
    progress::{Progress, compute_progress},
    redact::redact,
};

/// What a client gets to see, and for how long it stays valid.
#[derive(Debug, Clone)]
pub struct ReleaseView {
    pub metadata: PartialMetadata,
    pub progress: Progress,
}

/// Runs the release pipeline for one request.
///
/// `window` replaces the stored release window. With `pinned_percent` the clock is
/// ignored, links are gated at the instant that percentage is reached, and the result
/// carries no refresh interval.
pub fn release_view(
    metadata: &CompleteMetadata,
    window: ReleaseWindow,
    pinned_percent: Option<f64>,
    now: Timestamp,
) -> Result<ReleaseView, ReleaseError> {
    let (progress, reference) = match pinned_percent {
        Some(percent) => (Progress::pinned(percent), window.instant_at(percent)),
        None => (
            compute_progress(now, window.start(), window.end(), metadata.segment_count)?,
            now,
        ),
    };

    let mut partial = redact(metadata, progress.percent_released);
    partial.release_start = window.start();
    partial.release_end = window.end();

    let hidden_links = gate_links(&mut partial, reference);
    // only a ticking release is shortened; steady states keep the long-lived directive
    let progress = match pinned_percent {
        Some(_) => progress,
        None => progress.expiring_within(next_link_reveal(&partial, reference)),
    };

    log::debug!(
        "release view: {:.4}% released, {hidden_links} links hidden, refresh {:?}",
        progress.percent_released,
        progress.refresh_in_seconds
    );

    Ok(ReleaseView {
        metadata: partial,
        progress,
    })
}
