use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;

use crate::domain::metadata::{CompleteMetadata, CompleteSegment, PartialMetadata, Segment, Track};

/// Seed of the permutation that decides which segments are revealed first.
/// Changing it, or the generator, reshuffles every deployed mosaic.
pub const REDACTION_SEED: u64 = 42;

/// Absorbs float noise so an exact tick boundary does not hide one extra segment.
const TOLERANCE: f64 = 1e-9;

/// Number of segments out of `total` that stay hidden at `percent_released`.
pub fn hidden_segment_count(percent_released: f64, total: usize) -> usize {
    let percent = if percent_released.is_nan() {
        0.0
    } else {
        percent_released.clamp(0.0, 100.0)
    };
    let hidden = (100.0 - percent) * total as f64 / 100.0;
    ((hidden - TOLERANCE).ceil().max(0.0) as usize).min(total)
}

/// Number of segments out of `total` that are visible at `percent_released`.
pub fn released_segment_count(percent_released: f64, total: usize) -> usize {
    total - hidden_segment_count(percent_released, total)
}

/// Seeded permutation of `0..total`.
///
/// Segments are hidden by taking a prefix of this order, so a smaller sample is always
/// a subset of a larger one and release never hides a segment again.
pub fn redaction_order(total: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..total).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(REDACTION_SEED);
    order.shuffle(&mut rng);
    order
}

/// Projects the complete record onto what may be shown at `percent_released`.
///
/// Redacted segments lose both URLs but keep their size, so clients can still lay out
/// a placeholder tile.
pub fn redact(metadata: &CompleteMetadata, percent_released: f64) -> PartialMetadata {
    let total = metadata.counted_segments();
    let hidden = hidden_segment_count(percent_released, total);

    let mut redacted = vec![false; total];
    for index in redaction_order(total).into_iter().take(hidden) {
        redacted[index] = true;
    }

    log::debug!("redacting {hidden} of {total} segments at {percent_released:.4}%");

    let mut offset = 0;
    let tracks = metadata
        .tracks
        .iter()
        .map(|track| {
            let first = offset;
            offset += track.segments.len();
            Track {
                segments: track
                    .segments
                    .iter()
                    .enumerate()
                    .map(|(n, segment)| project_segment(segment, redacted[first + n]))
                    .collect(),
                height: track.height,
                name: track.name.clone(),
            }
        })
        .collect();

    PartialMetadata {
        tracks,
        segment_count: metadata.segment_count,
        total_width: metadata.total_width,
        total_height: metadata.total_height,
        release_start: metadata.release_start,
        release_end: metadata.release_end,
        links: metadata
            .links
            .iter()
            .map(|(label, link)| (label.clone(), link.into()))
            .collect(),
    }
}

fn project_segment(segment: &CompleteSegment, hide: bool) -> Segment {
    let mut projected = Segment::from(segment);
    if hide {
        projected.audio_url = None;
        projected.image_url = None;
    }
    projected
}
