use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::{error::MetadataError, window::ReleaseWindow};

pub type Timestamp = DateTime<FixedOffset>;

/// A mosaic tile as produced by the splitting pipeline. Both media URLs are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSegment {
    pub audio_url: String,
    pub image_url: String,
    pub width: u32,
    /// offset of this chunk within the track audio, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
}

/// A mosaic tile as sent to clients. Absent URLs mean the tile is not released yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub width: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
}

impl Segment {
    pub fn is_redacted(&self) -> bool {
        self.audio_url.is_none() && self.image_url.is_none()
    }
}

impl From<&CompleteSegment> for Segment {
    fn from(segment: &CompleteSegment) -> Self {
        Self {
            audio_url: Some(segment.audio_url.clone()),
            image_url: Some(segment.image_url.clone()),
            width: segment.width,
            start: segment.start,
            end: segment.end,
        }
    }
}

/// One horizontal strip of the mosaic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track<S> {
    pub segments: Vec<S>,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteLink {
    pub url: String,
    /// reveal date; `releaseEnd` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Timestamp>,
}

impl From<&CompleteLink> for Link {
    fn from(link: &CompleteLink) -> Self {
        Self {
            url: Some(link.url.clone()),
            date: link.date,
        }
    }
}

/// Album metadata record.
///
/// The same shape serves both views: [`CompleteMetadata`] is what the offline
/// pipeline stores, [`PartialMetadata`] is the only thing ever sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata<S, L> {
    pub tracks: Vec<Track<S>>,
    /// total number of segments across all tracks, precomputed upstream
    pub segment_count: usize,
    pub total_width: u32,
    pub total_height: u32,
    pub release_start: Timestamp,
    pub release_end: Timestamp,
    #[serde(default = "BTreeMap::new", skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, L>,
}

pub type CompleteMetadata = Metadata<CompleteSegment, CompleteLink>;
pub type PartialMetadata = Metadata<Segment, Link>;

/// Segment together with its position in the mosaic
#[derive(Debug, Clone, Copy)]
pub struct NumberedSegment<'a, S> {
    pub track_num: usize,
    pub segment_num: usize,
    pub track_name: Option<&'a str>,
    pub segment: &'a S,
}

impl<S, L> Metadata<S, L> {
    /// Segments in flattened order: tracks top to bottom, then left to right within a track.
    pub fn numbered_segments(&self) -> impl Iterator<Item = NumberedSegment<'_, S>> {
        self.tracks.iter().enumerate().flat_map(|(track_num, track)| {
            track
                .segments
                .iter()
                .enumerate()
                .map(move |(segment_num, segment)| NumberedSegment {
                    track_num,
                    segment_num,
                    track_name: track.name.as_deref(),
                    segment,
                })
        })
    }

    /// Number of segments actually present in the tracks
    pub fn counted_segments(&self) -> usize {
        self.tracks.iter().map(|track| track.segments.len()).sum()
    }

    pub fn release_window(&self) -> Result<ReleaseWindow, MetadataError> {
        ReleaseWindow::new(self.release_start, self.release_end)
    }
}

impl CompleteMetadata {
    /// Checks the invariants the serving path relies on.
    pub fn validate(&self) -> Result<(), MetadataError> {
        if self.tracks.is_empty() {
            return Err(MetadataError::NoTracks);
        }

        if let Some(track) = self.tracks.iter().position(|t| t.segments.is_empty()) {
            return Err(MetadataError::EmptyTrack { track });
        }

        let counted = self.counted_segments();
        if counted != self.segment_count {
            return Err(MetadataError::SegmentCountMismatch {
                declared: self.segment_count,
                counted,
            });
        }

        self.release_window()?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::{fixtures::*, *};

    const RECORD: &str = r#"{
  "tracks": [
    {
      "segments": [
        { "audioUrl": "a/0.mp3", "imageUrl": "i/0.jpg", "width": 12, "start": 0, "end": 1.5 },
        { "audioUrl": "a/1.mp3", "imageUrl": "i/1.jpg", "width": 13 }
      ],
      "height": 40,
      "name": "Overture"
    },
    {
      "segments": [{ "audioUrl": "a/2.mp3", "imageUrl": "i/2.jpg", "width": 25 }],
      "height": 38
    }
  ],
  "segmentCount": 3,
  "totalWidth": 25,
  "totalHeight": 78,
  "releaseStart": "2024-01-01T00:00:00+01:00",
  "releaseEnd": "2024-01-08T00:00:00+01:00",
  "links": {
    "Bandcamp": { "url": "https://example.bandcamp.com" },
    "Liner notes": { "url": "https://example.com/notes", "date": "2024-01-03T00:00:00Z" }
  }
}"#;

    #[test]
    fn test_parse_complete_record() -> anyhow::Result<()> {
        let metadata: CompleteMetadata = serde_json::from_str(RECORD)?;

        assert_eq!(metadata.tracks.len(), 2);
        assert_eq!(metadata.segment_count, 3);
        assert_eq!(metadata.tracks[0].name.as_deref(), Some("Overture"));
        assert_eq!(metadata.tracks[1].name, None);
        assert_eq!(metadata.tracks[0].segments[0].end, Some(1.5));
        assert_eq!(metadata.release_start, ts("2023-12-31T23:00:00Z"));
        assert_eq!(metadata.links["Bandcamp"].date, None);
        metadata.validate()?;

        Ok(())
    }

    #[test]
    fn test_parse_record_without_links() -> anyhow::Result<()> {
        let mut record: serde_json::Value = serde_json::from_str(RECORD)?;
        record.as_object_mut().unwrap().remove("links");

        let metadata: CompleteMetadata = serde_json::from_value(record)?;

        assert!(metadata.links.is_empty());
        assert!(!serde_json::to_string(&metadata)?.contains("links"));
        Ok(())
    }

    #[test]
    fn test_partial_serialization_omits_redacted_urls() -> anyhow::Result<()> {
        let segment = Segment {
            audio_url: None,
            image_url: None,
            width: 7,
            start: None,
            end: None,
        };

        assert!(segment.is_redacted());
        assert_eq!(serde_json::to_string(&segment)?, r#"{"width":7}"#);

        Ok(())
    }

    #[test]
    fn test_timestamps_keep_their_offset() -> anyhow::Result<()> {
        let metadata: CompleteMetadata = serde_json::from_str(RECORD)?;
        let json = serde_json::to_value(&metadata)?;

        assert_eq!(json["releaseStart"], "2024-01-01T00:00:00+01:00");

        Ok(())
    }

    #[test]
    fn test_numbered_segments_follow_track_order() {
        let metadata = metadata(&[2, 3]);

        let positions: Vec<_> = metadata
            .numbered_segments()
            .map(|s| (s.track_num, s.segment_num))
            .collect();

        assert_eq!(positions, vec![(0, 0), (0, 1), (1, 0), (1, 1), (1, 2)]);
        assert_eq!(
            metadata.numbered_segments().nth(3).unwrap().track_name,
            Some("Track 2")
        );
    }

    #[test]
    fn test_validate_segment_count_mismatch() {
        let mut metadata = metadata(&[2, 3]);
        metadata.segment_count = 4;

        assert!(matches!(
            metadata.validate(),
            Err(MetadataError::SegmentCountMismatch {
                declared: 4,
                counted: 5
            })
        ));
    }

    #[test]
    fn test_validate_empty_track() {
        let mut metadata = metadata(&[2, 0, 1]);
        metadata.segment_count = 3;

        assert!(matches!(
            metadata.validate(),
            Err(MetadataError::EmptyTrack { track: 1 })
        ));
    }

    #[test]
    fn test_validate_no_tracks() {
        let metadata = metadata(&[]);

        assert!(matches!(metadata.validate(), Err(MetadataError::NoTracks)));
    }

    #[test]
    fn test_validate_inverted_window() {
        let mut metadata = metadata(&[1]);
        metadata.release_end = metadata.release_start;

        assert!(matches!(
            metadata.validate(),
            Err(MetadataError::InvalidWindow { .. })
        ));
    }
}
