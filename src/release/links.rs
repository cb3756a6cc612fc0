use crate::domain::metadata::{PartialMetadata, Timestamp};

/// Hides the URL of every link whose reveal date is still ahead of `reference`.
/// A link without its own date is revealed together with the last segment.
///
/// Returns the number of links hidden.
pub fn gate_links(metadata: &mut PartialMetadata, reference: Timestamp) -> usize {
    let release_end = metadata.release_end;
    let mut hidden = 0;
    for link in metadata.links.values_mut() {
        if link.date.unwrap_or(release_end) > reference {
            link.url = None;
            hidden += 1;
        }
    }
    hidden
}

/// Whole seconds until the next hidden link becomes visible, if any link is still hidden.
pub fn next_link_reveal(metadata: &PartialMetadata, reference: Timestamp) -> Option<u64> {
    metadata
        .links
        .values()
        .map(|link| link.date.unwrap_or(metadata.release_end))
        .filter(|date| *date > reference)
        .map(|date| ((date - reference).num_milliseconds().max(1) as u64).div_ceil(1000))
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::metadata::{
            CompleteLink,
            fixtures::{metadata, ts},
        },
        release::redact,
    };

    fn with_links() -> PartialMetadata {
        let mut complete = metadata(&[2]);
        complete.links.insert(
            "Pre-order".to_string(),
            CompleteLink {
                url: "https://shop.example/preorder".to_string(),
                date: Some(ts("2023-12-01T00:00:00Z")),
            },
        );
        complete.links.insert(
            "Liner notes".to_string(),
            CompleteLink {
                url: "https://example.com/notes".to_string(),
                date: Some(ts("2024-01-03T00:00:00Z")),
            },
        );
        complete.links.insert(
            "Download".to_string(),
            CompleteLink {
                url: "https://example.com/album.zip".to_string(),
                date: None,
            },
        );
        redact(&complete, 100.0)
    }

    #[test]
    fn test_gate_links_mid_release() {
        let mut partial = with_links();

        let hidden = gate_links(&mut partial, ts("2024-01-02T00:00:00Z"));

        assert_eq!(hidden, 2);
        assert!(partial.links["Pre-order"].url.is_some());
        assert!(partial.links["Liner notes"].url.is_none());
        // undated links wait for the end of the release
        assert!(partial.links["Download"].url.is_none());
        assert_eq!(
            partial.links["Liner notes"].date,
            Some(ts("2024-01-03T00:00:00Z"))
        );
    }

    #[test]
    fn test_gate_links_on_reveal_date() {
        let mut partial = with_links();

        let hidden = gate_links(&mut partial, ts("2024-01-08T00:00:00Z"));

        assert_eq!(hidden, 0);
        assert!(partial.links.values().all(|link| link.url.is_some()));
    }

    #[test]
    fn test_next_link_reveal() {
        let partial = with_links();

        assert_eq!(
            next_link_reveal(&partial, ts("2024-01-02T23:00:00Z")),
            Some(3600)
        );
        assert_eq!(
            next_link_reveal(&partial, ts("2024-01-07T23:59:59.500Z")),
            Some(1)
        );
        assert_eq!(next_link_reveal(&partial, ts("2024-01-08T00:00:00Z")), None);
    }
}
