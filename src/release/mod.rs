//! Release-progress engine: how much of the album is out, which tiles stay hidden,
//! and how long the answer may be cached.

pub mod error;
pub mod links;
pub mod progress;
pub mod redact;
pub mod view;

pub use progress::{Progress, compute_progress};
pub use redact::{hidden_segment_count, redact, released_segment_count};
pub use view::{ReleaseView, release_view};
