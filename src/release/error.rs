use thiserror::Error;

use crate::domain::error::MetadataError;

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("cannot compute release progress without segments")]
    NoSegments,

    #[error(transparent)]
    Window(#[from] MetadataError),
}
