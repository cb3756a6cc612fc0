use log::error;
use rouille::Response;

use crate::{
    http::overrides::OverrideError, release::error::ReleaseError, storage::error::StorageError,
};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        error!("failed to load metadata record: {err}");
        ApiError::Internal("internal server error".into())
    }
}

impl From<ReleaseError> for ApiError {
    fn from(err: ReleaseError) -> Self {
        error!("failed to compute release progress: {err}");
        ApiError::Internal("internal server error".into())
    }
}

impl From<OverrideError> for ApiError {
    fn from(err: OverrideError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ApiError::BadRequest(msg) | ApiError::Internal(msg) => {
                Response::text(msg).with_status_code(status)
            }
        }
    }
}
