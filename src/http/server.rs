use chrono::Utc;
use log::{debug, info};
use rouille::{Request, Response};

use crate::{
    config::HttpConfig,
    domain::metadata::Timestamp,
    http::{error::ApiError, overrides::Overrides},
    release::{error::ReleaseError, release_view},
    storage::operations::MetadataStore,
};

pub struct HttpServer {
    store: MetadataStore,
    pub config: HttpConfig,
}

impl HttpServer {
    pub fn new(store: MetadataStore, config: HttpConfig) -> Self {
        Self { store, config }
    }

    pub fn run(self) {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        rouille::start_server(addr, move |request| self.handle_request(request));
    }

    fn handle_request(&self, request: &Request) -> Response {
        self.handle_request_at(request, Utc::now().fixed_offset())
    }

    /// Routes a request as if it arrived at `now`
    fn handle_request_at(&self, request: &Request, now: Timestamp) -> Response {
        Self::log_request(request);

        let response = rouille::router!(request,
            (GET) (/api/metadata) => {
                self.handle_get_metadata(request, now)
            },
            (GET) (/metadata) => {
                self.handle_get_metadata(request, now)
            },
            _ => Response::empty_404()
        );

        info!("Response: {} {}", request.method(), response.status_code);
        response
    }

    fn log_request(request: &Request) {
        info!("{} {}", request.method(), request.url());
    }

    fn handle_get_metadata(&self, request: &Request, now: Timestamp) -> Response {
        match self.get_metadata(request, now) {
            Ok(r) => r,
            Err(e) => e.into_response(),
        }
    }

    /// returns the redacted record with its cache headers, or ApiError
    fn get_metadata(&self, request: &Request, now: Timestamp) -> Result<Response, ApiError> {
        let overrides = self.overrides(request)?;
        let metadata = self.store.load()?;

        let window = match overrides.window {
            Some(window) => window,
            None => metadata.release_window().map_err(ReleaseError::from)?,
        };
        let view = release_view(&metadata, window, overrides.progress, now)?;

        let body = serde_json::to_vec(&view.metadata).map_err(|e| {
            log::error!("failed to serialize metadata: {e}");
            ApiError::Internal("internal server error".into())
        })?;
        let etag = format!("\"{}\"", blake3::hash(&body).to_hex());
        let cache_control = view.progress.cache_control();

        debug!(
            "METADATA at {now} -> {:.4}% released, Cache-Control: {cache_control}",
            view.progress.percent_released
        );

        let response = if Self::etag_matches(request, &etag) {
            Response::empty_204().with_status_code(304)
        } else {
            Response::from_data("application/json", body)
        };

        Ok(response
            .with_additional_header("Cache-Control", cache_control)
            .with_additional_header("ETag", etag))
    }

    /// Override parameters are only honored when the server runs in development posture.
    fn overrides(&self, request: &Request) -> Result<Overrides, ApiError> {
        if self.config.dev_overrides {
            return Ok(Overrides::from_request(request)?);
        }
        if Overrides::present_in(request) {
            debug!("ignoring override parameters: {}", request.raw_query_string());
        }
        Ok(Overrides::default())
    }

    fn etag_matches(request: &Request, etag: &str) -> bool {
        request.header("If-None-Match").is_some_and(|header| {
            header
                .split(',')
                .map(str::trim)
                .any(|candidate| candidate == etag || candidate == "*")
        })
    }
}

#[cfg(test)]
pub fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: rouille::Response,
) -> anyhow::Result<T> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}
