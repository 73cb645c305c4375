//! Blocking HTTP client for the grid API.

use std::time::Duration;

use place_domain::Color;
use place_domain::Grid;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::adapters::grid_dto::ErrorResponse;
use crate::adapters::grid_dto::GridResponse;
use crate::adapters::grid_dto::PaintRequest;
use crate::adapters::grid_dto::PaintResponse;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Cannot reach place server at {url}: {reason}")]
    Unavailable { url: String, reason: String },
    #[error("Server rejected request: {message}")]
    Rejected { status: u16, message: String },
    #[error("Unexpected response from server (HTTP {status}): {reason}")]
    InvalidResponse { status: u16, reason: String },
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),
    #[error("Grid stream failed: {0}")]
    Stream(String),
    #[error("Failed to set up HTTP client: {0}")]
    Transport(String),
}

impl ClientError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ClientError::Unavailable { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, ClientError::Rejected { .. })
    }
}

pub struct GridClient {
    http: Client,
    grid_url: Url,
    stream_url: Url,
}

impl GridClient {
    pub fn new(server: &Url) -> Result<Self, ClientError> {
        let grid_url = server
            .join("grid")
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        let stream_url = stream_url_for(server)?;
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            grid_url,
            stream_url,
        })
    }

    pub fn stream_url(&self) -> &Url {
        &self.stream_url
    }

    pub fn fetch(&self) -> Result<Grid, ClientError> {
        debug!(url = %self.grid_url, "Fetching grid");
        let response = self
            .http
            .get(self.grid_url.clone())
            .send()
            .map_err(|e| self.unavailable(e))?;
        let body: GridResponse = read_body(response)?;
        Ok(body.grid)
    }

    pub fn paint(&self, row: i64, col: i64, color: &Color) -> Result<Grid, ClientError> {
        debug!(url = %self.grid_url, row, col, color = %color, "Painting cell");
        let request = PaintRequest {
            row,
            col,
            color: color.as_str().to_string(),
        };
        let response = self
            .http
            .post(self.grid_url.clone())
            .json(&request)
            .send()
            .map_err(|e| self.unavailable(e))?;
        let body: PaintResponse = read_body(response)?;
        if !body.success {
            return Err(ClientError::InvalidResponse {
                status: StatusCode::OK.as_u16(),
                reason: "success flag was false".to_string(),
            });
        }
        Ok(body.grid)
    }

    fn unavailable(&self, err: reqwest::Error) -> ClientError {
        ClientError::Unavailable {
            url: self.grid_url.to_string(),
            reason: err.to_string(),
        }
    }
}

fn read_body<T: DeserializeOwned>(response: reqwest::blocking::Response) -> Result<T, ClientError> {
    let status = response.status();
    let bytes = response
        .bytes()
        .map_err(|e| ClientError::InvalidResponse {
            status: status.as_u16(),
            reason: e.to_string(),
        })?;
    decode_body(status, &bytes)
}

fn decode_body<T: DeserializeOwned>(status: StatusCode, bytes: &[u8]) -> Result<T, ClientError> {
    if status.is_success() {
        return serde_json::from_slice(bytes).map_err(|e| ClientError::InvalidResponse {
            status: status.as_u16(),
            reason: e.to_string(),
        });
    }
    match serde_json::from_slice::<ErrorResponse>(bytes) {
        Ok(body) if status.is_client_error() => Err(ClientError::Rejected {
            status: status.as_u16(),
            message: body.error,
        }),
        Ok(body) => Err(ClientError::InvalidResponse {
            status: status.as_u16(),
            reason: body.error,
        }),
        Err(_) => Err(ClientError::InvalidResponse {
            status: status.as_u16(),
            reason: String::from_utf8_lossy(bytes).trim().to_string(),
        }),
    }
}

fn stream_url_for(server: &Url) -> Result<Url, ClientError> {
    let mut url = server
        .join("grid/stream")
        .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
    let scheme = match url.scheme() {
        "https" => "wss",
        _ => "ws",
    };
    url.set_scheme(scheme)
        .map_err(|_| ClientError::InvalidUrl(format!("cannot use scheme {scheme} for {server}")))?;
    Ok(url)
}
