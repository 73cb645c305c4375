//! JSON bodies shared by the HTTP API and its clients.

use place_domain::Grid;
use serde::Deserialize;
use serde::Serialize;
use serde::de::Error as _;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;

pub const INVALID_COORDINATES: &str = "Invalid coordinates";
pub const INVALID_REQUEST: &str = "Invalid request";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridResponse {
    pub grid: Grid,
}

/// Body of `POST /grid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaintRequest {
    pub row: i64,
    pub col: i64,
    pub color: String,
}

#[derive(Deserialize)]
struct PaintBody {
    row: Number,
    col: Number,
    color: String,
}

impl PaintRequest {
    /// Parses a `POST /grid` body.
    ///
    /// The body must be a JSON object with numeric `row` and `col` and a string
    /// `color`. Any integral number is a coordinate, including `3.0` and values
    /// too large for `i64`; those saturate and so fail the later bounds check.
    /// Fractional numbers are rejected here.
    pub fn from_json_slice(body: &[u8]) -> serde_json::Result<Self> {
        let object: Map<String, Value> = serde_json::from_slice(body)?;
        let body: PaintBody = serde_json::from_value(Value::Object(object))?;
        Ok(Self {
            row: coordinate(&body.row)?,
            col: coordinate(&body.col)?,
            color: body.color,
        })
    }
}

fn coordinate(number: &Number) -> serde_json::Result<i64> {
    if let Some(value) = number.as_i64() {
        return Ok(value);
    }
    if number.is_u64() {
        return Ok(i64::MAX);
    }
    match number.as_f64() {
        Some(value) if value.is_finite() && value.fract() == 0.0 => Ok(value as i64),
        _ => Err(serde_json::Error::custom(format!("{number} is not an integer"))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaintResponse {
    pub success: bool,
    pub grid: Grid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Messages on the `/grid/stream` WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
    Hello {
        api_version: String,
        server_version: String,
        size: usize,
    },
    Grid {
        revision: u64,
        grid: Grid,
    },
    Error {
        message: String,
    },
}
