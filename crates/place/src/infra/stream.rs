//! WebSocket client for the grid push stream.

use std::io::ErrorKind;
use std::net::TcpStream;
use std::time::Duration;

use place_domain::Grid;
use tracing::debug;
use tracing::warn;
use tungstenite::Message;
use tungstenite::WebSocket;
use tungstenite::stream::MaybeTlsStream;
use url::Url;

use crate::adapters::grid_dto::StreamEvent;
use crate::infra::client::ClientError;

#[derive(Debug)]
pub enum StreamUpdate {
    Grid { revision: u64, grid: Grid },
    /// No complete message arrived within the read timeout.
    Idle,
    Closed,
}

pub struct GridStream {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
}

impl GridStream {
    /// Connects and arms a read timeout so callers can interleave shutdown checks.
    pub fn connect(url: &Url, read_timeout: Duration) -> Result<Self, ClientError> {
        let (socket, _response) = tungstenite::connect(url.as_str()).map_err(|e| {
            ClientError::Unavailable {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;
        match socket.get_ref() {
            MaybeTlsStream::Plain(stream) => stream
                .set_read_timeout(Some(read_timeout))
                .map_err(|e| ClientError::Stream(e.to_string()))?,
            _ => warn!("Read timeout not supported on this stream; shutdown may lag"),
        }
        Ok(Self { socket })
    }

    pub fn poll(&mut self) -> Result<StreamUpdate, ClientError> {
        loop {
            let message = match self.socket.read() {
                Ok(message) => message,
                Err(tungstenite::Error::Io(err))
                    if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    return Ok(StreamUpdate::Idle);
                }
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    return Ok(StreamUpdate::Closed);
                }
                Err(err) => return Err(ClientError::Stream(err.to_string())),
            };
            match message {
                Message::Text(text) => match parse_event(text.as_str())? {
                    Some(update) => return Ok(update),
                    None => continue,
                },
                Message::Close(_) => return Ok(StreamUpdate::Closed),
                _ => continue,
            }
        }
    }

    pub fn close(mut self) {
        let _ = self.socket.close(None);
        let _ = self.socket.flush();
    }
}

fn parse_event(text: &str) -> Result<Option<StreamUpdate>, ClientError> {
    let event: StreamEvent =
        serde_json::from_str(text).map_err(|e| ClientError::Stream(e.to_string()))?;
    match event {
        StreamEvent::Hello {
            api_version,
            server_version,
            size,
        } => {
            debug!(%api_version, %server_version, size, "Grid stream connected");
            Ok(None)
        }
        StreamEvent::Grid { revision, grid } => Ok(Some(StreamUpdate::Grid { revision, grid })),
        StreamEvent::Error { message } => Err(ClientError::Stream(message)),
    }
}
