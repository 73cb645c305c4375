pub mod canvas;
pub mod client;
pub mod config;
#[cfg(unix)]
pub mod signal_handler;
pub mod stream;

pub use canvas::InMemoryCanvas;
pub use client::ClientError;
pub use client::GridClient;
pub use config::ClientConfig;
pub use config::ServerConfig;
#[cfg(unix)]
pub use signal_handler::SignalHandler;
pub use stream::GridStream;
