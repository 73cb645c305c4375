//! Server runtime: canvas, signals and the HTTP API thread.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use place_domain::DEFAULT_COLOR;
use place_domain::GRID_SIZE;
use thiserror::Error;
use tracing::info;

use crate::app::daemon::http_api::ApiServerError;
use crate::app::daemon::http_api::start_api_server;
use crate::app::daemon::usecase_container::GridUseCases;
use crate::infra::InMemoryCanvas;
use crate::infra::ServerConfig;
#[cfg(unix)]
use crate::infra::SignalHandler;
#[cfg(unix)]
use crate::infra::signal_handler::SignalSetupError;

#[derive(Debug, Error)]
pub(crate) enum ServeError {
    #[error(transparent)]
    Api(#[from] ApiServerError),
    #[cfg(unix)]
    #[error(transparent)]
    Signal(#[from] SignalSetupError),
}

impl ServeError {
    pub fn is_invalid_listen(&self) -> bool {
        matches!(self, ServeError::Api(ApiServerError::InvalidListen { .. }))
    }
}

/// Serves a fresh canvas until SIGINT/SIGTERM. `on_ready` receives the base
/// URL once the listener is bound.
pub(crate) fn run_server(
    config: ServerConfig,
    on_ready: impl FnOnce(&str),
) -> Result<(), ServeError> {
    let canvas = Arc::new(InMemoryCanvas::new());
    let usecases = GridUseCases::new(canvas);
    let shutdown = Arc::new(AtomicBool::new(false));

    #[cfg(unix)]
    let _signals = SignalHandler::setup(Arc::clone(&shutdown))?;

    let handle = start_api_server(usecases, shutdown, &config)?;
    info!(
        addr = %handle.local_addr(),
        grid_size = GRID_SIZE,
        default_color = DEFAULT_COLOR,
        max_ws_connections = config.max_ws_connections(),
        "Place server ready"
    );
    on_ready(&handle.http_url());
    handle.join();
    info!("Place server exited");
    Ok(())
}
