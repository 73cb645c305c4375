//! SIGINT/SIGTERM handling for long-running commands.

use signal_hook::consts::SIGINT;
use signal_hook::consts::SIGTERM;
use signal_hook::iterator::Signals;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;
use std::thread::JoinHandle;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
#[error("Failed to install signal handler: {0}")]
pub struct SignalSetupError(String);

pub struct SignalHandler {
    _handle: JoinHandle<()>,
}

impl SignalHandler {
    /// Sets `shutdown` on the first SIGINT/SIGTERM. A second signal exits immediately.
    pub fn setup(shutdown: Arc<AtomicBool>) -> Result<Self, SignalSetupError> {
        let mut signals =
            Signals::new([SIGINT, SIGTERM]).map_err(|e| SignalSetupError(e.to_string()))?;

        let handle = thread::Builder::new()
            .name("signal-handler".to_string())
            .spawn(move || {
                let mut shutdown_initiated = false;
                for sig in signals.forever() {
                    if shutdown_initiated {
                        info!(signal = sig, "Received second signal, forcing exit");
                        std::process::exit(130);
                    }
                    shutdown_initiated = true;
                    info!(signal = sig, "Received signal, initiating graceful shutdown");
                    shutdown.store(true, Ordering::SeqCst);
                }
            })
            .map_err(|e| SignalSetupError(format!("failed to spawn signal handler: {e}")))?;

        Ok(Self { _handle: handle })
    }
}
