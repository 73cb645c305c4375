use crate::adapters::presenter::OutputFormat;
use crate::app::daemon::ServeError;
use crate::infra::ClientError;

/// Exit codes following sysexits.h.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const USAGE: i32 = 64;
    pub const UNAVAILABLE: i32 = 69;
    pub const IOERR: i32 = 74;
}

/// An error that has already been classified for output.
#[derive(Debug)]
pub struct CliError {
    pub exit_code: i32,
    pub format: OutputFormat,
    pub message: String,
}

impl CliError {
    pub fn new(format: OutputFormat, message: impl Into<String>, exit_code: i32) -> Self {
        Self {
            exit_code,
            format,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn exit_code_for_client_error(error: &ClientError) -> i32 {
    match error {
        ClientError::Rejected { .. } | ClientError::InvalidUrl(_) => exit_codes::USAGE,
        ClientError::Unavailable { .. } => exit_codes::UNAVAILABLE,
        ClientError::InvalidResponse { .. }
        | ClientError::Stream(_)
        | ClientError::Transport(_) => exit_codes::IOERR,
    }
}

pub(crate) fn exit_code_for_serve_error(error: &ServeError) -> i32 {
    if error.is_invalid_listen() {
        exit_codes::USAGE
    } else {
        exit_codes::IOERR
    }
}

pub fn suggestion_for_client_error(error: &ClientError) -> Option<&'static str> {
    match error {
        ClientError::Unavailable { .. } => {
            Some("Start a server with 'place serve' or point --server / PLACE_SERVER at one.")
        }
        ClientError::Rejected { .. } => Some("Rows and columns must both be between 0 and 9."),
        ClientError::InvalidUrl(_) => Some("Use a URL like http://127.0.0.1:3000/."),
        ClientError::InvalidResponse { .. }
        | ClientError::Stream(_)
        | ClientError::Transport(_) => None,
    }
}
