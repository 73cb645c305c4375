#![expect(clippy::print_stderr, reason = "CLI output is emitted here")]

use anyhow::Result;
use clap::CommandFactory;
use clap::Parser;
use clap_complete::generate;
use tracing::debug;

pub mod commands;
pub(crate) mod daemon;
pub mod error;
pub mod handlers;
pub mod watch;

use crate::adapters::presenter::OutputFormat;
use crate::adapters::presenter::create_presenter;
use crate::app::commands::Cli;
use crate::app::commands::Commands;
use crate::app::daemon::ServeError;
use crate::app::error::CliError;
use crate::app::error::exit_code_for_client_error;
use crate::app::error::exit_code_for_serve_error;
use crate::app::error::exit_codes;
use crate::app::error::suggestion_for_client_error;
use crate::app::handlers::HandlerContext;
use crate::common::Colors;
use crate::common::color_init;
use crate::common::telemetry;
use crate::infra::ClientError;

const PROGRAM_NAME: &str = "place";

pub struct Application;

impl Application {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self) -> Result<i32> {
        let exit_code = match self.execute() {
            Ok(()) => exit_codes::SUCCESS,
            Err(e) => self.handle_error(e),
        };
        Ok(exit_code)
    }

    fn execute(&self) -> Result<()> {
        let cli = Cli::parse();
        let default_level = match (&cli.command, cli.verbose) {
            (_, true) => "debug",
            (Commands::Serve { .. }, false) => "info",
            _ => "warn",
        };
        let _telemetry = telemetry::init_tracing(default_level);
        color_init(cli.no_color);
        let format = cli.effective_format();
        debug!(command = ?cli.command, format = ?format, "CLI command parsed");

        let ctx = HandlerContext::new(format);
        self.dispatch_command(&ctx, cli.command)
            .map_err(|e| self.wrap_error(e, format))
    }

    fn dispatch_command(&self, ctx: &HandlerContext, command: Commands) -> Result<()> {
        match command {
            Commands::Serve {
                listen,
                allow_remote,
            } => handlers::handle_serve(ctx, listen, allow_remote),
            Commands::Get { server } => handlers::handle_get(ctx, &server),
            Commands::Paint {
                row,
                col,
                color,
                server,
            } => handlers::handle_paint(ctx, row, col, color, &server),
            Commands::Watch {
                server,
                interval_ms,
                stream,
            } => handlers::handle_watch(ctx, &server, interval_ms, stream),
            Commands::Palette => handlers::handle_palette(ctx),
            Commands::Completions { shell } => {
                let mut cmd = Cli::command();
                generate(shell, &mut cmd, PROGRAM_NAME, &mut std::io::stdout());
                Ok(())
            }
        }
    }

    /// Classifies an error into a [`CliError`] carrying its exit code.
    fn wrap_error(&self, error: anyhow::Error, format: OutputFormat) -> anyhow::Error {
        if find_error::<CliError>(&error).is_some() {
            return error;
        }
        let cli_error = if let Some(client_error) = find_error::<ClientError>(&error) {
            let message = match suggestion_for_client_error(client_error) {
                Some(suggestion) if format == OutputFormat::Text => {
                    format!("{client_error}\n{} {suggestion}", Colors::dim("Suggestion:"))
                }
                _ => client_error.to_string(),
            };
            CliError::new(format, message, exit_code_for_client_error(client_error))
        } else if let Some(serve_error) = find_error::<ServeError>(&error) {
            CliError::new(
                format,
                serve_error.to_string(),
                exit_code_for_serve_error(serve_error),
            )
        } else {
            CliError::new(format, format!("{error:#}"), exit_codes::GENERAL_ERROR)
        };
        anyhow::Error::new(cli_error)
    }

    fn handle_error(&self, e: anyhow::Error) -> i32 {
        if let Some(cli_error) = find_error::<CliError>(&e) {
            create_presenter(cli_error.format).present_error(&cli_error.message);
            return cli_error.exit_code;
        }
        eprintln!("{}: {} {:#}", PROGRAM_NAME, Colors::error("Error:"), e);
        exit_codes::GENERAL_ERROR
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

fn find_error<T: std::error::Error + Send + Sync + 'static>(error: &anyhow::Error) -> Option<&T> {
    error.chain().find_map(|source| source.downcast_ref::<T>())
}
