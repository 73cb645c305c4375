use clap::Args;
use clap::Parser;
use clap::Subcommand;
pub use clap_complete::Shell;
use url::Url;

pub use crate::adapters::presenter::OutputFormat;
use crate::infra::config::parse_server_url;

const LONG_VERSION: &str = concat!(env!("PLACE_VERSION"), " (", env!("PLACE_GIT_SHA"), ")");

const AFTER_HELP: &str =
    "Use --help for full details and examples. Use --format json for machine-readable output.";

const LONG_ABOUT: &str = "\
A shared 10x10 pixel canvas.\n\
\n\
`place serve` holds the canvas in memory and serves it over HTTP together\n\
with a browser UI. The other commands are clients of a running server.";

const AFTER_LONG_HELP: &str = r##"EXAMPLES:
    # Start a server on the default address (127.0.0.1:3000)
    place serve

    # Paint a cell and read the canvas back
    place paint 0 0 "#ff0000"
    place get
    place get --json

    # Watch the canvas live in the terminal
    place watch
    place watch --stream

ENVIRONMENT:
    PLACE_LISTEN       Server listen address (default 127.0.0.1:3000)
    PLACE_SERVER       Server URL used by client commands
    PLACE_LOG          Write logs to this file
    PLACE_LOG_FORMAT   text or json
    RUST_LOG           Log filter (e.g. debug)"##;

#[derive(Parser)]
#[command(name = "place")]
#[command(author, version, long_version = LONG_VERSION, propagate_version = true)]
#[command(about = "Shared pixel-painting canvas server and client")]
#[command(long_about = LONG_ABOUT)]
#[command(after_help = AFTER_HELP)]
#[command(after_long_help = AFTER_LONG_HELP)]
#[command(subcommand_required = true, arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json)
    #[arg(
        short,
        long,
        global = true,
        value_enum,
        value_name = "FORMAT",
        default_value_t = OutputFormat::Text,
        help_heading = "Output Options"
    )]
    pub format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true, help_heading = "Output Options")]
    pub json: bool,

    /// Disable colored output (also respects NO_COLOR)
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new(),
        help_heading = "Output Options"
    )]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(short, long, global = true, help_heading = "Debug Options")]
    pub verbose: bool,
}

impl Cli {
    pub fn effective_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the canvas server
    #[command(long_about = "\
Run the canvas server.

The canvas starts all white and lives only as long as the process; nothing is
persisted. Stop the server with Ctrl-C (SIGINT) or SIGTERM.")]
    Serve {
        /// Listen address (overrides PLACE_LISTEN / PORT)
        #[arg(short, long, value_name = "ADDR")]
        listen: Option<String>,

        /// Allow binding a non-loopback address
        #[arg(long)]
        allow_remote: bool,
    },

    /// Print the current canvas
    Get {
        #[command(flatten)]
        server: ServerArgs,
    },

    /// Paint one cell
    #[command(after_long_help = "\
EXAMPLES:
    place paint 0 0              # paint with the default palette color (#ff0000)
    place paint 9 9 \"#0000ff\"")]
    Paint {
        /// Row, 0-9
        #[arg(allow_negative_numbers = true)]
        row: i64,

        /// Column, 0-9
        #[arg(allow_negative_numbers = true)]
        col: i64,

        /// Color to paint (defaults to the palette default)
        #[arg(value_name = "COLOR")]
        color: Option<String>,

        #[command(flatten)]
        server: ServerArgs,
    },

    /// Poll the canvas and redraw it in the terminal
    Watch {
        #[command(flatten)]
        server: ServerArgs,

        /// Poll interval in milliseconds (overrides PLACE_POLL_INTERVAL_MS)
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,

        /// Receive pushed updates over WebSocket instead of polling
        #[arg(long)]
        stream: bool,
    },

    /// List the color palette
    Palette,

    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ServerArgs {
    /// Server URL (overrides PLACE_SERVER)
    #[arg(short = 'S', long, value_name = "URL", value_parser = parse_server_arg)]
    pub server: Option<Url>,
}

fn parse_server_arg(value: &str) -> Result<Url, String> {
    parse_server_url(value).map_err(|e| format!("invalid server URL '{value}': {e}"))
}
