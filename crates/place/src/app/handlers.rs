use std::io;
use std::io::IsTerminal;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use place_domain::Color;
use place_domain::DEFAULT_PALETTE_INDEX;
use place_domain::PALETTE;
use place_domain::default_paint_color;
use tracing::debug;

use crate::adapters::presenter::OutputFormat;
use crate::adapters::presenter::PaintOutcome;
use crate::adapters::presenter::Presenter;
use crate::adapters::presenter::create_presenter;
use crate::app::commands::ServerArgs;
use crate::app::daemon::run_server;
use crate::app::watch::LineView;
use crate::app::watch::TerminalView;
use crate::app::watch::WatchView;
use crate::app::watch::poll_loop;
use crate::app::watch::stream_loop;
use crate::common::color_is_disabled;
use crate::infra::ClientConfig;
use crate::infra::GridClient;
use crate::infra::ServerConfig;
#[cfg(unix)]
use crate::infra::SignalHandler;

pub struct HandlerContext {
    pub format: OutputFormat,
    presenter: Box<dyn Presenter>,
}

impl HandlerContext {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            presenter: create_presenter(format),
        }
    }

    pub fn presenter(&self) -> &dyn Presenter {
        self.presenter.as_ref()
    }

    fn client_config(&self, args: &ServerArgs) -> Result<ClientConfig> {
        let config = ClientConfig::from_env()?;
        Ok(match &args.server {
            Some(server) => config.with_server(server.clone()),
            None => config,
        })
    }

    fn client(&self, args: &ServerArgs) -> Result<(GridClient, ClientConfig)> {
        let config = self.client_config(args)?;
        debug!(server = %config.server(), "Using place server");
        let client = GridClient::new(config.server())?;
        Ok((client, config))
    }
}

pub fn handle_serve(ctx: &HandlerContext, listen: Option<String>, allow_remote: bool) -> Result<()> {
    let mut config = ServerConfig::from_env();
    if let Some(listen) = listen {
        config = config.with_listen(listen);
    }
    if allow_remote {
        config = config.with_allow_remote(true);
    }
    run_server(config, |url| ctx.presenter().present_listening(url))
        .context("place server failed")?;
    Ok(())
}

pub fn handle_get(ctx: &HandlerContext, server: &ServerArgs) -> Result<()> {
    let (client, _) = ctx.client(server)?;
    let grid = client.fetch()?;
    ctx.presenter().present_grid(&grid);
    Ok(())
}

pub fn handle_paint(
    ctx: &HandlerContext,
    row: i64,
    col: i64,
    color: Option<String>,
    server: &ServerArgs,
) -> Result<()> {
    let color = color.map(Color::new).unwrap_or_else(default_paint_color);
    let (client, _) = ctx.client(server)?;
    let grid = client.paint(row, col, &color)?;
    ctx.presenter().present_paint(&PaintOutcome {
        success: true,
        row,
        col,
        color: &color,
        grid: &grid,
    });
    Ok(())
}

pub fn handle_watch(
    ctx: &HandlerContext,
    server: &ServerArgs,
    interval_ms: Option<u64>,
    stream: bool,
) -> Result<()> {
    let (client, config) = ctx.client(server)?;
    let config = match interval_ms {
        Some(ms) => config.with_poll_interval(Duration::from_millis(ms)),
        None => config,
    };
    let interval = config.poll_interval();

    let shutdown = Arc::new(AtomicBool::new(false));
    #[cfg(unix)]
    let _signals = SignalHandler::setup(Arc::clone(&shutdown))?;

    let color = !color_is_disabled();
    let interactive = ctx.format == OutputFormat::Text && io::stdout().is_terminal();
    if interactive {
        let mut view = TerminalView::enter(io::stdout(), config.server().as_str(), color)
            .context("failed to prepare terminal")?;
        run_watch(&client, &mut view, interval, stream, &shutdown)
    } else {
        let mut view = LineView::new(io::stdout(), ctx.format == OutputFormat::Json, color);
        run_watch(&client, &mut view, interval, stream, &shutdown)
    }
}

fn run_watch<V: WatchView>(
    client: &GridClient,
    view: &mut V,
    interval: Duration,
    stream: bool,
    shutdown: &AtomicBool,
) -> Result<()> {
    if stream {
        stream_loop(client, view, interval, shutdown).context("failed to draw grid")
    } else {
        poll_loop(client, view, interval, shutdown).context("failed to draw grid")
    }
}

pub fn handle_palette(ctx: &HandlerContext) -> Result<()> {
    ctx.presenter().present_palette(&PALETTE, DEFAULT_PALETTE_INDEX);
    Ok(())
}
