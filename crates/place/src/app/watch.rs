//! Live terminal viewer for a remote canvas.

use std::io;
use std::io::Write;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use crossterm::cursor;
use crossterm::execute;
use crossterm::queue;
use crossterm::style;
use crossterm::terminal;
use place_domain::Grid;
use serde::Serialize;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::adapters::render::printable;
use crate::adapters::render::render_grid;
use crate::common::Colors;
use crate::infra::ClientError;
use crate::infra::GridClient;
use crate::infra::GridStream;
use crate::infra::stream::StreamUpdate;

const STREAM_READ_TIMEOUT: Duration = Duration::from_millis(250);
const SHUTDOWN_CHECK_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus<'a> {
    Live,
    /// Showing the last grid seen because the latest refresh failed.
    Stale(&'a str),
}

pub trait WatchView {
    fn show(&mut self, grid: Option<&Grid>, status: FrameStatus<'_>) -> io::Result<()>;
}

pub trait GridSource {
    fn fetch_grid(&self) -> Result<Grid, ClientError>;
}

impl GridSource for GridClient {
    fn fetch_grid(&self) -> Result<Grid, ClientError> {
        self.fetch()
    }
}

/// Suppresses redraws when nothing visible changed.
#[derive(Default)]
struct FrameTracker {
    last: Option<Grid>,
    stale: bool,
}

impl FrameTracker {
    fn accept(&mut self, grid: Grid) -> bool {
        let changed = self.stale || self.last.as_ref() != Some(&grid);
        self.last = Some(grid);
        self.stale = false;
        changed
    }

    fn fail(&mut self) -> bool {
        let first_failure = !self.stale;
        self.stale = true;
        first_failure
    }
}

/// Fetches the grid every `interval` until `shutdown` is raised. Fetch
/// failures keep the last grid on screen and are retried on the next tick.
pub fn poll_loop<S: GridSource, V: WatchView>(
    source: &S,
    view: &mut V,
    interval: Duration,
    shutdown: &AtomicBool,
) -> io::Result<()> {
    let mut tracker = FrameTracker::default();
    while !shutdown.load(Ordering::SeqCst) {
        let started = Instant::now();
        match source.fetch_grid() {
            Ok(grid) => {
                if tracker.accept(grid) {
                    view.show(tracker.last.as_ref(), FrameStatus::Live)?;
                }
            }
            Err(err) => {
                warn!(error = %err, "Grid refresh failed; keeping last grid");
                if tracker.fail() {
                    let reason = err.to_string();
                    view.show(tracker.last.as_ref(), FrameStatus::Stale(&reason))?;
                }
            }
        }
        sleep_unless_shutdown(interval.saturating_sub(started.elapsed()), shutdown);
    }
    Ok(())
}

/// Follows the push stream, reconnecting after `retry` when it drops.
pub fn stream_loop<V: WatchView>(
    client: &GridClient,
    view: &mut V,
    retry: Duration,
    shutdown: &AtomicBool,
) -> io::Result<()> {
    let mut tracker = FrameTracker::default();
    while !shutdown.load(Ordering::SeqCst) {
        let reason = match GridStream::connect(client.stream_url(), STREAM_READ_TIMEOUT) {
            Ok(mut stream) => {
                info!(url = %client.stream_url(), "Grid stream connected");
                let reason = follow_stream(&mut stream, view, &mut tracker, shutdown)?;
                stream.close();
                reason
            }
            Err(err) => Some(err.to_string()),
        };
        let Some(reason) = reason else {
            break;
        };
        warn!(reason = %reason, "Grid stream unavailable; retrying");
        if tracker.fail() {
            view.show(tracker.last.as_ref(), FrameStatus::Stale(&reason))?;
        }
        sleep_unless_shutdown(retry, shutdown);
    }
    Ok(())
}

/// Returns `None` on shutdown, or why the stream ended.
fn follow_stream<V: WatchView>(
    stream: &mut GridStream,
    view: &mut V,
    tracker: &mut FrameTracker,
    shutdown: &AtomicBool,
) -> io::Result<Option<String>> {
    while !shutdown.load(Ordering::SeqCst) {
        match stream.poll() {
            Ok(StreamUpdate::Grid { revision, grid }) => {
                debug!(revision, "Grid update received");
                if tracker.accept(grid) {
                    view.show(tracker.last.as_ref(), FrameStatus::Live)?;
                }
            }
            Ok(StreamUpdate::Idle) => {}
            Ok(StreamUpdate::Closed) => return Ok(Some("stream closed by server".to_string())),
            Err(err) => return Ok(Some(err.to_string())),
        }
    }
    Ok(None)
}

fn sleep_unless_shutdown(total: Duration, shutdown: &AtomicBool) {
    let deadline = Instant::now() + total;
    loop {
        if shutdown.load(Ordering::SeqCst) {
            return;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return;
        }
        thread::sleep(remaining.min(SHUTDOWN_CHECK_INTERVAL));
    }
}

/// Full-screen view on the alternate screen. Restores the terminal on drop.
pub struct TerminalView<W: Write> {
    out: W,
    server: String,
    color: bool,
}

impl<W: Write> TerminalView<W> {
    pub fn enter(mut out: W, server: impl Into<String>, color: bool) -> io::Result<Self> {
        execute!(
            out,
            terminal::EnterAlternateScreen,
            terminal::Clear(terminal::ClearType::All),
            cursor::Hide
        )?;
        Ok(Self {
            out,
            server: server.into(),
            color,
        })
    }
}

impl<W: Write> WatchView for TerminalView<W> {
    fn show(&mut self, grid: Option<&Grid>, status: FrameStatus<'_>) -> io::Result<()> {
        queue!(
            self.out,
            terminal::Clear(terminal::ClearType::All),
            cursor::MoveTo(0, 0),
            style::SetAttribute(style::Attribute::Reset),
            style::ResetColor
        )?;
        writeln!(self.out, "{} {}", Colors::bold("place"), printable(&self.server))?;
        writeln!(self.out)?;
        match grid {
            Some(grid) => write!(self.out, "{}", render_grid(grid, self.color))?,
            None => writeln!(self.out, "{}", Colors::dim("(no grid yet)"))?,
        }
        writeln!(self.out)?;
        match status {
            FrameStatus::Live => writeln!(self.out, "{}", Colors::success("live"))?,
            FrameStatus::Stale(reason) => {
                writeln!(self.out, "{} {}", Colors::warning("stale:"), printable(reason))?
            }
        }
        writeln!(self.out, "{}", Colors::dim("Ctrl-C to quit"))?;
        self.out.flush()
    }
}

impl<W: Write> Drop for TerminalView<W> {
    fn drop(&mut self) {
        let _ = execute!(
            self.out,
            style::ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        );
    }
}

/// Appends one frame per change, for pipes and scripts. Stale frames are
/// only logged.
pub struct LineView<W: Write> {
    out: W,
    json: bool,
    color: bool,
}

impl<W: Write> LineView<W> {
    pub fn new(out: W, json: bool, color: bool) -> Self {
        Self { out, json, color }
    }
}

impl<W: Write> WatchView for LineView<W> {
    fn show(&mut self, grid: Option<&Grid>, status: FrameStatus<'_>) -> io::Result<()> {
        let (Some(grid), FrameStatus::Live) = (grid, status) else {
            return Ok(());
        };
        if self.json {
            #[derive(Serialize)]
            struct Frame<'a> {
                grid: &'a Grid,
            }
            let line = serde_json::to_string(&Frame { grid }).map_err(io::Error::other)?;
            writeln!(self.out, "{line}")?;
        } else {
            writeln!(self.out, "{}", render_grid(grid, self.color))?;
        }
        self.out.flush()
    }
}
