#![expect(clippy::print_stdout, reason = "CLI output is emitted here")]
#![expect(clippy::print_stderr, reason = "CLI output is emitted here")]

//! CLI output presenter.

use clap::ValueEnum;
use place_domain::Color;
use place_domain::Grid;
use serde::Serialize;

use crate::adapters::render::printable;
use crate::adapters::render::render_grid;
use crate::adapters::render::swatch;
use crate::common::Colors;
use crate::common::color_is_disabled;

const PROGRAM_NAME: &str = "place";

/// Output format for CLI commands
#[derive(Clone, Copy, Debug, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub trait Presenter {
    fn present_grid(&self, grid: &Grid);

    fn present_paint(&self, paint: &PaintOutcome<'_>);

    fn present_palette(&self, palette: &[&str], default_index: usize);

    fn present_listening(&self, url: &str);

    fn present_error(&self, message: &str);
}

#[derive(Debug, Serialize)]
pub struct PaintOutcome<'a> {
    pub success: bool,
    pub row: i64,
    pub col: i64,
    pub color: &'a Color,
    pub grid: &'a Grid,
}

pub struct TextPresenter;

impl Presenter for TextPresenter {
    fn present_grid(&self, grid: &Grid) {
        print!("{}", render_grid(grid, !color_is_disabled()));
    }

    fn present_paint(&self, paint: &PaintOutcome<'_>) {
        println!("{}", paint_summary(paint));
    }

    fn present_palette(&self, palette: &[&str], default_index: usize) {
        let show_swatch = !color_is_disabled();
        for (index, hex) in palette.iter().enumerate() {
            let marker = if index == default_index {
                Colors::dim(" (default)")
            } else {
                String::new()
            };
            if show_swatch {
                println!("{index:>2} {} {hex}{marker}", swatch(&Color::new(*hex)));
            } else {
                println!("{index:>2} {hex}{marker}");
            }
        }
    }

    fn present_listening(&self, url: &str) {
        println!("Place server listening on {}", Colors::bold(url));
    }

    fn present_error(&self, message: &str) {
        eprintln!(
            "{}: {} {}",
            PROGRAM_NAME,
            Colors::error("Error:"),
            printable(message)
        );
    }
}

fn paint_summary(paint: &PaintOutcome<'_>) -> String {
    format!(
        "{} Painted ({}, {}) {}",
        Colors::success("✓"),
        paint.row,
        paint.col,
        printable(paint.color.as_str())
    )
}

pub struct JsonPresenter;

impl JsonPresenter {
    fn emit<T: Serialize>(value: &T) {
        println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
    }
}

impl Presenter for JsonPresenter {
    fn present_grid(&self, grid: &Grid) {
        #[derive(Serialize)]
        struct Output<'a> {
            grid: &'a Grid,
        }
        Self::emit(&Output { grid });
    }

    fn present_paint(&self, paint: &PaintOutcome<'_>) {
        Self::emit(paint);
    }

    fn present_palette(&self, palette: &[&str], default_index: usize) {
        #[derive(Serialize)]
        struct Output<'a> {
            palette: &'a [&'a str],
            default: Option<&'a str>,
        }
        Self::emit(&Output {
            palette,
            default: palette.get(default_index).copied(),
        });
    }

    fn present_listening(&self, url: &str) {
        #[derive(Serialize)]
        struct Output<'a> {
            listening: &'a str,
        }
        println!(
            "{}",
            serde_json::to_string(&Output { listening: url }).unwrap_or_default()
        );
    }

    fn present_error(&self, message: &str) {
        #[derive(Serialize)]
        struct Output<'a> {
            success: bool,
            error: &'a str,
        }
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&Output {
                success: false,
                error: message,
            })
            .unwrap_or_default()
        );
    }
}

pub fn create_presenter(format: OutputFormat) -> Box<dyn Presenter> {
    match format {
        OutputFormat::Json => Box::new(JsonPresenter),
        OutputFormat::Text => Box::new(TextPresenter),
    }
}
