//! # Presentation Sink
//!
//! [`Sink`] is the only thing the renderers write to. [`AsciiBoard`] is the
//! bundled implementation: it keeps the latest content of every cell and
//! draws the grid as a bordered text table, with ANSI colors for highlights
//! when writing to a terminal.

use crate::cells::Highlight;
use std::collections::BTreeMap;

/// Receives rendered cells.
///
/// `set_cell` replaces whatever was at `position`, so writing the same cell
/// twice leaves the board as if it had been written once.
pub trait Sink {
    fn set_cell(
        &mut self,
        position: (usize, usize),
        title: &str,
        text: &str,
        highlight: Option<Highlight>,
    );
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Cell {
    title: String,
    text: String,
    highlight: Option<Highlight>,
}

/// Text-mode board for terminals and `--once` runs.
#[derive(Clone, Debug)]
pub struct AsciiBoard {
    rows: usize,
    cols: usize,
    cell_width: usize,
    text_lines: usize,
    color: bool,
    cells: BTreeMap<(usize, usize), Cell>,
}

impl AsciiBoard {
    pub const DEFAULT_CELL_WIDTH: usize = 22;
    pub const DEFAULT_TEXT_LINES: usize = 2;

    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cell_width: Self::DEFAULT_CELL_WIDTH,
            text_lines: Self::DEFAULT_TEXT_LINES,
            color: true,
            cells: BTreeMap::new(),
        }
    }

    /// Turn ANSI colors on or off.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Text currently shown at `position`, if anything was written there.
    pub fn text_at(&self, position: (usize, usize)) -> Option<&str> {
        self.cells.get(&position).map(|c| c.text.as_str())
    }

    pub fn highlight_at(&self, position: (usize, usize)) -> Option<Highlight> {
        self.cells.get(&position).and_then(|c| c.highlight)
    }

    /// Draw the whole board.
    pub fn draw(&self) -> String {
        let separator = {
            let segment = "-".repeat(self.cell_width + 2);
            let mut line = String::from("+");
            for _ in 0..self.cols {
                line.push_str(&segment);
                line.push('+');
            }
            line
        };

        let mut out = String::new();
        out.push_str(&separator);
        out.push('\n');
        for row in 0..self.rows {
            // Title line, then a fixed number of text lines
            for line in 0..=self.text_lines {
                out.push('|');
                for col in 0..self.cols {
                    let cell = self.cells.get(&(row, col));
                    let (content, highlight) = match (cell, line) {
                        (Some(cell), 0) => (cell.title.as_str(), None),
                        (Some(cell), n) => (
                            cell.text.lines().nth(n - 1).unwrap_or(""),
                            cell.highlight,
                        ),
                        (None, _) => ("", None),
                    };
                    out.push(' ');
                    out.push_str(&self.paint(&fit(content, self.cell_width), highlight));
                    out.push_str(" |");
                }
                out.push('\n');
            }
            out.push_str(&separator);
            out.push('\n');
        }
        out
    }

    fn paint(&self, text: &str, highlight: Option<Highlight>) -> String {
        match highlight {
            Some(h) if self.color => format!("\x1b[{}m{}\x1b[0m", ansi_code(h), text),
            _ => text.to_string(),
        }
    }
}

impl Sink for AsciiBoard {
    fn set_cell(
        &mut self,
        position: (usize, usize),
        title: &str,
        text: &str,
        highlight: Option<Highlight>,
    ) {
        self.cells.insert(
            position,
            Cell {
                title: title.to_string(),
                text: text.to_string(),
                highlight,
            },
        );
    }
}

fn ansi_code(highlight: Highlight) -> &'static str {
    match highlight {
        Highlight::Green => "32",
        Highlight::Yellow => "33",
        Highlight::Orange => "38;5;208",
        Highlight::Red => "31",
        Highlight::LightBlue => "94",
    }
}

/// Pad or truncate to exactly `width` characters.
fn fit(text: &str, width: usize) -> String {
    let mut fitted: String = text.chars().take(width).collect();
    let len = fitted.chars().count();
    fitted.extend(std::iter::repeat(' ').take(width - len));
    fitted
}
