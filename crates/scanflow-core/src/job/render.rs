//! Row rendering for job groups.

use std::io::{self, Write};

use crossterm::cursor::{MoveDown, MoveToColumn, MoveUp};
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};

/// Surface that can redraw a fixed row relative to a baseline.
///
/// `shift` counts rows up from the baseline (1 is the row just above it).
/// Implementations must leave the cursor on the baseline after each call.
pub trait RowRenderer {
    /// Make room for `rows` rows above the baseline.
    fn reserve(&mut self, rows: usize) -> io::Result<()>;

    fn render(&mut self, shift: usize, line: &str) -> io::Result<()>;
}

/// ANSI terminal renderer: moves the cursor up, clears and rewrites the row,
/// then moves back down.
pub struct AnsiRows<W> {
    out: W,
}

impl AnsiRows<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> AnsiRows<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RowRenderer for AnsiRows<W> {
    fn reserve(&mut self, rows: usize) -> io::Result<()> {
        for _ in 0..rows {
            writeln!(self.out)?;
        }
        self.out.flush()
    }

    fn render(&mut self, shift: usize, line: &str) -> io::Result<()> {
        let shift = u16::try_from(shift).unwrap_or(u16::MAX);
        queue!(
            self.out,
            MoveToColumn(0),
            MoveUp(shift),
            Clear(ClearType::CurrentLine),
            Print(line),
            MoveToColumn(0),
            MoveDown(shift)
        )?;
        self.out.flush()
    }
}

impl<R: RowRenderer + ?Sized> RowRenderer for &mut R {
    fn reserve(&mut self, rows: usize) -> io::Result<()> {
        (**self).reserve(rows)
    }

    fn render(&mut self, shift: usize, line: &str) -> io::Result<()> {
        (**self).render(shift, line)
    }
}
