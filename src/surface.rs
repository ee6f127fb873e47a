//! Display surfaces the UI thread renders into.

use std::io::Write;

use crossterm::style::{Attribute, Color, Stylize};
use tracing::warn;

use crate::render::{Rgb, Span};

/// Something that shows transcript content. Owned by the UI thread.
pub trait DisplaySurface: Send {
    /// Called on the UI thread after a message has been appended. `cursor`
    /// is the new end-of-content position, so the surface can scroll to it.
    fn on_append(&mut self, appended: &[Span], cursor: usize);
}

/// Renders spans as ANSI-styled text on a terminal writer.
pub struct TerminalSurface<W: Write + Send> {
    out: W,
}

impl TerminalSurface<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_spans(&mut self, spans: &[Span]) -> std::io::Result<()> {
        for span in spans {
            let mut content = crossterm::style::style(span.text.as_str());
            if let Some(Rgb(r, g, b)) = span.style.color {
                content = content.with(Color::Rgb { r, g, b });
            }
            if span.style.bold {
                content = content.attribute(Attribute::Bold);
            }
            write!(self.out, "{content}")?;
        }
        self.out.flush()
    }
}

impl<W: Write + Send> DisplaySurface for TerminalSurface<W> {
    fn on_append(&mut self, appended: &[Span], _cursor: usize) {
        // A terminal scrolls by itself; the cursor is always at the tail.
        if let Err(e) = self.write_spans(appended) {
            warn!(error = %e, "Failed to write to terminal");
        }
    }
}
