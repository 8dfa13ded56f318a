//! Response formatting.
//!
//! Every recognised command is answered with `ACK <NAME>`, at most one
//! `ERROR: <message>` (or free text such as the help listing) and a final
//! `DONE <NAME>` that may carry a payload. Numeric payloads use a fixed
//! precision so clients can parse them reliably.

use crate::error::ProtocolError;
use crate::operations::Position;
use std::io::{self, Write};

/// Line terminator appended to every response line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineEnding {
    /// `\r\n`, as written by the device firmware.
    #[default]
    CrLf,
    /// `\n`
    Lf,
}

impl LineEnding {
    /// The terminator bytes.
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::CrLf => "\r\n",
            LineEnding::Lf => "\n",
        }
    }
}

/// Format a position payload with two decimals per component.
pub fn format_position(position: &Position) -> String {
    format!("{:.2} {:.2} {:.2}", position.x, position.y, position.z)
}

/// Format a speed payload without decimals, halves rounded away from zero.
pub fn format_speed(speed: f64) -> String {
    format!("{:.0}", speed.round())
}

/// Writes protocol lines onto an output sink.
#[derive(Debug)]
pub struct ResponseEmitter<W> {
    sink: W,
    line_ending: LineEnding,
}

impl<W: Write> ResponseEmitter<W> {
    /// Wrap a sink using `\r\n` line endings.
    pub fn new(sink: W) -> Self {
        Self::with_line_ending(sink, LineEnding::default())
    }

    /// Wrap a sink with an explicit line ending.
    pub fn with_line_ending(sink: W, line_ending: LineEnding) -> Self {
        Self { sink, line_ending }
    }

    /// Write a raw line.
    pub fn line(&mut self, text: &str) -> io::Result<()> {
        self.sink.write_all(text.as_bytes())?;
        self.sink.write_all(self.line_ending.as_str().as_bytes())
    }

    /// `ACK <NAME>`
    pub fn ack(&mut self, command: &str) -> io::Result<()> {
        self.line(&format!("ACK {command}"))
    }

    /// `ERROR: <message>`
    pub fn error(&mut self, error: &ProtocolError) -> io::Result<()> {
        self.line(&format!("ERROR: {error}"))
    }

    /// `DONE <NAME>` or `DONE <NAME>: <payload>`
    pub fn done(&mut self, command: &str, payload: Option<&str>) -> io::Result<()> {
        match payload {
            Some(payload) => self.line(&format!("DONE {command}: {payload}")),
            None => self.line(&format!("DONE {command}")),
        }
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }

    /// Unwrap the sink.
    pub fn into_inner(self) -> W {
        self.sink
    }
}
