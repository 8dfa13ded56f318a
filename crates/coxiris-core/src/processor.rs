//! The read step: bytes in, responses out.
//!
//! [`CommandProcessor`] owns the line buffer and the dispatcher. The host
//! feeds it whatever bytes the transport produced and gets back one
//! [`DispatchReport`] per completed (or dropped) line.

use crate::dispatcher::{DispatchReport, Dispatcher};
use crate::error::ProtocolError;
use crate::line_buffer::{LineBuffer, LineEvent};
use crate::response::{LineEnding, ResponseEmitter};
use std::io::{self, Write};
use tracing::warn;

/// Line buffer plus dispatcher, driven one byte at a time.
#[derive(Debug, Clone)]
pub struct CommandProcessor {
    buffer: LineBuffer,
    dispatcher: Dispatcher,
    line_ending: LineEnding,
}

impl CommandProcessor {
    /// Create a processor with the given buffer capacity.
    pub fn new(dispatcher: Dispatcher, capacity: usize) -> Self {
        Self {
            buffer: LineBuffer::new(capacity),
            dispatcher,
            line_ending: LineEnding::default(),
        }
    }

    /// Use a different response line ending.
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// The dispatcher in use.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The line buffer, for inspection.
    pub fn buffer(&self) -> &LineBuffer {
        &self.buffer
    }

    /// Feed one byte; respond if it completed or overflowed a line.
    pub fn feed<W: Write>(
        &mut self,
        byte: u8,
        out: &mut ResponseEmitter<W>,
    ) -> io::Result<Option<DispatchReport>> {
        match self.buffer.feed(byte) {
            LineEvent::Accumulating | LineEvent::Discarded => Ok(None),
            LineEvent::LineReady => {
                let report = self.dispatcher.dispatch_line(self.buffer.line(), out);
                self.buffer.clear();
                report.map(Some)
            }
            LineEvent::Overflow => {
                let error = ProtocolError::BufferOverflow {
                    capacity: self.buffer.capacity(),
                };
                warn!(capacity = self.buffer.capacity(), "inbound line too long, discarding");
                out.error(&error)?;
                Ok(Some(DispatchReport::rejected(error)))
            }
        }
    }

    /// Feed a chunk of bytes, writing all responses to `sink`.
    pub fn process<W: Write>(&mut self, bytes: &[u8], sink: W) -> io::Result<Vec<DispatchReport>> {
        let mut out = ResponseEmitter::with_line_ending(sink, self.line_ending);
        let mut reports = Vec::new();
        for &byte in bytes {
            if let Some(report) = self.feed(byte, &mut out)? {
                reports.push(report);
            }
        }
        out.flush()?;
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandKind;
    use crate::operations::DeviceOperations;

    fn processor(capacity: usize) -> CommandProcessor {
        CommandProcessor::new(Dispatcher::new(DeviceOperations::new()), capacity)
    }

    #[test]
    fn partial_lines_wait_for_terminator() {
        let mut processor = processor(64);
        let mut out = Vec::new();

        let reports = processor.process(b"GET_", &mut out).unwrap();
        assert!(reports.is_empty());
        assert!(out.is_empty());

        let reports = processor.process(b"ID\n", &mut out).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].command, Some(CommandKind::GetId));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "ACK GET_ID\r\nDONE GET_ID: CX25F7TK9P\r\n"
        );
    }

    #[test]
    fn overflow_reports_once_and_resumes() {
        let mut processor = processor(8);
        let mut out = Vec::new();

        let reports = processor
            .process(b"ABSOLUTE_MOVE 1 2 3\r\nGET_ID\r\n", &mut out)
            .unwrap();

        assert_eq!(reports.len(), 2);
        assert!(matches!(
            reports[0].error,
            Some(ProtocolError::BufferOverflow { capacity: 8 })
        ));
        assert_eq!(reports[1].command, Some(CommandKind::GetId));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "ERROR: Command too long\r\nACK GET_ID\r\nDONE GET_ID: CX25F7TK9P\r\n"
        );
    }

    #[test]
    fn several_lines_in_one_chunk() {
        let mut processor = processor(64).with_line_ending(LineEnding::Lf);
        let mut out = Vec::new();
        let reports = processor
            .process(b"get_id\rcheck_errors\n\n", &mut out)
            .unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "ACK GET_ID\nDONE GET_ID: CX25F7TK9P\nACK CHECK_ERRORS\nERROR: CHECK_ERRORS function not configured\nDONE CHECK_ERRORS\n"
        );
    }

    #[test]
    fn whitespace_only_line_produces_no_output() {
        let mut processor = processor(64);
        let mut out = Vec::new();
        let reports = processor.process(b"   \t\n", &mut out).unwrap();
        assert_eq!(reports, vec![DispatchReport::idle()]);
        assert!(out.is_empty());
    }
}
