//! Bounded line accumulator for the inbound byte stream.
//!
//! Bytes are collected until a `\n` or `\r` terminator. A line that would
//! not fit is dropped as a whole: the buffer reports [`LineEvent::Overflow`]
//! once and then swallows everything up to and including the next
//! terminator, so the tail of an over-long command is never mistaken for a
//! command of its own.

/// Default buffer capacity in bytes, including the reserved terminator slot.
pub const DEFAULT_CAPACITY: usize = 64;

/// Smallest usable capacity (one payload byte plus the terminator slot).
pub const MIN_CAPACITY: usize = 2;

/// Outcome of feeding a single byte into a [`LineBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent {
    /// Byte stored, or a blank terminator ignored. Nothing to act on.
    Accumulating,
    /// A complete, non-empty line is available through [`LineBuffer::line`].
    LineReady,
    /// The line exceeded the capacity; its bytes were discarded.
    Overflow,
    /// Byte swallowed while skipping the remainder of an over-long line.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BufferState {
    Accumulating,
    Ready,
    Discarding,
}

/// Fixed-capacity byte accumulator with a write cursor.
///
/// The cursor never exceeds `capacity - 1`; the last slot stays reserved so
/// that a full line plus its terminator always fits.
#[derive(Debug, Clone)]
pub struct LineBuffer {
    bytes: Box<[u8]>,
    cursor: usize,
    state: BufferState,
}

impl LineBuffer {
    /// Create a buffer holding lines of up to `capacity - 1` bytes.
    ///
    /// Capacities below [`MIN_CAPACITY`] are raised to it.
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity.max(MIN_CAPACITY)].into_boxed_slice(),
            cursor: 0,
            state: BufferState::Accumulating,
        }
    }

    /// Total capacity, including the reserved terminator slot.
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Number of bytes currently accumulated.
    pub fn len(&self) -> usize {
        self.cursor
    }

    /// Whether no bytes are accumulated.
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Whether the buffer is skipping the rest of an over-long line.
    pub fn is_discarding(&self) -> bool {
        self.state == BufferState::Discarding
    }

    /// Feed one byte from the transport.
    pub fn feed(&mut self, byte: u8) -> LineEvent {
        if self.state == BufferState::Ready {
            self.clear();
        }

        let terminator = is_terminator(byte);

        if self.state == BufferState::Discarding {
            if terminator {
                self.state = BufferState::Accumulating;
            }
            return LineEvent::Discarded;
        }

        if terminator {
            if self.cursor == 0 {
                return LineEvent::Accumulating;
            }
            self.state = BufferState::Ready;
            return LineEvent::LineReady;
        }

        if self.cursor < self.bytes.len() - 1 {
            self.bytes[self.cursor] = byte;
            self.cursor += 1;
            return LineEvent::Accumulating;
        }

        self.cursor = 0;
        self.state = BufferState::Discarding;
        LineEvent::Overflow
    }

    /// The accumulated bytes, without terminator.
    ///
    /// After [`LineEvent::LineReady`] this is the completed line.
    pub fn line(&self) -> &[u8] {
        &self.bytes[..self.cursor]
    }

    /// Drop the accumulated line and reset the cursor.
    ///
    /// A pending discard of an over-long line is left in effect.
    pub fn clear(&mut self) {
        self.cursor = 0;
        if self.state == BufferState::Ready {
            self.state = BufferState::Accumulating;
        }
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

fn is_terminator(byte: u8) -> bool {
    byte == b'\n' || byte == b'\r'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(buffer: &mut LineBuffer, bytes: &[u8]) -> Vec<LineEvent> {
        bytes.iter().map(|&b| buffer.feed(b)).collect()
    }

    #[test]
    fn completes_line_on_newline() {
        let mut buffer = LineBuffer::default();
        let events = feed_all(&mut buffer, b"GET_ID\n");

        assert_eq!(events.last(), Some(&LineEvent::LineReady));
        assert_eq!(
            events.iter().filter(|e| **e == LineEvent::LineReady).count(),
            1
        );
        assert_eq!(buffer.line(), b"GET_ID");
    }

    #[test]
    fn carriage_return_also_terminates() {
        let mut buffer = LineBuffer::default();
        feed_all(&mut buffer, b"HELP");
        assert_eq!(buffer.feed(b'\r'), LineEvent::LineReady);
        assert_eq!(buffer.line(), b"HELP");
    }

    #[test]
    fn blank_terminators_are_ignored() {
        let mut buffer = LineBuffer::default();
        let events = feed_all(&mut buffer, b"\r\n\n\r");
        assert!(events.iter().all(|e| *e == LineEvent::Accumulating));
        assert!(buffer.is_empty());
    }

    #[test]
    fn crlf_yields_single_line() {
        let mut buffer = LineBuffer::default();
        let mut ready = 0;
        for &b in b"GO_HOME\r\n" {
            if buffer.feed(b) == LineEvent::LineReady {
                ready += 1;
                buffer.clear();
            }
        }
        assert_eq!(ready, 1);
    }

    #[test]
    fn unconsumed_line_is_reset_on_next_byte() {
        let mut buffer = LineBuffer::default();
        feed_all(&mut buffer, b"ONE\n");
        assert_eq!(buffer.feed(b'T'), LineEvent::Accumulating);
        assert_eq!(buffer.line(), b"T");
    }

    #[test]
    fn holds_capacity_minus_one_bytes() {
        let mut buffer = LineBuffer::new(8);
        let events = feed_all(&mut buffer, b"1234567");
        assert!(events.iter().all(|e| *e == LineEvent::Accumulating));
        assert_eq!(buffer.feed(b'\n'), LineEvent::LineReady);
        assert_eq!(buffer.line(), b"1234567");
    }

    #[test]
    fn overflow_is_reported_once_and_discards_until_terminator() {
        let mut buffer = LineBuffer::new(8);
        let events = feed_all(&mut buffer, b"12345678");

        assert_eq!(events[7], LineEvent::Overflow);
        assert!(buffer.is_empty());
        assert!(buffer.is_discarding());

        let tail = feed_all(&mut buffer, b"9ABC\n");
        assert!(tail.iter().all(|e| *e == LineEvent::Discarded));
        assert!(!buffer.is_discarding());

        feed_all(&mut buffer, b"GET_ID");
        assert_eq!(buffer.feed(b'\n'), LineEvent::LineReady);
        assert_eq!(buffer.line(), b"GET_ID");
    }

    #[test]
    fn overflow_tail_is_not_split_into_a_second_command() {
        let mut buffer = LineBuffer::new(8);
        let events = feed_all(&mut buffer, b"ABSOLUTE_MOVE 1 2 3\n");
        assert_eq!(
            events.iter().filter(|e| **e == LineEvent::Overflow).count(),
            1
        );
        assert!(!events.contains(&LineEvent::LineReady));
    }

    #[test]
    fn capacity_is_clamped_to_minimum() {
        let buffer = LineBuffer::new(0);
        assert_eq!(buffer.capacity(), MIN_CAPACITY);
    }

    #[test]
    fn clear_keeps_pending_discard() {
        let mut buffer = LineBuffer::new(2);
        feed_all(&mut buffer, b"ab");
        buffer.clear();
        assert!(buffer.is_discarding());
        assert_eq!(buffer.feed(b'c'), LineEvent::Discarded);
    }
}
