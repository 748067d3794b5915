//! Operator console abstraction.
//!
//! The configuration menu and the line editor talk to a human over a duplex
//! byte stream (a UART on the device, stdin/stdout on a development host).
//! Reads never block: the caller polls, and sleeps through [`Delay`] between
//! attempts.

/// Result of polling the console for one input byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// A byte was available.
    Byte(u8),
    /// Nothing buffered right now; poll again later.
    Pending,
    /// The input side is gone and will never produce more bytes.
    Closed,
}

/// Duplex character stream to the operator.
pub trait Console {
    /// Returns the next buffered byte without waiting.
    fn read_byte(&mut self) -> ReadStatus;

    /// Queues bytes for output.
    fn write(&mut self, bytes: &[u8]);

    /// Pushes queued output to the operator.
    fn flush(&mut self);

    /// Convenience wrapper for text output.
    fn write_str(&mut self, text: &str) {
        self.write(text.as_bytes());
    }

    /// Writes `text` followed by CR LF.
    fn write_line(&mut self, text: &str) {
        self.write(text.as_bytes());
        self.write(b"\r\n");
    }

    /// Discards everything already buffered on the input side.
    fn drain_input(&mut self) {
        while let ReadStatus::Byte(_) = self.read_byte() {}
    }
}

/// Cooperative sleep used between polls.
pub trait Delay {
    fn delay_ms(&mut self, ms: u32);
}
