//! Character-at-a-time line editor for the operator console.
//!
//! Both operations block (cooperatively) until the operator presses Enter:
//! they poll the [`Console`] and sleep through [`Delay`] whenever no byte is
//! waiting.  Before printing the prompt they drain whatever is already
//! buffered, so keystrokes typed at a previous screen never leak into the
//! next field.
//!
//! | Input byte        | `read_line`                        | `read_int`                          |
//! |-------------------|------------------------------------|-------------------------------------|
//! | `\r` / `\n`       | finish                             | finish                              |
//! | `\b` / DEL        | erase last char (no-op when empty) | erase last digit or the sign        |
//! | `-`               | stored                             | sign, only as the first character   |
//! | `0`–`9`           | stored                             | accumulated; stops at `max_digits`  |
//! | anything else     | stored (echoed as `*` if masked)   | ignored                             |

use crate::settings::record::FixedText;
use crate::terminal::{Console, Delay, ReadStatus};

/// Sleep between polls when no input is waiting.
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 200;

const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7F;
const ERASE_ECHO: &[u8] = b"\x08 \x08";
const LINE_END: &[u8] = b"\r\n";

fn is_backspace(byte: u8) -> bool {
    byte == BACKSPACE || byte == DELETE
}

fn is_terminator(byte: u8) -> bool {
    byte == b'\r' || byte == b'\n'
}

/// Reads text and integers from an operator console.
pub struct LineEditor<'a, C: Console + ?Sized, D: Delay + ?Sized> {
    console: &'a mut C,
    delay: &'a mut D,
    poll_interval_ms: u32,
}

impl<'a, C: Console + ?Sized, D: Delay + ?Sized> LineEditor<'a, C, D> {
    pub fn new(console: &'a mut C, delay: &'a mut D) -> Self {
        Self {
            console,
            delay,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval_ms: u32) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Reads one line of at most `max_len - 1` bytes.
    ///
    /// Characters beyond that limit are consumed and dropped without echo
    /// until the terminator arrives.  When `masked` is set every stored
    /// character is echoed as `*`.
    pub fn read_line(&mut self, prompt: &str, max_len: usize, masked: bool) -> Vec<u8> {
        let capacity = max_len.saturating_sub(1);
        let mut buffer = Vec::with_capacity(capacity);
        self.prompt(prompt);

        while let Some(byte) = self.next_byte() {
            if is_terminator(byte) {
                break;
            }
            if is_backspace(byte) {
                if buffer.pop().is_some() {
                    self.echo(ERASE_ECHO);
                }
                continue;
            }
            if buffer.len() >= capacity {
                continue;
            }
            buffer.push(byte);
            if masked {
                self.echo(b"*");
            } else {
                self.echo(&[byte]);
            }
        }

        self.echo(LINE_END);
        buffer
    }

    /// Reads a line straight into a NUL-terminated text field of `N` bytes.
    pub fn read_text<const N: usize>(&mut self, prompt: &str, masked: bool) -> FixedText<N> {
        FixedText::from_bytes_truncated(&self.read_line(prompt, N, masked))
    }

    /// Reads a signed decimal integer of at most `max_digits` digits.
    ///
    /// Returns as soon as the terminator arrives or the digit limit is hit.
    pub fn read_int(&mut self, prompt: &str, max_digits: usize) -> i64 {
        let mut value: i64 = 0;
        let mut digits = 0usize;
        let mut negative = false;
        self.prompt(prompt);

        while digits < max_digits {
            let Some(byte) = self.next_byte() else {
                break;
            };
            match byte {
                b if is_terminator(b) => break,
                b if is_backspace(b) => {
                    if digits > 0 {
                        value /= 10;
                        digits -= 1;
                        self.echo(ERASE_ECHO);
                    } else if negative {
                        negative = false;
                        self.echo(ERASE_ECHO);
                    }
                }
                b'-' if digits == 0 && !negative => {
                    negative = true;
                    self.echo(b"-");
                }
                b'0'..=b'9' => {
                    value = value
                        .saturating_mul(10)
                        .saturating_add(i64::from(byte - b'0'));
                    digits += 1;
                    self.echo(&[byte]);
                }
                _ => {}
            }
        }

        self.echo(LINE_END);
        if negative {
            -value
        } else {
            value
        }
    }

    fn prompt(&mut self, prompt: &str) {
        self.console.drain_input();
        self.console.write_str(prompt);
        self.console.flush();
    }

    fn echo(&mut self, bytes: &[u8]) {
        self.console.write(bytes);
        self.console.flush();
    }

    /// Polls until a byte arrives; `None` once the console is closed.
    fn next_byte(&mut self) -> Option<u8> {
        loop {
            match self.console.read_byte() {
                ReadStatus::Byte(byte) => return Some(byte),
                ReadStatus::Pending => self.delay.delay_ms(self.poll_interval_ms),
                ReadStatus::Closed => return None,
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
