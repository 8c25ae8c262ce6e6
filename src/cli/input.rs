//! Line input for prompts
//!
//! `LineReader` keeps one bounded buffer across calls and carries any bytes
//! read past the current newline over to the next call, so several answers
//! piped in one chunk are all seen.

use std::io::{self, IsTerminal, Read, Stdin, Stdout, Write};
use zeroize::Zeroize;

use crate::crypto::SecureBytes;
use crate::error::Result;

/// Longest line the reader returns in one piece
pub const LINE_BUFFER_LEN: usize = 256;

/// Source of prompted answers
pub trait Prompter {
    /// Show `text` and read one line. `None` means end of input.
    fn prompt(&mut self, text: &str) -> Result<Option<SecureBytes>>;

    /// Like `prompt`, but the answer is not echoed where possible
    fn prompt_secret(&mut self, text: &str) -> Result<Option<SecureBytes>>;
}

/// Buffered line reader with explicit carry-over state
pub struct LineReader<R> {
    input: R,
    buf: [u8; LINE_BUFFER_LEN],
    /// Bytes of `buf` holding input
    filled: usize,
    /// Bytes of `buf` already handed out (line plus its newline)
    consumed: usize,
}

impl<R: Read> LineReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            buf: [0u8; LINE_BUFFER_LEN],
            filled: 0,
            consumed: 0,
        }
    }

    /// Next line without its `\n`
    ///
    /// Returns `None` at end of input; a trailing fragment with no newline is
    /// discarded. A line that fills the whole buffer without a newline is
    /// returned as it stands.
    pub fn read_line(&mut self) -> io::Result<Option<SecureBytes>> {
        self.compact();

        loop {
            if let Some(pos) = self.buf[..self.filled].iter().position(|&b| b == b'\n') {
                self.consumed = pos + 1;
                return Ok(Some(SecureBytes::from(&self.buf[..pos])));
            }

            if self.filled == LINE_BUFFER_LEN {
                self.consumed = LINE_BUFFER_LEN;
                return Ok(Some(SecureBytes::from(&self.buf[..])));
            }

            let read = match self.input.read(&mut self.buf[self.filled..]) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if read == 0 {
                return Ok(None);
            }
            self.filled += read;
        }
    }

    /// Wipe what was handed out last time and move the rest to the front
    fn compact(&mut self) {
        if self.consumed == 0 {
            return;
        }
        let remaining = self.filled - self.consumed;
        self.buf[..self.consumed].zeroize();
        self.buf.copy_within(self.consumed..self.filled, 0);
        self.buf[remaining..self.filled].zeroize();
        self.filled = remaining;
        self.consumed = 0;
    }
}

impl<R> Drop for LineReader<R> {
    fn drop(&mut self) {
        self.buf.zeroize();
    }
}

/// Prompts on a writer, answers from a `LineReader`
pub struct Terminal<R, W> {
    reader: LineReader<R>,
    output: W,
    /// Use `rpassword` for secrets (input is a real terminal)
    interactive: bool,
}

impl Terminal<Stdin, Stdout> {
    /// Standard input/output. Secrets are read with echo off when stdin is a tty.
    pub fn stdio() -> Self {
        let stdin = io::stdin();
        let interactive = stdin.is_terminal();
        Self::new(stdin, io::stdout(), interactive)
    }
}

impl<R: Read, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W, interactive: bool) -> Self {
        Self {
            reader: LineReader::new(input),
            output,
            interactive,
        }
    }

    pub fn output(&self) -> &W {
        &self.output
    }
}

impl<R: Read, W: Write> Prompter for Terminal<R, W> {
    fn prompt(&mut self, text: &str) -> Result<Option<SecureBytes>> {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()?;
        Ok(self.reader.read_line()?)
    }

    fn prompt_secret(&mut self, text: &str) -> Result<Option<SecureBytes>> {
        if !self.interactive {
            return self.prompt(text);
        }
        match rpassword::prompt_password(text) {
            Ok(secret) => Ok(Some(SecureBytes::from(secret))),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Parse a counter the way C `atoi` does for non-negative input: leading
/// ASCII digits only, 0 if there are none, wrapping past `u32::MAX`
pub fn parse_counter(text: &[u8]) -> u32 {
    text.iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0u32, |acc, b| acc.wrapping_mul(10).wrapping_add(u32::from(b - b'0')))
}
