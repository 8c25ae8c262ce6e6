//! Fixed-capacity scratch buffer that wipes itself
//!
//! `ScratchBuffer` is used to assemble hash inputs, agent protocol frames and
//! rendered output without touching the heap. It has two rules:
//! 1. It never grows past `N` bytes. Appends that do not fit are truncated
//!    silently, so callers size buffers generously.
//! 2. On drop (or `clear`) the whole backing array is zeroed, not only the
//!    used prefix, because it frequently holds the only copy of a secret.

use std::io::{self, Write};
use zeroize::Zeroize;

/// A stack-allocated, append-only byte buffer of capacity `N`
pub struct ScratchBuffer<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> ScratchBuffer<N> {
    pub const fn new() -> Self {
        Self { buf: [0u8; N], len: 0 }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Append a single byte, dropped if the buffer is full
    pub fn push(&mut self, byte: u8) -> &mut Self {
        if self.len < N {
            self.buf[self.len] = byte;
            self.len += 1;
        }
        self
    }

    /// Append as much of `data` as still fits
    pub fn extend_from_slice(&mut self, data: &[u8]) -> &mut Self {
        let n = data.len().min(N - self.len);
        self.buf[self.len..self.len + n].copy_from_slice(&data[..n]);
        self.len += n;
        self
    }

    /// Append a big-endian u32. Unlike byte strings this is all-or-nothing:
    /// an integer that does not fit completely is not written at all.
    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        if N - self.len >= 4 {
            self.buf[self.len..self.len + 4].copy_from_slice(&value.to_be_bytes());
            self.len += 4;
        }
        self
    }

    /// Append `[u32 BE length][data]`.
    ///
    /// The prefix always carries the full length of `data`, even if the data
    /// itself ends up truncated.
    pub fn put_string(&mut self, data: &[u8]) -> &mut Self {
        self.put_u32(data.len() as u32);
        self.extend_from_slice(data)
    }

    /// Overwrite 4 already-written bytes at `offset` with a big-endian u32.
    /// Used to patch frame length placeholders. Out-of-range offsets are ignored.
    pub fn set_u32_at(&mut self, offset: usize, value: u32) {
        if offset.checked_add(4).is_some_and(|end| end <= self.len) {
            self.buf[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
        }
    }

    /// Write the current contents to `out` in one `write_all` call
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(self.as_bytes())?;
        out.flush()
    }

    /// Zero the entire backing storage and reset the length
    pub fn clear(&mut self) {
        self.buf.zeroize();
        self.len = 0;
    }
}

impl<const N: usize> Default for ScratchBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Drop for ScratchBuffer<N> {
    fn drop(&mut self) {
        self.clear();
    }
}

// Contents may be secret
impl<const N: usize> std::fmt::Debug for ScratchBuffer<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchBuffer")
            .field("capacity", &N)
            .field("len", &self.len)
            .field("data", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::ManuallyDrop;

    #[test]
    fn test_truncates_at_capacity() {
        let mut buf = ScratchBuffer::<8>::new();
        buf.extend_from_slice(&[0xAA; 100]);

        assert_eq!(buf.len(), 8);
        assert_eq!(buf.as_bytes(), &[0xAA; 8]);

        buf.push(1);
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn test_put_u32_is_all_or_nothing() {
        let mut buf = ScratchBuffer::<6>::new();
        buf.put_u32(0x01020304);
        buf.put_u32(0x05060708);

        assert_eq!(buf.as_bytes(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_put_string_framing() {
        let mut buf = ScratchBuffer::<64>::new();
        buf.put_string(b"ssh-ed25519");

        assert_eq!(&buf.as_bytes()[..4], &[0, 0, 0, 11]);
        assert_eq!(&buf.as_bytes()[4..], b"ssh-ed25519");
    }

    #[test]
    fn test_put_string_truncated_keeps_full_prefix() {
        let mut buf = ScratchBuffer::<8>::new();
        buf.put_string(b"abcdefgh");

        assert_eq!(buf.as_bytes(), &[0, 0, 0, 8, b'a', b'b', b'c', b'd']);
    }

    #[test]
    fn test_set_u32_at_patches_placeholder() {
        let mut buf = ScratchBuffer::<16>::new();
        buf.put_u32(0).push(0x11).extend_from_slice(b"xyz");
        let body = buf.len() as u32 - 4;
        buf.set_u32_at(0, body);

        assert_eq!(buf.as_bytes(), &[0, 0, 0, 4, 0x11, b'x', b'y', b'z']);

        // past the written prefix: ignored
        buf.set_u32_at(6, 0xFFFF_FFFF);
        assert_eq!(&buf.as_bytes()[6..], b"yz");
    }

    #[test]
    fn test_write_to() {
        let mut buf = ScratchBuffer::<32>::new();
        buf.extend_from_slice(b"PIN: ").extend_from_slice(b"1234\n");

        let mut out = Vec::new();
        buf.write_to(&mut out).unwrap();
        assert_eq!(out, b"PIN: 1234\n");
    }

    #[test]
    fn test_clear_zeroes_whole_storage() {
        let mut buf = ScratchBuffer::<16>::new();
        buf.extend_from_slice(&[0xFF; 16]);
        buf.clear();

        assert!(buf.is_empty());
        assert!(buf.buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_zeroed_on_drop() {
        let mut buf = ManuallyDrop::new(ScratchBuffer::<32>::new());
        buf.extend_from_slice(b"correct horse battery staple");

        // Run the destructor in place; the storage itself stays alive
        unsafe { ManuallyDrop::drop(&mut buf) };

        assert!(buf.buf.iter().all(|&b| b == 0));
        assert_eq!(buf.len, 0);
    }
}
