//! Heap container for secrets of runtime-determined length
//!
//! Holds the passphrase and the master key. The bytes are:
//! 1. Zeroed before the allocation is released
//! 2. Never cloned or printed
//! 3. Locked in memory where possible (prevents swapping)

use std::ops::Deref;
use zeroize::Zeroize;

/// A secure container for sensitive bytes that automatically zeroes on drop
pub struct SecureBytes(Vec<u8>);

impl SecureBytes {
    /// Take ownership of `data`; from here on its memory is managed securely
    pub fn new(data: Vec<u8>) -> Self {
        let secure = Self(data);
        secure.lock_memory();
        secure
    }

    /// Zero-filled buffer of `len` bytes, for primitives that write into a slice
    pub fn zeroed(len: usize) -> Self {
        Self::new(vec![0u8; len])
    }

    /// Lock memory to prevent swapping (best effort, may fail without privileges)
    fn lock_memory(&self) {
        if self.0.capacity() == 0 {
            return;
        }
        unsafe {
            libc::mlock(self.0.as_ptr() as *const libc::c_void, self.0.capacity());
        }
    }

    fn unlock_memory(&self) {
        if self.0.capacity() == 0 {
            return;
        }
        unsafe {
            libc::munlock(self.0.as_ptr() as *const libc::c_void, self.0.capacity());
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

impl Deref for SecureBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<u8>> for SecureBytes {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<String> for SecureBytes {
    fn from(data: String) -> Self {
        Self::new(data.into_bytes())
    }
}

impl From<&[u8]> for SecureBytes {
    fn from(data: &[u8]) -> Self {
        Self::new(data.to_vec())
    }
}

impl Zeroize for SecureBytes {
    fn zeroize(&mut self) {
        // Vec::zeroize wipes the spare capacity too
        self.0.zeroize();
    }
}

impl Drop for SecureBytes {
    fn drop(&mut self) {
        self.0.zeroize();
        self.unlock_memory();
    }
}

// Prevent accidental debug printing of secrets
impl std::fmt::Debug for SecureBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureBytes")
            .field("len", &self.0.len())
            .field("data", &"[REDACTED]")
            .finish()
    }
}
