//! scrypt master key derivation
//!
//! The master key is stretched once per session from the passphrase and a
//! salt built from the user's full name. scrypt is memory-hard, which makes
//! every offline guess cost 32 MiB of RAM and a noticeable amount of time.

use scrypt::Params;

use super::{ScratchBuffer, SecureBytes, DOMAIN_TAG};
use crate::error::{Result, SlpmError};

/// Master key length in bytes
pub const MASTER_KEY_LEN: usize = 64;

/// scrypt work factors: N = 2^15 = 32768, r = 8, p = 2
const LOG_N: u8 = 15;
const BLOCK_SIZE: u32 = 8;
const PARALLELISM: u32 = 2;

/// Session master key. Never serialized, zeroed on drop.
pub struct MasterKey(SecureBytes);

impl MasterKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}

/// Build the scrypt salt: `DOMAIN_TAG || u32 BE len(identity) || identity`
pub fn master_salt(identity: &str) -> ScratchBuffer<4096> {
    let mut salt = ScratchBuffer::new();
    salt.extend_from_slice(DOMAIN_TAG)
        .put_string(identity.as_bytes());
    salt
}

/// Derive the master key from a passphrase and the user's identity string
///
/// # Arguments
/// * `passphrase` - Consumed; it is zeroed when this function returns,
///   whether derivation succeeded or not
/// * `identity` - The salt identity (usually the user's full name)
///
/// # Errors
/// Returns `KeyDerivation` if scrypt rejects its parameters or output
/// length. The caller treats this as fatal.
pub fn derive_master_key(passphrase: SecureBytes, identity: &str) -> Result<MasterKey> {
    let salt = master_salt(identity);

    let params = Params::new(LOG_N, BLOCK_SIZE, PARALLELISM, MASTER_KEY_LEN)
        .map_err(|e| SlpmError::KeyDerivation(e.to_string()))?;

    let mut key = SecureBytes::zeroed(MASTER_KEY_LEN);
    scrypt::scrypt(&passphrase, salt.as_bytes(), &params, key.as_mut_slice())
        .map_err(|e| SlpmError::KeyDerivation(e.to_string()))?;

    tracing::debug!(salt_len = salt.len(), "master key derived");
    Ok(MasterKey(key))
}

#[cfg(test)]
impl MasterKey {
    pub(crate) fn from_bytes(bytes: &[u8]) -> Self {
        Self(SecureBytes::from(bytes))
    }
}
