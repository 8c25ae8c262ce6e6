//! Deterministic Ed25519 SSH identities
//!
//! A site seed is exactly an Ed25519 secret seed (32 bytes), so the keypair
//! is the scheme's own seed expansion with no extra randomness: the same
//! site and counter always give the same SSH key.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ed25519_dalek::SigningKey;
use ssh_key::public::{Ed25519PublicKey, KeyData};
use ssh_key::HashAlg;
use zeroize::{Zeroize, Zeroizing};

use super::{ScratchBuffer, SiteSeed};

/// Algorithm name used in key blobs and exported lines
pub const ALGORITHM: &str = "ssh-ed25519";

pub const PUBLIC_KEY_LEN: usize = 32;

/// Expanded secret key length: seed || public key
pub const SECRET_KEY_LEN: usize = 64;

/// `string(ALGORITHM) || string(public key)` is 51 bytes
const KEY_BLOB_CAPACITY: usize = 64;

/// An Ed25519 keypair derived from a site seed
pub struct Ed25519Identity {
    public: [u8; PUBLIC_KEY_LEN],
    /// Wiped on drop, or earlier via `wipe_secret`
    secret: Zeroizing<[u8; SECRET_KEY_LEN]>,
}

impl Ed25519Identity {
    /// Expand `seed` into a keypair
    pub fn from_seed(seed: &SiteSeed) -> Self {
        // SigningKey zeroizes its own copy on drop
        let signing_key = SigningKey::from_bytes(seed.as_bytes());

        Self {
            public: signing_key.verifying_key().to_bytes(),
            secret: Zeroizing::new(signing_key.to_keypair_bytes()),
        }
    }

    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.public
    }

    /// The expanded secret key in the agent's wire form (seed || public)
    pub fn secret_key(&self) -> &[u8; SECRET_KEY_LEN] {
        &self.secret
    }

    /// Zero the secret half now. The public half stays usable.
    pub fn wipe_secret(&mut self) {
        self.secret.zeroize();
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.public)
    }

    /// Public key as an `authorized_keys` line (without trailing newline)
    pub fn public_key_openssh(&self, comment: &str) -> String {
        public_key_openssh(&self.public, comment)
    }
}

impl std::fmt::Debug for Ed25519Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Identity")
            .field("fingerprint", &self.fingerprint())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Wire-format key blob: `[u32 len]["ssh-ed25519"][u32 len][public key]`
pub fn key_blob(public: &[u8; PUBLIC_KEY_LEN]) -> ScratchBuffer<KEY_BLOB_CAPACITY> {
    let mut blob = ScratchBuffer::new();
    blob.put_string(ALGORITHM.as_bytes()).put_string(public);
    blob
}

/// Format: "ssh-ed25519 <base64 key blob> <comment>"
pub fn public_key_openssh(public: &[u8; PUBLIC_KEY_LEN], comment: &str) -> String {
    let encoded = STANDARD.encode(key_blob(public).as_bytes());
    format!("{} {} {}", ALGORITHM, encoded, comment)
}

/// OpenSSH-style SHA-256 fingerprint, e.g. `SHA256:abc...`
pub fn fingerprint(public: &[u8; PUBLIC_KEY_LEN]) -> String {
    KeyData::Ed25519(Ed25519PublicKey(*public))
        .fingerprint(HashAlg::Sha256)
        .to_string()
}
