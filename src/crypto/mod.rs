//! Secret derivation pipeline for slpm
//!
//! This module provides:
//! - scrypt for stretching the passphrase into a master key
//! - HMAC-SHA256 for per-site seeds
//! - Ed25519 for deterministic SSH identities
//! - Secure memory handling with automatic zeroing

mod keys;
mod master_key;
mod scratch;
mod secure_bytes;
mod seed;

pub use keys::{
    fingerprint, key_blob, public_key_openssh, Ed25519Identity, ALGORITHM, PUBLIC_KEY_LEN,
    SECRET_KEY_LEN,
};
pub use master_key::{derive_master_key, master_salt, MasterKey, MASTER_KEY_LEN};
pub use scratch::ScratchBuffer;
pub use secure_bytes::SecureBytes;
pub use seed::{derive_site_seed, seed_message, SiteSeed, SEED_LEN};

/// Domain-separation tag mixed into both the scrypt salt and every seed
pub const DOMAIN_TAG: &[u8] = b"com.lyndir.masterpassword";
