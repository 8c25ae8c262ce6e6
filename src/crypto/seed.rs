//! Per-site seed derivation (HMAC-SHA256 keyed by the master key)

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{MasterKey, ScratchBuffer, DOMAIN_TAG};
use crate::error::{Result, SlpmError};

type HmacSha256 = Hmac<Sha256>;

/// Seed length in bytes (one HMAC-SHA256 output)
pub const SEED_LEN: usize = 32;

/// 32 pseudorandom bytes derived for one (site, counter) pair.
///
/// Move-only and wiped on drop. Lives only as long as the query using it.
#[repr(transparent)]
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SiteSeed([u8; SEED_LEN]);

impl SiteSeed {
    pub fn from_bytes(bytes: [u8; SEED_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for SiteSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SiteSeed([REDACTED])")
    }
}

/// HMAC message: `DOMAIN_TAG || u32 BE len(site) || site || u32 BE counter`
pub fn seed_message(site: &[u8], counter: u32) -> ScratchBuffer<4096> {
    let mut msg = ScratchBuffer::new();
    msg.extend_from_slice(DOMAIN_TAG)
        .put_string(site)
        .put_u32(counter);
    msg
}

/// Derive the seed for `site` at `counter`
///
/// `site` is taken as raw bytes; it need not be UTF-8. Identical inputs
/// always give the identical seed.
pub fn derive_site_seed(key: &MasterKey, site: &[u8], counter: u32) -> Result<SiteSeed> {
    let msg = seed_message(site, counter);

    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| SlpmError::SeedDerivation(e.to_string()))?;
    mac.update(msg.as_bytes());

    let mut out = mac.finalize().into_bytes();
    let mut seed = SiteSeed([0u8; SEED_LEN]);
    seed.0.copy_from_slice(&out);
    out.as_mut_slice().zeroize();

    Ok(seed)
}
