//! Agent client with a fixed ring of registered identities
//!
//! Identities are added with a confirm constraint and tracked in an
//! 8-slot ring. When the ring wraps, the oldest identity is removed from the
//! agent before its slot is reused; on shutdown every remaining identity is
//! removed. Removal is best effort: a failure frees the slot anyway and is
//! queued for the caller to report (see `take_removal_failures`).

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;

use subtle::{Choice, ConstantTimeEq};
use tracing::{debug, info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::protocol::{add_identity_request, remove_identity_request, transact};
use crate::crypto::{Ed25519Identity, PUBLIC_KEY_LEN};
use crate::error::{Result, SlpmError};

/// Number of identities kept in the agent at once
pub const RING_SIZE: usize = 8;

/// Outcome of [`AgentClient::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Agent use is switched off; nothing was sent
    Inactive,
    /// The same public key is already registered by this client
    AlreadyPresent,
    /// Added; `evicted` is set when the oldest identity had to make room
    Added { evicted: bool },
}

/// One registered identity
#[derive(Zeroize, ZeroizeOnDrop)]
struct AgentSlot {
    public_key: [u8; PUBLIC_KEY_LEN],
    fingerprint: String,
}

/// Why an agent that was asked for is not there
#[derive(Debug, Clone, Copy)]
enum Unreachable {
    NotConfigured,
    Connect(io::ErrorKind),
}

impl Unreachable {
    fn error(self) -> SlpmError {
        match self {
            Self::NotConfigured => SlpmError::AgentNotConfigured,
            Self::Connect(kind) => SlpmError::AgentConnect(io::Error::from(kind)),
        }
    }
}

enum Link<S> {
    Disabled,
    Unreachable(Unreachable),
    Connected(S),
}

/// Client for a local ssh-agent, generic over the stream for testing
pub struct AgentClient<S: Read + Write = UnixStream> {
    link: Link<S>,
    slots: [Option<AgentSlot>; RING_SIZE],
    next: usize,
    /// Removals the agent refused or never answered, oldest first
    removal_failures: Vec<SlpmError>,
}

impl AgentClient<UnixStream> {
    /// Connect to the agent socket at `path`
    pub fn connect(path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(path).map_err(SlpmError::AgentConnect)?;
        debug!(path = %path.display(), "connected to ssh-agent");
        Ok(Self::from_stream(stream))
    }
}

impl<S: Read + Write> AgentClient<S> {
    fn with_link(link: Link<S>) -> Self {
        Self {
            link,
            slots: Default::default(),
            next: 0,
            removal_failures: Vec::new(),
        }
    }

    pub fn from_stream(stream: S) -> Self {
        Self::with_link(Link::Connected(stream))
    }

    /// A client that never talks to anything. `register` reports `Inactive`.
    pub fn disabled() -> Self {
        Self::with_link(Link::Disabled)
    }

    /// No agent address was given. Every `register` fails with
    /// `AgentNotConfigured`.
    pub fn not_configured() -> Self {
        Self::with_link(Link::Unreachable(Unreachable::NotConfigured))
    }

    /// Connecting failed with `kind`. Every `register` fails with
    /// `AgentConnect`.
    pub fn unreachable(kind: io::ErrorKind) -> Self {
        Self::with_link(Link::Unreachable(Unreachable::Connect(kind)))
    }

    pub fn is_available(&self) -> bool {
        matches!(self.link, Link::Connected(_))
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Public key held in ring slot `index`, if any
    pub fn slot_public_key(&self, index: usize) -> Option<&[u8; PUBLIC_KEY_LEN]> {
        self.slots.get(index)?.as_ref().map(|slot| &slot.public_key)
    }

    /// Whether `public_key` is held in any slot. Compares in constant time
    /// and always visits every slot.
    pub fn contains(&self, public_key: &[u8; PUBLIC_KEY_LEN]) -> bool {
        let found = self
            .slots
            .iter()
            .flatten()
            .fold(Choice::from(0), |acc, slot| acc | slot.public_key.ct_eq(public_key));
        found.into()
    }

    /// Hand `identity` to the agent
    ///
    /// The caller still owns the secret key and must wipe it once this
    /// returns, whatever the outcome.
    ///
    /// # Errors
    /// An agent that could not be reached, I/O failures and unexpected agent
    /// replies. The ring is left unchanged.
    pub fn register(&mut self, identity: &Ed25519Identity, comment: &str) -> Result<Registration> {
        match &self.link {
            Link::Disabled => return Ok(Registration::Inactive),
            Link::Unreachable(cause) => return Err(cause.error()),
            Link::Connected(_) => {}
        }

        let public_key = identity.public_key();
        if self.contains(public_key) {
            return Ok(Registration::AlreadyPresent);
        }

        if let Link::Connected(stream) = &mut self.link {
            let request = add_identity_request(identity, comment);
            transact(stream, &request)?;
        }

        let evicted = self.release_slot(self.next);
        let fingerprint = identity.fingerprint();
        info!(slot = self.next, %fingerprint, "identity added to ssh-agent");
        self.slots[self.next] = Some(AgentSlot {
            public_key: *public_key,
            fingerprint,
        });
        self.next = (self.next + 1) % RING_SIZE;

        Ok(Registration::Added { evicted })
    }

    /// Empty slot `index`, asking the agent to forget its identity first.
    /// Returns whether the slot was occupied.
    fn release_slot(&mut self, index: usize) -> bool {
        let Some(slot) = self.slots[index].take() else {
            return false;
        };

        if let Link::Connected(stream) = &mut self.link {
            let request = remove_identity_request(&slot.public_key);
            match transact(stream, &request) {
                Ok(()) => debug!(slot = index, fingerprint = %slot.fingerprint, "identity removed from ssh-agent"),
                Err(e) => {
                    warn!(slot = index, fingerprint = %slot.fingerprint, "removing key from ssh-agent failed: {}", e);
                    self.removal_failures.push(SlpmError::AgentRemove(Box::new(e)));
                }
            }
        }
        true
    }

    /// Removal failures since the last call
    pub fn take_removal_failures(&mut self) -> Vec<SlpmError> {
        std::mem::take(&mut self.removal_failures)
    }

    /// Remove every registered identity, oldest first
    pub fn shutdown(&mut self) {
        for offset in 0..RING_SIZE {
            self.release_slot((self.next + offset) % RING_SIZE);
        }
        self.next = 0;
    }
}

impl<S: Read + Write> Drop for AgentClient<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<S: Read + Write> std::fmt::Debug for AgentClient<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentClient")
            .field("available", &self.is_available())
            .field("registered", &self.len())
            .field("next", &self.next)
            .finish()
    }
}
