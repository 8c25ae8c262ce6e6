//! Minimal ssh-agent client: add and remove Ed25519 identities

mod client;
pub mod protocol;

pub use client::{AgentClient, Registration, RING_SIZE};
