//! slpm - stateless password manager
//!
//! This crate derives per-site credentials from one master passphrase:
//! - Passwords rendered from fixed templates
//! - Ed25519 SSH identities, optionally loaded into a running ssh-agent
//! - Nothing derived is ever written to disk

#[cfg(not(unix))]
compile_error!("slpm talks to ssh-agent over a Unix domain socket and builds on Unix only");

pub mod agent;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod template;

pub use error::{Result, SlpmError};
