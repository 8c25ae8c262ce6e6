//! Session configuration
//!
//! Resolved once at startup from command-line flags and their environment
//! fallbacks (`SLPM_FULLNAME`, `SSH_AUTH_SOCK`, `USER`). The derivation and
//! agent code never read the environment themselves.

use std::path::PathBuf;

/// Default user part of exported key comments
pub const DEFAULT_USER: &str = "user";

/// Everything a session needs besides the passphrase
#[derive(Debug, Clone)]
pub struct Config {
    /// Identity mixed into the master key salt (usually the full name)
    pub fullname: String,
    /// ssh-agent socket; `None` leaves the agent client inert
    pub agent_socket: Option<PathBuf>,
    /// Skip the agent even if a socket is configured
    pub use_agent: bool,
    /// User name placed in exported public key comments
    pub user: String,
}

impl Config {
    pub fn new(fullname: impl Into<String>) -> Self {
        Self {
            fullname: fullname.into(),
            ..Self::default()
        }
    }

    pub fn with_agent_socket(mut self, path: impl Into<PathBuf>) -> Self {
        self.agent_socket = Some(path.into());
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn without_agent(mut self) -> Self {
        self.use_agent = false;
        self
    }

    /// Comment stored alongside the key inside the agent: `slpm+<site>`
    pub fn agent_comment(&self, site: &str) -> String {
        format!("slpm+{}", site)
    }

    /// Comment on the exported public key line: `<user>@slpm+<site>`
    pub fn key_comment(&self, site: &str) -> String {
        format!("{}@slpm+{}", self.user, site)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fullname: String::new(),
            agent_socket: None,
            use_agent: true,
            user: DEFAULT_USER.to_string(),
        }
    }
}
