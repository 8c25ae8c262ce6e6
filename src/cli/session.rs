//! The interactive session: passphrase, then one site query after another
//!
//! Failure policy:
//! - master key derivation failure ends the session
//! - a failed seed or agent registration only loses that one query
//! - duplicate keys and a disabled agent are informational

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;

use colored::Colorize;
use tracing::{debug, warn};

use super::input::{parse_counter, Prompter};
use crate::agent::{AgentClient, Registration};
use crate::config::Config;
use crate::crypto::{derive_master_key, derive_site_seed, Ed25519Identity, MasterKey, SiteSeed};
use crate::error::{Result, SlpmError};
use crate::template::write_passwords;

/// Site prefix that asks for an SSH identity instead of passwords
pub const SSH_PREFIX: &str = "ssh ";

/// Write one line to standard error. Failures to do so are ignored.
pub fn notice(message: &str) {
    let _ = write_line(&mut io::stderr().lock(), message);
}

/// `message` and its newline go out in a single write
fn write_line<W: Write + ?Sized>(out: &mut W, message: &str) -> io::Result<()> {
    let mut line = String::with_capacity(message.len() + 1);
    line.push_str(message);
    line.push('\n');
    out.write_all(line.as_bytes())
}

/// Report a per-query or per-identity failure and carry on
fn report(error: &SlpmError) {
    notice(&error.to_string().red().to_string());
}

fn report_removal_failures<S: Read + Write>(agent: &mut AgentClient<S>) {
    for failure in agent.take_removal_failures() {
        report(&failure);
    }
}

/// Connect to the configured agent
///
/// With `--no-agent` the client is inert and SSH queries still print their
/// public key. A missing or unreachable agent is reported here once, and
/// then fails every SSH query.
pub fn connect_agent(config: &Config) -> AgentClient<UnixStream> {
    if !config.use_agent {
        debug!("ssh-agent disabled");
        return AgentClient::disabled();
    }
    let Some(path) = config.agent_socket.as_deref() else {
        report(&SlpmError::AgentNotConfigured);
        return AgentClient::not_configured();
    };
    match AgentClient::connect(path) {
        Ok(agent) => agent,
        Err(e) => {
            report(&e);
            let kind = match &e {
                SlpmError::AgentConnect(cause) => cause.kind(),
                _ => io::ErrorKind::Other,
            };
            AgentClient::unreachable(kind)
        }
    }
}

/// Run a whole session against the configured agent
///
/// # Errors
/// End of input at the passphrase prompt, key derivation failure, or a
/// failed write to `out`.
pub fn run<P, W>(config: &Config, prompter: &mut P, out: &mut W) -> Result<()>
where
    P: Prompter + ?Sized,
    W: Write + ?Sized,
{
    let key = unlock(config, prompter, out)?;
    let mut agent = connect_agent(config);
    query_loop(config, &key, &mut agent, prompter, out)?;
    agent.shutdown();
    report_removal_failures(&mut agent);
    write!(out, "\rBye!    \n")?;
    out.flush()?;
    Ok(())
}

/// Print the banner, read the passphrase and derive the master key
pub fn unlock<P, W>(config: &Config, prompter: &mut P, out: &mut W) -> Result<MasterKey>
where
    P: Prompter + ?Sized,
    W: Write + ?Sized,
{
    writeln!(out, "SLPM_FULLNAME='{}'", config.fullname)?;
    out.flush()?;

    let Some(passphrase) = prompter.prompt_secret("Passphrase: ")? else {
        writeln!(out)?;
        return Err(SlpmError::Cancelled);
    };

    write!(out, "Deriving key...")?;
    out.flush()?;
    let key = derive_master_key(passphrase, &config.fullname)?;
    write!(out, "\rKey derivation complete.\n")?;
    out.flush()?;
    Ok(key)
}

/// Prompt for site and counter until end of input
pub fn query_loop<P, W, S>(
    config: &Config,
    key: &MasterKey,
    agent: &mut AgentClient<S>,
    prompter: &mut P,
    out: &mut W,
) -> Result<()>
where
    P: Prompter + ?Sized,
    W: Write + ?Sized,
    S: Read + Write,
{
    loop {
        let Some(site) = prompter.prompt("Site: ")? else {
            return Ok(());
        };
        let Some(counter) = prompter.prompt("Counter: ")? else {
            return Ok(());
        };

        match query(config, key, agent, &site, parse_counter(&counter), out) {
            Ok(()) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => report(&e),
        }
    }
}

/// Answer one query: passwords by default, an SSH identity for `ssh <site>`
///
/// The site is derived from as raw bytes; only comments see it as text.
pub fn query<W, S>(
    config: &Config,
    key: &MasterKey,
    agent: &mut AgentClient<S>,
    site: &[u8],
    counter: u32,
    out: &mut W,
) -> Result<()>
where
    W: Write + ?Sized,
    S: Read + Write,
{
    let (site, ssh) = match site.strip_prefix(SSH_PREFIX.as_bytes()) {
        Some(rest) => (rest, true),
        None => (site, false),
    };
    let name = String::from_utf8_lossy(site);
    debug!(site = %name, counter, ssh, "site query");

    let seed = derive_site_seed(key, site, counter)?;
    if ssh {
        output_ssh_identity(config, &seed, agent, &name, out)
    } else {
        write_passwords(&seed, out)
    }
}

fn output_ssh_identity<W, S>(
    config: &Config,
    seed: &SiteSeed,
    agent: &mut AgentClient<S>,
    site: &str,
    out: &mut W,
) -> Result<()>
where
    W: Write + ?Sized,
    S: Read + Write,
{
    let mut identity = Ed25519Identity::from_seed(seed);
    let outcome = agent.register(&identity, &config.agent_comment(site));
    identity.wipe_secret();
    report_removal_failures(agent);

    match outcome? {
        Registration::Inactive => {}
        Registration::AlreadyPresent => notice("Key was already in agent"),
        Registration::Added { evicted: true } => {
            warn!("ring full, oldest identity evicted");
            notice("Oldest key is evicted from agent");
        }
        Registration::Added { evicted: false } => {}
    }

    let line = identity.public_key_openssh(&config.key_comment(site));
    writeln!(out, "{}", line)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::input::Terminal;
    use std::io::Cursor;

    fn fixed_key() -> MasterKey {
        let bytes: Vec<u8> = (0u8..64).collect();
        MasterKey::from_bytes(&bytes)
    }

    #[test]
    fn test_password_query_known_answer() {
        let mut agent = AgentClient::<UnixStream>::disabled();
        let mut out = Vec::new();

        query(&Config::default(), &fixed_key(), &mut agent, b"example.com", 1, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Maximum Security Password: t0=)cE2ZMPi4rVfrrQcV\n\
             Long Password: FahlLebe5)Kods\n\
             Medium Password: Fah1_Cet\n\
             Short Password: Fah1\n\
             Basic Password: tI51NEQ6\n\
             PIN: 0051\n"
        );
    }

    #[test]
    fn test_ssh_query_without_agent_prints_public_key() {
        let config = Config::default().with_user("alice");
        let mut agent = AgentClient::<UnixStream>::disabled();
        let mut out = Vec::new();

        query(&config, &fixed_key(), &mut agent, b"ssh example.com", 1, &mut out).unwrap();

        let line = String::from_utf8(out).unwrap();
        assert!(line.starts_with("ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAI"));
        assert!(line.ends_with(" alice@slpm+example.com\n"));
    }

    #[test]
    fn test_ssh_prefix_is_stripped_before_derivation() {
        // "ssh example.com" derives from "example.com": same seed, so the
        // public key must match one built from that seed directly
        let key = fixed_key();
        let seed = derive_site_seed(&key, b"example.com", 1).unwrap();
        let expected = Ed25519Identity::from_seed(&seed).public_key_openssh("user@slpm+example.com");

        let mut agent = AgentClient::<UnixStream>::disabled();
        let mut out = Vec::new();
        query(&Config::default(), &key, &mut agent, b"ssh example.com", 1, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", expected));
    }

    #[test]
    fn test_query_loop_runs_until_end_of_input() {
        let input = b"example.com\n1\nexample.com\n2\nexample.com\n".to_vec();
        let mut terminal = Terminal::new(Cursor::new(input), Vec::new(), false);
        let mut agent = AgentClient::<UnixStream>::disabled();
        let mut out = Vec::new();

        query_loop(&Config::default(), &fixed_key(), &mut agent, &mut terminal, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 12);
        assert_eq!(terminal.output(), b"Site: Counter: Site: Counter: Site: Counter: ");
    }

    #[test]
    fn test_unlock_without_passphrase_is_cancelled() {
        let mut terminal = Terminal::new(Cursor::new(Vec::new()), Vec::new(), false);
        let mut out = Vec::new();

        let result = unlock(&Config::new("Alice"), &mut terminal, &mut out);

        assert!(matches!(result, Err(SlpmError::Cancelled)));
        assert_eq!(out, b"SLPM_FULLNAME='Alice'\n\n");
    }

    #[test]
    fn test_disabled_agent_is_inert() {
        let config = Config::default()
            .with_agent_socket("/nonexistent/agent.sock")
            .without_agent();
        assert!(!connect_agent(&config).is_available());
    }

    #[test]
    fn test_missing_socket_suppresses_ssh_line() {
        let config = Config::default().with_agent_socket("/nonexistent/agent.sock");
        let mut agent = connect_agent(&config);
        assert!(!agent.is_available());

        let mut out = Vec::new();
        let result = query(&config, &fixed_key(), &mut agent, b"ssh example.com", 1, &mut out);

        assert!(matches!(result, Err(SlpmError::AgentConnect(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn test_unconfigured_agent_suppresses_ssh_line() {
        let config = Config::default();
        let mut agent = connect_agent(&config);

        let mut out = Vec::new();
        let result = query(&config, &fixed_key(), &mut agent, b"ssh example.com", 1, &mut out);

        assert!(matches!(result, Err(SlpmError::AgentNotConfigured)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_unreachable_agent_leaves_passwords_alone() {
        let config = Config::default().with_agent_socket("/nonexistent/agent.sock");
        let mut agent = connect_agent(&config);

        let mut out = Vec::new();
        query(&config, &fixed_key(), &mut agent, b"example.com", 1, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 6);
    }

    #[test]
    fn test_query_loop_reports_agent_error_and_continues() {
        let config = Config::default();
        let input = b"ssh example.com\n1\nexample.com\n1\n".to_vec();
        let mut terminal = Terminal::new(Cursor::new(input), Vec::new(), false);
        let mut agent = AgentClient::<UnixStream>::not_configured();
        let mut out = Vec::new();

        query_loop(&config, &fixed_key(), &mut agent, &mut terminal, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("ssh-ed25519"));
        assert_eq!(text.lines().count(), 6);
    }

    #[test]
    fn test_site_need_not_be_utf8() {
        let key = fixed_key();
        let site = b"caf\xe9.example";
        let seed = derive_site_seed(&key, site, 1).unwrap();
        let mut expected = Vec::new();
        write_passwords(&seed, &mut expected).unwrap();

        let input = b"caf\xe9.example\n1\n".to_vec();
        let mut terminal = Terminal::new(Cursor::new(input), Vec::new(), false);
        let mut agent = AgentClient::<UnixStream>::disabled();
        let mut out = Vec::new();
        query_loop(&Config::default(), &key, &mut agent, &mut terminal, &mut out).unwrap();

        assert_eq!(out, expected);
    }

    #[test]
    fn test_non_utf8_site_comment_is_lossy() {
        let config = Config::default().without_agent();
        let mut agent = AgentClient::<UnixStream>::disabled();
        let mut out = Vec::new();

        query(&config, &fixed_key(), &mut agent, b"ssh caf\xe9", 1, &mut out).unwrap();

        let line = String::from_utf8(out).unwrap();
        assert!(line.ends_with(" user@slpm+caf\u{fffd}\n"));
    }

    /// Counts `write` calls
    #[derive(Default)]
    struct Writes {
        calls: usize,
        data: Vec<u8>,
    }

    impl Write for Writes {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.calls += 1;
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_notice_line_is_one_write() {
        let mut sink = Writes::default();

        write_line(&mut sink, "Key was already in agent").unwrap();

        assert_eq!(sink.calls, 1);
        assert_eq!(sink.data, b"Key was already in agent\n");
    }
}
