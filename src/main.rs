use clap::Parser;
use colored::Colorize;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use slpm::cli::{self, Terminal};
use slpm::config::{Config, DEFAULT_USER};

#[derive(Parser)]
#[command(name = "slpm")]
#[command(author = "Oleg")]
#[command(version = "0.1.0")]
#[command(about = "Stateless password manager: passwords and SSH keys from one passphrase", long_about = None)]
struct Cli {
    /// Full name used as the master key salt
    #[arg(long, env = "SLPM_FULLNAME", default_value = "")]
    fullname: String,

    /// ssh-agent socket that derived SSH keys are loaded into
    #[arg(long, env = "SSH_AUTH_SOCK")]
    agent_socket: Option<PathBuf>,

    /// User name for exported public key comments
    #[arg(long, env = "USER", default_value = DEFAULT_USER)]
    user: String,

    /// Never talk to ssh-agent
    #[arg(long)]
    no_agent: bool,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        let mut config = Config::new(cli.fullname).with_user(cli.user);
        if let Some(path) = cli.agent_socket {
            config = config.with_agent_socket(path);
        }
        if cli.no_agent {
            config = config.without_agent();
        }
        config
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let config = Config::from(Cli::parse());
    let mut terminal = Terminal::stdio();

    match cli::run(&config, &mut terminal, &mut io::stdout()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
