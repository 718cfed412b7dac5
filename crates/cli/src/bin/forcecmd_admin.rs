//! `forcecmd-admin`: operator tool for the allowlist used by `forcecmd`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "forcecmd-admin")]
#[command(about = "Manage and test the forcecmd allowlist", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create ~/.ssh (mode 0700) and a template allowlist (mode 0600). Never overwrites an existing file.
    Init {
        /// Config file path (default: ~/.ssh/authorized_forced_commands.yml)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Verify ownership and permissions of the allowlist, parse it and list its entries.
    Check {
        /// Config file path (default: ~/.ssh/authorized_forced_commands.yml)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Also reject a file writable by its group or by others.
        #[arg(long)]
        reject_group_writable: bool,
    },

    /// Show whether a command line would be allowed, without running it.
    Test {
        /// Config file path (default: ~/.ssh/authorized_forced_commands.yml)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Also reject a file writable by its group or by others.
        #[arg(long)]
        reject_group_writable: bool,

        /// The command line as the SSH client would send it (quote it as one argument).
        #[arg(value_name = "COMMAND LINE")]
        command_line: String,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Version) => {
            println!("forcecmd {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Commands::Init { config }) => admin::run_init(config),
        Some(Commands::Check {
            config,
            reject_group_writable,
        }) => admin::run_check(config, reject_group_writable),
        Some(Commands::Test {
            config,
            reject_group_writable,
            command_line,
        }) => admin::run_test(config, reject_group_writable, &command_line),
        None => {
            println!("Run with --help for usage");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

#[cfg(unix)]
mod admin {
    use anyhow::Result;
    use forcecmd::config::{ConfigLocation, GateOptions, TrustPolicy};
    use forcecmd::gate::{self, TrustDecision};
    use forcecmd::identity::Identity;
    use forcecmd::request::RequestedCommand;
    use std::path::PathBuf;

    fn options(config: Option<PathBuf>, reject_group_writable: bool) -> GateOptions {
        GateOptions {
            config: ConfigLocation::from_override(config),
            policy: TrustPolicy {
                reject_group_writable,
            },
        }
    }

    pub fn run_init(config: Option<PathBuf>) -> Result<()> {
        let path = ConfigLocation::from_override(config).resolve()?;
        if forcecmd::init::init_config_file(&path)? {
            println!("created {}", path.display());
        } else {
            println!("{} already exists, left unchanged", path.display());
        }
        Ok(())
    }

    pub fn run_check(config: Option<PathBuf>, reject_group_writable: bool) -> Result<()> {
        let opts = options(config, reject_group_writable);
        let trusted = gate::load_trusted(&opts, Identity::current()?)?;
        println!(
            "{}: ok (type {:?}, {} entries)",
            trusted.path.display(),
            trusted.document.kind,
            trusted.document.commands.len()
        );
        for (i, entry) in trusted.document.commands.iter().enumerate() {
            let shadowed = trusted.document.find_entry(&entry.path) != Some(i);
            println!(
                "  [{}] {}{}  {}  ({} env)",
                i,
                entry.path,
                if shadowed { " (unreachable: shadowed by earlier entry)" } else { "" },
                entry.description,
                entry.env_vars().len()
            );
        }
        Ok(())
    }

    pub fn run_test(config: Option<PathBuf>, reject_group_writable: bool, command_line: &str) -> Result<()> {
        let Some(request) = RequestedCommand::parse(command_line) else {
            anyhow::bail!("empty command line");
        };
        let opts = options(config, reject_group_writable);
        let trusted = gate::load_trusted(&opts, Identity::current()?)?;
        match gate::decide(&request, &trusted.document) {
            TrustDecision::Matched { index, entry } => {
                println!("allowed: {} (entry {})", entry.path, index);
                println!("  arguments: {:?}", request.arguments);
                for (key, value) in entry.env_vars() {
                    println!("  env: {}={}", key, value);
                }
                Ok(())
            }
            TrustDecision::Denied(program) => Err(forcecmd::GateError::NotAllowed(program).into()),
        }
    }
}

#[cfg(not(unix))]
mod admin {
    use anyhow::Result;
    use forcecmd::GateError;
    use std::path::PathBuf;

    pub fn run_init(_config: Option<PathBuf>) -> Result<()> {
        Err(GateError::UnsupportedPlatform.into())
    }

    pub fn run_check(_config: Option<PathBuf>, _reject_group_writable: bool) -> Result<()> {
        Err(GateError::UnsupportedPlatform.into())
    }

    pub fn run_test(_config: Option<PathBuf>, _reject_group_writable: bool, _command_line: &str) -> Result<()> {
        Err(GateError::UnsupportedPlatform.into())
    }
}
