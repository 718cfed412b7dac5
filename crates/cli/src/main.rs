//! `forcecmd`: install as an sshd `ForceCommand` (or `command="…"` in authorized_keys).
//!
//! Takes no arguments. Reads `SSH_ORIGINAL_COMMAND`, checks it against
//! `~/.ssh/authorized_forced_commands.yml` and runs it if allowed. Exits with the
//! command's own status, or 1 with a one-line diagnostic on stderr.

use forcecmd::GateError;

fn main() {
    // stderr belongs to the SSH client: no log output, and no filter taken from the
    // session environment.
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Off)
        .init();

    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

#[cfg(unix)]
fn run() -> Result<i32, GateError> {
    use forcecmd::config::GateOptions;
    use forcecmd::identity::Identity;
    use forcecmd::request::RequestedCommand;

    let request = RequestedCommand::from_env()?;
    let identity = Identity::current()?;
    forcecmd::gate::run(&GateOptions::default(), &request, identity)
}

#[cfg(not(unix))]
fn run() -> Result<i32, GateError> {
    Err(GateError::UnsupportedPlatform)
}
