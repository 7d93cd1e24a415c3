//! minishell: interactive shell with `>` redirection and two-line pipelines.
//!
//! Usage:
//!   minishell                 start the prompt loop
//!   minishell --dump-config   print the merged configuration and exit

use minishell::config::Config;
use minishell::exec::SignalPolicy;
use minishell::logging;

const USAGE: &str = "usage: minishell [--dump-config] [--help]";

fn main() {
    let mut dump_config = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--dump-config" => dump_config = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other => {
                eprintln!("minishell: unknown argument: {other}\n{USAGE}");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load();

    if dump_config {
        match config.to_toml() {
            Ok(text) => print!("{text}"),
            Err(e) => {
                eprintln!("minishell: cannot serialize config: {e}");
                std::process::exit(1);
            }
        }
        std::process::exit(0);
    }

    if let Some(path) = logging::init(&config.logging) {
        log::debug!("logging to {}", path.display());
    }

    if let Err(e) = SignalPolicy::interactive().install() {
        logging::report("sigaction", e);
        std::process::exit(1);
    }

    match minishell::run_interactive(&config) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            log::error!("session aborted: {e}");
            std::process::exit(1);
        }
    }
}
