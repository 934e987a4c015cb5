//! chatcmd - Interactive console for chat command grammars.
//!
//! Reads chat messages from standard input, one per line, and answers the
//! ones starting with the command prefix, the way a chat bot would.
//!
//! # Configuration
//!
//! Declare the commands in a `config.yaml` file:
//!
//! ```yaml
//! prefix: "!"
//! commands:
//!   - name: give
//!     dest: give
//!     args:
//!       - { name: item, type: string, dest: item, required: true }
//!       - { name: count, type: int, dest: count, default: 1 }
//!     flags:
//!       - { dest: quiet, short: q, long: quiet }
//! ```
//!
//! Configured commands reply with their parsed values as JSON, and the
//! built-in `help` command lists the usage of every command.
//!
//! # Usage
//!
//! ```bash
//! chatcmd --config config.yaml
//! !give -q diamond 5
//! {"count":5,"give":true,"item":"diamond","quiet":true}
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)
//! - `CHATCMD_*` - Override configuration values, e.g. `CHATCMD_PREFIX="?"`

use std::{
    io::{self, BufRead},
    path::PathBuf,
};

use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};

use chatcmd::{
    commands::{Commander, actions::EchoCommand},
    config::Config,
};

/// Command-line arguments for chatcmd.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Command prefix, overrides the configuration.
    #[arg(short, long)]
    prefix: Option<String>,

    /// Print the usage of every command and exit.
    #[arg(short, long)]
    usage: bool,

    /// Name the messages are sent as.
    #[arg(short, long, default_value = "console")]
    sender: String,
}

fn main() {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    info!("Starting chatcmd {}...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load config file: {e:#}");
            return;
        }
    };

    let commander = build_commander(config, args.prefix);

    if args.usage {
        for info in commander.catalog() {
            for line in info.usage {
                println!("{}{line}", commander.prefix());
            }
        }
        return;
    }

    if let Err(e) = run(&commander, &args.sender) {
        error!("Failed to read standard input: {e}");
    }
}

/// Registers the configured commands, skipping the invalid ones.
fn build_commander(config: Config, prefix: Option<String>) -> Commander {
    let mut commander = Commander::new(prefix.unwrap_or(config.prefix));

    for grammar in config.commands {
        let name = grammar.name.clone();
        if let Err(e) = commander.register(grammar, Box::new(EchoCommand)) {
            warn!("Skipping command {name}: {e}");
        }
    }

    commander
}

/// Answers every line of standard input until it is closed.
fn run(commander: &Commander, sender: &str) -> io::Result<()> {
    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = line?;

        match commander.call(&line, sender) {
            Ok(result) => println!("{}", result.response),
            Err(e) => {
                if let Some(message) = commander.format_error(&e) {
                    println!("{message}");
                }
            }
        }
    }

    info!("Standard input closed, exiting");
    Ok(())
}
