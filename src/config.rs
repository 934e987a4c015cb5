//! Configuration file structures for chatcmd.
//!
//! The configuration is a YAML file declaring the command prefix and the
//! grammars of the commands to register. Every value can be overridden from
//! the environment with the `CHATCMD_` prefix, nested keys being separated by
//! `__` (e.g. `CHATCMD_PREFIX="?"`).
//!
//! # Configuration File Format
//!
//! ```yaml
//! # Prefix every command starts with
//! prefix: "!"
//!
//! # Command grammars
//! commands:
//!   - name: give
//!     dest: give
//!     aliases: [g]
//!     help: Give an item
//!     args:
//!       - { name: item, type: string, dest: item, required: true }
//!       - { name: count, type: int, dest: count, default: 1 }
//!     flags:
//!       - { dest: quiet, short: q, long: quiet }
//! ```

use std::path::Path;

use anyhow::{Context, bail};
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use log::debug;
use serde::Deserialize;

use crate::parser::SubDef;

/// Environment variables starting with this prefix override file values.
pub const ENV_PREFIX: &str = "CHATCMD_";

fn default_prefix() -> String {
    "!".to_string()
}

/// Root configuration structure.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Prefix every command starts with, `!` by default
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Grammars of the commands to register
    #[serde(default)]
    pub commands: Vec<SubDef>,
}

impl Config {
    /// Loads the configuration from `path`, then applies environment overrides.
    ///
    /// Without a path, only the environment and the defaults are used.
    ///
    /// # Errors
    ///
    /// Fails when `path` does not exist or when the merged configuration does
    /// not match the expected structure.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Config> {
        let mut figment = Figment::new();

        if let Some(path) = path {
            if !path.exists() {
                bail!("config file {} not found", path.display());
            }
            debug!("loading config file {}", path.display());
            figment = figment.merge(Yaml::file(path));
        }

        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| match path {
                Some(path) => format!("invalid config file {}", path.display()),
                None => "invalid configuration".to_string(),
            })?;

        Ok(config)
    }
}
