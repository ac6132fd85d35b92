//! Layered configuration
//!
//! Values are merged in this order, later layers winning:
//! built-in defaults, the user config file, the project `cjspack.toml`
//! (or an explicit `--config` file), environment variables, then CLI flags.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use etcetera::BaseStrategy;
use indexmap::IndexSet;
use log::debug;
use serde::Deserialize;

use crate::types::{Instantiation, Platform};

pub const CONFIG_FILE_NAME: &str = "cjspack.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Project root holding the package directory; defaults to the entry's directory
    pub root: Option<PathBuf>,
    /// Value substituted for `process.env.NODE_ENV` when pruning
    pub env: String,
    pub minify: bool,
    /// Extension appended to specifiers that have none
    pub extension: String,
    /// Directory under the root where installed packages live
    pub package_dir: String,
    /// Extra bare specifiers passed through to the host like built-ins
    pub externals: IndexSet<String>,
    pub platform: Platform,
    pub instantiation: Instantiation,
    /// Prefix the bundle with a `process.env.NODE_ENV` shim
    pub process_shim: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            env: "development".to_owned(),
            minify: false,
            extension: "js".to_owned(),
            package_dir: "node_modules".to_owned(),
            externals: IndexSet::new(),
            platform: Platform::default(),
            instantiation: Instantiation::default(),
            process_shim: false,
        }
    }
}

/// On-disk representation; every field is optional so files can be partial
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
struct ConfigFile {
    root: Option<PathBuf>,
    env: Option<String>,
    minify: Option<bool>,
    extension: Option<String>,
    package_dir: Option<String>,
    externals: Option<Vec<String>>,
    platform: Option<Platform>,
    instantiation: Option<Instantiation>,
    process_shim: Option<bool>,
}

impl Config {
    /// Load configuration from the user and project config files and the environment
    ///
    /// `explicit` replaces the project `cjspack.toml` lookup when given.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(user_config) = user_config_path()
            && user_config.is_file()
        {
            config.merge_file(&user_config)?;
        }

        match explicit {
            Some(path) => config.merge_file(path)?,
            None => {
                let project_config = PathBuf::from(CONFIG_FILE_NAME);
                if project_config.is_file() {
                    config.merge_file(&project_config)?;
                }
            }
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Merge a TOML file over the current values
    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        debug!("Loading configuration from {}", path.display());
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let file: ConfigFile = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        // Relative roots are anchored at the config file's directory
        if let Some(root) = file.root {
            self.root = Some(match path.parent() {
                Some(parent) if root.is_relative() => parent.join(root),
                _ => root,
            });
        }
        if let Some(env) = file.env {
            self.env = env;
        }
        if let Some(minify) = file.minify {
            self.minify = minify;
        }
        if let Some(extension) = file.extension {
            self.extension = extension.trim_start_matches('.').to_owned();
        }
        if let Some(package_dir) = file.package_dir {
            self.package_dir = package_dir;
        }
        if let Some(externals) = file.externals {
            self.externals.extend(externals);
        }
        if let Some(platform) = file.platform {
            self.platform = platform;
        }
        if let Some(instantiation) = file.instantiation {
            self.instantiation = instantiation;
        }
        if let Some(process_shim) = file.process_shim {
            self.process_shim = process_shim;
        }
        Ok(())
    }

    /// Apply `CJSPACK_*` variables, falling back to `NODE_ENV` for the environment
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(env) = var("CJSPACK_ENV").or_else(|| var("NODE_ENV")) {
            self.env = env;
        }
        if let Some(minify) = var("CJSPACK_MINIFY") {
            self.minify = parse_bool(&minify)
                .with_context(|| format!("Invalid CJSPACK_MINIFY value '{minify}'"))?;
        }
        if let Some(platform) = var("CJSPACK_PLATFORM") {
            self.platform = match platform.to_ascii_lowercase().as_str() {
                "node" => Platform::Node,
                "browser" => Platform::Browser,
                other => anyhow::bail!("Invalid CJSPACK_PLATFORM value '{other}'"),
            };
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// `<config dir>/cjspack/cjspack.toml`, e.g. `~/.config/cjspack/cjspack.toml`
fn user_config_path() -> Option<PathBuf> {
    let strategy = etcetera::choose_base_strategy().ok()?;
    Some(strategy.config_dir().join("cjspack").join(CONFIG_FILE_NAME))
}
