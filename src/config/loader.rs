use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::config::types::AppConfig;

/// Discover and load the app config.
///
/// Priority:
/// 1. `--config` flag (explicit path)
/// 2. `$PIPEWATCH_CONFIG` environment variable
/// 3. `$XDG_CONFIG_HOME/pipewatch/config.toml`
/// 4. `~/.config/pipewatch/config.toml`
///
/// A missing config file is not an error — defaults apply. A present but
/// unparseable file is.
pub fn load_config(explicit_path: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit_path {
        return load_file(path);
    }

    match find_config() {
        Some(path) => load_file(&path),
        None => Ok(AppConfig::default()),
    }
}

fn load_file(path: &Path) -> Result<AppConfig> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("parsing TOML from {}", path.display()))
}

fn find_config() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("PIPEWATCH_CONFIG")
        && !path.is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let candidates = [
        std::env::var("XDG_CONFIG_HOME").ok().map(PathBuf::from),
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".config")),
    ];

    candidates
        .into_iter()
        .flatten()
        .map(|base| base.join("pipewatch").join("config.toml"))
        .find(|path| path.exists())
}
