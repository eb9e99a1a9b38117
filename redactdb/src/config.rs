//! Runtime configuration from environment variables.

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const DATABASE_URL: &str = "REDACTDB_DATABASE_URL";
}

/// Default values
pub mod defaults {
    pub const DATABASE_URL: &str = "~/.local/share/opencode/opencode.db";
}

/// Expand a leading `~/` against $HOME; everything else passes through.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = env::var("HOME") {
            return Path::new(&home).join(rest);
        }
    }
    PathBuf::from(path)
}

/// Target database path: env override, else the well-known app-data
/// location.
pub fn database_path() -> PathBuf {
    let raw = env::var(env_vars::DATABASE_URL)
        .unwrap_or_else(|_| defaults::DATABASE_URL.to_string());
    expand_tilde(&raw)
}
