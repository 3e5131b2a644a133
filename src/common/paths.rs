//! Settings and output locations
//!
//! The settings file is looked up in order: explicit path, `$FLORAE_E2E_CONFIG`,
//! `./config.toml`, then the per-user config directory:
//! - Linux: `~/.config/florae-e2e/config.toml`
//! - macOS: `~/Library/Application Support/florae-e2e/config.toml`
//! - Windows: `%APPDATA%\florae-e2e\config.toml`

use std::path::{Path, PathBuf};

use super::{Error, Result};

/// Name used for per-user directories
const APP_NAME: &str = "florae-e2e";

/// Environment variable overriding the settings location
pub const CONFIG_ENV: &str = "FLORAE_E2E_CONFIG";

/// Settings file name in the working directory
pub const CONFIG_FILE: &str = "config.toml";

/// Root of per-run output folders, relative to the working directory
pub const OUTPUT_ROOT: &str = "output";

/// Get the per-user configuration directory
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Resolve which settings file to load
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    let env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let user = config_dir().map(|dir| dir.join(CONFIG_FILE));
    resolve_from(explicit, env, user)
}

fn resolve_from(
    explicit: Option<&Path>,
    env: Option<PathBuf>,
    user: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = env {
        return Ok(path);
    }

    let local = PathBuf::from(CONFIG_FILE);
    if local.exists() {
        return Ok(local);
    }

    let mut searched = vec![local.display().to_string()];
    if let Some(path) = user {
        if path.exists() {
            return Ok(path);
        }
        searched.push(path.display().to_string());
    }

    Err(Error::Config(format!(
        "No settings file found. Searched: {}. Pass --config or set {}",
        searched.join(", "),
        CONFIG_ENV
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let path = resolve_from(
            Some(Path::new("custom.toml")),
            Some(PathBuf::from("env.toml")),
            None,
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("custom.toml"));
    }

    #[test]
    fn test_env_before_defaults() {
        let path = resolve_from(None, Some(PathBuf::from("env.toml")), None).unwrap();
        assert_eq!(path, PathBuf::from("env.toml"));
    }

    #[test]
    fn test_user_dir_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let user = dir.path().join(CONFIG_FILE);
        std::fs::write(&user, "").unwrap();

        // Only meaningful when the test's working directory has no config.toml
        if !Path::new(CONFIG_FILE).exists() {
            assert_eq!(resolve_from(None, None, Some(user.clone())).unwrap(), user);
            assert!(resolve_from(None, None, Some(dir.path().join("missing.toml"))).is_err());
        }
    }

    #[test]
    fn test_config_dir_is_valid() {
        let dir = config_dir();
        assert!(dir.is_some());
    }
}
