//! Finds the configuration files to load.
//!
//! Resolution order mirrors how artists and TDs actually override things:
//! an explicit environment variable beats a per-user file in `$HOME`, which
//! beats the stock file shipped next to the plugin. Probing is injectable so
//! tests never have to touch the process environment.

use std::env;
use std::path::PathBuf;

use crate::conf::ConfigError;

/// Environment variable pointing at an explicit config file.
pub const CONF_ENV_VAR: &str = "RIGKIT_CONF";
/// Stock config file name, looked for in `$HOME` and the install root.
pub const CONF_FILE_NAME: &str = "rigkit.conf";
/// Per-user logging override shipped in the install root.
pub const USER_LOG_CONF_FILE_NAME: &str = "user_logging.conf";

/// Knows where config files may live for one runtime.
#[derive(Debug, Clone)]
pub struct ConfigLocator {
    env_path: Option<PathBuf>,
    home_dir: Option<PathBuf>,
    install_root: Option<PathBuf>,
}

impl ConfigLocator {
    /// Locator probing explicit paths, used directly by tests.
    pub fn new(
        env_path: Option<PathBuf>,
        home_dir: Option<PathBuf>,
        install_root: Option<PathBuf>,
    ) -> Self {
        Self { env_path, home_dir, install_root }
    }

    /// Locator reading `RIGKIT_CONF` and `HOME` from the process
    /// environment, with the plugin install directory supplied by startup.
    pub fn from_env(install_root: Option<PathBuf>) -> Self {
        Self {
            env_path: env::var_os(CONF_ENV_VAR).map(PathBuf::from),
            home_dir: env::var_os("HOME").map(PathBuf::from),
            install_root,
        }
    }

    /// Resolve the main `rigkit.conf`.
    ///
    /// Checks, in order: the file named by `RIGKIT_CONF`, then
    /// `$HOME/rigkit.conf`, then `<install root>/rigkit.conf`. Every
    /// candidate is re-checked on each call, so a file created after
    /// startup is picked up by the next load.
    ///
    /// # Returns
    ///
    /// The first existing candidate, or [`ConfigError::NotFound`] listing
    /// every path that was probed.
    pub fn config_file(&self) -> Result<PathBuf, ConfigError> {
        let mut searched = Vec::new();
        for candidate in self.candidates() {
            if candidate.is_file() {
                return Ok(candidate);
            }
            searched.push(candidate);
        }
        Err(ConfigError::NotFound { searched })
    }

    /// Resolve the file driving logger setup: a `user_logging.conf` in the
    /// install root wins, otherwise the main config file is used.
    pub fn log_config_file(&self) -> Result<PathBuf, ConfigError> {
        if let Some(root) = &self.install_root {
            let user = root.join(USER_LOG_CONF_FILE_NAME);
            if user.is_file() {
                return Ok(user);
            }
        }
        self.config_file()
    }

    fn candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(path) = &self.env_path {
            candidates.push(path.clone());
        }
        if let Some(home) = &self.home_dir {
            candidates.push(home.join(CONF_FILE_NAME));
        }
        if let Some(root) = &self.install_root {
            candidates.push(root.join(CONF_FILE_NAME));
        }
        candidates
    }
}
