//! Configuration for Tabasamu
//!
//! Two layers: [`TabasamuConfig`] is the static crate configuration (where
//! packages live, the URL their images are served from, which option key
//! holds the active package), loaded from a JSON file. The active package
//! itself lives in a host-provided [`ConfigStore`].
//!
//! # Example config.json
//!
//! ```json
//! {
//!   "packages_dir": "/srv/habari/user/plugins/tabasamu",
//!   "base_url": "https://example.com/user/plugins/tabasamu",
//!   "option_name": "tabasamu__package",
//!   "default_package": "phoenity"
//! }
//! ```

mod store;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TabasamuError};
use crate::packages::PackageLoader;

pub use store::{ConfigStore, JsonFileConfigStore, MemoryConfigStore};

/// Option key holding the active package name.
pub const OPTION_NAME: &str = "tabasamu__package";

/// Package seeded on first activation.
pub const DEFAULT_PACKAGE: &str = "phoenity";

/// Default URL prefix for package images.
pub const DEFAULT_BASE_URL: &str = "/user/plugins/tabasamu";

/// Environment variable overriding `packages_dir`.
pub const ENV_PACKAGES_DIR: &str = "TABASAMU_PACKAGES_DIR";

/// Environment variable overriding `base_url`.
pub const ENV_BASE_URL: &str = "TABASAMU_BASE_URL";

/// Static configuration.
///
/// # Defaults
///
/// - `packages_dir`: `~/.tabasamu/smilies`
/// - `base_url`: `/user/plugins/tabasamu`
/// - `option_name`: `tabasamu__package`
/// - `default_package`: `phoenity`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabasamuConfig {
    /// Directory containing one subdirectory per package.
    pub packages_dir: PathBuf,
    /// URL prefix under which package directories are served.
    pub base_url: String,
    /// Option key that stores the active package name.
    pub option_name: String,
    /// Package seeded when no package has been chosen yet.
    pub default_package: String,
}

impl Default for TabasamuConfig {
    fn default() -> Self {
        Self {
            packages_dir: tabasamu_home().join("smilies"),
            base_url: DEFAULT_BASE_URL.to_string(),
            option_name: OPTION_NAME.to_string(),
            default_package: DEFAULT_PACKAGE.to_string(),
        }
    }
}

impl TabasamuConfig {
    /// Load configuration from a JSON file, then apply environment overrides.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from the default location (`~/.tabasamu/config.json`).
    pub fn load_default() -> Result<Self> {
        Self::load(&default_config_path())
    }

    fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        if !path.is_file() {
            return Err(TabasamuError::Config(format!(
                "Config path {} is not a file",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Override fields from environment-style variables.
    ///
    /// `lookup` resolves a variable name to its value; empty values are
    /// ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_PACKAGES_DIR).filter(|v| !v.trim().is_empty()) {
            self.packages_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url;
        }
    }

    /// Package loader for the configured directory and URL.
    pub fn loader(&self) -> PackageLoader {
        PackageLoader::new(&self.packages_dir, &self.base_url)
    }

    /// In-memory option store for a one-off render.
    ///
    /// The active package is `package` if given, else the choice held in
    /// `store`, else `default_package`. Nothing is written to `store`.
    pub fn render_store(&self, store: &dyn ConfigStore, package: Option<String>) -> MemoryConfigStore {
        let active = package
            .or_else(|| store.get_option(&self.option_name))
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.default_package.clone());
        MemoryConfigStore::with_option(&self.option_name, active)
    }
}

/// `~/.tabasamu`, or `./.tabasamu` when no home directory is known.
pub fn tabasamu_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tabasamu")
}

/// Default config file location.
pub fn default_config_path() -> PathBuf {
    tabasamu_home().join("config.json")
}
