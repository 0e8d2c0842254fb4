//! The Tabasamu plugin facade.
//!
//! Ties the pieces together for a host application: plugin metadata, the
//! activation and init hooks, and the package chooser shown on the
//! plugin's settings page.

use std::sync::Arc;

use tracing::info;

use crate::config::{ConfigStore, TabasamuConfig};
use crate::error::{Result, TabasamuError};
use crate::filter::ContentFilter;
use crate::packages::{PackageLoader, PackageSource};
use crate::pipeline::{ContentKind, FormatRegistry};

/// Plugin version.
pub const VERSION: &str = "0.8";

/// Name the filter is registered under in the content pipeline.
pub const FORMATTER_NAME: &str = "tabasamu";

/// Descriptive metadata shown in the host's plugin list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    /// Display name.
    pub name: &'static str,
    /// Project homepage.
    pub url: &'static str,
    /// Plugin author.
    pub author: &'static str,
    /// Author homepage.
    pub author_url: &'static str,
    /// Plugin version.
    pub version: &'static str,
    /// One-line summary.
    pub description: &'static str,
    /// License name.
    pub license: &'static str,
}

/// Selectable smilies for a host application.
pub struct Tabasamu {
    config: TabasamuConfig,
    source: Arc<dyn PackageSource>,
    store: Arc<dyn ConfigStore>,
    filter: Arc<ContentFilter>,
}

impl Tabasamu {
    /// Create the plugin over packages in `config.packages_dir`.
    pub fn new(config: TabasamuConfig, store: Arc<dyn ConfigStore>) -> Self {
        let source: Arc<dyn PackageSource> = Arc::new(PackageLoader::new(
            &config.packages_dir,
            &config.base_url,
        ));
        Self::with_source(config, source, store)
    }

    /// Create the plugin over an arbitrary package source.
    pub fn with_source(
        config: TabasamuConfig,
        source: Arc<dyn PackageSource>,
        store: Arc<dyn ConfigStore>,
    ) -> Self {
        let filter = Arc::new(ContentFilter::new(
            Arc::clone(&source),
            Arc::clone(&store),
            config.option_name.clone(),
        ));
        Self {
            config,
            source,
            store,
            filter,
        }
    }

    /// Plugin metadata.
    pub fn info() -> PluginInfo {
        PluginInfo {
            name: "Tabasamu",
            url: "http://drunkenmonkey.org/projects/tabasamu",
            author: "Drunken Monkey Labs",
            author_url: "http://drunkenmonkey.org",
            version: VERSION,
            description: "Selectable smilies for Habari.",
            license: "Apache License 2.0",
        }
    }

    /// Activation hook: seed the default package if none is chosen yet.
    ///
    /// Returns `true` when the option was written.
    pub fn activate(&self) -> Result<bool> {
        if self.active_package().is_some() {
            return Ok(false);
        }
        self.store
            .set_option(&self.config.option_name, &self.config.default_package)?;
        info!(package = %self.config.default_package, "Seeded default smilies package");
        Ok(true)
    }

    /// Init hook: attach the filter to post and comment output.
    pub fn init(&self, registry: &mut FormatRegistry) {
        for kind in [ContentKind::PostContent, ContentKind::CommentContent] {
            registry.apply(FORMATTER_NAME, self.filter.clone(), kind);
        }
    }

    /// The content filter.
    pub fn filter(&self) -> &Arc<ContentFilter> {
        &self.filter
    }

    /// Static configuration.
    pub fn config(&self) -> &TabasamuConfig {
        &self.config
    }

    /// Currently selected package name.
    pub fn active_package(&self) -> Option<String> {
        self.filter.active_package()
    }

    /// Options for the package chooser: `(package name, "Name Version")`,
    /// sorted by package name.
    pub fn package_choices(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .source
            .discover_packages()?
            .into_iter()
            .map(|(name, package)| {
                let label = package.label();
                (name, label)
            })
            .collect())
    }

    /// Save a new package choice from the settings form.
    ///
    /// The package must exist and parse; the cached table is dropped so the
    /// next render picks up the new choice.
    pub fn select_package(&self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TabasamuError::Config(
                "A smilies package must be selected".to_string(),
            ));
        }
        let package = self.source.load_package(name)?;
        self.store.set_option(&self.config.option_name, name)?;
        self.filter.invalidate();
        info!(package = %name, label = %package.label(), "Selected smilies package");
        Ok(())
    }

    /// Actions offered on the host's plugin page.
    pub fn config_actions() -> Vec<&'static str> {
        vec!["Choose Smilies"]
    }
}
