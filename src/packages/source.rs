//! The package collaborator seen by the content filter.

use std::collections::BTreeMap;

use crate::error::Result;

use super::types::PackageDescriptor;

/// Anything that can resolve smilies packages by name.
///
/// [`PackageLoader`](super::PackageLoader) is the filesystem implementation;
/// hosts with other storage can provide their own.
#[cfg_attr(test, mockall::automock)]
pub trait PackageSource: Send + Sync {
    /// Load one package.
    fn load_package(&self, name: &str) -> Result<PackageDescriptor>;

    /// List every available package, keyed by package name.
    fn discover_packages(&self) -> Result<BTreeMap<String, PackageDescriptor>>;
}
