//! Package types for Tabasamu
//!
//! This module defines the parsed representation of a smilies package: the
//! package metadata block, each emoticon entry, and the ordered attribute bag
//! an entry carries into its rendered markup.

use std::path::PathBuf;

/// Ordered key/value attributes with overwrite-on-merge semantics.
///
/// Setting a key that already exists replaces its value in place, so the
/// original position is kept. New keys are appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    pairs: Vec<(String, String)>,
}

impl Attributes {
    /// Create an empty attribute bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, overwriting an existing value for the same key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    /// Merge every pair of `other` on top of `self`.
    pub fn merge(&mut self, other: &Attributes) {
        for (key, value) in other.iter() {
            self.set(key, value);
        }
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (k, v) in iter {
            attrs.set(k, v);
        }
        attrs
    }
}

/// One emoticon defined inside a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmoticonEntry {
    /// Exact text to match. Never empty.
    pub token: String,

    /// Image file name, relative to the package directory.
    pub image_file: String,

    /// Extra attributes forwarded into the rendered `<img>` (e.g. `width`).
    pub custom_attributes: Attributes,
}

impl EmoticonEntry {
    /// Create an entry with no custom attributes.
    pub fn new(token: impl Into<String>, image_file: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            image_file: image_file.into(),
            custom_attributes: Attributes::new(),
        }
    }

    /// Builder-style helper to attach a custom attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_attributes.set(key, value);
        self
    }
}

/// The `<info>` block of a package definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageInfo {
    /// Human-readable package name.
    pub name: String,
    /// Package version string.
    pub version: String,
}

/// A fully parsed smilies package.
#[derive(Debug, Clone)]
pub struct PackageDescriptor {
    /// Package identifier (its directory name).
    pub name: String,

    /// Human-readable name from the `<info>` block.
    pub display_name: String,

    /// Version from the `<info>` block.
    pub version: String,

    /// URL under which the package's images are served.
    pub base_url: String,

    /// Directory holding the definition file and images.
    pub base_path: PathBuf,

    /// Entries in definition-file order.
    pub entries: Vec<EmoticonEntry>,
}

impl PackageDescriptor {
    /// Label shown in the package chooser, e.g. `"Phoenity 1.0"`.
    ///
    /// Falls back to the directory name when the definition has no
    /// display name.
    pub fn label(&self) -> String {
        let name = if self.display_name.trim().is_empty() {
            self.name.as_str()
        } else {
            self.display_name.as_str()
        };
        if self.version.trim().is_empty() {
            name.to_string()
        } else {
            format!("{} {}", name, self.version)
        }
    }

    /// Number of emoticon entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}
