//! Package discovery and loading for Tabasamu
//!
//! This module handles discovering package directories, reading and parsing
//! `smilies.xml` definitions, and resolving a package name to its
//! descriptor.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, info, warn};

use crate::error::{Result, TabasamuError};

use super::source::PackageSource;
use super::types::{Attributes, EmoticonEntry, PackageDescriptor, PackageInfo};

/// File name every package directory must contain.
pub const PACKAGE_FILE: &str = "smilies.xml";

/// Resolves package names against a packages directory and a base URL.
///
/// # Example
///
/// ```no_run
/// use tabasamu::packages::PackageLoader;
///
/// let loader = PackageLoader::new("/srv/smilies", "/user/plugins/tabasamu");
/// for (name, package) in loader.discover_packages().unwrap() {
///     println!("{}: {} ({} smilies)", name, package.label(), package.entry_count());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct PackageLoader {
    root: PathBuf,
    base_url: String,
}

impl PackageLoader {
    /// Create a loader rooted at `root`, serving images under `base_url`.
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Directory scanned for packages.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// URL prefix for package images.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL under which one package's images are served.
    pub fn package_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    /// Discover every package under the root directory.
    ///
    /// Subdirectories without a `smilies.xml` are not packages and are
    /// skipped silently. A package whose definition fails to parse is
    /// logged and left out; the rest are still returned. A missing root
    /// directory yields an empty listing.
    pub fn discover_packages(&self) -> Result<BTreeMap<String, PackageDescriptor>> {
        let mut packages = BTreeMap::new();

        if !self.root.is_dir() {
            info!(dir = %self.root.display(), "Smilies directory does not exist, skipping");
            return Ok(packages);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let entry_path = entry.path();
            if !entry_path.is_dir() {
                continue;
            }
            if !entry_path.join(PACKAGE_FILE).is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            match self.load_package(&name) {
                Ok(package) => {
                    info!(
                        package = %name,
                        version = %package.version,
                        smilies = package.entry_count(),
                        "Discovered smilies package"
                    );
                    packages.insert(name, package);
                }
                Err(e) => {
                    warn!(
                        dir = %entry_path.display(),
                        error = %e,
                        "Failed to load smilies package, skipping"
                    );
                }
            }
        }

        Ok(packages)
    }

    /// Load a single package by name.
    ///
    /// # Errors
    /// - `TabasamuError::InvalidPackageName` if the name could escape the root
    /// - `TabasamuError::NotFound` if `<root>/<name>/smilies.xml` does not exist
    /// - `TabasamuError::Parse` if the definition is malformed
    pub fn load_package(&self, name: &str) -> Result<PackageDescriptor> {
        validate_package_name(name)?;

        let base_path = self.root.join(name);
        let definition = base_path.join(PACKAGE_FILE);
        if !definition.is_file() {
            return Err(TabasamuError::NotFound(format!(
                "No {} found for package '{}' in {}",
                PACKAGE_FILE,
                name,
                self.root.display()
            )));
        }

        let xml = fs::read_to_string(&definition).map_err(|e| {
            TabasamuError::parse(name, format!("failed to read {}: {}", definition.display(), e))
        })?;
        let (info, entries) = parse_definition(name, &xml)?;

        debug!(package = %name, smilies = entries.len(), "Loaded smilies package");

        Ok(PackageDescriptor {
            name: name.to_string(),
            display_name: info.name,
            version: info.version,
            base_url: self.package_url(name),
            base_path,
            entries,
        })
    }
}

impl PackageSource for PackageLoader {
    fn load_package(&self, name: &str) -> Result<PackageDescriptor> {
        PackageLoader::load_package(self, name)
    }

    fn discover_packages(&self) -> Result<BTreeMap<String, PackageDescriptor>> {
        PackageLoader::discover_packages(self)
    }
}

/// Reject package names that could resolve outside the packages directory.
///
/// A package name is a single directory entry: it must be non-empty, must
/// not be `.` or `..`, and must not contain a path separator or NUL. Any
/// other folder name is accepted, including spaces and non-ASCII letters.
pub fn validate_package_name(name: &str) -> Result<()> {
    let escapes = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if escapes {
        return Err(TabasamuError::InvalidPackageName(name.to_string()));
    }
    Ok(())
}

/// Which leaf element the reader is currently collecting text for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    InfoName,
    InfoVersion,
    Text,
    Image,
}

/// The `<info>` fields seen so far.
#[derive(Debug, Default)]
struct PendingInfo {
    name: Option<String>,
    version: Option<String>,
}

/// A `<smiley>` element being assembled.
#[derive(Debug, Default)]
struct PendingSmiley {
    attributes: Attributes,
    text: Option<String>,
    image: Option<String>,
}

/// Parse the contents of a `smilies.xml` definition.
///
/// The document root may have any name. Its `<info>` child supplies the
/// package name and version; each `<smiley>` child becomes one entry, in
/// document order. A smiley's own XML attributes become its custom
/// attributes. Token text is kept verbatim; the image name is trimmed.
/// When a field element is repeated, the first occurrence wins.
pub fn parse_definition(package: &str, xml: &str) -> Result<(PackageInfo, Vec<EmoticonEntry>)> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<String> = Vec::new();
    let mut info = PendingInfo::default();
    let mut entries = Vec::new();
    let mut pending: Option<PendingSmiley> = None;
    let mut field: Option<Field> = None;
    let mut saw_root = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            TabasamuError::parse(
                package,
                format!("XML error at position {}: {}", reader.buffer_position(), e),
            )
        })?;

        match event {
            Event::Start(ref e) => {
                let name = element_name(e);
                saw_root = true;
                if stack.len() == 1 && name == "smiley" {
                    pending = Some(PendingSmiley {
                        attributes: smiley_attributes(package, e)?,
                        ..Default::default()
                    });
                }
                field = match (stack.len(), stack.last().map(String::as_str), name.as_str()) {
                    (2, Some("info"), "name") => Some(Field::InfoName),
                    (2, Some("info"), "version") => Some(Field::InfoVersion),
                    (2, Some("smiley"), "text") => Some(Field::Text),
                    (2, Some("smiley"), "image") => Some(Field::Image),
                    _ => None,
                };
                if let Some(f) = field {
                    if !start_field(&mut info, pending.as_mut(), f) {
                        field = None;
                    }
                }
                stack.push(name);
            }
            Event::Empty(ref e) => {
                let name = element_name(e);
                saw_root = true;
                if stack.len() == 1 && name == "smiley" {
                    let smiley = PendingSmiley {
                        attributes: smiley_attributes(package, e)?,
                        ..Default::default()
                    };
                    entries.push(finish_smiley(package, entries.len() + 1, smiley)?);
                } else if stack.len() == 2 && stack[1] == "smiley" {
                    // <text/> or <image/>: present but empty
                    match name.as_str() {
                        "text" => {
                            start_field(&mut info, pending.as_mut(), Field::Text);
                        }
                        "image" => {
                            start_field(&mut info, pending.as_mut(), Field::Image);
                        }
                        _ => {}
                    }
                }
            }
            Event::Text(ref t) => {
                if let Some(f) = field {
                    let text = t.unescape().map_err(|e| {
                        TabasamuError::parse(package, format!("invalid text content: {}", e))
                    })?;
                    append_field(&mut info, pending.as_mut(), f, &text);
                }
            }
            Event::CData(ref t) => {
                if let Some(f) = field {
                    let text = String::from_utf8_lossy(&t[..]);
                    append_field(&mut info, pending.as_mut(), f, &text);
                }
            }
            Event::End(_) => {
                let closed = stack.pop();
                field = None;
                if stack.len() == 1 && closed.as_deref() == Some("smiley") {
                    if let Some(smiley) = pending.take() {
                        entries.push(finish_smiley(package, entries.len() + 1, smiley)?);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(TabasamuError::parse(package, "document has no root element"));
    }
    if !stack.is_empty() {
        return Err(TabasamuError::parse(
            package,
            format!("unexpected end of document inside <{}>", stack.join("><")),
        ));
    }

    let info = PackageInfo {
        name: info.name.unwrap_or_default(),
        version: info.version.unwrap_or_default(),
    };
    Ok((info, entries))
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

fn smiley_attributes(package: &str, e: &BytesStart<'_>) -> Result<Attributes> {
    let mut attributes = Attributes::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| {
            TabasamuError::parse(package, format!("invalid smiley attribute: {}", e))
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value().map_err(|e| {
            TabasamuError::parse(package, format!("invalid value for attribute '{}': {}", key, e))
        })?;
        attributes.set(key, value);
    }
    Ok(attributes)
}

/// Open `field` for collecting text. Returns `false` when the field was
/// already set by an earlier element, which is then left untouched.
fn start_field(info: &mut PendingInfo, pending: Option<&mut PendingSmiley>, field: Field) -> bool {
    let Some(slot) = field_slot(info, pending, field) else {
        return false;
    };
    if slot.is_some() {
        return false;
    }
    *slot = Some(String::new());
    true
}

fn append_field(info: &mut PendingInfo, pending: Option<&mut PendingSmiley>, field: Field, text: &str) {
    if let Some(value) = field_slot(info, pending, field).and_then(Option::as_mut) {
        value.push_str(text);
    }
}

fn field_slot<'a>(
    info: &'a mut PendingInfo,
    pending: Option<&'a mut PendingSmiley>,
    field: Field,
) -> Option<&'a mut Option<String>> {
    match field {
        Field::InfoName => Some(&mut info.name),
        Field::InfoVersion => Some(&mut info.version),
        Field::Text => pending.map(|smiley| &mut smiley.text),
        Field::Image => pending.map(|smiley| &mut smiley.image),
    }
}

fn finish_smiley(package: &str, position: usize, smiley: PendingSmiley) -> Result<EmoticonEntry> {
    let token = match smiley.text {
        Some(text) if !text.is_empty() => text,
        _ => {
            return Err(TabasamuError::parse(
                package,
                format!("smiley #{} has no <text>", position),
            ))
        }
    };
    let image_file = match smiley.image.map(|i| i.trim().to_string()) {
        Some(image) if !image.is_empty() => image,
        _ => {
            return Err(TabasamuError::parse(
                package,
                format!("smiley #{} ('{}') has no <image>", position, token),
            ))
        }
    };

    Ok(EmoticonEntry {
        token,
        image_file,
        custom_attributes: smiley.attributes,
    })
}
