//! The smilies content filter.
//!
//! [`ContentFilter::apply`] replaces emoticon tokens in HTML with `<img>`
//! tags while leaving markup alone. The replacement table for the active
//! package is built lazily on first use and rebuilt only when the active
//! package changes.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tabasamu::config::{MemoryConfigStore, OPTION_NAME};
//! use tabasamu::filter::ContentFilter;
//! use tabasamu::packages::PackageLoader;
//!
//! let loader = Arc::new(PackageLoader::new("/srv/smilies", "/smilies"));
//! let store = Arc::new(MemoryConfigStore::with_option(OPTION_NAME, "phoenity"));
//! let filter = ContentFilter::new(loader, store, OPTION_NAME);
//!
//! println!("{}", filter.apply("<p>Hello :)</p>"));
//! ```

mod split;
mod table;

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::config::ConfigStore;
use crate::packages::PackageSource;
use crate::pipeline::ContentFormatter;

pub use split::{is_tag_span, split_spans};
pub use table::{ReplacementRule, ReplacementTable};

/// Replaces emoticon tokens in HTML text spans.
///
/// Safe to share between threads: the table is built and swapped under a
/// mutex, and readers work on a snapshot, so no caller ever sees a
/// half-built table.
pub struct ContentFilter {
    source: Arc<dyn PackageSource>,
    store: Arc<dyn ConfigStore>,
    option_name: String,
    table: Mutex<Arc<ReplacementTable>>,
}

impl ContentFilter {
    /// Create a filter that reads the active package name from `store`
    /// under `option_name` and loads packages from `source`.
    pub fn new(
        source: Arc<dyn PackageSource>,
        store: Arc<dyn ConfigStore>,
        option_name: impl Into<String>,
    ) -> Self {
        Self {
            source,
            store,
            option_name: option_name.into(),
            table: Mutex::new(Arc::new(ReplacementTable::default())),
        }
    }

    /// Replace every emoticon token outside of tags.
    ///
    /// Never fails: if no package is active or the package cannot be
    /// loaded, `content` is returned unchanged.
    pub fn apply(&self, content: &str) -> String {
        let table = match self.active_package() {
            Some(package) => self.table_for(&package),
            None => {
                debug!(option = %self.option_name, "No active smilies package");
                return content.to_string();
            }
        };
        if table.is_empty() {
            return content.to_string();
        }

        let mut out = String::with_capacity(content.len());
        for span in split_spans(content) {
            if is_tag_span(span) {
                out.push_str(span);
            } else {
                out.push_str(&table.replace_text(span));
            }
        }
        out
    }

    /// Name of the active package, as stored in the option store.
    pub fn active_package(&self) -> Option<String> {
        self.store
            .get_option(&self.option_name)
            .filter(|name| !name.trim().is_empty())
    }

    /// Snapshot of the current table.
    pub fn table(&self) -> Arc<ReplacementTable> {
        Arc::clone(&self.lock_table())
    }

    /// Drop the cached table so the next call rebuilds it.
    pub fn invalidate(&self) {
        *self.lock_table() = Arc::new(ReplacementTable::default());
        debug!("Smilies table invalidated");
    }

    /// Table for `package`, building it if the cached one is stale.
    fn table_for(&self, package: &str) -> Arc<ReplacementTable> {
        let mut guard = self.lock_table();
        if guard.is_stale_for(package) {
            *guard = Arc::new(self.build_table(package));
        }
        Arc::clone(&guard)
    }

    fn build_table(&self, package: &str) -> ReplacementTable {
        match self.source.load_package(package) {
            Ok(descriptor) => {
                let table = ReplacementTable::build(&descriptor);
                info!(
                    package = %package,
                    rules = table.len(),
                    "Built smilies table"
                );
                table
            }
            Err(e) => {
                warn!(
                    package = %package,
                    error = %e,
                    "Failed to load smilies package, content passes through unchanged"
                );
                ReplacementTable::unavailable(package)
            }
        }
    }

    fn lock_table(&self) -> std::sync::MutexGuard<'_, Arc<ReplacementTable>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ContentFormatter for ContentFilter {
    fn format(&self, content: &str) -> String {
        self.apply(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfigStore;
    use crate::error::TabasamuError;
    use crate::packages::{EmoticonEntry, MockPackageSource, PackageDescriptor, PackageLoader};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const OPTION: &str = "tabasamu__package";

    fn descriptor(name: &str, entries: Vec<EmoticonEntry>) -> PackageDescriptor {
        PackageDescriptor {
            name: name.to_string(),
            display_name: name.to_string(),
            version: "1.0".to_string(),
            base_url: format!("/smilies/{}", name),
            base_path: PathBuf::from("/tmp").join(name),
            entries,
        }
    }

    fn smile_markup(package: &str) -> String {
        format!(
            r#" <img class="habari-smiley" alt=":)" src="/smilies/{}/happy.png" /> "#,
            package
        )
    }

    /// Filter over a mock source that expects exactly `loads` loads.
    fn filter_with_mock(store: Arc<MemoryConfigStore>, loads: usize) -> ContentFilter {
        let mut source = MockPackageSource::new();
        source
            .expect_load_package()
            .times(loads)
            .returning(|name| Ok(descriptor(name, vec![EmoticonEntry::new(":)", "happy.png")])));
        ContentFilter::new(Arc::new(source), store, OPTION)
    }

    #[test]
    fn test_apply_replaces_text_and_skips_tags() {
        let store = Arc::new(MemoryConfigStore::with_option(OPTION, "pkgA"));
        let filter = filter_with_mock(store, 1);

        let markup = smile_markup("pkgA");
        assert_eq!(
            filter.apply("Hi :) <b>:)</b>"),
            format!("Hi {m} <b>{m}</b>", m = markup)
        );
    }

    #[test]
    fn test_apply_leaves_token_inside_tag() {
        let store = Arc::new(MemoryConfigStore::with_option(OPTION, "pkgA"));
        let filter = filter_with_mock(store, 1);

        let input = r#"<img alt=":)" title=":) :)"><a href="/x?q=:)">link</a>"#;
        assert_eq!(filter.apply(input), input);
    }

    #[test]
    fn test_apply_span_starting_with_bracket_is_untouched() {
        let store = Arc::new(MemoryConfigStore::with_option(OPTION, "pkgA"));
        let filter = filter_with_mock(store, 1);

        assert_eq!(filter.apply("<b>< :)"), "<b>< :)");
    }

    #[test]
    fn test_apply_builds_table_once() {
        let store = Arc::new(MemoryConfigStore::with_option(OPTION, "pkgA"));
        let filter = filter_with_mock(store, 1);

        for _ in 0..5 {
            let _ = filter.apply(":)");
        }
        assert_eq!(filter.table().built_for(), Some("pkgA"));
    }

    #[test]
    fn test_apply_rebuilds_once_on_package_change() {
        let store = Arc::new(MemoryConfigStore::with_option(OPTION, "pkgA"));
        let filter = filter_with_mock(Arc::clone(&store), 2);

        assert_eq!(filter.apply(":)"), smile_markup("pkgA"));
        assert_eq!(filter.apply(":)"), smile_markup("pkgA"));

        store.set_option(OPTION, "pkgB").unwrap();
        assert_eq!(filter.apply(":)"), smile_markup("pkgB"));
        assert_eq!(filter.apply(":)"), smile_markup("pkgB"));
        assert_eq!(filter.table().built_for(), Some("pkgB"));
    }

    #[test]
    fn test_invalidate_forces_reload() {
        let store = Arc::new(MemoryConfigStore::with_option(OPTION, "pkgA"));
        let filter = filter_with_mock(store, 2);

        let _ = filter.apply(":)");
        filter.invalidate();
        assert!(filter.table().is_stale_for("pkgA"));
        let _ = filter.apply(":)");
    }

    #[test]
    fn test_apply_missing_package_passes_through() {
        let mut source = MockPackageSource::new();
        source
            .expect_load_package()
            .times(1)
            .returning(|name| Err(TabasamuError::NotFound(format!("package '{}'", name))));
        let store = Arc::new(MemoryConfigStore::with_option(OPTION, "ghost"));
        let filter = ContentFilter::new(Arc::new(source), store, OPTION);

        assert_eq!(filter.apply("Hi :)"), "Hi :)");
        assert_eq!(filter.apply("Bye :("), "Bye :(");
    }

    #[test]
    fn test_apply_without_active_package() {
        let mut source = MockPackageSource::new();
        source.expect_load_package().times(0);
        let filter = ContentFilter::new(Arc::new(source), Arc::new(MemoryConfigStore::new()), OPTION);

        assert_eq!(filter.apply("Hi :)"), "Hi :)");
        assert_eq!(filter.active_package(), None);
    }

    #[test]
    fn test_empty_table_preserves_malformed_markup() {
        let mut source = MockPackageSource::new();
        source
            .expect_load_package()
            .returning(|name| Ok(descriptor(name, vec![])));
        let store = Arc::new(MemoryConfigStore::with_option(OPTION, "empty"));
        let filter = ContentFilter::new(Arc::new(source), store, OPTION);

        for input in ["", "<<", "a < b > c", "<p unclosed", "</x></y>>", "plain :)"] {
            assert_eq!(filter.apply(input), input);
        }
    }

    #[test]
    fn test_apply_literal_metacharacters() {
        let mut source = MockPackageSource::new();
        source.expect_load_package().returning(|name| {
            Ok(descriptor(name, vec![EmoticonEntry::new(":-)", "nose.png")]))
        });
        let store = Arc::new(MemoryConfigStore::with_option(OPTION, "p"));
        let filter = ContentFilter::new(Arc::new(source), store, OPTION);

        let out = filter.apply(":-) :--) :)");
        assert!(out.starts_with(r#" <img class="habari-smiley" alt=":-)""#));
        assert!(out.ends_with(" :--) :)"));
    }

    #[test]
    fn test_apply_duplicate_token_uses_first() {
        let mut source = MockPackageSource::new();
        source.expect_load_package().returning(|name| {
            Ok(descriptor(
                name,
                vec![
                    EmoticonEntry::new(":)", "first.png"),
                    EmoticonEntry::new(":)", "second.png"),
                ],
            ))
        });
        let store = Arc::new(MemoryConfigStore::with_option(OPTION, "p"));
        let filter = ContentFilter::new(Arc::new(source), store, OPTION);

        let out = filter.apply(":)");
        assert!(out.contains("first.png"));
        assert!(!out.contains("second.png"));
    }

    #[test]
    fn test_apply_with_filesystem_packages() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("pkgA");
        fs::create_dir(&dir).unwrap();
        fs::write(
            dir.join("smilies.xml"),
            r#"<package><smiley alt="Happy face"><text>:)</text><image>happy.png</image></smiley></package>"#,
        )
        .unwrap();

        let loader = Arc::new(PackageLoader::new(tmp.path(), "/smilies"));
        let store = Arc::new(MemoryConfigStore::with_option(OPTION, "pkgA"));
        let filter = ContentFilter::new(loader, store, OPTION);

        assert_eq!(
            filter.apply("<p>:)</p>"),
            r#"<p> <img class="habari-smiley" alt="Happy face" src="/smilies/pkgA/happy.png" /> </p>"#
        );
    }

    #[test]
    fn test_apply_concurrent_callers_share_one_build() {
        let store = Arc::new(MemoryConfigStore::with_option(OPTION, "pkgA"));
        let filter = Arc::new(filter_with_mock(store, 1));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let filter = Arc::clone(&filter);
                std::thread::spawn(move || filter.apply("x :) y"))
            })
            .collect();

        let expected = format!("x {} y", smile_markup("pkgA"));
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
