//! Content pipeline hook points.
//!
//! A host renders two kinds of user content, post bodies and comment
//! bodies, and runs each through the formatters registered for that kind
//! just before output.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tabasamu::pipeline::{ContentKind, FormatRegistry};
//!
//! let mut registry = FormatRegistry::new();
//! registry.apply("shout", Arc::new(|s: &str| s.to_uppercase()), ContentKind::CommentContent);
//!
//! assert_eq!(registry.format(ContentKind::CommentContent, "hi"), "HI");
//! assert_eq!(registry.format(ContentKind::PostContent, "hi"), "hi");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Content kinds
// ---------------------------------------------------------------------------

/// Which content stream a formatter is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// Post bodies on output.
    PostContent,
    /// Comment bodies on output.
    CommentContent,
}

impl ContentKind {
    /// Hook name the host uses for this stream.
    pub fn hook_name(&self) -> &'static str {
        match self {
            ContentKind::PostContent => "post_content_out",
            ContentKind::CommentContent => "comment_content_out",
        }
    }
}

// ---------------------------------------------------------------------------
// Formatter trait
// ---------------------------------------------------------------------------

/// A named content transform.
pub trait ContentFormatter: Send + Sync {
    /// Transform `content`. Must not fail.
    fn format(&self, content: &str) -> String;
}

impl<F> ContentFormatter for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn format(&self, content: &str) -> String {
        self(content)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Formatters registered per content kind, run in registration order.
#[derive(Default)]
pub struct FormatRegistry {
    formatters: HashMap<ContentKind, Vec<(String, Arc<dyn ContentFormatter>)>>,
}

impl FormatRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `formatter` under `name` to the `kind` stream.
    ///
    /// Applying the same name twice to one stream replaces the earlier
    /// formatter and keeps its position.
    pub fn apply(&mut self, name: &str, formatter: Arc<dyn ContentFormatter>, kind: ContentKind) {
        let chain = self.formatters.entry(kind).or_default();
        match chain.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = formatter,
            None => chain.push((name.to_string(), formatter)),
        }
        info!(formatter = name, hook = kind.hook_name(), "Applied formatter");
    }

    /// Run every formatter for `kind` over `content`.
    pub fn format(&self, kind: ContentKind, content: &str) -> String {
        let Some(chain) = self.formatters.get(&kind) else {
            return content.to_string();
        };

        let mut out = content.to_string();
        for (name, formatter) in chain {
            debug!(formatter = %name, hook = kind.hook_name(), "Running formatter");
            out = formatter.format(&out);
        }
        out
    }

    /// Names of the formatters attached to `kind`, in order.
    pub fn names(&self, kind: ContentKind) -> Vec<&str> {
        self.formatters
            .get(&kind)
            .map(|chain| chain.iter().map(|(n, _)| n.as_str()).collect())
            .unwrap_or_default()
    }

    /// Whether `name` is attached to `kind`.
    pub fn is_applied(&self, name: &str, kind: ContentKind) -> bool {
        self.formatters
            .get(&kind)
            .is_some_and(|chain| chain.iter().any(|(n, _)| n == name))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
