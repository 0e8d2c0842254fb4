//! Replacement tables built from a smilies package.

use std::collections::HashSet;

use aho_corasick::AhoCorasick;
use tracing::warn;

use crate::packages::PackageDescriptor;
use crate::render::render_img;

/// One token and the markup that replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementRule {
    /// Literal text to find.
    pub token: String,
    /// Markup written in its place.
    pub rendered_markup: String,
}

/// Ordered token-to-markup rules for one package.
///
/// A table is built whole and never mutated afterwards; switching packages
/// means building a new one.
#[derive(Debug, Clone, Default)]
pub struct ReplacementTable {
    built_for: Option<String>,
    rules: Vec<ReplacementRule>,
    matcher: Option<AhoCorasick>,
}

impl ReplacementTable {
    /// Build a table from every entry of `descriptor`, in definition order.
    ///
    /// When a token appears more than once only its first definition is
    /// kept.
    pub fn build(descriptor: &PackageDescriptor) -> Self {
        let mut seen = HashSet::new();
        let rules: Vec<ReplacementRule> = descriptor
            .entries
            .iter()
            .filter(|entry| seen.insert(entry.token.as_str()))
            .map(|entry| ReplacementRule {
                token: entry.token.clone(),
                rendered_markup: render_img(entry, &descriptor.base_url),
            })
            .collect();

        Self::from_rules(descriptor.name.clone(), rules)
    }

    /// Build a table from prepared rules.
    pub fn from_rules(package: impl Into<String>, rules: Vec<ReplacementRule>) -> Self {
        let package = package.into();
        let matcher = if rules.is_empty() {
            None
        } else {
            match AhoCorasick::new(rules.iter().map(|r| r.token.as_str())) {
                Ok(ac) => Some(ac),
                Err(e) => {
                    warn!(package = %package, error = %e, "Token prefilter unavailable");
                    None
                }
            }
        };

        Self {
            built_for: Some(package),
            rules,
            matcher,
        }
    }

    /// An empty table recorded as built for `package`.
    ///
    /// Used when the package could not be loaded, so the failure is not
    /// retried on every call.
    pub fn unavailable(package: impl Into<String>) -> Self {
        Self {
            built_for: Some(package.into()),
            rules: Vec::new(),
            matcher: None,
        }
    }

    /// True when the table was never built or was built for another package.
    pub fn is_stale_for(&self, package: &str) -> bool {
        self.built_for.as_deref() != Some(package)
    }

    /// Package this table was built for, if any.
    pub fn built_for(&self) -> Option<&str> {
        self.built_for.as_deref()
    }

    /// Rules in application order.
    pub fn rules(&self) -> &[ReplacementRule] {
        &self.rules
    }

    /// Markup for `token`, if the table has a rule for it.
    pub fn lookup(&self, token: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|r| r.token == token)
            .map(|r| r.rendered_markup.as_str())
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule to a text span.
    ///
    /// Rules run one after another over the progressively rewritten text, so
    /// a later rule can match inside markup produced by an earlier one.
    pub fn replace_text(&self, text: &str) -> String {
        if self.rules.is_empty() {
            return text.to_string();
        }
        // No cascade can start unless some token is present in the input.
        if let Some(matcher) = &self.matcher {
            if !matcher.is_match(text) {
                return text.to_string();
            }
        }

        let mut out = text.to_string();
        for rule in &self.rules {
            if out.contains(rule.token.as_str()) {
                out = out.replace(rule.token.as_str(), &rule.rendered_markup);
            }
        }
        out
    }
}
