//! Markup rendering for emoticon entries.
//!
//! Turns one [`EmoticonEntry`] into the `<img>` fragment that replaces its
//! token. Default attributes are `class`, `alt` and `src`; the entry's own
//! attributes are merged on top, so a package can override any of them.

use crate::packages::{Attributes, EmoticonEntry};

/// CSS class every rendered smiley carries unless the package overrides it.
pub const SMILEY_CLASS: &str = "habari-smiley";

/// Render the replacement markup for `entry`, with images served from
/// `base_url`.
///
/// Values are trimmed and HTML-escaped. The fragment is padded with one
/// space on each side so it never fuses with neighbouring text.
///
/// ```
/// use tabasamu::packages::EmoticonEntry;
/// use tabasamu::render::render_img;
///
/// let entry = EmoticonEntry::new(":)", "smile.png");
/// assert_eq!(
///     render_img(&entry, "/smilies/phoenity"),
///     r#" <img class="habari-smiley" alt=":)" src="/smilies/phoenity/smile.png" /> "#
/// );
/// ```
pub fn render_img(entry: &EmoticonEntry, base_url: &str) -> String {
    let mut attributes: Attributes = [
        ("class", SMILEY_CLASS.to_string()),
        ("alt", entry.token.clone()),
        (
            "src",
            format!("{}/{}", base_url.trim_end_matches('/'), entry.image_file),
        ),
    ]
    .into_iter()
    .collect();
    attributes.merge(&entry.custom_attributes);

    let rendered: Vec<String> = attributes
        .iter()
        .map(|(key, value)| format!("{}=\"{}\"", key, escape_attribute(value.trim())))
        .collect();

    format!(" <img {} /> ", rendered.join(" "))
}

/// Escape a value for use inside a double-quoted HTML attribute.
pub fn escape_attribute(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}
