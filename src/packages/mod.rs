//! Smilies packages for Tabasamu
//!
//! A package is a directory holding a `smilies.xml` definition and the images
//! it references. Switching the active package swaps the whole set of
//! recognised emoticons.
//!
//! # Package Directory Structure
//!
//! ```text
//! ~/.tabasamu/smilies/
//! ├── phoenity/
//! │   ├── smilies.xml
//! │   ├── smile.png
//! │   └── sad.png
//! └── kolobok/
//!     ├── smilies.xml
//!     └── ...
//! ```
//!
//! # Example smilies.xml
//!
//! ```xml
//! <package>
//!   <info>
//!     <name>Phoenity</name>
//!     <version>1.0</version>
//!   </info>
//!   <smiley width="15" height="15">
//!     <text>:)</text>
//!     <image>smile.png</image>
//!   </smiley>
//! </package>
//! ```
//!
//! Attributes on `<smiley>` are forwarded into the rendered `<img>` tag and
//! override the defaults on key collision.

mod loader;
mod source;
pub mod types;

pub use loader::{parse_definition, validate_package_name, PackageLoader, PACKAGE_FILE};
#[cfg(test)]
pub use source::MockPackageSource;
pub use source::PackageSource;
pub use types::{Attributes, EmoticonEntry, PackageDescriptor, PackageInfo};
