//! Tabasamu - selectable smilies packages for HTML content

pub mod config;
pub mod error;
pub mod filter;
pub mod packages;
pub mod pipeline;
pub mod plugin;
pub mod render;

pub use config::TabasamuConfig;
pub use error::{Result, TabasamuError};
pub use filter::ContentFilter;
pub use plugin::Tabasamu;
