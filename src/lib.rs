//! fixerbot - answers `{{mod name}}` lookups against the Thunderstore registry

pub mod catalog;
pub mod config;
pub mod console;
pub mod dispatch;
pub mod error;
pub mod matching;
pub mod resolver;
pub mod summary;

pub use error::{FetchError, FixerError, Result};
