//! Version handling for TYPO3 core releases
//!
//! # Modules
//!
//! - [`normalizer`]: Parses loosely formatted version strings into canonical versions
//! - [`range`]: Selects the releases between two versions

pub mod normalizer;
pub mod range;

pub use normalizer::{CoreVersion, normalize};
