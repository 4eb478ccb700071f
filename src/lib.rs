//! Update impact analysis for TYPO3 core upgrades
//!
//! Given an installed and a target core version, this crate determines every release in
//! between, fetches their changelogs and reports the ones that contain breaking changes or
//! security fixes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Version   │────▶│   Release   │────▶│  Changelog  │
//! │ (normalize) │     │(index,fetch)│     │   (parse)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │                   │
//!        ▼                   ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Report    │     │    Cache    │◀────│  Security   │
//! │ (classify)  │     │  (storage)  │     │ (severity)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```

pub mod cache;
pub mod changelog;
pub mod config;
pub mod error;
pub mod release;
pub mod report;
pub mod security;
pub mod version;
