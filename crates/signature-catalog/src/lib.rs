//! # signature-catalog
//!
//! Attack-signature matching for the waf-gate request filter.
//!
//! The crate is organised around three layers:
//!
//! 1. **[`patterns`]** -- static table of regex signatures grouped by
//!    [`AttackCategory`](patterns::AttackCategory).
//! 2. **[`catalog`]** -- compiles the signatures, one
//!    [`RegexSet`](regex::RegexSet) per category, and classifies values
//!    first-match-wins in category order.
//! 3. **[`loader`]** -- optional YAML rule files that extend or replace the
//!    built-in table.
//!
//! ## Quick start
//!
//! ```rust
//! use signature_catalog::{AttackCategory, Catalog};
//!
//! let catalog = Catalog::builtin().unwrap();
//! let verdict = catalog.classify("1 UNION SELECT password FROM users");
//! assert_eq!(verdict.category(), Some(AttackCategory::SqlInjection));
//! assert_eq!(verdict.alert_message().unwrap(), "WAF Alert: SQL Injection detected");
//! ```

pub mod catalog;
pub mod loader;
pub mod patterns;
mod schema;
mod verdict;

pub use catalog::{Catalog, CatalogError};
pub use patterns::{AttackCategory, SignaturePattern, SIGNATURES};
pub use schema::{RuleDefinition, RuleSet};
pub use verdict::{Detection, Verdict};
