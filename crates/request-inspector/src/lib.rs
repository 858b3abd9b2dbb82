//! # request-inspector
//!
//! Decides whether an HTTP request may reach application code.
//!
//! The hosting server hands over the request parts and buffered body;
//! [`extract`] turns them into an [`InspectionInput`] (query parameters, form
//! fields and cookies, duplicates preserved) and the [`Inspector`] classifies
//! every value against a shared [`signature_catalog::Catalog`].  The first
//! rejected value decides the request.
//!
//! ```rust
//! use std::sync::Arc;
//! use request_inspector::{extract, InspectionLimits, Inspector};
//! use signature_catalog::Catalog;
//!
//! let inspector = Inspector::new(Arc::new(Catalog::builtin().unwrap()));
//! let (parts, _) = http::Request::get("/?id=1%27").body(()).unwrap().into_parts();
//! let input = extract::extract_request(&parts, b"", &InspectionLimits::default()).unwrap();
//! assert!(!inspector.inspect(&input).is_clean());
//! ```

pub mod extract;
mod input;
mod inspector;

pub use extract::{ExtractError, InspectionLimits};
pub use input::{FieldSource, InspectionField, InspectionInput};
pub use inspector::{FieldFinding, Inspector};
