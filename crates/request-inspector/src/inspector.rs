use std::sync::Arc;

use signature_catalog::{Catalog, Detection, Verdict};
use tracing::warn;

use crate::input::{FieldSource, InspectionInput};

/// The first field that failed inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFinding {
    pub source: FieldSource,
    pub name: String,
    pub detection: Detection,
}

/// Admit/reject decision for whole requests.
///
/// Holds a shared, read-only [`Catalog`]; cloning an `Inspector` is cheap
/// and every method takes `&self`.
#[derive(Debug, Clone)]
pub struct Inspector {
    catalog: Arc<Catalog>,
}

impl Inspector {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Classify every field of the request and return the first rejection,
    /// or [`Verdict::Clean`] when every value is clean.
    pub fn inspect(&self, input: &InspectionInput) -> Verdict {
        match self.find_first(input) {
            Some(finding) => Verdict::Rejected(finding.detection),
            None => Verdict::Clean,
        }
    }

    /// Like [`inspect`](Self::inspect) but also reports which field was
    /// rejected.  Scanning stops at the first rejected field.
    pub fn find_first(&self, input: &InspectionInput) -> Option<FieldFinding> {
        input.iter().find_map(|field| match self.catalog.classify(&field.value) {
            Verdict::Clean => None,
            Verdict::Rejected(detection) => {
                warn!(
                    source = %field.source,
                    field = %field.name,
                    category = %detection.category,
                    rule = %detection.rule,
                    value_len = field.value.len(),
                    "attack signature detected"
                );
                Some(FieldFinding {
                    source: field.source,
                    name: field.name.clone(),
                    detection,
                })
            }
        })
    }
}
