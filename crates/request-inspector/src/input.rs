use serde::{Deserialize, Serialize};
use std::fmt;

/// Where in the request a field came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    Query,
    Form,
    Cookie,
}

impl fmt::Display for FieldSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::Form => write!(f, "form"),
            Self::Cookie => write!(f, "cookie"),
        }
    }
}

/// One named value taken from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionField {
    pub source: FieldSource,
    pub name: String,
    pub value: String,
}

/// Every inspectable field of a single request, in extraction order.
///
/// Fields are never merged: a name present in both the query string and the
/// form body appears twice, once per source.
#[derive(Debug, Clone, Default)]
pub struct InspectionInput {
    fields: Vec<InspectionField>,
}

impl InspectionInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one field.
    pub fn push(&mut self, source: FieldSource, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push(InspectionField {
            source,
            name: name.into(),
            value: value.into(),
        });
    }

    /// Append every `(name, value)` pair under the same source.
    pub fn extend_from(
        &mut self,
        source: FieldSource,
        pairs: impl IntoIterator<Item = (String, String)>,
    ) {
        self.fields.extend(
            pairs
                .into_iter()
                .map(|(name, value)| InspectionField { source, name, value }),
        );
    }

    pub fn iter(&self) -> impl Iterator<Item = &InspectionField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
