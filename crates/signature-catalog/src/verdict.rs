use serde::{Deserialize, Serialize};

use crate::patterns::AttackCategory;

/// Which rule fired, and for which category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    /// Category reported to the client.
    pub category: AttackCategory,
    /// `name` of the first rule that matched.
    pub rule: String,
    /// Human-readable description of that rule.
    pub description: String,
}

impl Detection {
    /// Message body for the 403 response, e.g.
    /// `WAF Alert: SQL Injection detected`.
    pub fn alert_message(&self) -> String {
        format!("WAF Alert: {} detected", self.category.description())
    }
}

/// Classification outcome for a single value or a whole request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// No rule in any category matched.
    Clean,
    /// A rule matched; the request must not proceed.
    Rejected(Detection),
}

impl Verdict {
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }

    /// The detection, if this verdict is a rejection.
    pub fn detection(&self) -> Option<&Detection> {
        match self {
            Self::Clean => None,
            Self::Rejected(detection) => Some(detection),
        }
    }

    /// The category, if this verdict is a rejection.
    pub fn category(&self) -> Option<AttackCategory> {
        self.detection().map(|d| d.category)
    }

    /// See [`Detection::alert_message`].  `None` for clean verdicts.
    pub fn alert_message(&self) -> Option<String> {
        self.detection().map(Detection::alert_message)
    }
}
