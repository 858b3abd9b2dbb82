use serde::{Deserialize, Serialize};

use crate::patterns::AttackCategory;

/// Top-level rule file loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSet {
    /// Schema version; currently must be "1.0".
    pub version: String,
    /// Keep the built-in signatures and append these rules after them.
    /// When false, the file replaces the built-in table entirely.
    #[serde(default = "default_true")]
    pub extend_builtin: bool,
    /// Additional rules, grouped by category at compile time.
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            extend_builtin: true,
            rules: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// A single externally supplied signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDefinition {
    /// Unique rule name.
    pub name: String,
    /// Category reported when this rule matches.
    pub category: AttackCategory,
    /// Regex string, compiled case-insensitively.
    pub pattern: String,
    #[serde(default)]
    pub description: Option<String>,
}
