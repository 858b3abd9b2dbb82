use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::patterns::SIGNATURES;
use crate::schema::RuleSet;

/// Load a [`RuleSet`] from a YAML file on disk.
///
/// Validates the rule set after deserialization (version check, unique and
/// non-empty rule names, non-empty patterns).
pub fn load_rule_set(path: impl AsRef<Path>) -> Result<RuleSet> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read rule file: {}", path.display()))?;
    load_rule_set_from_str(&contents)
        .with_context(|| format!("failed to parse rule file: {}", path.display()))
}

/// Parse and validate a [`RuleSet`] from a YAML string.
pub fn load_rule_set_from_str(yaml: &str) -> Result<RuleSet> {
    let rules: RuleSet = serde_yml::from_str(yaml).context("YAML deserialization failed")?;
    validate(&rules)?;
    Ok(rules)
}

fn validate(rules: &RuleSet) -> Result<()> {
    if rules.version != "1.0" {
        bail!(
            "unsupported rule file version '{}'; only '1.0' is supported",
            rules.version
        );
    }

    // File rules share a namespace with the built-ins they extend.
    let mut seen: HashSet<&str> = HashSet::new();
    if rules.extend_builtin {
        seen.extend(SIGNATURES.iter().map(|s| s.name));
    }

    for rule in &rules.rules {
        if rule.name.is_empty() {
            bail!("rule name must not be empty");
        }
        if rule.pattern.is_empty() {
            bail!("rule '{}' has an empty pattern", rule.name);
        }
        if !seen.insert(rule.name.as_str()) {
            bail!("duplicate rule name: '{}'", rule.name);
        }
    }

    Ok(())
}
