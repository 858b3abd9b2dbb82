//! Compiled signature catalogue and the `classify` entry point.

use regex::{RegexBuilder, RegexSet, RegexSetBuilder};
use tracing::{debug, trace};

use crate::patterns::{AttackCategory, SIGNATURES};
use crate::schema::RuleSet;
use crate::verdict::{Detection, Verdict};

/// Upper bound on the compiled size of any single rule or category set.
const COMPILED_SIZE_LIMIT: usize = 10 * (1 << 20);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while building a [`Catalog`].  All of them are startup
/// failures: a catalog is either complete or it does not exist.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to compile rule '{rule}': {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to compile {category} rule set: {source}")]
    InvalidCategorySet {
        category: AttackCategory,
        #[source]
        source: regex::Error,
    },

    #[error("catalog contains no rules")]
    Empty,
}

// ---------------------------------------------------------------------------
// Compiled representation
// ---------------------------------------------------------------------------

/// Borrowed view of one rule prior to compilation.
struct RuleSource<'a> {
    name: &'a str,
    category: AttackCategory,
    pattern: &'a str,
    description: &'a str,
}

#[derive(Debug)]
struct RuleInfo {
    name: String,
    description: String,
}

/// One category with its rules in declaration order.
///
/// `set` holds the same patterns as `rules`, index for index, so the lowest
/// matching set index is the first matching rule.
#[derive(Debug)]
struct CategoryRules {
    category: AttackCategory,
    set: RegexSet,
    rules: Vec<RuleInfo>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable, ordered collection of compiled signature categories.
///
/// Build it once at startup and share it behind an `Arc`; [`classify`] takes
/// `&self` and touches no mutable state.
///
/// [`classify`]: Catalog::classify
pub struct Catalog {
    categories: Vec<CategoryRules>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("num_categories", &self.categories.len())
            .field("num_rules", &self.rule_count())
            .finish()
    }
}

impl Catalog {
    /// Compile the built-in [`SIGNATURES`] table.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::compile(builtin_sources())
    }

    /// Compile a catalog from a loaded rule file.
    ///
    /// With `extend_builtin` the built-in signatures come first within each
    /// category and the file's rules follow in file order.  Category
    /// precedence is always the fixed [`AttackCategory::ALL`] order.
    pub fn from_rule_set(rule_set: &RuleSet) -> Result<Self, CatalogError> {
        let file_rules = rule_set.rules.iter().map(|r| RuleSource {
            name: &r.name,
            category: r.category,
            pattern: &r.pattern,
            description: r.description.as_deref().unwrap_or(&r.name),
        });

        if rule_set.extend_builtin {
            Self::compile(builtin_sources().chain(file_rules))
        } else {
            Self::compile(file_rules)
        }
    }

    fn compile<'a>(sources: impl Iterator<Item = RuleSource<'a>>) -> Result<Self, CatalogError> {
        let sources: Vec<RuleSource<'a>> = sources.collect();
        let mut categories = Vec::new();

        for category in AttackCategory::ALL {
            let members: Vec<&RuleSource<'a>> =
                sources.iter().filter(|s| s.category == category).collect();
            if members.is_empty() {
                continue;
            }

            // Compile each rule on its own first so a bad pattern is
            // reported by name rather than as an anonymous set failure.
            for source in &members {
                RegexBuilder::new(source.pattern)
                    .case_insensitive(true)
                    .size_limit(COMPILED_SIZE_LIMIT)
                    .build()
                    .map_err(|e| CatalogError::InvalidPattern {
                        rule: source.name.to_string(),
                        source: e,
                    })?;
            }

            let set = RegexSetBuilder::new(members.iter().map(|s| s.pattern))
                .case_insensitive(true)
                .size_limit(COMPILED_SIZE_LIMIT)
                .build()
                .map_err(|e| CatalogError::InvalidCategorySet { category, source: e })?;

            let rules = members
                .iter()
                .map(|s| RuleInfo {
                    name: s.name.to_string(),
                    description: s.description.to_string(),
                })
                .collect();

            debug!(%category, rules = members.len(), "compiled signature category");
            categories.push(CategoryRules { category, set, rules });
        }

        if categories.is_empty() {
            return Err(CatalogError::Empty);
        }

        Ok(Self { categories })
    }

    /// Classify a single value.
    ///
    /// Categories are tried in precedence order and the first category with
    /// any matching rule decides the verdict; within it, the earliest
    /// declared matching rule is reported.
    pub fn classify(&self, value: &str) -> Verdict {
        for group in &self.categories {
            if let Some(idx) = group.set.matches(value).iter().next() {
                let rule = &group.rules[idx];
                trace!(category = %group.category, rule = %rule.name, "signature matched");
                return Verdict::Rejected(Detection {
                    category: group.category,
                    rule: rule.name.clone(),
                    description: rule.description.clone(),
                });
            }
        }
        Verdict::Clean
    }

    /// Total number of compiled rules across all categories.
    pub fn rule_count(&self) -> usize {
        self.categories.iter().map(|c| c.rules.len()).sum()
    }

    /// Categories present in this catalog, in precedence order, with the
    /// names of their rules in evaluation order.
    pub fn categories(&self) -> impl Iterator<Item = (AttackCategory, Vec<&str>)> + '_ {
        self.categories
            .iter()
            .map(|c| (c.category, c.rules.iter().map(|r| r.name.as_str()).collect()))
    }
}

fn builtin_sources<'a>() -> impl Iterator<Item = RuleSource<'a>> {
    SIGNATURES.iter().map(|s| RuleSource {
        name: s.name,
        category: s.category,
        pattern: s.pattern,
        description: s.description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_rule_set_from_str;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn catalog() -> Catalog {
        Catalog::builtin().expect("built-in catalog should compile")
    }

    fn rule_for(catalog: &Catalog, value: &str) -> Option<(AttackCategory, String)> {
        catalog
            .classify(value)
            .detection()
            .map(|d| (d.category, d.rule.clone()))
    }

    // -- construction -----------------------------------------------------

    #[test]
    fn builtin_contains_every_signature() {
        let c = catalog();
        assert_eq!(c.rule_count(), SIGNATURES.len());
        let order: Vec<AttackCategory> = c.categories().map(|(cat, _)| cat).collect();
        assert_eq!(order, AttackCategory::ALL.to_vec());
    }

    #[test]
    fn rules_keep_declaration_order() {
        let c = catalog();
        let (_, sqli) = c.categories().next().unwrap();
        assert_eq!(
            sqli,
            vec![
                "sql_meta_chars",
                "assignment_then_meta",
                "quote_or",
                "union_select",
                "select_from",
                "insert_into",
                "drop_table",
            ]
        );
    }

    // -- clean values -----------------------------------------------------

    #[test]
    fn benign_values_are_clean() {
        let c = catalog();
        let values = [
            "",
            "hello",
            "John Smith",
            "42",
            "user@example.com",
            "a-b_c.d",
            "2024/05/01",
        ];
        for value in values {
            assert!(c.classify(value).is_clean(), "unexpected rejection for: {value}");
        }
    }

    // -- SQL injection ----------------------------------------------------

    #[test]
    fn detects_sql_injection_idioms() {
        let c = catalog();
        let cases = [
            ("O'Brien", "sql_meta_chars"),
            ("admin%27", "sql_meta_chars"),
            ("1 -- comment", "sql_meta_chars"),
            ("1 %23", "sql_meta_chars"),
            ("x#", "sql_meta_chars"),
            ("id=1;", "assignment_then_meta"),
            ("a%3Db%3B", "assignment_then_meta"),
            ("1 UNION  SELECT password", "union_select"),
            ("select name from users", "select_from"),
            ("INSERT INTO accounts", "insert_into"),
            ("drop table users", "drop_table"),
        ];
        for (value, rule) in cases {
            assert_eq!(
                rule_for(&c, value),
                Some((AttackCategory::SqlInjection, rule.to_string())),
                "value: {value}"
            );
        }
    }

    #[test]
    fn ascii_separators_count_as_whitespace() {
        let c = catalog();
        let cases = [
            ("1 union\x1fselect pw", AttackCategory::SqlInjection, "union_select"),
            ("drop\x1ctable users", AttackCategory::SqlInjection, "drop_table"),
            ("insert\x1dinto t", AttackCategory::SqlInjection, "insert_into"),
            ("onload\x1e\x1d=alert(1)", AttackCategory::CrossSiteScripting, "event_handler"),
        ];
        for (value, category, rule) in cases {
            assert_eq!(
                rule_for(&c, value),
                Some((category, rule.to_string())),
                "value: {value:?}"
            );
        }
    }

    #[test]
    fn quote_or_is_shadowed_by_meta_chars() {
        // Any quote already trips the first rule; `quote_or` only names
        // matches through custom catalogs without `sql_meta_chars`.
        let c = catalog();
        assert_eq!(
            rule_for(&c, "' or 1"),
            Some((AttackCategory::SqlInjection, "sql_meta_chars".to_string()))
        );
    }

    #[test]
    fn union_select_is_case_insensitive() {
        let c = catalog();
        for value in ["UNION SELECT", "union select", "UnIoN sElEcT"] {
            assert_eq!(c.classify(value).category(), Some(AttackCategory::SqlInjection), "{value}");
        }
    }

    #[test]
    fn percent_encoding_is_matched_literally() {
        let c = catalog();
        // A double-encoded quote (`%2527`) reaches the catalog as `%27`
        // after the host's single decoding pass.
        assert_eq!(c.classify("%27").category(), Some(AttackCategory::SqlInjection));
        assert_eq!(c.classify("abc%27").category(), Some(AttackCategory::SqlInjection));
        assert_eq!(c.classify("%4F%52").category(), None);
        // Encoded traversal is not decoded by the catalog.
        assert!(c.classify("%2e%2e%2f").is_clean());
    }

    // -- XSS --------------------------------------------------------------

    #[test]
    fn detects_cross_site_scripting() {
        let c = catalog();
        let cases = [
            ("<script>alert(1)</script>", "script_tag"),
            ("<SCRIPT type=\"x\">a</SCRIPT >", "script_tag"),
            ("javascript:alert(1)", "javascript_protocol"),
            ("<img src=x onerror=alert(1)>", "event_handler"),
            ("<body onload =x>", "event_handler"),
        ];
        for (value, rule) in cases {
            assert_eq!(
                rule_for(&c, value),
                Some((AttackCategory::CrossSiteScripting, rule.to_string())),
                "value: {value}"
            );
        }
    }

    #[test]
    fn script_tag_does_not_span_lines() {
        let c = catalog();
        assert!(c.classify("<script>\nalert(1)\n</script>").is_clean());
    }

    // -- file inclusion ---------------------------------------------------

    #[test]
    fn detects_file_inclusion() {
        let c = catalog();
        let cases = [
            ("../../etc/passwd", "directory_traversal"),
            ("/etc/passwd", "etc_passwd"),
            ("C:\\boot.ini", "boot_ini"),
            ("bootXini", "boot_ini"),
            ("php://filter/resource=index", "stream_wrapper"),
            ("FILE:///tmp/x", "stream_wrapper"),
        ];
        for (value, rule) in cases {
            assert_eq!(
                rule_for(&c, value),
                Some((AttackCategory::FileInclusion, rule.to_string())),
                "value: {value}"
            );
        }
    }

    // -- session hijacking ------------------------------------------------

    #[test]
    fn detects_session_identifiers() {
        let c = catalog();
        assert_eq!(
            rule_for(&c, "PHPSESSID=abc123"),
            Some((AttackCategory::SessionHijacking, "phpsessid".to_string()))
        );
        assert_eq!(
            rule_for(&c, "aspsessionidqqq"),
            Some((AttackCategory::SessionHijacking, "aspsessionid".to_string()))
        );
    }

    #[test]
    fn jsessionid_assignment_reports_xss() {
        // "JSESSIONID=" contains "ONID=", which the earlier `event_handler`
        // rule already matches.
        let c = catalog();
        assert_eq!(
            rule_for(&c, "JSESSIONID=abc"),
            Some((AttackCategory::CrossSiteScripting, "event_handler".to_string()))
        );
    }

    // -- precedence -------------------------------------------------------

    #[test]
    fn sql_injection_wins_over_xss() {
        let c = catalog();
        let verdict = c.classify("'<script>alert(1)</script>");
        assert_eq!(verdict.category(), Some(AttackCategory::SqlInjection));
    }

    #[test]
    fn xss_wins_over_file_inclusion() {
        let c = catalog();
        let verdict = c.classify("javascript:../../etc/passwd");
        assert_eq!(verdict.category(), Some(AttackCategory::CrossSiteScripting));
    }

    // -- bounded matching cost --------------------------------------------

    #[test]
    fn pathological_inputs_finish_quickly() {
        let c = catalog();
        let max_len = 16 * 1024;
        let inputs = [
            "<script".repeat(max_len / 7),
            "<a on".repeat(max_len / 5),
            "=".repeat(max_len),
            "select ".repeat(max_len / 7),
            "union\t".repeat(max_len / 6),
            "<".repeat(max_len),
            "a".repeat(max_len),
        ];
        for input in &inputs {
            let started = Instant::now();
            let _ = c.classify(input);
            let elapsed = started.elapsed();
            assert!(
                elapsed < Duration::from_secs(2),
                "classify took {elapsed:?} on a {}-byte input",
                input.len()
            );
        }
    }

    // -- concurrency ------------------------------------------------------

    #[test]
    fn shared_catalog_classifies_across_threads() {
        let c = Arc::new(catalog());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let c = Arc::clone(&c);
                std::thread::spawn(move || {
                    let value = if i % 2 == 0 { "union select" } else { "plain" };
                    c.classify(value).is_clean()
                })
            })
            .collect();
        let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results, vec![false, true, false, true, false, true, false, true]);
    }

    // -- rule files -------------------------------------------------------

    #[test]
    fn rule_file_extends_builtin_categories() {
        let rules = load_rule_set_from_str(
            r#"
version: "1.0"
rules:
  - name: sqli_sleep
    category: sql_injection
    pattern: "sleep\\s*\\("
  - name: xss_iframe
    category: cross_site_scripting
    pattern: "<iframe"
    description: "inline frames"
"#,
        )
        .unwrap();
        let c = Catalog::from_rule_set(&rules).unwrap();
        assert_eq!(c.rule_count(), SIGNATURES.len() + 2);

        assert_eq!(
            rule_for(&c, "SLEEP(5)"),
            Some((AttackCategory::SqlInjection, "sqli_sleep".to_string()))
        );
        let verdict = c.classify("<IFRAME src>");
        let detection = verdict.detection().unwrap();
        assert_eq!(detection.rule, "xss_iframe");
        assert_eq!(detection.description, "inline frames");
    }

    #[test]
    fn rule_file_can_replace_builtins() {
        let rules = load_rule_set_from_str(
            r#"
version: "1.0"
extend_builtin: false
rules:
  - name: only_etc
    category: file_inclusion
    pattern: "/etc/"
"#,
        )
        .unwrap();
        let c = Catalog::from_rule_set(&rules).unwrap();
        assert_eq!(c.rule_count(), 1);
        assert!(c.classify("' or 1=1 --").is_clean());
        assert_eq!(c.classify("/etc/shadow").category(), Some(AttackCategory::FileInclusion));
        // Description falls back to the rule name.
        assert_eq!(c.classify("/etc/shadow").detection().unwrap().description, "only_etc");
    }

    #[test]
    fn file_rules_keep_category_precedence() {
        let rules = load_rule_set_from_str(
            r#"
version: "1.0"
extend_builtin: false
rules:
  - name: late_session
    category: session_hijacking
    pattern: "token"
  - name: early_sqli
    category: sql_injection
    pattern: "token"
"#,
        )
        .unwrap();
        let c = Catalog::from_rule_set(&rules).unwrap();
        assert_eq!(
            rule_for(&c, "token"),
            Some((AttackCategory::SqlInjection, "early_sqli".to_string()))
        );
    }

    #[test]
    fn invalid_pattern_names_the_rule() {
        let rules = load_rule_set_from_str(
            r#"
version: "1.0"
rules:
  - name: broken
    category: sql_injection
    pattern: "(unclosed"
"#,
        )
        .unwrap();
        let err = Catalog::from_rule_set(&rules).unwrap_err();
        assert!(matches!(&err, CatalogError::InvalidPattern { rule, .. } if rule == "broken"));
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn empty_catalog_is_an_error() {
        let rules = load_rule_set_from_str("version: \"1.0\"\nextend_builtin: false\n").unwrap();
        assert!(matches!(Catalog::from_rule_set(&rules), Err(CatalogError::Empty)));
    }
}
