//! Built-in attack signature library.
//!
//! Contains the static table of regex signatures used to detect common web
//! attacks in request values.  Each entry carries a snake_case name, the
//! [`AttackCategory`] it reports, a regex string and a short description.
//! Matching is always case-insensitive; the flag is applied when the
//! [`Catalog`](crate::catalog::Catalog) compiles the table, so the pattern
//! strings themselves carry no inline flags.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Class of web attack a signature detects.
///
/// The declaration order is the precedence order: when a value matches
/// signatures from several categories, the earliest category is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackCategory {
    /// SQL meta-characters and statement keywords.
    SqlInjection,
    /// Script tags, `javascript:` URLs and inline event handlers.
    CrossSiteScripting,
    /// Directory traversal, well-known system files and stream wrappers.
    FileInclusion,
    /// Session identifiers smuggled inside parameter values.
    SessionHijacking,
}

impl AttackCategory {
    /// Every category, in precedence order.
    pub const ALL: [AttackCategory; 4] = [
        Self::SqlInjection,
        Self::CrossSiteScripting,
        Self::FileInclusion,
        Self::SessionHijacking,
    ];

    /// Noun used in the rejection message shown to clients.
    pub fn description(&self) -> &'static str {
        match self {
            Self::SqlInjection => "SQL Injection",
            Self::CrossSiteScripting => "XSS",
            Self::FileInclusion => "File Inclusion",
            Self::SessionHijacking => "Session Hijacking",
        }
    }
}

impl fmt::Display for AttackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SqlInjection => write!(f, "SQLInjection"),
            Self::CrossSiteScripting => write!(f, "CrossSiteScripting"),
            Self::FileInclusion => write!(f, "FileInclusion"),
            Self::SessionHijacking => write!(f, "SessionHijacking"),
        }
    }
}

// ---------------------------------------------------------------------------
// Signature definition
// ---------------------------------------------------------------------------

/// A single built-in detection signature.
pub struct SignaturePattern {
    /// Short, snake_case identifier used in logs and rejections.
    pub name: &'static str,
    /// The attack class this signature reports.
    pub category: AttackCategory,
    /// A regex string, compiled case-insensitively by the catalog.
    pub pattern: &'static str,
    /// One-line human-readable summary.
    pub description: &'static str,
}

// ---------------------------------------------------------------------------
// Signature table
// ---------------------------------------------------------------------------

/// The built-in signature library, grouped by category in precedence order.
///
/// Values are matched as handed over by the host: percent-encoded variants
/// such as `%27` are literal alternatives here, never decoded first.
///
/// Whitespace classes are written `[\s\x1c-\x1f]`: the regex crate's `\s`
/// leaves out the ASCII file, group, record and unit separators.
pub static SIGNATURES: &[SignaturePattern] = &[
    // ---- SQL injection -------------------------------------------------
    SignaturePattern {
        name: "sql_meta_chars",
        category: AttackCategory::SqlInjection,
        pattern: r"%27|'|--|%23|#",
        description: "SQL meta-characters",
    },
    SignaturePattern {
        name: "assignment_then_meta",
        category: AttackCategory::SqlInjection,
        pattern: r"(%3D|=)[^\n]*(%27|'|--|%3B|;)",
        description: "assignment followed by SQL meta-characters",
    },
    SignaturePattern {
        name: "quote_or",
        category: AttackCategory::SqlInjection,
        pattern: r"\w*(%27|')[\s\x1c-\x1f]*(%6F|o|%4F)(%72|r|%52)",
        description: "quote followed by OR",
    },
    SignaturePattern {
        name: "union_select",
        category: AttackCategory::SqlInjection,
        pattern: r"union[\s\x1c-\x1f]+select",
        description: "UNION SELECT",
    },
    SignaturePattern {
        name: "select_from",
        category: AttackCategory::SqlInjection,
        pattern: r"select.+from",
        description: "SELECT ... FROM",
    },
    SignaturePattern {
        name: "insert_into",
        category: AttackCategory::SqlInjection,
        pattern: r"insert[\s\x1c-\x1f]+into",
        description: "INSERT INTO",
    },
    SignaturePattern {
        name: "drop_table",
        category: AttackCategory::SqlInjection,
        pattern: r"drop[\s\x1c-\x1f]+table",
        description: "DROP TABLE",
    },
    // ---- Cross-site scripting ------------------------------------------
    SignaturePattern {
        name: "script_tag",
        category: AttackCategory::CrossSiteScripting,
        pattern: r"<script.*?>.*?</script.*?>",
        description: "script tags",
    },
    SignaturePattern {
        name: "javascript_protocol",
        category: AttackCategory::CrossSiteScripting,
        pattern: r"javascript:",
        description: "javascript: pseudo-protocol",
    },
    SignaturePattern {
        name: "event_handler",
        category: AttackCategory::CrossSiteScripting,
        pattern: r"on\w+[\s\x1c-\x1f]*=",
        description: "on* event handlers",
    },
    SignaturePattern {
        name: "tag_with_event_handler",
        category: AttackCategory::CrossSiteScripting,
        pattern: r"<.*?on\w+[\s\x1c-\x1f]*=.*?>",
        description: "HTML tags with event handlers",
    },
    // ---- File inclusion ------------------------------------------------
    SignaturePattern {
        name: "directory_traversal",
        category: AttackCategory::FileInclusion,
        pattern: r"\.\./",
        description: "directory traversal",
    },
    SignaturePattern {
        name: "etc_passwd",
        category: AttackCategory::FileInclusion,
        pattern: r"/etc/passwd",
        description: "Linux passwd file",
    },
    SignaturePattern {
        name: "boot_ini",
        category: AttackCategory::FileInclusion,
        // The dot is deliberately unescaped and matches any character.
        pattern: r"boot.ini",
        description: "Windows boot file",
    },
    SignaturePattern {
        name: "stream_wrapper",
        category: AttackCategory::FileInclusion,
        pattern: r"(file|php):",
        description: "file:// or php:// stream wrappers",
    },
    // ---- Session hijacking ---------------------------------------------
    SignaturePattern {
        name: "phpsessid",
        category: AttackCategory::SessionHijacking,
        pattern: r"PHPSESSID=",
        description: "PHP session ID",
    },
    SignaturePattern {
        name: "jsessionid",
        category: AttackCategory::SessionHijacking,
        pattern: r"JSESSIONID=",
        description: "Java session ID",
    },
    SignaturePattern {
        name: "aspsessionid",
        category: AttackCategory::SessionHijacking,
        pattern: r"ASPSESSIONID",
        description: "ASP session ID",
    },
];
