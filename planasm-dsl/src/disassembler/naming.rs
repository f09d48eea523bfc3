//! Identifier synthesis
//!
//! Disassembly invents every identifier in its output, since the plan
//! document has no names of its own. Candidates are derived from URIs and
//! extension names, squeezed into identifier shape, then uniquified
//! against everything already handed out in the run.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

static IDENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new("^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap());
static UNSAFE_CHAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new("[^a-zA-Z0-9_]").unwrap());
static MULTI_UNDERSCORE_RE: Lazy<Regex> = Lazy::new(|| Regex::new("_+").unwrap());

/// Whether `name` is a well-formed identifier (keywords included).
pub fn is_identifier(name: &str) -> bool {
    IDENT_RE.is_match(name)
}

/// Squeeze the joined components into identifier shape.
///
/// Unsafe characters become underscores, runs of underscores collapse to
/// one, a single trailing underscore is dropped, and a leading underscore
/// is added when the result would be empty or start with a digit.
pub fn make_ident(components: &[&str]) -> String {
    let name = components.join("_");
    let name = UNSAFE_CHAR_RE.replace_all(&name, "_");
    let mut name = MULTI_UNDERSCORE_RE.replace_all(&name, "_").into_owned();
    if name.ends_with('_') {
        name.pop();
    }
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// The basename of a URI: everything after the last `/`, cut at the
/// first `.`.
pub fn uri_basename(uri: &str) -> &str {
    let base = match uri.rsplit_once('/') {
        Some((_, tail)) => tail,
        None => uri,
    };
    match base.split_once('.') {
        Some((head, _)) => head,
        None => base,
    }
}

/// Substitutions applied to extension names before identifier synthesis,
/// so that operator names like `+` yield readable identifiers instead of
/// a bare underscore.
#[derive(Debug, Clone)]
pub struct NamingRules {
    aliases: HashMap<String, String>,
}

impl Default for NamingRules {
    fn default() -> Self {
        let mut aliases = HashMap::new();
        for (from, to) in [("+", "add"), ("-", "sub"), ("*", "mult"), ("/", "div")] {
            aliases.insert(from.to_string(), to.to_string());
        }
        Self { aliases }
    }
}

impl NamingRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// The alias registered for `name`, or `name` itself.
    pub fn alias<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn set_alias(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.aliases.insert(from.into(), to.into());
    }
}

/// Identifiers already handed out in one disassembly run.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    used: HashSet<String>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `name`, or `name_2`, `name_3` and so on until an unused
    /// identifier is found. The candidate must already be identifier-shaped.
    pub fn uniquify(&mut self, name: &str) -> String {
        debug_assert!(
            is_identifier(name),
            "uniquify requires an identifier, got {:?}",
            name
        );
        if self.used.insert(name.to_string()) {
            return name.to_string();
        }
        let mut i = 2;
        loop {
            let candidate = format!("{}_{}", name, i);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            i += 1;
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
