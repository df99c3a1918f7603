//! The rule table: owns every named production of a compilation.
//!
//! Names are escaped to a restricted charset, identical (name, body) pairs
//! dedupe to one entry, and conflicting bodies under one base name probe
//! numeric suffixes. Serialization is sorted by name so the emitted grammar
//! is deterministic and diff-stable regardless of visit order.

use std::collections::BTreeMap;

use crate::error::{GrammarError, Result};
use crate::primitives::{self, BuiltinRule, SPACE_RULE};

/// Rewrite a rule name to the allowed charset `[0-9A-Za-z-]`.
pub fn escape_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

/// Names a user-derived rule may not take verbatim: the grammar entry point,
/// the shared helpers, and every built-in rule.
pub fn is_reserved(name: &str) -> bool {
    matches!(name, "root" | "space" | "dot")
        || primitives::PRIMITIVE_RULES.contains_key(name)
        || primitives::STRING_FORMAT_RULES.contains_key(name)
}

#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: BTreeMap<String, String>,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleTable {
    /// A fresh table always carries the shared `space` rule.
    pub fn new() -> Self {
        let mut rules = BTreeMap::new();
        rules.insert("space".to_string(), SPACE_RULE.to_string());
        Self { rules }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.rules.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Register `body` under (the escaped form of) `name` and return the
    /// name actually used.
    ///
    /// Registering the same body under the same base name twice is a no-op
    /// returning the existing name; a different body probes `name0, name1, …`
    /// until a free slot or a slot holding the identical body is found.
    pub fn add_rule(&mut self, name: &str, body: &str) -> String {
        let esc_name = escape_name(name);
        match self.rules.get(&esc_name) {
            None => {
                self.rules.insert(esc_name.clone(), body.to_string());
                esc_name
            }
            Some(existing) if existing == body => esc_name,
            Some(_) => {
                let mut i = 0usize;
                loop {
                    let key = format!("{esc_name}{i}");
                    match self.rules.get(&key) {
                        None => {
                            self.rules.insert(key.clone(), body.to_string());
                            return key;
                        }
                        Some(existing) if existing == body => return key,
                        Some(_) => i += 1,
                    }
                }
            }
        }
    }

    /// Register a built-in rule and, recursively, every dependency it names.
    ///
    /// # Errors
    ///
    /// `GrammarError::Catalog` if a dependency is missing from the static
    /// catalogs — a catalog defect, not bad input.
    pub fn add_primitive(&mut self, name: &str, rule: &BuiltinRule) -> Result<String> {
        let n = self.add_rule(name, rule.body);
        for dep in rule.deps {
            let dep_rule =
                primitives::lookup(dep).ok_or_else(|| GrammarError::Catalog(dep.to_string()))?;
            if !self.rules.contains_key(*dep) {
                self.add_primitive(dep, dep_rule)?;
            }
        }
        Ok(n)
    }

    /// Serialize all rules as `name ::= body` lines, sorted by name.
    pub fn format_grammar(&self) -> String {
        let mut out = String::new();
        for (name, body) in &self.rules {
            out.push_str(name);
            out.push_str(" ::= ");
            out.push_str(body);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::PRIMITIVE_RULES;

    #[test]
    fn space_rule_is_always_present() {
        let table = RuleTable::new();
        assert_eq!(table.get("space"), Some(SPACE_RULE));
    }

    #[test]
    fn identical_body_dedupes() {
        let mut table = RuleTable::new();
        let a = table.add_rule("item", "\"x\"");
        let b = table.add_rule("item", "\"x\"");
        assert_eq!(a, "item");
        assert_eq!(a, b);
        assert_eq!(table.len(), 2); // space + item
    }

    #[test]
    fn conflicting_body_probes_numeric_suffix() {
        let mut table = RuleTable::new();
        assert_eq!(table.add_rule("item", "\"x\""), "item");
        assert_eq!(table.add_rule("item", "\"y\""), "item0");
        assert_eq!(table.add_rule("item", "\"z\""), "item1");
        // an already-probed body dedupes to its suffixed slot
        assert_eq!(table.add_rule("item", "\"y\""), "item0");
    }

    #[test]
    fn names_are_escaped() {
        let mut table = RuleTable::new();
        assert_eq!(table.add_rule("foo.bar/baz", "\"x\""), "foo-bar-baz");
    }

    #[test]
    fn reserved_names() {
        assert!(is_reserved("root"));
        assert!(is_reserved("space"));
        assert!(is_reserved("integer"));
        assert!(is_reserved("date-string"));
        assert!(!is_reserved("status"));
    }

    #[test]
    fn add_primitive_materializes_transitive_closure() {
        let mut table = RuleTable::new();
        let name = table
            .add_primitive("object", &PRIMITIVE_RULES["object"])
            .unwrap();
        assert_eq!(name, "object");
        // object -> string -> char, object -> value -> everything
        for dep in ["string", "char", "value", "array", "number", "boolean", "null"] {
            assert!(table.contains(dep), "missing {dep}");
        }
    }

    #[test]
    fn format_is_sorted_by_name() {
        let mut table = RuleTable::new();
        table.add_rule("zeta", "\"z\"");
        table.add_rule("alpha", "\"a\"");
        let text = table.format_grammar();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "alpha ::= \"a\"");
        assert_eq!(lines[1], "space ::= \" \"?");
        assert_eq!(lines[2], "zeta ::= \"z\"");
    }
}
