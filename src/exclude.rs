//! String-exclusion grammar generator.
//!
//! Given a finite set of literal keys, emits a fragment matching any JSON
//! string *except* those exact literals. Used for `additionalProperties`
//! key rules so additional keys cannot collide with declared property
//! names. Only exact matches are excluded — both extensions of an
//! excluded literal and bare prefixes of one are fine, since the fragment
//! always covers a complete quoted string value.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::primitives::PRIMITIVE_RULES;
use crate::rules::RuleTable;

#[derive(Default)]
struct TrieNode {
    children: BTreeMap<char, TrieNode>,
    terminal: bool,
}

impl TrieNode {
    fn insert(&mut self, s: &str) {
        let mut node = self;
        for c in s.chars() {
            node = node.children.entry(c).or_default();
        }
        node.terminal = true;
    }
}

/// Build the exclusion fragment for `strings`, registering the `char`
/// primitive it leans on.
pub fn not_strings(table: &mut RuleTable, strings: &[&str]) -> Result<String> {
    let mut trie = TrieNode::default();
    for s in strings {
        trie.insert(s);
    }

    let char_rule = table.add_primitive("char", &PRIMITIVE_RULES["char"])?;
    let mut out = String::from("[\"] ( ");
    walk(&trie, &mut out, &char_rule);
    out.push_str(" )");
    if !trie.terminal {
        out.push('?');
    }
    out.push_str(" [\"] space");
    Ok(out)
}

/// Each trie edge becomes an alternative: the edge character followed by
/// either a nested alternation (inner node) or one-or-more further
/// characters (terminal leaf — any longer string is fine). The nested
/// group is optional unless the prefix reaching it is itself excluded,
/// so bare prefixes of excluded strings stay accepted. A trailing
/// branch accepts any character outside the recorded edges.
fn walk(node: &TrieNode, out: &mut String, char_rule: &str) {
    let mut rejects = String::new();
    let mut first = true;
    for (c, child) in &node.children {
        push_class_char(&mut rejects, *c);
        if !first {
            out.push_str(" | ");
        }
        first = false;
        out.push('[');
        push_class_char(out, *c);
        out.push(']');
        if !child.children.is_empty() {
            out.push_str(" (");
            walk(child, out, char_rule);
            out.push(')');
            if !child.terminal {
                out.push('?');
            }
        } else if child.terminal {
            out.push(' ');
            out.push_str(char_rule);
            out.push('+');
        }
    }
    if !node.children.is_empty() {
        if !first {
            out.push_str(" | ");
        }
        out.push_str("[^\"");
        out.push_str(&rejects);
        out.push_str("] ");
        out.push_str(char_rule);
        out.push('*');
    }
}

// Characters that would alter a `[...]` class get a backslash.
fn push_class_char(out: &mut String, c: char) {
    if matches!(c, ']' | '\\' | '^' | '-') {
        out.push('\\');
    }
    out.push(c);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbnf::Grammar;

    fn exclusion_grammar(strings: &[&str]) -> Grammar {
        let mut table = RuleTable::new();
        let body = not_strings(&mut table, strings).unwrap();
        table.add_rule("root", &body);
        Grammar::parse(&table.format_grammar()).unwrap()
    }

    #[test]
    fn registers_char_primitive() {
        let mut table = RuleTable::new();
        not_strings(&mut table, &["a"]).unwrap();
        assert!(table.contains("char"));
    }

    #[test]
    fn prefixes_of_excluded_strings_stay_accepted() {
        let grammar = exclusion_grammar(&["ab"]);
        assert!(grammar.accepts("\"a\""));
        assert!(!grammar.accepts("\"ab\""));
        assert!(grammar.accepts("\"abc\""));

        let grammar = exclusion_grammar(&["name", "age"]);
        assert!(grammar.accepts("\"nam\""));
        assert!(grammar.accepts("\"email\""));
        assert!(!grammar.accepts("\"name\""));
        assert!(!grammar.accepts("\"age\""));
    }

    #[test]
    fn excluded_prefix_of_an_excluded_string_stays_rejected() {
        let grammar = exclusion_grammar(&["a", "ab"]);
        assert!(!grammar.accepts("\"a\""));
        assert!(!grammar.accepts("\"ab\""));
        assert!(grammar.accepts("\"ac\""));
        assert!(grammar.accepts("\"abc\""));
    }

    #[test]
    fn metacharacters_in_excluded_keys_are_escaped() {
        let grammar = exclusion_grammar(&["a]b", "x^y", "p\\q"]);
        assert!(!grammar.accepts("\"a]b\""));
        assert!(!grammar.accepts("\"x^y\""));
        assert!(!grammar.accepts("\"p\\q\""));
        assert!(grammar.accepts("\"a]\""));
        assert!(grammar.accepts("\"other\""));
    }

    #[test]
    fn shared_prefix_nests() {
        let mut table = RuleTable::new();
        let out = not_strings(&mut table, &["ab", "ac"]).unwrap();
        assert!(out.starts_with("[\"] ( "));
        assert!(out.contains("[a] ("));
        // the whole body is optional: the empty string is not excluded
        assert!(out.ends_with(" )? [\"] space"));
    }

    #[test]
    fn excluding_empty_string_removes_optionality() {
        let mut table = RuleTable::new();
        let out = not_strings(&mut table, &[""]).unwrap();
        assert!(out.ends_with(" ) [\"] space"));
    }
}
