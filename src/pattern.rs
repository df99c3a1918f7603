//! Regex-to-grammar translation for `pattern` string schemas.
//!
//! Handles the anchored subset of regular expressions whose syntax maps
//! directly onto grammar notation: character classes pass through verbatim,
//! `|` and `( … )` groups keep their meaning, quantifiers apply to the
//! preceding unit, and `{m,n}` bodies are hoisted into named sub-rules so
//! the repetition builder can reference them. Lookaround and other `(?…)`
//! constructs are rejected.

use std::collections::BTreeMap;

use crate::error::{GrammarError, Result};
use crate::repeat::build_repetition;
use crate::rules::RuleTable;
use crate::visitor::Compiler;

/// `.` outside dotall mode: any character except a line break.
const DOT: &str = "[^\\x0A\\x0D]";
/// `.` under dotall: any code point.
const DOTALL: &str = "[\\U00000000-\\U0010FFFF]";

/// Characters with structural meaning in a regex; a run of literals stops
/// before one of these so quantifiers bind to a single character.
const NON_LITERAL: &str = "|.()[]{}*+?";
/// Characters that need a regex escape but none in a grammar literal.
const ESCAPED_IN_REGEX_ONLY: &str = "^$.[]()|{}*+?";

/// A parsed unit: its rendering plus whether it is a bare literal (literals
/// coalesce and get quoted late, so quantifiers can still split them).
type Piece = (String, bool);

fn to_rule(piece: &Piece) -> String {
    let (text, is_literal) = piece;
    if *is_literal {
        format!("\"{text}\"")
    } else {
        text.clone()
    }
}

/// Merge adjacent literal runs, then render the sequence.
fn join_seq(seq: Vec<Piece>) -> Piece {
    let mut merged: Vec<Piece> = Vec::new();
    for piece in seq {
        match merged.last_mut() {
            Some(last) if last.1 && piece.1 => last.0.push_str(&piece.0),
            _ => merged.push(piece),
        }
    }
    if merged.len() == 1 {
        return merged.pop().unwrap_or_default();
    }
    let text = merged.iter().map(to_rule).collect::<Vec<_>>().join(" ");
    (text, false)
}

struct PatternCompiler<'a> {
    rules: &'a mut RuleTable,
    dotall: bool,
    chars: Vec<char>,
    pos: usize,
    name: String,
    pattern: String,
    /// Hoisted `{m,n}` bodies, deduped by body text.
    sub_rule_ids: BTreeMap<String, String>,
}

impl Compiler {
    /// Translate an anchored `pattern` into a rule wrapping the translated
    /// body in quotes (the grammar matches the JSON string encoding).
    pub(crate) fn visit_pattern(&mut self, pattern: &str, name: &str) -> Result<String> {
        let Some(inner) = pattern.strip_prefix('^').and_then(|p| p.strip_suffix('$')) else {
            return Err(GrammarError::UnanchoredPattern(pattern.to_string()));
        };
        let mut pc = PatternCompiler {
            rules: &mut self.rules,
            dotall: self.options.dotall,
            chars: inner.chars().collect(),
            pos: 0,
            name: name.to_string(),
            pattern: inner.to_string(),
            sub_rule_ids: BTreeMap::new(),
        };
        let body = pc.transform(false)?;
        let rule = format!("\"\\\"\" {} \"\\\"\" space", to_rule(&body));
        Ok(self.rules.add_rule(name, &rule))
    }
}

impl PatternCompiler<'_> {
    fn unsupported(&self, index: usize) -> GrammarError {
        GrammarError::UnsupportedPattern {
            index,
            pattern: self.pattern.clone(),
        }
    }

    fn unbalanced(&self, delimiter: char, index: usize) -> GrammarError {
        GrammarError::UnbalancedPattern {
            delimiter,
            index,
            pattern: self.pattern.clone(),
        }
    }

    /// Parse units until the end of the pattern or, inside a group, the
    /// closing parenthesis.
    fn transform(&mut self, in_group: bool) -> Result<Piece> {
        let group_start = self.pos;
        let length = self.chars.len();
        let mut seq: Vec<Piece> = Vec::new();

        while self.pos < length {
            let c = self.chars[self.pos];
            match c {
                '.' => {
                    let body = if self.dotall { DOTALL } else { DOT };
                    let dot = self.rules.add_rule("dot", body);
                    seq.push((dot, false));
                    self.pos += 1;
                }
                '(' => {
                    self.pos += 1;
                    if self.chars.get(self.pos) == Some(&'?') {
                        return Err(self.unsupported(self.pos));
                    }
                    let inner = self.transform(true)?;
                    seq.push((format!("({})", to_rule(&inner)), false));
                }
                ')' => {
                    self.pos += 1;
                    if !in_group {
                        return Err(self.unbalanced(')', self.pos - 1));
                    }
                    return Ok(join_seq(seq));
                }
                '[' => {
                    let start = self.pos;
                    let mut class = String::from('[');
                    self.pos += 1;
                    while self.pos < length && self.chars[self.pos] != ']' {
                        if self.chars[self.pos] == '\\' && self.pos + 1 < length {
                            class.push('\\');
                            class.push(self.chars[self.pos + 1]);
                            self.pos += 2;
                        } else {
                            class.push(self.chars[self.pos]);
                            self.pos += 1;
                        }
                    }
                    if self.pos >= length {
                        return Err(self.unbalanced('[', start));
                    }
                    class.push(']');
                    self.pos += 1;
                    seq.push((class, false));
                }
                '|' => {
                    seq.push(("|".to_string(), false));
                    self.pos += 1;
                }
                '*' | '+' | '?' => {
                    let last = seq.last_mut().ok_or_else(|| self.unsupported(self.pos))?;
                    *last = (format!("{}{c}", to_rule(last)), false);
                    self.pos += 1;
                }
                '{' => {
                    let start = self.pos;
                    let mut content = String::new();
                    self.pos += 1;
                    while self.pos < length && self.chars[self.pos] != '}' {
                        content.push(self.chars[self.pos]);
                        self.pos += 1;
                    }
                    if self.pos >= length {
                        return Err(self.unbalanced('{', start));
                    }
                    self.pos += 1;
                    let (min_times, max_times) = self.parse_quantifier(&content, start)?;

                    let (sub, sub_is_literal) = seq.pop().ok_or_else(|| self.unsupported(start))?;
                    let item = if sub_is_literal {
                        format!("\"{sub}\"")
                    } else if let Some(id) = self.sub_rule_ids.get(&sub) {
                        id.clone()
                    } else {
                        let id = self
                            .rules
                            .add_rule(&format!("{}-{}", self.name, self.sub_rule_ids.len() + 1), &sub);
                        self.sub_rule_ids.insert(sub, id.clone());
                        id
                    };
                    seq.push((build_repetition(&item, min_times, max_times, None), false));
                }
                _ => {
                    let literal = self.take_literal();
                    if literal.is_empty() {
                        // stray structural character, e.g. an unmatched `}`
                        return Err(self.unsupported(self.pos));
                    }
                    seq.push((literal, true));
                }
            }
        }

        if in_group {
            return Err(self.unbalanced('(', group_start.saturating_sub(1)));
        }
        Ok(join_seq(seq))
    }

    fn parse_quantifier(&self, content: &str, at: usize) -> Result<(u64, Option<u64>)> {
        let nums: Vec<&str> = content.split(',').map(str::trim).collect();
        match nums.as_slice() {
            [one] => {
                let n = one.parse::<u64>().map_err(|_| self.unsupported(at))?;
                Ok((n, Some(n)))
            }
            [lo, hi] => {
                let min = if lo.is_empty() {
                    0
                } else {
                    lo.parse::<u64>().map_err(|_| self.unsupported(at))?
                };
                let max = if hi.is_empty() {
                    None
                } else {
                    Some(hi.parse::<u64>().map_err(|_| self.unsupported(at))?)
                };
                Ok((min, max))
            }
            _ => Err(self.unsupported(at)),
        }
    }

    /// Accumulate a run of literal characters. A run stops before a
    /// structural character so a following quantifier binds to the last
    /// character alone; regex escapes of structural characters fold to the
    /// bare character, other escapes pass through.
    fn take_literal(&mut self) -> String {
        let length = self.chars.len();
        let mut literal = String::new();
        while self.pos < length {
            let ch = self.chars[self.pos];
            if ch == '\\' && self.pos + 1 < length {
                let next = self.chars[self.pos + 1];
                if ESCAPED_IN_REGEX_ONLY.contains(next) {
                    literal.push(next);
                } else {
                    literal.push('\\');
                    literal.push(next);
                }
                self.pos += 2;
            } else if ch == '"' {
                literal.push_str("\\\"");
                self.pos += 1;
            } else if !NON_LITERAL.contains(ch)
                && (self.pos == length - 1
                    || literal.is_empty()
                    || self.chars[self.pos + 1] == '.'
                    || !NON_LITERAL.contains(self.chars[self.pos + 1]))
            {
                literal.push(ch);
                self.pos += 1;
            } else {
                break;
            }
        }
        literal
    }
}
