//! Grammar parsing and string acceptance.
//!
//! A line-oriented parser for the emitted dialect (`name ::= body` with
//! literals, character classes, groups, alternation and quantifiers) plus a
//! breadth-first matcher that decides whether a candidate string is in a
//! rule's language. The matcher propagates sets of reachable positions, so
//! ambiguous alternations and nested repetitions need no backtracking.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GbnfError {
    #[error("grammar line {line}: {msg}")]
    Parse { line: usize, msg: String },
    #[error("reference to undefined rule `{0}`")]
    UnknownRule(String),
    #[error("grammar has no `root` rule")]
    MissingRoot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(String),
    CharClass {
        negated: bool,
        ranges: Vec<(char, char)>,
    },
    RuleRef(String),
    Seq(Vec<Node>),
    Alt(Vec<Node>),
    Repeat {
        node: Box<Node>,
        min: u64,
        max: Option<u64>,
    },
}

#[derive(Debug, Clone)]
pub struct Grammar {
    rules: BTreeMap<String, Node>,
}

impl Grammar {
    /// Parse grammar text. Every referenced rule must be defined and a
    /// `root` rule must exist.
    pub fn parse(text: &str) -> Result<Self, GbnfError> {
        let mut rules = BTreeMap::new();
        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((name, body)) = trimmed.split_once("::=") else {
                return Err(GbnfError::Parse {
                    line: line_no,
                    msg: "missing `::=`".to_string(),
                });
            };
            let node = BodyParser::new(body, line_no).parse()?;
            rules.insert(name.trim().to_string(), node);
        }
        if !rules.contains_key("root") {
            return Err(GbnfError::MissingRoot);
        }
        let grammar = Self { rules };
        grammar.check_refs()?;
        Ok(grammar)
    }

    fn check_refs(&self) -> Result<(), GbnfError> {
        for node in self.rules.values() {
            self.check_node_refs(node)?;
        }
        Ok(())
    }

    fn check_node_refs(&self, node: &Node) -> Result<(), GbnfError> {
        match node {
            Node::RuleRef(name) => {
                if !self.rules.contains_key(name) {
                    return Err(GbnfError::UnknownRule(name.clone()));
                }
            }
            Node::Seq(items) | Node::Alt(items) => {
                for item in items {
                    self.check_node_refs(item)?;
                }
            }
            Node::Repeat { node, .. } => self.check_node_refs(node)?,
            Node::Literal(_) | Node::CharClass { .. } => {}
        }
        Ok(())
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Whether `input` is in the language of the `root` rule.
    pub fn accepts(&self, input: &str) -> bool {
        self.rule_accepts("root", input)
    }

    /// Whether `input` is in the language of the named rule.
    pub fn rule_accepts(&self, rule: &str, input: &str) -> bool {
        let Some(node) = self.rules.get(rule) else {
            return false;
        };
        let chars: Vec<char> = input.chars().collect();
        let starts = BTreeSet::from([0]);
        self.ends(node, &chars, &starts).contains(&chars.len())
    }

    /// All positions reachable by matching `node` starting from each
    /// position in `starts`.
    fn ends(&self, node: &Node, input: &[char], starts: &BTreeSet<usize>) -> BTreeSet<usize> {
        match node {
            Node::Literal(text) => {
                let lit: Vec<char> = text.chars().collect();
                starts
                    .iter()
                    .filter(|&&s| input[s..].starts_with(&lit[..]))
                    .map(|&s| s + lit.len())
                    .collect()
            }
            Node::CharClass { negated, ranges } => starts
                .iter()
                .filter_map(|&s| {
                    let c = *input.get(s)?;
                    let inside = ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi);
                    (inside != *negated).then_some(s + 1)
                })
                .collect(),
            Node::RuleRef(name) => match self.rules.get(name) {
                Some(target) => self.ends(target, input, starts),
                None => BTreeSet::new(),
            },
            Node::Seq(items) => {
                let mut positions = starts.clone();
                for item in items {
                    if positions.is_empty() {
                        break;
                    }
                    positions = self.ends(item, input, &positions);
                }
                positions
            }
            Node::Alt(alts) => alts
                .iter()
                .flat_map(|alt| self.ends(alt, input, starts))
                .collect(),
            Node::Repeat { node, min, max } => {
                // a repetition can never need more iterations than there
                // are characters left, plus one zero-width pass
                let limit = max.unwrap_or(input.len() as u64 + 1).max(*min);
                let mut current = starts.clone();
                let mut result = BTreeSet::new();
                if *min == 0 {
                    result.extend(current.iter().copied());
                }
                let mut count: u64 = 0;
                while count < limit {
                    let next = self.ends(node, input, &current);
                    count += 1;
                    if count >= *min {
                        result.extend(next.iter().copied());
                    }
                    // a fixpoint means further iterations change nothing
                    if next.is_empty() || next == current {
                        if next == current && count < *min {
                            result.extend(next.iter().copied());
                        }
                        break;
                    }
                    current = next;
                }
                result
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// BODY PARSER
// ————————————————————————————————————————————————————————————————————————————

struct BodyParser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl BodyParser {
    fn new(body: &str, line: usize) -> Self {
        Self {
            chars: body.chars().collect(),
            pos: 0,
            line,
        }
    }

    fn error(&self, msg: impl Into<String>) -> GbnfError {
        GbnfError::Parse {
            line: self.line,
            msg: msg.into(),
        }
    }

    fn parse(mut self) -> Result<Node, GbnfError> {
        let node = self.parse_alternation()?;
        self.skip_ws();
        if self.pos < self.chars.len() {
            return Err(self.error(format!(
                "unexpected `{}` at column {}",
                self.chars[self.pos], self.pos
            )));
        }
        Ok(node)
    }

    fn skip_ws(&mut self) {
        while self.chars.get(self.pos).is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn parse_alternation(&mut self) -> Result<Node, GbnfError> {
        let mut alts = vec![self.parse_sequence()?];
        loop {
            self.skip_ws();
            if self.peek() == Some('|') {
                self.pos += 1;
                alts.push(self.parse_sequence()?);
            } else {
                break;
            }
        }
        if alts.len() == 1 {
            Ok(alts.pop().unwrap_or(Node::Seq(Vec::new())))
        } else {
            Ok(Node::Alt(alts))
        }
    }

    fn parse_sequence(&mut self) -> Result<Node, GbnfError> {
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None | Some('|') | Some(')') => break,
                _ => items.push(self.parse_item()?),
            }
        }
        if items.len() == 1 {
            Ok(items.pop().unwrap_or(Node::Seq(Vec::new())))
        } else {
            Ok(Node::Seq(items))
        }
    }

    fn parse_item(&mut self) -> Result<Node, GbnfError> {
        let base = self.parse_base()?;
        match self.peek() {
            Some('?') => {
                self.pos += 1;
                Ok(Node::Repeat {
                    node: Box::new(base),
                    min: 0,
                    max: Some(1),
                })
            }
            Some('*') => {
                self.pos += 1;
                Ok(Node::Repeat {
                    node: Box::new(base),
                    min: 0,
                    max: None,
                })
            }
            Some('+') => {
                self.pos += 1;
                Ok(Node::Repeat {
                    node: Box::new(base),
                    min: 1,
                    max: None,
                })
            }
            Some('{') => {
                self.pos += 1;
                let (min, max) = self.parse_bounds()?;
                Ok(Node::Repeat {
                    node: Box::new(base),
                    min,
                    max,
                })
            }
            _ => Ok(base),
        }
    }

    fn parse_bounds(&mut self) -> Result<(u64, Option<u64>), GbnfError> {
        let mut content = String::new();
        while let Some(c) = self.peek() {
            if c == '}' {
                break;
            }
            content.push(c);
            self.pos += 1;
        }
        if self.peek() != Some('}') {
            return Err(self.error("unterminated `{`"));
        }
        self.pos += 1;
        let parse_num = |s: &str| {
            s.parse::<u64>()
                .map_err(|_| self.error(format!("bad repetition bound `{s}`")))
        };
        match content.split_once(',') {
            None => {
                let n = parse_num(&content)?;
                Ok((n, Some(n)))
            }
            Some((lo, "")) => Ok((parse_num(lo)?, None)),
            Some((lo, hi)) => Ok((parse_num(lo)?, Some(parse_num(hi)?))),
        }
    }

    fn parse_base(&mut self) -> Result<Node, GbnfError> {
        match self.peek() {
            Some('"') => self.parse_literal(),
            Some('[') => self.parse_class(),
            Some('(') => {
                self.pos += 1;
                let inner = self.parse_alternation()?;
                self.skip_ws();
                if self.peek() != Some(')') {
                    return Err(self.error("unterminated `(`"));
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(c) if c.is_ascii_alphanumeric() || c == '-' => {
                let mut name = String::new();
                while let Some(c) = self.peek() {
                    if c.is_ascii_alphanumeric() || c == '-' {
                        name.push(c);
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
                Ok(Node::RuleRef(name))
            }
            Some(c) => Err(self.error(format!("unexpected `{c}`"))),
            None => Err(self.error("unexpected end of body")),
        }
    }

    fn parse_literal(&mut self) -> Result<Node, GbnfError> {
        self.pos += 1; // opening quote
        let mut text = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated literal")),
                Some('"') => {
                    self.pos += 1;
                    return Ok(Node::Literal(text));
                }
                Some('\\') => {
                    self.pos += 1;
                    text.push(self.parse_escape()?);
                }
                Some(c) => {
                    text.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn parse_class(&mut self) -> Result<Node, GbnfError> {
        self.pos += 1; // opening bracket
        let negated = self.peek() == Some('^');
        if negated {
            self.pos += 1;
        }
        let mut ranges = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated character class")),
                Some(']') => {
                    self.pos += 1;
                    return Ok(Node::CharClass { negated, ranges });
                }
                Some(_) => {
                    let lo = self.parse_class_char()?;
                    // `-` is a range only when another member follows
                    if self.peek() == Some('-') && self.chars.get(self.pos + 1) != Some(&']') {
                        self.pos += 1;
                        let hi = self.parse_class_char()?;
                        ranges.push((lo, hi));
                    } else {
                        ranges.push((lo, lo));
                    }
                }
            }
        }
    }

    fn parse_class_char(&mut self) -> Result<char, GbnfError> {
        match self.peek() {
            None => Err(self.error("unterminated character class")),
            Some('\\') => {
                self.pos += 1;
                self.parse_escape()
            }
            Some(c) => {
                self.pos += 1;
                Ok(c)
            }
        }
    }

    /// Decode the character after a backslash.
    fn parse_escape(&mut self) -> Result<char, GbnfError> {
        let Some(c) = self.peek() else {
            return Err(self.error("dangling escape"));
        };
        self.pos += 1;
        match c {
            'n' => Ok('\n'),
            'r' => Ok('\r'),
            't' => Ok('\t'),
            'x' => self.parse_hex(2),
            'u' => self.parse_hex(4),
            'U' => self.parse_hex(8),
            other => Ok(other),
        }
    }

    fn parse_hex(&mut self, digits: usize) -> Result<char, GbnfError> {
        let mut value: u32 = 0;
        for _ in 0..digits {
            let Some(d) = self.peek().and_then(|c| c.to_digit(16)) else {
                return Err(self.error("bad hex escape"));
            };
            value = value * 16 + d;
            self.pos += 1;
        }
        char::from_u32(value).ok_or_else(|| self.error("escape is not a valid code point"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_matches_literals() {
        let g = Grammar::parse("root ::= \"true\" | \"false\"\n").unwrap();
        assert!(g.accepts("true"));
        assert!(g.accepts("false"));
        assert!(!g.accepts("maybe"));
        assert!(!g.accepts("truefalse"));
    }

    #[test]
    fn quantifiers_and_classes() {
        let g = Grammar::parse("root ::= [a-c]+ [0-9]{2,3}\n").unwrap();
        assert!(g.accepts("a12"));
        assert!(g.accepts("abc123"));
        assert!(!g.accepts("a1"));
        assert!(!g.accepts("a1234"));
        assert!(!g.accepts("12"));
    }

    #[test]
    fn negated_class_and_escapes() {
        let g = Grammar::parse("root ::= [^\\x0A\\x0D]+\n").unwrap();
        assert!(g.accepts("any text"));
        assert!(!g.accepts("two\nlines"));
    }

    #[test]
    fn rule_references_resolve() {
        let text = "root ::= item (\",\" item)*\nitem ::= [0-9]+\n";
        let g = Grammar::parse(text).unwrap();
        assert!(g.accepts("1"));
        assert!(g.accepts("1,22,333"));
        assert!(!g.accepts("1,"));
    }

    #[test]
    fn optional_space_rule() {
        let g = Grammar::parse("root ::= \"a\" space \"b\" space\nspace ::= \" \"?\n").unwrap();
        assert!(g.accepts("ab"));
        assert!(g.accepts("a b "));
        assert!(!g.accepts("a  b"));
    }

    #[test]
    fn nested_zero_width_repetition_terminates() {
        let g = Grammar::parse("root ::= (\"x\"?)* \"end\"\n").unwrap();
        assert!(g.accepts("end"));
        assert!(g.accepts("xxend"));
    }

    #[test]
    fn undefined_reference_is_rejected() {
        assert!(matches!(
            Grammar::parse("root ::= missing\n"),
            Err(GbnfError::UnknownRule(_))
        ));
    }

    #[test]
    fn missing_root_is_rejected() {
        assert!(matches!(
            Grammar::parse("other ::= \"x\"\n"),
            Err(GbnfError::MissingRoot)
        ));
    }

    #[test]
    fn bad_line_reports_line_number() {
        match Grammar::parse("root ::= \"ok\"\nbroken line\n") {
            Err(GbnfError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
