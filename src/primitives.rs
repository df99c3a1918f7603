//! Static catalog of built-in grammar fragments.
//!
//! Covers the raw JSON value kinds plus the whitelisted string formats
//! (date/time/date-time/uuid). Each entry carries the names of the rules its
//! body references, so registering one primitive pulls in its transitive
//! closure (see `RuleTable::add_primitive`).

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Optional-whitespace filler emitted after every JSON token.
pub const SPACE_RULE: &str = "\" \"?";

/// An immutable built-in rule: a grammar body plus its rule dependencies.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinRule {
    pub body: &'static str,
    pub deps: &'static [&'static str],
}

const fn rule(body: &'static str, deps: &'static [&'static str]) -> BuiltinRule {
    BuiltinRule { body, deps }
}

pub static PRIMITIVE_RULES: Lazy<BTreeMap<&'static str, BuiltinRule>> = Lazy::new(|| {
    BTreeMap::from([
        ("boolean", rule(r#"("true" | "false") space"#, &[])),
        ("decimal-part", rule("[0-9]{1,16}", &[])),
        ("integral-part", rule("[0] | [1-9] [0-9]{0,15}", &[])),
        (
            "number",
            rule(
                r#"("-"? integral-part) ("." decimal-part)? ([eE] [-+]? integral-part)? space"#,
                &["integral-part", "decimal-part"],
            ),
        ),
        (
            "integer",
            rule(r#"("-"? integral-part) space"#, &["integral-part"]),
        ),
        (
            "value",
            rule(
                "object | array | string | number | boolean | null",
                &["object", "array", "string", "number", "boolean", "null"],
            ),
        ),
        (
            "object",
            rule(
                r#""{" space ( string ":" space value ("," space string ":" space value)* )? "}" space"#,
                &["string", "value"],
            ),
        ),
        (
            "array",
            rule(
                r#""[" space ( value ("," space value)* )? "]" space"#,
                &["value"],
            ),
        ),
        (
            "uuid",
            rule(
                r#""\"" [0-9a-fA-F]{8} "-" [0-9a-fA-F]{4} "-" [0-9a-fA-F]{4} "-" [0-9a-fA-F]{4} "-" [0-9a-fA-F]{12} "\"" space"#,
                &[],
            ),
        ),
        (
            "char",
            rule(
                r#"[^"\\\x7F\x00-\x1F] | [\\] (["\\bfnrt] | "u" [0-9a-fA-F]{4})"#,
                &[],
            ),
        ),
        ("string", rule(r#""\"" char* "\"" space"#, &["char"])),
        ("null", rule(r#""null" space"#, &[])),
    ])
});

pub static STRING_FORMAT_RULES: Lazy<BTreeMap<&'static str, BuiltinRule>> = Lazy::new(|| {
    BTreeMap::from([
        (
            "date",
            rule(
                r#"[0-9]{4} "-" ( "0" [1-9] | "1" [0-2] ) "-" ( "0" [1-9] | [1-2] [0-9] | "3" [0-1] )"#,
                &[],
            ),
        ),
        (
            "time",
            rule(
                r#"([01] [0-9] | "2" [0-3]) ":" [0-5] [0-9] ":" [0-5] [0-9] ( "." [0-9]{3} )? ( "Z" | ( "+" | "-" ) ( [01] [0-9] | "2" [0-3] ) ":" [0-5] [0-9] )"#,
                &[],
            ),
        ),
        ("date-time", rule(r#"date "T" time"#, &["date", "time"])),
        ("date-string", rule(r#""\"" date "\"" space"#, &["date"])),
        ("time-string", rule(r#""\"" time "\"" space"#, &["time"])),
        (
            "date-time-string",
            rule(r#""\"" date-time "\"" space"#, &["date-time"]),
        ),
    ])
});

/// Look up a built-in rule in either catalog.
pub fn lookup(name: &str) -> Option<&'static BuiltinRule> {
    PRIMITIVE_RULES
        .get(name)
        .or_else(|| STRING_FORMAT_RULES.get(name))
}
