//! Compiler error taxonomy.
//!
//! Every error here is a configuration/input error: the schema (or a pattern
//! inside it) cannot be expressed as a grammar. Nothing is retryable and no
//! partial grammar is ever produced.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GrammarError>;

#[derive(Debug, Error)]
pub enum GrammarError {
    /// Remote `$ref` (or a non-JSON-pointer form). The compiler is offline
    /// and never fetches schemas.
    #[error("unsupported $ref: {0}")]
    UnsupportedRef(String),

    /// A local `$ref` path segment that does not exist in the schema.
    #[error("broken $ref: segment `{segment}` not found in {node}")]
    BrokenRef { segment: String, node: String },

    /// `pattern` without both `^` and `$` anchors.
    #[error("pattern must be anchored (^...$): /{0}/")]
    UnanchoredPattern(String),

    /// A regex construct outside the supported subset (lookaround, etc).
    #[error("unsupported pattern syntax at index {index} of /{pattern}/")]
    UnsupportedPattern { index: usize, pattern: String },

    /// Unterminated `(`, `[` or `{`, or a stray `)`.
    #[error("unbalanced `{delimiter}` at index {index} of /{pattern}/")]
    UnbalancedPattern {
        delimiter: char,
        index: usize,
        pattern: String,
    },

    /// The schema matched none of the visitor's dispatch rules.
    #[error("unrecognized schema: {0}")]
    UnrecognizedSchema(String),

    /// A built-in rule names a dependency missing from the static catalog.
    /// This is a defect in the catalog, never bad input.
    #[error("primitive catalog references unknown rule `{0}`")]
    Catalog(String),

    /// Schema text that is not valid JSON (only from `compile_str`).
    #[error("invalid schema JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
