//! JSON Schema → grammar compiler for constrained decoding.
//!
//! Turns a JSON Schema into a self-contained grammar whose language is
//! exactly the schema-conforming JSON texts (modulo light whitespace), for
//! use as a token-sampling constraint. The pipeline:
//!
//! - `resolver` dereferences every local `$ref` up front
//! - `visitor` walks the schema, classifying each node and emitting rules
//! - `rules` owns the rule table (naming, dedup, deterministic output)
//! - `primitives` is the static catalog of built-in JSON fragments
//! - `pattern`, `intrange`, `exclude`, `repeat` generate the specialized
//!   fragments (regex subset, integer ranges, key exclusion, repetition)
//! - `gbnf` parses emitted grammars back and decides string acceptance

pub mod cli;
pub mod error;
pub mod exclude;
pub mod gbnf;
pub mod intrange;
pub mod pattern;
pub mod primitives;
pub mod repeat;
pub mod resolver;
pub mod rules;
pub mod visitor;

pub use error::{GrammarError, Result};
pub use visitor::{CompileOptions, Compiler, compile, compile_str};
