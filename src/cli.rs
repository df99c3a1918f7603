//! Minimal CLI: compile → grammar, check → accept/reject
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::gbnf::Grammar;
use crate::visitor::{self, CompileOptions};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile JSON Schemas into constrained-decoding grammars, or check
/// candidate strings against a compiled grammar
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compile schema files into grammar text
    Compile(CompileOut),
    /// parse a grammar and test candidate strings against it
    Check(CheckRun),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CompileOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// property names to emit first, comma separated
    #[arg(long, value_delimiter = ',')]
    prop_order: Vec<String>,

    /// `.` in patterns matches line breaks too
    #[arg(long, default_value_t = false)]
    dotall: bool,

    /// output .gbnf file (stdout if omitted; single input only)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct CheckRun {
    /// compiled grammar file
    #[arg(long, short)]
    grammar: PathBuf,

    /// rule to match against
    #[arg(long, default_value = "root")]
    rule: String,

    /// candidate strings, one per argument
    #[arg(required = true)]
    candidates: Vec<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_process(
        &self,
        mut apply: impl FnMut(&str, &str) -> anyhow::Result<()>,
    ) -> anyhow::Result<()> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file ({source_path_str})"))?;
            apply(&source_path_str, &source)?;
        }
        Ok(())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Compile(target) => {
                let options = CompileOptions {
                    prop_order: target.prop_order.clone(),
                    dotall: target.dotall,
                };

                // 1) compile every input
                let mut outputs = Vec::<String>::new();
                target.input_settings.load_process(|path, source| {
                    let grammar = visitor::compile_str(source, &options)
                        .with_context(|| format!("failed to compile schema ({path})"))?;
                    outputs.push(grammar);
                    Ok(())
                })?;

                // 2) write or print
                if let Some(out) = target.out.as_ref() {
                    anyhow::ensure!(
                        outputs.len() == 1,
                        "--out expects exactly one input, got {}",
                        outputs.len()
                    );
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, &outputs[0])?;
                } else {
                    for grammar in &outputs {
                        print!("{grammar}");
                    }
                }
                Ok(())
            }
            Command::Check(target) => {
                let grammar_path = target.grammar.to_string_lossy().to_string();
                let source = std::fs::read_to_string(&target.grammar)
                    .with_context(|| format!("failed to read grammar file ({grammar_path})"))?;
                let grammar = Grammar::parse(&source)
                    .with_context(|| format!("failed to parse grammar ({grammar_path})"))?;

                let mut rejected = 0usize;
                for candidate in &target.candidates {
                    if grammar.rule_accepts(&target.rule, candidate) {
                        println!("{} {candidate}", "accept".green());
                    } else {
                        rejected += 1;
                        println!("{} {candidate}", "reject".red());
                    }
                }
                anyhow::ensure!(rejected == 0, "{rejected} candidate(s) rejected");
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            // Treat as a glob pattern
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                matched_any = true;
                out.push(entry?);
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                anyhow::bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            // Treat as a literal path
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
