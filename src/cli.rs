//! CLI: schema → (compiled union report | Rust source)
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde::Serialize;

use crate::codegen::Codegen;
use crate::config::GenConfig;
use crate::naming::DefaultNamer;
use crate::resolve::{SchemaGraph, SchemaView};
use crate::schema::Schema;
use crate::union::{compile, CompiledUnion, EncodePolicy, UnionError};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// detect discriminated unions in JSON Schema `oneOf`s and emit tagged-union codecs
#[derive(Parser, Debug)]
#[command(name = "json-union", version)]
pub struct CommandLineInterface {
    /// more logging (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// analyze tagged unions and print the compiled model (declaration + procedures) as JSON
    Analyze(AnalyzeOut),
    /// emit Rust tagged-union types with serde codecs
    Rust(RustOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more schema documents. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// only compile these definitions (default: every schema marked `x-tagged-union`)
    #[arg(long = "union", value_name = "NAME")]
    unions: Vec<String>,

    /// skip unions that fail to compile instead of aborting the run
    #[arg(long, default_value_t = false)]
    keep_going: bool,

    /// JSON generation config (see `GenConfig`)
    #[arg(long)]
    config: Option<PathBuf>,

    /// fail encoding when more than one variant slot is set
    #[arg(long, default_value_t = false)]
    strict_encode: bool,
}

#[derive(clap::Parser, Debug)]
struct AnalyzeOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct RustOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .rs file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Serialize)]
struct Report<'a> {
    source: String,
    union: &'a CompiledUnion,
}

/// Successfully compiled unions of one schema document.
#[derive(Debug)]
struct Compiled {
    source: String,
    unions: Vec<CompiledUnion>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn gen_config(&self) -> Result<GenConfig> {
        let mut config = match self.config.as_ref() {
            Some(path) => GenConfig::load(path)?,
            None => GenConfig::default(),
        };
        if self.strict_encode {
            config.encode_policy = EncodePolicy::Strict;
        }
        tracing::debug!(?config, "generation config");
        Ok(config)
    }

    fn load_compile(&self, policy: EncodePolicy) -> Result<Vec<Compiled>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .map_err(|error| anyhow!("failed to resolve input file paths: {error}"))?;

        let mut out = Vec::with_capacity(source_paths.len());
        let mut skipped = 0usize;
        for source_path in source_paths {
            let source = source_path.to_string_lossy().to_string();
            let graph = load_graph(&source_path)?;

            let candidates = self.candidates(&graph, &source)?;
            if candidates.is_empty() {
                tracing::warn!(%source, "no tagged unions found");
            }

            let results: Vec<(String, Result<CompiledUnion, UnionError>)> = candidates
                .par_iter()
                .map(|node| (label(&graph, node), compile(&graph, &DefaultNamer, node, policy)))
                .collect();

            let mut unions = Vec::with_capacity(results.len());
            for (name, result) in results {
                match result {
                    Ok(compiled) => {
                        tracing::debug!(%source, union = %name, variants = compiled.decl.slots.len(), "compiled");
                        unions.push(compiled);
                    }
                    Err(error) if self.keep_going => {
                        skipped += 1;
                        tracing::warn!(%source, union = %name, %error, "skipping union");
                        eprintln!("{} {source}: {error}", "skipped".yellow().bold());
                    }
                    Err(error) => {
                        return Err(anyhow::Error::new(error))
                            .with_context(|| format!("failed to compile union {name} in {source}"));
                    }
                }
            }
            out.push(Compiled { source, unions });
        }

        let total: usize = out.iter().map(|c| c.unions.len()).sum();
        eprintln!(
            "{} {total} union(s){}",
            "compiled".green().bold(),
            if skipped > 0 { format!(", {skipped} skipped") } else { String::new() }
        );
        Ok(out)
    }

    fn candidates<'g>(&self, graph: &'g SchemaGraph, source: &str) -> Result<Vec<&'g Schema>> {
        if self.unions.is_empty() {
            return Ok(graph.tagged_unions());
        }
        self.unions
            .iter()
            .map(|name| {
                let node = graph
                    .definition(name)
                    .ok_or_else(|| anyhow!("{source}: no definition named {name:?}"))?;
                graph
                    .resolve(node)
                    .with_context(|| format!("{source}: cannot resolve definition {name:?}"))
            })
            .collect()
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn verbosity(&self) -> u8 {
        self.verbose
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Analyze(target) => {
                let config = target.input_settings.gen_config()?;
                let compiled = target.input_settings.load_compile(config.encode_policy)?;
                let reports: Vec<Report<'_>> = compiled
                    .iter()
                    .flat_map(|c| c.unions.iter().map(move |union| Report { source: c.source.clone(), union }))
                    .collect();
                let report_src = serde_json::to_string_pretty(&reports)?;
                write_output(target.out.as_deref(), &report_src)
            }
            Command::Rust(target) => {
                let config = target.input_settings.gen_config()?;
                let compiled = target.input_settings.load_compile(config.encode_policy)?;
                let mut cg = Codegen::new(config);
                for union in compiled.iter().flat_map(|c| c.unions.iter()) {
                    cg.emit(union)?;
                }
                write_output(target.out.as_deref(), &cg.into_string())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn load_graph(path: &Path) -> Result<SchemaGraph> {
    let display = path.display();
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema file {display}"))?;
    let value = serde_json::from_str::<serde_json::Value>(&source)
        .with_context(|| format!("failed to parse JSON schema file {display}"))?;
    SchemaGraph::from_value(value).with_context(|| format!("failed to load schema graph from {display}"))
}

fn label(graph: &SchemaGraph, node: &Schema) -> String {
    graph
        .name_of(node)
        .or(node.title.as_deref())
        .unwrap_or("<root>")
        .to_string()
}

fn write_output(out: Option<&Path>, src: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, src).with_context(|| format!("failed to write {}", out.display()))?;
            tracing::info!(path = %out.display(), bytes = src.len(), "wrote output");
        }
        None => println!("{src}"),
    }
    Ok(())
}

pub fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>>
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
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                matched_any = true;
                out.push(entry?);
            }
            if !matched_any {
                return Err(format!("glob pattern matched no files: {pattern}").into());
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
