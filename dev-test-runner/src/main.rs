//! Round-trip checker: decode each sample with a compiled union, encode it back,
//! and compare against the input.
mod models;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use colored::Colorize;
use json_union::cli::resolve_file_path_patterns;
use json_union::naming::DefaultNamer;
use json_union::resolve::SchemaGraph;
use json_union::union::{compile, EncodePolicy};
use serde_json::Value;

#[derive(Parser, Debug)]
struct Args {
    /// schema document holding the union
    #[arg(long)]
    schema: PathBuf,

    /// definition name of the union
    #[arg(long = "union")]
    union: String,

    /// sample JSON values; literal paths or quoted glob patterns
    #[arg(num_args = 1.., required = true)]
    samples: Vec<String>,

    /// also round-trip through the checked-in `AuthProviders` types (auth-providers samples only)
    #[arg(long, default_value_t = false)]
    typed: bool,
}

fn round_trip(codec: &json_union::runtime::Codec<'_>, path: &PathBuf, typed: bool) -> Result<()> {
    let src = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let input: Value = serde_json::from_str(&src).with_context(|| format!("parse {}", path.display()))?;
    let value = codec.decode(&input)?;
    let output = codec.encode(&value)?;
    if output != input {
        return Err(anyhow!("encoded value differs:\n  in:  {input}\n  out: {output}"));
    }
    if typed {
        let value: models::AuthProviders = serde_json::from_value(input.clone())?;
        let output = serde_json::to_value(&value)?;
        if output != input {
            return Err(anyhow!("typed value differs:\n  in:  {input}\n  out: {output}"));
        }
    }
    Ok(())
}

fn run(args: &Args) -> Result<bool> {
    let src = std::fs::read_to_string(&args.schema)
        .with_context(|| format!("read {}", args.schema.display()))?;
    let graph = SchemaGraph::from_value(serde_json::from_str(&src)?)?;
    let node = graph
        .definition(&args.union)
        .ok_or_else(|| anyhow!("no definition named {:?}", args.union))?;
    let compiled = compile(&graph, &DefaultNamer, node, EncodePolicy::Strict)?;
    let codec = compiled.codec();

    let samples = resolve_file_path_patterns(&args.samples).map_err(|e| anyhow!("{e}"))?;
    let mut failed = 0usize;
    for path in &samples {
        match round_trip(&codec, path, args.typed) {
            Ok(()) => eprintln!("✅ {}", path.display().to_string().green()),
            Err(error) => {
                failed += 1;
                eprintln!("❌ {}: {error:#}", path.display().to_string().red());
            }
        }
    }
    eprintln!("{} passed, {} failed", samples.len() - failed, failed);
    Ok(failed == 0)
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("{} {error:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
