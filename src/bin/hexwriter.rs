//! Compile scripts to binary, or decompile binaries with a rules document.
//!
//! Usage:
//!   hexwriter script.hw [more.hw ...] [-o out.bin]
//!   hexwriter -d rules.json data.bin [more.bin ...]
//!
//! Without `--out` compiled bytes are printed as an escaped byte string.
//! Set `RUST_LOG=debug` for a trace of definitions and struct recursion.

use anyhow::{Context, Result};
use clap::Parser;
use hexwriter::{Compiler, Config, Decompiler, RuleDocument};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Script files to compile, or binary files to decompile
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Write compiled bytes to this file
    #[arg(short, long)]
    out: Option<PathBuf>,
    /// Encoding of string literals and text fields
    #[arg(short, long, default_value = "UTF-8")]
    encoding: String,
    /// Pad width scripts start with
    #[arg(long = "default-pad-size", visible_alias = "dps", default_value_t = 4)]
    default_pad_size: usize,
    /// Decompile the input files with this rules document (JSON)
    #[arg(short, long, value_name = "RULES")]
    decompile: Option<PathBuf>,
    /// Deepest nesting of definitions or structs
    #[arg(long, default_value_t = 64)]
    max_depth: usize,
}

impl Args {
    fn config(&self) -> Config {
        Config::default()
            .with_encoding(self.encoding.clone())
            .with_default_pad_width(Some(self.default_pad_size))
            .with_max_depth(self.max_depth)
    }
}

fn compile(args: &Args) -> Result<bool> {
    let compiler = Compiler::new(args.config())?;
    let mut source = String::new();
    let mut ok = true;
    for path in &args.files {
        match std::fs::read_to_string(path) {
            Ok(text) => source.push_str(&text),
            Err(e) => {
                log::error!("unable to open {}: {}", path.display(), e);
                ok = false;
            }
        }
    }

    let bytes = compiler.compile(&source)?;
    match &args.out {
        Some(out) => {
            std::fs::write(out, &bytes).with_context(|| format!("could not write {}", out.display()))?;
            log::info!("wrote {} byte(s) to {}", bytes.len(), out.display());
        }
        None => println!("{}", escape_bytes(&bytes)),
    }
    Ok(ok)
}

fn decompile(args: &Args, rules_path: &Path) -> Result<bool> {
    let decompiler = Decompiler::new(args.config())?;
    let text = std::fs::read_to_string(rules_path)
        .with_context(|| format!("cannot open rules {}", rules_path.display()))?;
    let rules = RuleDocument::from_json(&text).with_context(|| format!("bad rules {}", rules_path.display()))?;

    println!("{}", decompiler.header(&rules));
    let mut ok = true;
    for path in &args.files {
        let binary = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                log::error!("cannot open {}: {}", path.display(), e);
                ok = false;
                continue;
            }
        };
        match decompiler.decompile(&rules, &binary) {
            Ok(out) => println!("{}", out.text),
            Err(e) => {
                log::error!("{}: {}", path.display(), e);
                ok = false;
            }
        }
    }
    Ok(ok)
}

fn escape_bytes(bytes: &[u8]) -> String {
    bytes.iter().flat_map(|&b| std::ascii::escape_default(b)).map(char::from).collect()
}

fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("warn"));
    let args = Args::parse();
    let result = match &args.decompile {
        Some(rules) => decompile(&args, rules),
        None => compile(&args),
    };
    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
