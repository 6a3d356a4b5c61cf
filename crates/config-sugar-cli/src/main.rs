//! config-sugar command line interface
//!
//! Expands a sugared YAML or JSON config file against a registry definition
//! and prints the canonical tree as JSON.
//!
//! # Usage
//!
//! ```bash
//! # Expand a rooted document ({ <category>: ... })
//! config-sugar --registry registry.yaml job.yaml
//!
//! # Expand a bare node as a given type, failing on unknown aliases
//! config-sugar --registry registry.yaml --type Filter --strict filter.json
//!
//! # Read from stdin
//! cat job.yaml | config-sugar --registry registry.yaml -
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;

use config_sugar::{loader, source, ConfigValue, ExpandOptions, Expander, TypeName};

#[derive(Parser, Debug)]
#[command(name = "config-sugar")]
#[command(version)]
#[command(about = "Expand sugared config trees into canonical typed trees")]
struct Args {
    /// Registry definition file (categories, aliases, types)
    #[arg(long, short = 'r', env = "CONFIG_SUGAR_REGISTRY")]
    registry: PathBuf,

    /// Config file to expand, or `-` for stdin
    input: PathBuf,

    /// Expand the input as this type instead of as a rooted document
    #[arg(long = "type", short = 't')]
    ty: Option<String>,

    /// Fail on discriminators naming unregistered aliases
    #[arg(long)]
    strict: bool,

    /// Maximum nesting depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// Input format (default: from the file extension, YAML otherwise)
    #[arg(long, value_enum)]
    input_format: Option<InputFormat>,

    /// Output format
    #[arg(long, short = 'o', default_value = "pretty", value_enum)]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    Json,
    Yaml,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let loaded = loader::load_registry(&args.registry)?;
    let options = effective_options(loaded.options, args);
    let document = read_input(&args.input, args.input_format)?;

    let expander = Expander::new(&loaded.registry).with_options(options);
    let expansion = match &args.ty {
        Some(ty) => expander.expand_reported(&TypeName::new(ty.as_str()), &document),
        None => expander.expand_root_reported(&document),
    }
    .with_context(|| format!("Failed to expand {}", args.input.display()))?;

    for warning in &expansion.warnings {
        warn!("{}", warning);
    }

    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string(&expansion.value)?,
        OutputFormat::Pretty => serde_json::to_string_pretty(&expansion.value)?,
    };
    println!("{}", rendered);
    Ok(())
}

/// Registry options, then environment overrides, then command-line flags
fn effective_options(base: ExpandOptions, args: &Args) -> ExpandOptions {
    let mut options = base.overridden_by(|key| std::env::var(key).ok());
    if let Some(depth) = args.max_depth {
        options = options.with_max_depth(depth);
    }
    if args.strict {
        options = options.strict();
    }
    options
}

fn read_input(path: &Path, format: Option<InputFormat>) -> Result<ConfigValue> {
    let (name, text) = if path == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        ("stdin".to_string(), text)
    } else {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        (path.display().to_string(), text)
    };

    let format = format.unwrap_or_else(|| detect_format(path));
    let value = match format {
        InputFormat::Json => source::from_json_str(&name, &text)?,
        InputFormat::Yaml => source::from_yaml_str(&name, &text)?,
    };
    Ok(value)
}

fn detect_format(path: &Path) -> InputFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::Json,
        _ => InputFormat::Yaml,
    }
}
