use clap::{Parser, ValueEnum};
use mdjschema::ast::TableId;
use mdjschema::config::{OneToOne, Options};
use mdjschema::resolve::{OwnerPolicy, Side};
use mdjschema::{export, report, resolve_value};
use serde_json::Value;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Schema JSON for code emitters
    Json,
    /// Full resolved model as JSON
    Model,
    /// Human-readable listing
    Summary,
}

/// Resolve a StarUML ERD export into a relational schema model
#[derive(Parser, Debug)]
#[command(name = "mdjschema", version, about, long_about = None)]
struct Cli {
    /// Input .mdj file
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: Format,

    /// JSON options file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Namespace separator in entity names
    #[arg(long)]
    separator: Option<String>,

    /// Namespace for entity names without a separator
    #[arg(long)]
    namespace: Option<String>,

    /// One-to-one fallback: first-end, second-end, lexical, reject or prompt
    #[arg(long = "one-to-one")]
    one_to_one: Option<String>,

    /// Exit with status 2 when any diagnostic is reported
    #[arg(long)]
    deny_warnings: bool,

    /// Log pipeline steps (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

/// Asks on the terminal which table owns an ambiguous one-to-one key.
struct Prompt;

impl OwnerPolicy for Prompt {
    fn choose_owner(&mut self, first: &TableId, second: &TableId, relationship: &str) -> Option<Side> {
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();
        loop {
            eprint!(
                "Relationship `{relationship}`: which table holds the foreign key? [1] {first} [2] {second} [s]kip: "
            );
            let _ = io::stderr().flush();
            let line = match lines.next() {
                Some(Ok(line)) => line,
                _ => return None,
            };
            match line.trim() {
                "1" => return Some(Side::First),
                "2" => return Some(Side::Second),
                "s" | "skip" => return None,
                _ => eprintln!("Please answer 1, 2 or s."),
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(io::stderr)
        .init();

    let mut options = match &cli.config {
        Some(path) => {
            let text = read_or_exit(path);
            Options::from_json(&text).unwrap_or_else(|e| {
                eprintln!("Failed to load {}: {}", path.display(), e);
                process::exit(1);
            })
        }
        None => Options::default(),
    };
    if let Some(separator) = cli.separator {
        options.separator = separator;
    }
    if let Some(namespace) = cli.namespace {
        options.default_namespace = Some(namespace);
    }

    let mut policy: Box<dyn OwnerPolicy> = match cli.one_to_one.as_deref() {
        Some("prompt") => Box::new(Prompt),
        Some(name) => match OneToOne::from_str(name) {
            Some(choice) => {
                options.one_to_one = choice;
                choice.policy()
            }
            None => {
                eprintln!("Invalid one-to-one policy: {}", name);
                process::exit(1);
            }
        },
        None => options.one_to_one.policy(),
    };

    if let Err(e) = options.validate() {
        eprintln!("{}", e);
        process::exit(1);
    }

    let input = read_or_exit(&cli.input);
    let root: Value = match serde_json::from_str(&input) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Invalid JSON in {}: {}", cli.input.display(), e);
            process::exit(1);
        }
    };

    let resolution = match resolve_value(&root, &options, policy.as_mut()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to resolve {}: {}", cli.input.display(), e);
            process::exit(1);
        }
    };

    let rendered = match cli.format {
        Format::Json => export::to_json_string(&resolution.schema, &resolution.diagnostics),
        Format::Model => serde_json::to_string_pretty(&resolution.schema).unwrap_or_else(|e| {
            eprintln!("Failed to serialize model: {}", e);
            process::exit(1);
        }),
        Format::Summary => report::summary(&resolution.schema, &resolution.diagnostics),
    };

    match cli.output {
        Some(path) => {
            if let Err(e) = fs::write(&path, &rendered) {
                eprintln!("Failed to write {}: {}", path.display(), e);
                process::exit(1);
            }
        }
        None => println!("{}", rendered),
    }

    if cli.deny_warnings && !resolution.diagnostics.is_empty() {
        process::exit(2);
    }
}

fn read_or_exit(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {}: {}", path.display(), e);
            process::exit(1);
        }
    }
}
