//! `plist` CLI -- inspect, query, edit and convert XML property lists.
//!
//! ## Usage
//!
//! ```sh
//! # Summarize a document (top-level kind and element count)
//! plist show -i config.plist
//!
//! # Print the value at a dotted path
//! plist get servers.0.port -i config.plist
//!
//! # Set a scalar in place (the file is rewritten atomically)
//! plist set servers.0.port 9090 --kind integer -f config.plist
//!
//! # Remove an entry in place
//! plist remove servers.0.debug -f config.plist
//!
//! # List dictionary keys
//! plist keys servers.0 -i config.plist
//!
//! # Convert between JSON and plist
//! echo '{"port":8080}' | plist from-json
//! plist to-json -i config.plist
//! ```
//!
//! Logging goes to stderr; `-v` enables debug output and `RUST_LOG` overrides
//! the filter entirely.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use prop_core::{
    externalize_ref, internalize_value, internalize_value_from_file, Array, Container,
    ContainerRef, Dictionary, PropPath, Segment, Value,
};
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Nesting limit for `to-json`, counted as [`Value::depth`] levels. Stays
/// within the limit `serde_json` applies when parsing, so every JSON document
/// this tool writes can be read back.
const MAX_JSON_DEPTH: usize = 128;

#[derive(Parser)]
#[command(name = "plist", version, about = "XML property list CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a plist and print its top-level kind and element count
    Show {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Print the value at a dotted path (scalars as text, containers as plist)
    Get {
        /// Dotted path, e.g. `servers.0.host`; empty for the root
        path: String,
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Set a scalar at a dotted path and write the file back
    Set {
        /// Dotted path of the entry to set; its parent must exist
        path: String,
        /// New value
        value: String,
        /// How to interpret VALUE
        #[arg(short, long, value_enum, default_value_t = ScalarKind::String)]
        kind: ScalarKind,
        /// Plist file to edit in place
        #[arg(short, long)]
        file: String,
    },
    /// Remove the entry at a dotted path and write the file back
    Remove {
        /// Dotted path of the entry to remove
        path: String,
        /// Plist file to edit in place
        #[arg(short, long)]
        file: String,
    },
    /// List the keys of the dictionary at a dotted path, one per line
    Keys {
        /// Dotted path of a dictionary; empty for the root
        #[arg(default_value = "")]
        path: String,
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Convert a JSON document to a plist
    FromJson {
        /// Input JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Convert a plist to pretty-printed JSON
    ToJson {
        /// Input plist file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ScalarKind {
    Integer,
    String,
    Bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Show { input } => {
            let root = read_plist(input.as_deref())?;
            let view = as_container(&root)?;
            println!("{} ({} entries)", view.kind(), view.count());
        }
        Commands::Get { path, input } => {
            let root = read_plist(input.as_deref())?;
            let path = PropPath::parse(&path);
            let value = path
                .resolve(&root)
                .ok_or_else(|| anyhow!("No value at path '{}'", path))?;
            match ContainerRef::from_value(value) {
                Some(view) => print!("{}", externalize_ref(view)),
                None => println!("{}", scalar_text(value)),
            }
        }
        Commands::Set {
            path,
            value,
            kind,
            file,
        } => {
            let mut root = read_plist(Some(&file))?;
            let path = PropPath::parse(&path);
            let value = parse_scalar(&value, kind)?;
            set_at_path(&mut root, &path, value)?;
            write_plist(&root, &file)?;
        }
        Commands::Remove { path, file } => {
            let mut root = read_plist(Some(&file))?;
            let path = PropPath::parse(&path);
            remove_at_path(&mut root, &path)?;
            write_plist(&root, &file)?;
        }
        Commands::Keys { path, input } => {
            let root = read_plist(input.as_deref())?;
            let path = PropPath::parse(&path);
            let dict = path
                .resolve(&root)
                .and_then(Value::as_dictionary)
                .ok_or_else(|| anyhow!("No dictionary at path '{}'", path))?;
            for key in &dict.keys() {
                println!("{}", scalar_text(key));
            }
        }
        Commands::FromJson { input, output } => {
            let json = read_input(input.as_deref())?;
            let parsed: serde_json::Value =
                serde_json::from_str(&json).context("Failed to parse JSON input")?;
            let value = Value::try_from(parsed).context("Failed to convert JSON to plist")?;
            let view = as_container(&value)?;
            write_output(output.as_deref(), &externalize_ref(view))?;
        }
        Commands::ToJson { input, output } => {
            let root = read_plist(input.as_deref())?;
            let depth = root.depth();
            if depth > MAX_JSON_DEPTH {
                bail!(
                    "Plist nests {} levels deep; JSON output supports at most {}",
                    depth,
                    MAX_JSON_DEPTH
                );
            }
            let pretty = serde_json::to_string_pretty(&root)?;
            write_output(output.as_deref(), &format!("{}\n", pretty))?;
        }
    }

    Ok(())
}

/// Install a stderr subscriber. Defaults to `warn` (`debug` with `-v`);
/// `RUST_LOG` takes precedence when set.
fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn as_container(value: &Value) -> Result<ContainerRef<'_>> {
    ContainerRef::from_value(value).ok_or_else(|| {
        anyhow!(
            "Top-level value must be an array or a dictionary, found {}",
            value.kind()
        )
    })
}

/// Plain-text rendering of a scalar for stdout.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::Integer(n) => n.to_string(),
        Value::Text(s) => s.clone(),
        Value::Boolean(b) => b.to_string(),
        Value::Array(a) => format!("<array of {}>", a.count()),
        Value::Dictionary(d) => format!("<dict of {}>", d.count()),
    }
}

fn parse_scalar(raw: &str, kind: ScalarKind) -> Result<Value> {
    match kind {
        ScalarKind::Integer => raw
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .with_context(|| format!("Invalid integer: '{}'", raw)),
        ScalarKind::String => Ok(Value::Text(raw.to_string())),
        ScalarKind::Bool => match raw {
            "true" | "yes" | "1" => Ok(Value::Boolean(true)),
            "false" | "no" | "0" => Ok(Value::Boolean(false)),
            other => bail!("Invalid boolean: '{}' (expected true or false)", other),
        },
    }
}

/// Set `value` at `path`. Array parents follow `Array::set` (index may equal
/// the count to append); dictionary parents insert or replace.
fn set_at_path(root: &mut Value, path: &PropPath, value: Value) -> Result<()> {
    let (parent_path, last) = path
        .split_last()
        .ok_or_else(|| anyhow!("Cannot replace the top-level container"))?;
    let parent = parent_path
        .resolve_mut(root)
        .ok_or_else(|| anyhow!("No container at path '{}'", parent_path))?;
    match parent {
        Value::Array(a) => {
            let index = segment_index(last)?;
            a.set(index, value)
                .with_context(|| format!("Cannot set '{}'", path))?;
        }
        Value::Dictionary(d) => d.set(last.to_string(), value),
        other => bail!("'{}' is a {}, not a container", parent_path, other.kind()),
    }
    debug!(%path, "set value");
    Ok(())
}

fn remove_at_path(root: &mut Value, path: &PropPath) -> Result<()> {
    let (parent_path, last) = path
        .split_last()
        .ok_or_else(|| anyhow!("Cannot remove the top-level container"))?;
    let parent = parent_path
        .resolve_mut(root)
        .ok_or_else(|| anyhow!("No container at path '{}'", parent_path))?;
    match parent {
        Value::Array(a) => {
            let index = segment_index(last)?;
            a.remove(index)
                .with_context(|| format!("Cannot remove '{}'", path))?;
        }
        Value::Dictionary(d) => {
            if d.remove(&last.to_string()).is_none() {
                debug!(%path, "key already absent");
            }
        }
        other => bail!("'{}' is a {}, not a container", parent_path, other.kind()),
    }
    Ok(())
}

fn segment_index(segment: &Segment) -> Result<usize> {
    match segment {
        Segment::Index(i) => Ok(*i),
        Segment::Key(k) => k
            .parse()
            .with_context(|| format!("'{}' is not an array index", k)),
    }
}

fn read_plist(path: Option<&str>) -> Result<Value> {
    let value = match path {
        Some(path) => internalize_value_from_file(path)
            .with_context(|| format!("Failed to load plist: {}", path))?,
        None => {
            let xml = read_input(None)?;
            internalize_value(&xml).context("Failed to parse plist")?
        }
    };
    debug!(kind = %value.kind(), "loaded plist");
    Ok(value)
}

fn write_plist(root: &Value, path: &str) -> Result<()> {
    let written = match root {
        Value::Array(a) => Array::to_file(a, path),
        Value::Dictionary(d) => Dictionary::to_file(d, path),
        other => bail!("Top-level value must be a container, found {}", other.kind()),
    };
    written.with_context(|| format!("Failed to write file: {}", path))
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(Path::new(path))
            .with_context(|| format!("Failed to read file: {}", path)),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
