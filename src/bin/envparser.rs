use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use envparser::{
    DEFAULT_DATETIME_FORMAT, EnvLoader, EnvStore, Inference, MalformedLines, SubstitutionMode,
    Value,
};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Inspect `.env` files with typed values
#[derive(Debug, Parser)]
#[command(name = "envparser", version, about, long_about = None)]
struct Cli {
    /// Env file to read
    #[arg(short, long, global = true, env = "ENVPARSER_FILE", default_value = ".env")]
    file: PathBuf,

    /// Keep `$VAR` and `${VAR}` placeholders as written
    #[arg(long, global = true)]
    no_expand: bool,

    /// Skip malformed lines instead of failing the load
    #[arg(long, global = true)]
    skip_malformed: bool,

    /// chrono format used to detect date-time values
    #[arg(long, global = true, default_value = DEFAULT_DATETIME_FORMAT)]
    datetime_format: String,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every key with its inferred value
    Dump {
        /// Print a JSON object instead of KEY=value lines
        #[arg(long)]
        json: bool,
    },
    /// Print one value, exiting with status 1 when it is absent
    Get {
        key: String,

        /// Target type: str, bool, int, float, list, tuple, dict or a synonym
        #[arg(short, long, default_value = "string")]
        kind: String,

        /// Value used when the key is missing
        #[arg(short, long)]
        default: Option<String>,
    },
}

impl Cli {
    fn loader(&self) -> EnvLoader {
        let substitution_mode = if self.no_expand {
            SubstitutionMode::Disabled
        } else {
            SubstitutionMode::Expand
        };
        let malformed_lines = if self.skip_malformed {
            MalformedLines::Skip
        } else {
            MalformedLines::Abort
        };
        EnvLoader::new()
            .path(&self.file)
            .substitution_mode(substitution_mode)
            .malformed_lines(malformed_lines)
            .datetime_format(self.datetime_format.as_str())
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // RUST_LOG always applies; --verbose raises the fallback level to DEBUG.
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .try_init();

    let store = cli.loader().load();
    if let Some(err) = store.error() {
        eprintln!("envparser: {err}");
        return Ok(ExitCode::FAILURE);
    }

    let mut stdout = std::io::stdout().lock();
    match &cli.command {
        Command::Dump { json } => dump(&store, *json, &mut stdout)?,
        Command::Get { key, kind, default } => {
            let Some(value) = store.get_named(key, kind, default.as_deref()) else {
                return Ok(ExitCode::FAILURE);
            };
            writeln!(stdout, "{}", render(store.inference(), &value))
                .context("failed to write value")?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn dump(store: &EnvStore, json: bool, out: &mut impl Write) -> Result<()> {
    let values = store.get_all();
    let inference = store.inference();
    if json {
        let dump = JsonDump {
            values: &values,
            inference,
        };
        serde_json::to_writer_pretty(&mut *out, &dump).context("failed to encode values")?;
        writeln!(out)?;
        return Ok(());
    }

    for (key, value) in &values {
        match value {
            Some(value) => writeln!(out, "{key}={}", render(inference, value))?,
            None => writeln!(out, "{key}=")?,
        }
    }
    Ok(())
}

/// Date-times print in the format they were detected with.
fn render(inference: &Inference, value: &Value) -> String {
    match value {
        Value::DateTime(datetime) => inference
            .render_datetime(datetime)
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    }
}

/// JSON object in file order.
struct JsonDump<'a> {
    values: &'a [(String, Option<Value>)],
    inference: &'a Inference,
}

impl Serialize for JsonDump<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (key, value) in self.values {
            match value {
                Some(value @ Value::DateTime(_)) => {
                    map.serialize_entry(key, &render(self.inference, value))?
                }
                other => map.serialize_entry(key, other)?,
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn parse_uses_defaults() {
        let cli = Cli::try_parse_from(["envparser", "dump"]).expect("parse should succeed");

        assert_eq!(cli.file, PathBuf::from(".env"));
        assert!(!cli.no_expand);
        assert!(!cli.skip_malformed);
        assert_eq!(cli.datetime_format, "%Y-%m-%d %H:%M:%S");
        assert!(matches!(cli.command, Command::Dump { json: false }));
    }

    #[test]
    fn parse_get_with_kind_and_default() {
        let cli = Cli::try_parse_from([
            "envparser", "get", "PORT", "--kind", "int", "--default", "8080", "-f", "app.env",
        ])
        .expect("parse should succeed");

        assert_eq!(cli.file, PathBuf::from("app.env"));
        let Command::Get { key, kind, default } = cli.command else {
            panic!("expected get");
        };
        assert_eq!(key, "PORT");
        assert_eq!(kind, "int");
        assert_eq!(default.as_deref(), Some("8080"));
    }

    #[test]
    fn parse_requires_subcommand() {
        assert!(Cli::try_parse_from(["envparser"]).is_err());
    }
}
