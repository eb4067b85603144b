//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Map, Number, Value as JsonValue};
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

use sheetsql_core::{
    value::format_timestamp, Coercible, Mutable, Navigable, ResultSet, ScrollMode, Session,
    SessionConfig, SqlError, Value,
};

/// Output format for query results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tab-separated table
    #[default]
    Text,
    /// JSON array of row objects
    Json,
}

#[derive(Parser)]
#[command(name = "sheetsql")]
#[command(author, version, about = "Query spreadsheets like tables", long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sheets of a workbook
    Sheets {
        /// Workbook file (.xlsx, .xls, .ods, .csv)
        input: PathBuf,
    },

    /// Print every row selected by a query
    Query {
        /// Workbook file
        input: PathBuf,

        /// Query text, e.g. "SELECT * FROM Sheet1"
        sql: String,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Report the type of every cell from its own row
        #[arg(long)]
        extended_metadata: bool,

        /// Open a scrollable cursor
        #[arg(long)]
        scrollable: bool,

        /// Session configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Delete one row and write the workbook back
    Delete {
        /// Workbook file
        input: PathBuf,

        /// Query selecting the sheet
        sql: String,

        /// 1-based row to delete
        #[arg(short, long)]
        row: i64,

        /// Session configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Settings for the query command
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub format: OutputFormat,
    pub extended_metadata: bool,
    pub scrollable: bool,
    pub config: Option<PathBuf>,
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Sheets { input } => {
            sheets_command(&input)?;
        }
        Commands::Query {
            input,
            sql,
            format,
            extended_metadata,
            scrollable,
            config,
        } => {
            let options = QueryOptions {
                format,
                extended_metadata,
                scrollable,
                config,
            };
            query_command(&input, &sql, &options)?;
        }
        Commands::Delete {
            input,
            sql,
            row,
            config,
        } => {
            delete_command(&input, &sql, row, config.as_deref())?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

/// Read session settings from an optional TOML file
pub fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    SessionConfig::from_toml_str(&content)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}

/// Execute the sheets command
pub fn sheets_command(input: &Path) -> Result<()> {
    let session = open_session(input, SessionConfig::default())?;
    for name in session.sheet_names()? {
        println!("{}", name);
    }
    Ok(())
}

/// Execute the query command
pub fn query_command(input: &Path, sql: &str, options: &QueryOptions) -> Result<()> {
    let output = render_query(input, sql, options)?;
    println!("{}", output);
    Ok(())
}

/// Run a query and render every row it selects
pub fn render_query(input: &Path, sql: &str, options: &QueryOptions) -> Result<String> {
    let mut config = load_config(options.config.as_deref())?;
    if options.extended_metadata {
        config = config.with_extended_metadata(true);
    }
    if options.scrollable {
        config = config.with_scroll(ScrollMode::Scrollable);
    }

    let mut session = open_session(input, config)?;
    let mut rs = session
        .query(sql)
        .with_context(|| format!("Failed to run query: {}", sql))?;
    debug!(
        "Query on '{}' selects {} rows",
        rs.sheet_name(),
        rs.row_count()
    );

    match options.format {
        OutputFormat::Text => render_text(&mut rs, options.extended_metadata),
        OutputFormat::Json => render_json(&mut rs),
    }
}

/// Execute the delete command
pub fn delete_command(input: &Path, sql: &str, row: i64, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?.mutable();
    let mut session = open_session(input, config)?;

    {
        let mut rs = session
            .query(sql)
            .with_context(|| format!("Failed to run query: {}", sql))?;
        if row < 1 || !rs.absolute(row)? {
            anyhow::bail!(
                "Row {} is out of range: '{}' has {} rows",
                row,
                rs.sheet_name(),
                rs.row_count()
            );
        }
        rs.delete_row()
            .with_context(|| format!("Failed to delete row {}", row))?;
    }

    session
        .commit()
        .with_context(|| format!("Failed to write workbook: {}", input.display()))?;
    println!("Deleted row {} from {}", row, input.display());
    for warning in session.warnings() {
        println!("warning: {}", warning);
    }
    session.close();
    Ok(())
}

fn open_session(input: &Path, config: SessionConfig) -> Result<Session> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    Session::open_path(input, config)
        .with_context(|| format!("Failed to open workbook: {}", input.display()))
}

/// A cell as shown to the user: its value, or the reason it has none
enum Rendered {
    Value(Value),
    Error(String),
}

impl Rendered {
    fn read(rs: &mut ResultSet<'_>, column: usize) -> Result<Self> {
        match rs.get_object(column) {
            Ok(value) => Ok(Rendered::Value(value)),
            Err(SqlError::DataRetrieval(message)) => Ok(Rendered::Error(message)),
            Err(err) => Err(err.into()),
        }
    }

    fn to_json(&self) -> JsonValue {
        match self {
            Rendered::Value(Value::Null) => JsonValue::Null,
            Rendered::Value(Value::Boolean(b)) => JsonValue::Bool(*b),
            Rendered::Value(Value::Decimal(d)) => {
                let text = d.to_string();
                text.parse::<Number>()
                    .map(JsonValue::Number)
                    .unwrap_or(JsonValue::String(text))
            }
            Rendered::Value(Value::Text(s)) => JsonValue::String(s.clone()),
            Rendered::Value(Value::Timestamp(ts)) => JsonValue::String(format_timestamp(ts)),
            Rendered::Error(message) => JsonValue::String(message.clone()),
        }
    }

    fn to_text(&self) -> String {
        match self {
            Rendered::Value(value) => value.to_string(),
            Rendered::Error(message) => message.clone(),
        }
    }
}

fn render_text(rs: &mut ResultSet<'_>, with_types: bool) -> Result<String> {
    let labels: Vec<String> = rs.metadata().iter().map(|c| c.label.clone()).collect();
    let mut out = labels.join("\t");

    let mut rows = 0;
    while rs.next()? {
        rows += 1;
        let mut cells = Vec::with_capacity(labels.len());
        for column in 1..=labels.len() {
            let mut text = Rendered::read(rs, column)?.to_text();
            if with_types {
                let _ = write!(text, " [{}]", rs.column_type(column)?);
            }
            cells.push(text);
        }
        out.push('\n');
        out.push_str(&cells.join("\t"));
    }

    let _ = write!(out, "\n({} rows)", rows);
    Ok(out)
}

fn render_json(rs: &mut ResultSet<'_>) -> Result<String> {
    let labels: Vec<String> = rs.metadata().iter().map(|c| c.label.clone()).collect();
    let mut rows = Vec::new();
    while rs.next()? {
        let mut object = Map::new();
        for (i, label) in labels.iter().enumerate() {
            object.insert(label.clone(), Rendered::read(rs, i + 1)?.to_json());
        }
        rows.push(JsonValue::Object(object));
    }
    serde_json::to_string_pretty(&rows).context("Failed to serialize rows to JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetsql_core::Decimal;

    #[test]
    fn test_cli_parses_query_flags() {
        let cli = Cli::try_parse_from([
            "sheetsql",
            "--verbose",
            "query",
            "book.xlsx",
            "SELECT * FROM Sheet1",
            "--format",
            "json",
            "--scrollable",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Query {
                format, scrollable, extended_metadata, ..
            } => {
                assert_eq!(format, OutputFormat::Json);
                assert!(scrollable);
                assert!(!extended_metadata);
            }
            _ => panic!("expected query command"),
        }
    }

    #[test]
    fn test_cli_requires_row_for_delete() {
        let args = ["sheetsql", "delete", "book.xlsx", "SELECT * FROM A"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_json_rendering_of_values() {
        let number = Rendered::Value(Value::Decimal("12.5".parse::<Decimal>().unwrap()));
        assert_eq!(number.to_json().to_string(), "12.5");
        assert_eq!(Rendered::Value(Value::Null).to_json(), JsonValue::Null);
        assert_eq!(
            Rendered::Error("#N/A".to_string()).to_json(),
            JsonValue::String("#N/A".to_string())
        );
    }

    #[test]
    fn test_load_config_defaults_without_file() {
        let config = load_config(None).unwrap();
        assert!(config.read_only);
    }
}
