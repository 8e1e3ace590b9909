//! Command-line front end for the paged query engine.
//!
//! ```bash
//! # Paged query described by a JSON request
//! pagedsql --db sakila.sqlite query --request request.json
//!
//! # Plain statement with typed parameters, as CSV
//! pagedsql --db sakila.sqlite -o csv select --sql "SELECT * FROM film WHERE length > ?" --params params.json
//! ```

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing_subscriber::EnvFilter;

use pagedsql::config::{EngineConfig, OutputFormat};
use pagedsql::{PagedQueryService, ResultEnvelope, SqliteExecutor, TypedParameter};

#[derive(Parser, Debug)]
#[command(
    name = "pagedsql",
    version,
    about = "Run dynamic paged queries against a SQLite database"
)]
struct Args {
    /// SQLite database file
    #[arg(long, env = "PAGEDSQL_DB", global = true)]
    db: Option<PathBuf>,

    /// Configuration file path
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum, global = true)]
    output: Option<OutputFormatArg>,

    /// Enable debug logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a paged query described by a JSON request ("-" reads stdin)
    Query {
        #[arg(long, value_name = "FILE")]
        request: PathBuf,

        /// Base query, overriding the request's baseQuery
        #[arg(long)]
        query: Option<String>,
    },
    /// Run a statement and print its rows
    Select {
        #[arg(long)]
        sql: String,

        /// JSON array of {type, value} parameters
        #[arg(long, value_name = "FILE")]
        params: Option<PathBuf>,
    },
    /// Run a write statement and print the number of affected rows
    Exec {
        #[arg(long)]
        sql: String,

        /// JSON array of {type, value} parameters
        #[arg(long, value_name = "FILE")]
        params: Option<PathBuf>,
    },
    /// Run a count statement and print the integer it returns
    Count {
        #[arg(long)]
        sql: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    Json,
    Csv,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Csv => OutputFormat::Csv,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_logging(&config, args.verbose);

    let db_path = config.database_path()?;
    tracing::debug!(db = %db_path.display(), "using database");
    let service = PagedQueryService::new(Arc::new(SqliteExecutor::new(db_path)));

    let mut out = io::stdout().lock();
    match &args.command {
        Command::Query { request, query } => {
            let document = read_json(request)?;
            let result = service.run_paged_json(&document, query.as_deref())?;
            match config.output_format {
                OutputFormat::Json => write_json(&mut out, &result, config.pretty)?,
                OutputFormat::Csv => write_csv(&mut out, &result.table)?,
            }
        }
        Command::Select { sql, params } => {
            let params = read_params(params.as_deref())?;
            let table = service.execute(sql, &params)?;
            match config.output_format {
                OutputFormat::Json => write_json(&mut out, &table, config.pretty)?,
                OutputFormat::Csv => write_csv(&mut out, &table)?,
            }
        }
        Command::Exec { sql, params } => {
            let params = read_params(params.as_deref())?;
            let affected = service.execute_update(sql, &params)?;
            writeln!(out, "{affected}")?;
        }
        Command::Count { sql } => {
            let count = service.execute_count(sql)?;
            writeln!(out, "{count}")?;
        }
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::load_default()?,
    };

    if let Some(db) = &args.db {
        config.database = Some(db.clone());
    }
    if let Some(output) = args.output {
        config.output_format = output.into();
    }

    Ok(config)
}

fn init_logging(config: &EngineConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.log_level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("pagedsql={level}")))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn read_json(path: &Path) -> Result<JsonValue> {
    let content = if path == Path::new("-") {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("failed to read request from stdin")?;
        content
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };

    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn read_params(path: Option<&Path>) -> Result<Vec<TypedParameter>> {
    match path {
        Some(path) => Ok(TypedParameter::list_from_json(&read_json(path)?)?),
        None => Ok(Vec::new()),
    }
}

fn write_json(out: &mut impl Write, value: &impl Serialize, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_csv(out: &mut impl Write, table: &ResultEnvelope) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record(table.columns.iter().map(|column| column.label.as_str()))
        .context("failed to write csv header")?;

    for row in &table.rows {
        writer
            .write_record(table.columns.iter().map(|column| {
                row.get(&column.label)
                    .map(|value| value.to_text())
                    .unwrap_or_default()
            }))
            .context("failed to write csv row")?;
    }

    writer.flush().context("failed to flush csv output")?;
    Ok(())
}
