//! Canopy CLI - Compile annotated models to explores
//!
//! Usage:
//!   canopy compile --models <models.json> [--metrics <metrics.json>]
//!                  [--catalog <catalog.json>] [--config <canopy.toml>]
//!                  [--dialect <dialect>] [--pretty]
//!   canopy lineage --models <models.json> --model <name>
//!
//! Examples:
//!   canopy compile --models target/models.json --catalog target/catalog.json --pretty
//!   canopy compile --models target/models.json --dialect snowflake
//!   canopy lineage --models target/models.json --model orders
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.

use canopy::catalog::WarehouseCatalog;
use canopy::compile::{compile_values, parse_models, CompileOptions};
use canopy::config::Settings;
use canopy::model::DbtMetric;
use canopy::semantic::ModelGraph;
use canopy::sql::{Dialect, DialectSqlBuilder};
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "canopy")]
#[command(about = "Canopy - compiles annotated warehouse models into queryable explores")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile models into explores and print them as JSON
    Compile {
        /// JSON array of models
        #[arg(long)]
        models: PathBuf,

        /// JSON array of legacy standalone metrics
        #[arg(long)]
        metrics: Option<PathBuf>,

        /// Warehouse catalog (database -> schema -> table -> column -> type)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Settings file (defaults to $CANOPY_CONFIG, then ./canopy.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Warehouse dialect, overriding the settings file
        #[arg(short, long)]
        dialect: Option<DialectArg>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the lineage graph of one model
    Lineage {
        /// JSON array of models
        #[arg(long)]
        models: PathBuf,

        /// Name of the model
        #[arg(long)]
        model: String,
    },
}

#[derive(Clone, ValueEnum)]
enum DialectArg {
    Postgres,
    Snowflake,
    Bigquery,
    Redshift,
    Databricks,
    Trino,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Snowflake => Dialect::Snowflake,
            DialectArg::Bigquery => Dialect::BigQuery,
            DialectArg::Redshift => Dialect::Redshift,
            DialectArg::Databricks => Dialect::Databricks,
            DialectArg::Trino => Dialect::Trino,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            models,
            metrics,
            catalog,
            config,
            dialect,
            pretty,
        } => cmd_compile(models, metrics, catalog, config, dialect, pretty),
        Commands::Lineage { models, model } => cmd_lineage(models, model),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Error reading file '{}': {}", path.display(), e))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("Error parsing file '{}': {}", path.display(), e))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> ExitCode {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match rendered {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_settings(config: Option<PathBuf>) -> Result<Settings, String> {
    let settings = match config {
        Some(path) => Settings::load(&path),
        None => Settings::discover(),
    };
    settings.map_err(|e| format!("Error loading settings: {}", e))
}

fn cmd_compile(
    models: PathBuf,
    metrics: Option<PathBuf>,
    catalog: Option<PathBuf>,
    config: Option<PathBuf>,
    dialect: Option<DialectArg>,
    pretty: bool,
) -> ExitCode {
    let inputs = (|| -> Result<_, String> {
        let settings = load_settings(config)?;
        let models: Vec<Value> = read_json(&models)?;
        let metrics: Vec<DbtMetric> = match &metrics {
            Some(path) => read_json(path)?,
            None => Vec::new(),
        };
        let catalog: Option<WarehouseCatalog> = match &catalog {
            Some(path) => Some(read_json(path)?),
            None => None,
        };
        Ok((settings, models, metrics, catalog))
    })();
    let (mut settings, models, metrics, catalog) = match inputs {
        Ok(inputs) => inputs,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::FAILURE;
        }
    };

    if let Some(dialect) = dialect {
        settings.warehouse.dialect = dialect.into();
    }
    let builder: DialectSqlBuilder = settings.warehouse.sql_builder();
    let options = CompileOptions::from_settings(&settings);

    let outcomes = compile_values(models, catalog.as_ref(), &metrics, &builder, &options);

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    if failed > 0 {
        eprintln!("{} of {} explores failed to compile", failed, outcomes.len());
    }
    print_json(&outcomes, pretty)
}

fn cmd_lineage(models: PathBuf, model: String) -> ExitCode {
    let models = match read_json::<Vec<Value>>(&models) {
        Ok(values) => parse_models(values).models,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::FAILURE;
        }
    };

    let Some(target) = models.iter().find(|m| m.name == model) else {
        eprintln!("Model '{}' not found", model);
        return ExitCode::FAILURE;
    };

    let graph = ModelGraph::build(&models);
    print_json(&graph.lineage_for(target), true)
}
