//! Metrics Runtime CLI - inspect the catalog and compile metrics queries
//!
//! Usage:
//!   metrics-runtime objects list --tenant <id> [--type <type>]
//!   metrics-runtime objects create --tenant <id> <name> --type metrics_view [--sql <sql>]
//!   metrics-runtime compile toplist <request.json>
//!
//! Examples:
//!   metrics-runtime objects get --tenant default ad_bids
//!   metrics-runtime compile totals requests/totals.json
//!   metrics-runtime --config ./metrics-runtime.toml compile timeseries requests/ts.json

use clap::{Parser, Subcommand, ValueEnum};
use metrics_runtime::catalog::{CatalogObject, CatalogStore, ObjectType, SqliteCatalog};
use metrics_runtime::config::Settings;
use metrics_runtime::query::{
    compile_timeseries, compile_toplist, compile_totals, CompileOptions, CompiledQuery,
    TimeSeriesRequest, ToplistRequest, TotalsRequest,
};
use metrics_runtime::schema::StructType;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "metrics-runtime")]
#[command(about = "Metrics Runtime - catalog store and metrics view query compiler")]
#[command(version)]
struct Cli {
    /// Path to a config file (overrides the default search)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage catalog objects
    Objects {
        #[command(subcommand)]
        command: ObjectCommands,
    },

    /// Compile a metrics view request (JSON file) to SQL
    Compile {
        /// Request shape
        kind: RequestKind,

        /// Path to the JSON request
        request: PathBuf,

        /// Print the compiled query as JSON instead of SQL and arguments
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ObjectCommands {
    /// List objects in a tenant's catalog
    List {
        #[arg(short, long)]
        tenant: String,

        /// Only list objects of this type
        #[arg(long = "type", value_parser = parse_object_type)]
        object_type: Option<ObjectType>,
    },

    /// Show one object (name lookup is case-insensitive)
    Get {
        #[arg(short, long)]
        tenant: String,

        name: String,
    },

    /// Create an object
    Create {
        #[arg(short, long)]
        tenant: String,

        name: String,

        #[arg(long = "type", value_parser = parse_object_type)]
        object_type: ObjectType,

        /// Defining SQL
        #[arg(long)]
        sql: Option<String>,

        /// Path to a JSON schema ({"fields": [...]})
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Mark the object as system-managed
        #[arg(long)]
        managed: bool,
    },

    /// Delete an object (no error if it does not exist)
    Delete {
        #[arg(short, long)]
        tenant: String,

        name: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RequestKind {
    Toplist,
    Timeseries,
    Totals,
}

fn parse_object_type(s: &str) -> Result<ObjectType, String> {
    s.parse()
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = match load_settings(cli.config.as_ref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Objects { command } => cmd_objects(&settings, command),
        Commands::Compile {
            kind,
            request,
            json,
        } => cmd_compile(&settings, kind, request, json),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("metrics_runtime=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("metrics_runtime=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings, String> {
    let settings = match path {
        Some(p) => Settings::from_file(p),
        None => Settings::load(),
    };
    settings.map_err(|e| e.to_string())
}

fn open_catalog(settings: &Settings) -> Result<SqliteCatalog, String> {
    let path = settings.catalog.resolved_path().map_err(|e| e.to_string())?;
    let catalog = match path {
        Some(p) => SqliteCatalog::open(&p),
        None => {
            tracing::warn!("no catalog path configured, using an in-memory catalog");
            SqliteCatalog::open_in_memory()
        }
    };
    catalog.map_err(|e| e.to_string())
}

fn cmd_objects(settings: &Settings, command: ObjectCommands) -> ExitCode {
    let catalog = match open_catalog(settings) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error opening catalog: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match command {
        ObjectCommands::List {
            tenant,
            object_type,
        } => catalog
            .find_objects(&tenant, object_type)
            .map_err(|e| e.to_string())
            .and_then(|objects| print_json(&objects)),
        ObjectCommands::Get { tenant, name } => match catalog.find_object(&tenant, &name) {
            Ok(Some(obj)) => print_json(&obj),
            Ok(None) => Err(format!("object not found: {}", name)),
            Err(e) => Err(e.to_string()),
        },
        ObjectCommands::Create {
            tenant,
            name,
            object_type,
            sql,
            schema,
            managed,
        } => build_object(name, object_type, sql, schema, managed).and_then(|obj| {
            catalog
                .create_object(&tenant, obj)
                .map_err(|e| e.to_string())
                .and_then(|created| print_json(&created))
        }),
        ObjectCommands::Delete { tenant, name } => catalog
            .delete_object(&tenant, &name)
            .map_err(|e| e.to_string()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn build_object(
    name: String,
    object_type: ObjectType,
    sql: Option<String>,
    schema: Option<PathBuf>,
    managed: bool,
) -> Result<CatalogObject, String> {
    let mut obj = CatalogObject::new(name, object_type).managed(managed);
    if let Some(sql) = sql {
        obj = obj.with_sql(sql);
    }
    if let Some(path) = schema {
        let schema: StructType = read_json(&path)?;
        obj = obj.with_schema(schema);
    }
    Ok(obj)
}

fn cmd_compile(settings: &Settings, kind: RequestKind, request: PathBuf, json: bool) -> ExitCode {
    let options = CompileOptions::from(&settings.query);

    let compiled = match kind {
        RequestKind::Toplist => read_json::<ToplistRequest>(&request)
            .and_then(|req| compile_toplist(&req, &options).map_err(|e| e.to_string())),
        RequestKind::Timeseries => read_json::<TimeSeriesRequest>(&request)
            .and_then(|req| compile_timeseries(&req, &options).map_err(|e| e.to_string())),
        RequestKind::Totals => read_json::<TotalsRequest>(&request)
            .and_then(|req| compile_totals(&req, &options).map_err(|e| e.to_string())),
    };

    match compiled {
        Ok(compiled) => {
            if json {
                if let Err(e) = print_json(&compiled) {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            } else {
                print_compiled(&compiled);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Compilation error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_compiled(compiled: &CompiledQuery) {
    println!("{}", compiled.sql);
    if !compiled.args.is_empty() {
        println!();
        println!("-- Arguments:");
        for (i, arg) in compiled.args.iter().enumerate() {
            let value = serde_json::to_string(arg).unwrap_or_else(|_| format!("{:?}", arg));
            println!("--   ${} = {}", i + 1, value);
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T, String> {
    let source = fs::read_to_string(path)
        .map_err(|e| format!("Error reading file '{}': {}", path.display(), e))?;
    serde_json::from_str(&source).map_err(|e| format!("Invalid JSON in '{}': {}", path.display(), e))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let out = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{}", out);
    Ok(())
}
