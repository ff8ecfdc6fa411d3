mod config;
mod logging;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use datagen_core::{
    DEFAULT_TABLE_NAME, Error as CoreError, ValidationReport, build_dependency_report, normalize,
    parse_table_schemas, validate_schema, validate_table_schemas,
};
use datagen_generate::output::json::write_combined_json;
use datagen_generate::{
    GenerationEngine, GenerationError, GenerationResult, OutputFormat, SchemaMap, WrittenFile,
    write_dataset, write_report,
};
use serde_json::Value;
use thiserror::Error;

use config::{FileConfig, Overrides, RunConfig, parse_count_entry};
use logging::{LogFormat, init_logging};

/// File name of the combined JSON document.
const COMBINED_FILE: &str = "dataset.json";

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config file: {0}")]
    Config(#[from] toml::de::Error),
    #[error("schema error: {0}")]
    Core(#[from] CoreError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("schema validation failed with {0} error(s)")]
    ValidationFailed(usize),
}

#[derive(Parser, Debug)]
#[command(name = "datagen", version, about = "Schema-driven synthetic data generator")]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,
    /// Append logs to this file instead of stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    /// Log at debug level unless RUST_LOG is set.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate records and write them to the output directory.
    Generate(GenerateArgs),
    /// Print the order in which tables would be generated.
    Order(SchemaArgs),
    /// Check a schema file and report errors and warnings.
    Validate(SchemaArgs),
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Schema file: one table schema or a map of table name to schema.
    schema: PathBuf,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Schema file: one table schema or a map of table name to schema.
    schema: PathBuf,
    /// Records per table unless overridden by --counts.
    #[arg(long)]
    count: Option<u64>,
    /// Per-table counts as TABLE=N, comma separated.
    #[arg(long, value_delimiter = ',', value_parser = parse_count_entry)]
    counts: Vec<(String, u64)>,
    /// Table name for a single-table schema.
    #[arg(long)]
    table: Option<String>,
    /// Seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,
    /// Anchor date for generated dates (YYYY-MM-DD).
    #[arg(long)]
    base_date: Option<NaiveDate>,
    /// Faker locale (en_US or pt_BR).
    #[arg(long)]
    locale: Option<String>,
    /// Output format: json, csv or sql.
    #[arg(long)]
    format: Option<OutputFormat>,
    /// Output directory.
    #[arg(long)]
    out: Option<PathBuf>,
    /// TOML config file. Defaults to ./datagen.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Fail on regex syntax the pattern generator does not understand.
    #[arg(long, default_value_t = false)]
    strict_patterns: bool,
    /// Write all tables into a single JSON document.
    #[arg(long, default_value_t = false)]
    combined: bool,
}

/// A schema file holds either one table or a map of tables.
#[derive(Debug)]
enum SchemaDocument {
    Single(Value),
    Tables(SchemaMap),
}

impl SchemaDocument {
    fn load(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_value(serde_json::from_str(&content)?)
    }

    fn from_value(value: Value) -> Result<Self, CliError> {
        match value {
            Value::Object(map) if map.contains_key("type") => Ok(Self::Single(Value::Object(map))),
            Value::Object(map) if map.is_empty() => Err(CliError::InvalidConfig(
                "schema file contains no tables".to_string(),
            )),
            Value::Object(map) => Ok(Self::Tables(map.into_iter().collect())),
            _ => Err(CliError::InvalidConfig(
                "schema file must contain a JSON object".to_string(),
            )),
        }
    }
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_file.as_deref(), cli.verbose)?;

    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Order(args) => run_order(args),
        Command::Validate(args) => run_validate(args),
    }
}

fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let file = FileConfig::load(args.config.as_deref())?;
    let config = RunConfig::resolve(
        file,
        Overrides {
            seed: args.seed,
            base_date: args.base_date,
            locale: args.locale,
            strict_patterns: args.strict_patterns,
            format: args.format,
            out_dir: args.out,
            count: args.count,
            counts: args.counts.into_iter().collect(),
        },
    );
    if args.combined && config.format != OutputFormat::Json {
        return Err(CliError::InvalidConfig(
            "--combined requires the json format".to_string(),
        ));
    }

    let engine = GenerationEngine::new(config.options.clone());
    let result = match SchemaDocument::load(&args.schema)? {
        SchemaDocument::Single(schema) => {
            let table = args.table.as_deref().unwrap_or(DEFAULT_TABLE_NAME);
            let count = config
                .counts
                .get(table)
                .copied()
                .unwrap_or(config.default_count);
            engine.generate_table(table, &schema, count)?
        }
        SchemaDocument::Tables(schemas) => {
            if args.table.is_some() {
                return Err(CliError::InvalidConfig(
                    "--table only applies to single-table schema files".to_string(),
                ));
            }
            let counts = config.counts_for(schemas.keys());
            engine.generate(&schemas, &counts)?
        }
    };

    let written = if args.combined {
        write_combined(&config.out_dir, &result)?
    } else {
        write_dataset(&config.out_dir, config.format, &result)?
    };
    for file in &written {
        println!("wrote {} ({} bytes)", file.path.display(), file.bytes);
    }
    println!(
        "generated {} records across {} tables (seed {})",
        result.report.total_records(),
        result.data.len(),
        result.report.seed
    );
    Ok(())
}

fn write_combined(dir: &Path, result: &GenerationResult) -> Result<Vec<WrittenFile>, CliError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(COMBINED_FILE);
    let bytes = write_combined_json(&path, &result.data)?;
    Ok(vec![
        WrittenFile { path, bytes },
        write_report(dir, &result.report)?,
    ])
}

fn run_order(args: SchemaArgs) -> Result<(), CliError> {
    match SchemaDocument::load(&args.schema)? {
        SchemaDocument::Single(_) => println!("{DEFAULT_TABLE_NAME}"),
        SchemaDocument::Tables(schemas) => {
            let document = Value::Object(
                schemas
                    .into_iter()
                    .map(|(table, schema)| (table, normalize(schema)))
                    .collect(),
            );
            let report = build_dependency_report(&parse_table_schemas(&document)?);
            for table in &report.order {
                println!("{table}");
            }
            for cycle in &report.cycles {
                eprintln!("cycle: {}", cycle.join(" -> "));
            }
        }
    }
    Ok(())
}

fn run_validate(args: SchemaArgs) -> Result<(), CliError> {
    let report = match SchemaDocument::load(&args.schema)? {
        SchemaDocument::Single(schema) => validate_schema(&schema),
        SchemaDocument::Tables(schemas) => {
            validate_table_schemas(&Value::Object(schemas.into_iter().collect()))
        }
    };
    print_validation(&report);
    if !report.is_valid() {
        return Err(CliError::ValidationFailed(report.errors.len()));
    }
    println!("schema is valid");
    Ok(())
}

fn print_validation(report: &ValidationReport) {
    for issue in &report.errors {
        println!("error: {issue}");
    }
    for issue in &report.warnings {
        println!("warning: {issue}");
    }
}
