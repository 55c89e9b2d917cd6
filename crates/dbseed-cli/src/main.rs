//! dbseed CLI - load fixture datasets into a database in bounded chunks.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use dbseed::drivers::{self, DryRunConnection};
use dbseed::operation::{effective_chunk_size, ChunkPlanner};
use dbseed::{
    load_yaml_dataset, BulkInsert, Config, CsvDataSet, DataSet, DataTable, DatabaseOperation,
    Direction, LoadReport, MemoryDataSet, OperationKind, SeedError, TargetConfig,
};
use serde_json::json;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "dbseed")]
#[command(about = "Load fixture datasets into PostgreSQL, SQL Server or MySQL")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "dbseed.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a dataset into the configured target
    Load {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Override maximum rows per INSERT statement
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Insert tables in reverse dataset order
        #[arg(long)]
        reverse: bool,

        /// Truncate every dataset table before inserting
        #[arg(long)]
        clean: bool,

        /// Record the statements instead of connecting to the target
        #[arg(long)]
        dry_run: bool,
    },

    /// Show how each table would be split into statements, without a database.
    ///
    /// Chunk sizes are limited using the dataset's columns; a load uses the
    /// destination table's columns, which may be wider.
    Plan {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Override maximum rows per INSERT statement
        #[arg(long)]
        chunk_size: Option<usize>,
    },
}

#[derive(Args)]
struct DatasetArgs {
    /// YAML dataset file
    #[arg(long, conflicts_with = "csv")]
    dataset: Option<PathBuf>,

    /// CSV file for one table, as TABLE=PATH (repeatable, loaded in order)
    #[arg(long, value_name = "TABLE=PATH")]
    csv: Vec<String>,

    /// Field value read as NULL in CSV files
    #[arg(long, default_value = dbseed::dataset::DEFAULT_NULL_MARKER)]
    csv_null: String,
}

impl DatasetArgs {
    fn load(&self) -> Result<MemoryDataSet, SeedError> {
        if let Some(path) = &self.dataset {
            let dataset = load_yaml_dataset(path)?;
            info!("Loaded {} tables from {:?}", dataset.len(), path);
            return Ok(dataset);
        }
        if self.csv.is_empty() {
            return Err(SeedError::Config(
                "a dataset is required: pass --dataset <file.yaml> or --csv <table=path>".into(),
            ));
        }

        let mut csv = CsvDataSet::new().with_null_marker(self.csv_null.clone());
        for spec in &self.csv {
            let (table, path) = spec.split_once('=').ok_or_else(|| {
                SeedError::Config(format!("--csv expects TABLE=PATH, got '{}'", spec))
            })?;
            csv.add_table(table.trim(), path.trim())?;
        }
        Ok(csv.into_dataset())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), SeedError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(SeedError::Config)?;

    match &cli.command {
        Commands::Load {
            dataset,
            chunk_size,
            reverse,
            clean,
            dry_run,
        } => {
            let mut config = if *dry_run {
                load_config_or_default(&cli.config)?
            } else {
                let config = Config::load(&cli.config)?;
                info!("Loaded configuration from {:?}", cli.config);
                config
            };

            // Apply CLI overrides
            if let Some(size) = chunk_size {
                config.load.chunk_size = *size;
            }
            if *reverse {
                config.load.direction = Direction::Reverse;
            }
            if *clean {
                config.load.operation = OperationKind::CleanInsert;
            }
            config.validate()?;

            let dataset = dataset.load()?;
            let report = load(&config, &dataset, *dry_run, cli.output_json).await?;
            print_report(&report, cli.output_json)?;
        }

        Commands::Plan {
            dataset,
            chunk_size,
        } => {
            let mut config = load_config_or_default(&cli.config)?;
            if let Some(size) = chunk_size {
                config.load.chunk_size = *size;
            }
            config.validate()?;

            let dataset = dataset.load()?;
            print_plan(&config, &dataset, cli.output_json)?;
        }
    }

    Ok(())
}

async fn load(
    config: &Config,
    dataset: &MemoryDataSet,
    dry_run: bool,
    output_json: bool,
) -> Result<LoadReport, SeedError> {
    let operation = config
        .load
        .operation
        .build(config.load.chunk_size, config.load.direction);
    info!(
        "Running {} against {} ({})",
        operation.name(),
        config.target.display_name(),
        config.target.r#type
    );

    if dry_run {
        let mut conn = DryRunConnection::with_dialect(drivers::dialect_for(&config.target.r#type)?)
            .with_dataset(dataset);
        let report = operation.execute(&mut conn, dataset).await?;
        if !output_json {
            for (sql, args) in conn.statements() {
                println!("{};  -- {} args", sql, args.len());
            }
        }
        return Ok(report);
    }

    let mut conn = drivers::connect(&config.target).await?;
    operation.execute(conn.as_mut(), dataset).await
}

/// Use the config file if it exists, defaults otherwise (no database needed).
fn load_config_or_default(path: &Path) -> Result<Config, SeedError> {
    if path.exists() {
        let config = Config::load(path)?;
        info!("Loaded configuration from {:?}", path);
        return Ok(config);
    }
    Ok(Config {
        target: TargetConfig {
            r#type: "postgres".to_string(),
            host: "localhost".to_string(),
            port: None,
            database: "dbseed".to_string(),
            user: "dbseed".to_string(),
            password: String::new(),
            ssl_mode: "disable".to_string(),
        },
        load: Default::default(),
    })
}

fn print_report(report: &LoadReport, output_json: bool) -> Result<(), SeedError> {
    if output_json {
        println!("{}", report.to_json()?);
        return Ok(());
    }
    for table in &report.tables {
        println!(
            "{:<14} {:<30} {:>8} rows {:>6} statements",
            table.operation, table.table, table.rows, table.statements
        );
    }
    println!(
        "Done: {} rows in {} statements",
        report.total_rows(),
        report.total_statements()
    );
    Ok(())
}

fn print_plan(config: &Config, dataset: &dyn DataSet, output_json: bool) -> Result<(), SeedError> {
    let dialect = drivers::dialect_for(&config.target.r#type)?;
    let mut tables = Vec::new();

    for table in config.load.direction.tables(dataset) {
        let columns = table.metadata().column_count();
        let limit = dialect.max_parameters();
        let chunk_size = effective_chunk_size(config.load.chunk_size, columns, limit).ok_or_else(|| {
            SeedError::TooManyColumns {
                operation: BulkInsert::NAME.to_string(),
                table: table.name().to_string(),
                columns,
                limit: limit.unwrap_or_default(),
            }
        })?;
        let chunks: Vec<_> = ChunkPlanner::new(table.row_count(), chunk_size).collect();

        if output_json {
            tables.push(json!({
                "table": table.name(),
                "rows": table.row_count(),
                "columns": columns,
                "chunk_size": chunk_size,
                "chunks": chunks.iter().map(|c| json!({"start": c.start, "len": c.len})).collect::<Vec<_>>(),
            }));
            continue;
        }

        println!(
            "{}: {} rows, {} columns, chunk size {}",
            table.name(),
            table.row_count(),
            columns,
            chunk_size
        );
        for (i, chunk) in chunks.iter().enumerate() {
            println!("  statement {}: rows {}..{}", i + 1, chunk.start, chunk.end());
        }
    }

    if output_json {
        println!("{}", serde_json::to_string_pretty(&tables)?);
    }
    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("Invalid verbosity '{}': use debug, info, warn or error", other)),
    };

    // stdout carries reports and plans
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("Invalid log format '{}': use text or json", other)),
    }

    Ok(())
}
