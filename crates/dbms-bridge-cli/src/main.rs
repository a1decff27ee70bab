//! dbms-bridge CLI - per-database SQL capabilities and dialect translation.

use clap::{Parser, Subcommand};
use dbms_bridge::{
    split_statements, Config, Dbms, DbmsError, DbmsSelector, LockWait, TranslatorRegistry,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "dbms-bridge")]
#[command(about = "Per-database SQL capabilities and dialect translation")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "warn")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the supported dialects
    Dialects,

    /// Split a script into statements
    Split {
        /// Script file
        file: PathBuf,
    },

    /// Translate a script from one dialect to another
    Translate {
        /// Dialect the script is written in
        #[arg(long)]
        from: Dbms,

        /// Dialect to translate to
        #[arg(long)]
        to: Dbms,

        /// Script file
        file: PathBuf,
    },

    /// Build the locking read for a dialect
    LockQuery {
        /// Target dialect
        #[arg(long)]
        dialect: Dbms,

        /// Server version, for version-aware dialects
        #[arg(long, default_value = "")]
        server_version: String,

        /// Rows per read (default: locking.batch_size from config)
        #[arg(long)]
        batch_size: Option<u32>,

        /// Lock wait: negative skips locked rows, 0 fails fast, n waits n seconds
        #[arg(long, allow_negative_numbers = true)]
        wait: Option<i32>,

        /// Build the non-locking peek instead
        #[arg(long)]
        peek: bool,

        /// SELECT statement
        query: String,
    },

    /// Show the capability chosen for a reported product
    Select {
        /// Product name as reported by the driver
        #[arg(long)]
        product: String,

        /// Product version as reported by the driver
        #[arg(long, default_value = "")]
        version: String,
    },
}

#[derive(Debug, Serialize)]
struct DialectInfo {
    key: &'static str,
    product_name: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct TranslationOutput {
    source: Dbms,
    target: Dbms,
    statements: Vec<String>,
}

#[derive(Debug, Serialize)]
struct LockQueryOutput {
    dialect: Dbms,
    batch_size: u32,
    wait: LockWait,
    query: String,
}

#[derive(Debug, Serialize)]
struct SelectionOutput {
    product: String,
    version: String,
    dialect: Dbms,
    skip_locked: bool,
    parameter_type_match_required: bool,
    lob_strategy: String,
    sys_date: String,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> Result<(), DbmsError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| DbmsError::Config(e.to_string()))?;

    let config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => Config::default(),
    };

    match cli.command {
        Commands::Dialects => {
            let dialects: Vec<DialectInfo> = Dbms::ALL
                .iter()
                .filter(|dbms| **dbms != Dbms::None)
                .map(|dbms| DialectInfo {
                    key: dbms.key(),
                    product_name: dbms.product_name(),
                })
                .collect();
            if cli.output_json {
                print_json(&dialects)?;
            } else {
                for dialect in &dialects {
                    println!(
                        "{:<12} {}",
                        dialect.key,
                        dialect.product_name.unwrap_or("-")
                    );
                }
            }
        }

        Commands::Split { file } => {
            let script = read_script(&file)?;
            let statements = split_statements(&script);
            debug!("split {:?} into {} statements", file, statements.len());
            if cli.output_json {
                print_json(&statements)?;
            } else {
                println!("{}", statements.join("\n\n"));
            }
        }

        Commands::Translate { from, to, file } => {
            if to == Dbms::None {
                return Err(DbmsError::Config(
                    "'none' is not a translation target".to_string(),
                ));
            }
            let script = read_script(&file)?;
            let registry = TranslatorRegistry::from_config(&config.translation);
            if cli.output_json {
                print_json(&TranslationOutput {
                    source: from,
                    target: to,
                    statements: registry.translate_statements(from, to, &script)?,
                })?;
            } else {
                println!("{}", registry.translate_script(from, to, &script)?);
            }
        }

        Commands::LockQuery {
            dialect,
            server_version,
            batch_size,
            wait,
            peek,
            query,
        } => {
            let selector = DbmsSelector::from_config(&config.selector)?;
            let capability = selector.select_dialect(dialect, &server_version)?;
            let batch_size = batch_size.unwrap_or(config.locking.batch_size);
            let wait = wait.map(LockWait::new).unwrap_or(config.locking.default_wait);
            let query = if peek {
                capability.peek_query(&query, batch_size, wait)?
            } else {
                capability.locking_read_query(&query, batch_size, wait)?
            };
            if cli.output_json {
                print_json(&LockQueryOutput {
                    dialect: capability.dbms(),
                    batch_size,
                    wait,
                    query,
                })?;
            } else {
                println!("{}", query);
            }
        }

        Commands::Select { product, version } => {
            let selector = DbmsSelector::from_config(&config.selector)?;
            let capability = selector.select(&product, &version)?;
            let output = SelectionOutput {
                product,
                version,
                dialect: capability.dbms(),
                skip_locked: capability.has_skip_locked(),
                parameter_type_match_required: capability.is_parameter_type_match_required(),
                lob_strategy: format!("{:?}", capability.lob_strategy()),
                sys_date: capability.sys_date().to_string(),
            };
            if cli.output_json {
                print_json(&output)?;
            } else {
                println!("Product: {} {}", output.product, output.version);
                println!("  Dialect: {}", output.dialect);
                println!("  Skip locked: {}", output.skip_locked);
                println!(
                    "  Parameter type match required: {}",
                    output.parameter_type_match_required
                );
                println!("  LOB strategy: {}", output.lob_strategy);
                println!("  Current date: {}", output.sys_date);
            }
        }
    }

    Ok(())
}

fn read_script(path: &Path) -> Result<String, DbmsError> {
    Ok(std::fs::read_to_string(path)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), DbmsError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| DbmsError::Config(format!("cannot render JSON output: {}", e)))?;
    println!("{}", json);
    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("unknown verbosity '{}'", other)),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format '{}'", other)),
    }

    Ok(())
}
