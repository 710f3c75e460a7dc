//! cosmoframe CLI
//!
//! Command-line interface for cosmoframe:
//! - Serve the query API
//! - Run a one-off query and print the frame
//! - Check the data source
//! - Generate a config file
//!
//! # Configuration
//!
//! Read from `--config`, else the default locations (see
//! [`Config::load_default`]). `COSMOFRAME_*` environment variables override
//! file values; `RUST_LOG` overrides the configured log level.

use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cosmoframe::api::{serve, ApiConfig, AppState};
use cosmoframe::config::{generate_default_config, Config, LoggingConfig};
use cosmoframe::datasource::{DataQuery, DataSource, QueryDataRequest};
use cosmoframe::frame::{FieldValues, Frame};
use cosmoframe::query::{parse_query_model, TimeRange};
use cosmoframe::store::{ContainerRef, MemoryStore};

#[derive(Parser)]
#[command(name = "cosmoframe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query Cosmos DB containers into typed data frames")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the usual locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the query API
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run one query and print the resulting frame
    Query {
        /// Database (default: from config)
        #[arg(short, long)]
        database: Option<String>,
        /// Container (default: from config)
        #[arg(short = 'C', long)]
        container: Option<String>,
        /// Partition key value (default: from config)
        #[arg(short = 'k', long)]
        partition_key: Option<String>,
        /// Comma-separated columns, or * for all
        #[arg(long, default_value = "*")]
        columns: String,
        /// Time range ending now (e.g. 30m, 24h, 7d, 2w)
        #[arg(short, long, default_value = "24h")]
        last: String,
        /// Range start (RFC 3339); overrides --last together with --to
        #[arg(long, requires = "to")]
        from: Option<DateTime<Utc>>,
        /// Range end (RFC 3339)
        #[arg(long, requires = "from")]
        to: Option<DateTime<Utc>>,
        /// Read documents from a JSON array file instead of the account
        #[arg(long)]
        documents: Option<PathBuf>,
    },

    /// Check that the data source can reach its account
    Health,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    init_tracing(&config.logging);

    match cli.command {
        Commands::Serve { host, port } => {
            tracing::info!("Starting cosmoframe API server v{}", env!("CARGO_PKG_VERSION"));

            let mut api_config = ApiConfig::from(&config.api);
            if let Some(host) = host {
                api_config.host = host;
            }
            if let Some(port) = port {
                api_config.port = port;
            }

            let settings = config.to_settings();
            tracing::info!(?settings, "Data source settings");
            let datasource = Arc::new(DataSource::new(&settings));

            let health = datasource.check_health().await;
            if health.is_ok() {
                tracing::info!("{}", health.message);
            } else {
                tracing::warn!("Data source not healthy: {} (queries will fail)", health.message);
            }

            let state = AppState::new(datasource, api_config.clone());
            serve(state, &api_config).await?;
        }

        Commands::Query {
            database,
            container,
            partition_key,
            columns,
            last,
            from,
            to,
            documents,
        } => {
            let time_range = match (from, to) {
                (Some(from), Some(to)) => TimeRange::new(from, to),
                _ => {
                    let to = Utc::now();
                    let from = to
                        .checked_sub_signed(parse_duration(&last)?)
                        .ok_or_else(|| format!("Duration {} reaches past the supported range", last))?;
                    TimeRange::new(from, to)
                }
            };

            let model = json!({
                "database": database,
                "container": container,
                "partitionKey": partition_key,
                "columns": columns,
            })
            .to_string();

            let settings = config.to_settings();
            let datasource = match documents {
                Some(path) => {
                    // Resolve the container the query will address so the
                    // file's documents land there
                    let resolved = parse_query_model(model.as_bytes(), &settings.defaults)?;
                    let store = load_documents(
                        &path,
                        ContainerRef::new(resolved.database, resolved.container),
                    )?;
                    DataSource::with_store(Arc::new(store)).defaults(settings.defaults.clone())
                }
                None => DataSource::new(&settings),
            };

            let request = QueryDataRequest::new(vec![DataQuery::new("A", time_range, model)]);
            let response = datasource.query_data(request).await;

            match cli.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&response)?),
                _ => {
                    for (ref_id, result) in &response.responses {
                        match &result.error {
                            Some(error) => eprintln!("{}: {}", ref_id, error),
                            None => result.frames.iter().for_each(print_table),
                        }
                    }
                }
            }

            if response.responses.values().any(|r| !r.is_ok()) {
                std::process::exit(1);
            }
        }

        Commands::Health => {
            let datasource = DataSource::new(&config.to_settings());
            let result = datasource.check_health().await;

            match cli.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&result)?),
                _ => {
                    println!("cosmoframe v{}", env!("CARGO_PKG_VERSION"));
                    println!();
                    println!("Data source: {}", if result.is_ok() { "ok" } else { "error" });
                    println!("  {}", result.message);
                }
            }

            if !result.is_ok() {
                std::process::exit(1);
            }
        }

        Commands::Config { output } => write_default_config(output.as_deref())?,
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("cosmoframe={},tower_http=info", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn write_default_config(output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = generate_default_config();

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &config)?;
            println!("Config written to {:?}", path);
        }
        None => {
            print!("{}", config);
        }
    }
    Ok(())
}

fn load_documents(
    path: &Path,
    container: ContainerRef,
) -> Result<MemoryStore, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let values: Vec<serde_json::Value> = serde_json::from_str(&content)?;
    tracing::info!(documents = values.len(), %container, "Loaded documents from {:?}", path);
    Ok(MemoryStore::new().with_values(container, values))
}

fn parse_duration(s: &str) -> Result<Duration, Box<dyn std::error::Error>> {
    let s = s.trim().to_lowercase();

    let (amount, unit): (&str, fn(i64) -> Option<Duration>) =
        if let Some(minutes) = s.strip_suffix('m') {
            (minutes, Duration::try_minutes)
        } else if let Some(hours) = s.strip_suffix('h') {
            (hours, Duration::try_hours)
        } else if let Some(days) = s.strip_suffix('d') {
            (days, Duration::try_days)
        } else if let Some(weeks) = s.strip_suffix('w') {
            (weeks, Duration::try_weeks)
        } else {
            return Err(format!("Invalid duration format: {}. Use 30m, 24h, 7d or 2w", s).into());
        };

    unit(amount.parse()?).ok_or_else(|| format!("Duration out of range: {}", s).into())
}

fn print_table(frame: &Frame) {
    let names = frame.field_names();
    println!("{}", names.join("\t"));

    for row in 0..frame.row_count() {
        let cells: Vec<String> = frame
            .fields
            .iter()
            .map(|field| match &field.values {
                FieldValues::Time(times) => times[row].to_rfc3339(),
                FieldValues::Number(numbers) => {
                    numbers[row].map(|n| n.to_string()).unwrap_or_default()
                }
                FieldValues::String(strings) => strings[row].clone().unwrap_or_default(),
            })
            .collect();
        println!("{}", cells.join("\t"));
    }

    println!();
    println!("{} rows, {} fields", frame.row_count(), frame.fields.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30m").unwrap(), Duration::minutes(30));
        assert_eq!(parse_duration("24h").unwrap(), Duration::hours(24));
        assert_eq!(parse_duration(" 7D ").unwrap(), Duration::days(7));
        assert_eq!(parse_duration("2w").unwrap(), Duration::weeks(2));
        assert!(parse_duration("7y").is_err());
        assert!(parse_duration("h").is_err());
    }

    #[test]
    fn test_parse_duration_out_of_range() {
        let err = parse_duration("9999999999999h").unwrap_err();
        assert_eq!(err.to_string(), "Duration out of range: 9999999999999h");
        assert!(parse_duration("99999999999999999999w").is_err());

        let longest = parse_duration("15250w").unwrap();
        assert!(Utc::now().checked_sub_signed(longest).is_some());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "cosmoframe", "query", "-d", "iot", "-C", "readings", "--columns", "a,b", "--last", "1h",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Query { ref columns, .. } if columns == "a,b"));

        assert!(Cli::try_parse_from(["cosmoframe", "query", "--from", "2024-01-01T00:00:00Z"]).is_err());
    }
}
