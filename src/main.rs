use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use chrono::NaiveDate;
use nxfdash::config::{DashboardConfig, LogFormat};
use nxfdash::history::{
    build_view, CriteriaError, FilterCriteria, RunSummary, SortKey, SortOrder, TimeWindow,
    ViewRequest,
};

#[derive(Parser)]
#[command(
    name = "nxfdash",
    about = "Execution analytics for Nextflow pipeline runs",
    version,
    long_about = None
)]
struct Cli {
    /// Config file (defaults to $NXFDASH_CONFIG, then /etc/nxfdash/nxfdash.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List pipeline runs matching the filters
    Runs {
        #[command(flatten)]
        filter: FilterArgs,

        /// Case-insensitive search over query id, database and query text
        #[arg(long)]
        search: Option<String>,

        /// Sort column: end-time, execution-time, status, query-id
        #[arg(long, default_value = "end-time")]
        sort: SortKey,

        /// Sort order: asc or desc
        #[arg(long, default_value = "desc")]
        order: SortOrder,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Summarize pipeline runs matching the filters
    Summary {
        #[command(flatten)]
        filter: FilterArgs,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Format a number of seconds as e.g. 1hr25min30sec
    #[command(allow_negative_numbers = true)]
    Format {
        seconds: f64,
    },

    /// Serve the run history API
    Serve {
        /// Exported query-history rows (JSON array)
        #[arg(long)]
        input: PathBuf,

        /// Bind address (overrides server.listen_address)
        #[arg(long)]
        bind: Option<String>,
    },

    /// List workdir stage paths of a run's report, timeline and trace
    Artifacts {
        /// Nextflow run name, e.g. r017n26s
        run_name: String,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Args)]
struct FilterArgs {
    /// Exported query-history rows (JSON array)
    #[arg(long)]
    input: PathBuf,

    /// Lookback window, e.g. 6h or 2d (max 3d)
    #[arg(long)]
    window: Option<TimeWindow>,

    /// Keep only these statuses (repeatable)
    #[arg(long = "status")]
    statuses: Vec<String>,

    /// Minimum execution time in seconds
    #[arg(long)]
    min_elapsed: Option<f64>,

    /// Maximum execution time in seconds
    #[arg(long)]
    max_elapsed: Option<f64>,

    /// Earliest end date to keep (YYYY-MM-DD, inclusive)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Latest end date to keep (YYYY-MM-DD, inclusive)
    #[arg(long)]
    to: Option<NaiveDate>,
}

impl FilterArgs {
    fn criteria(&self, config: &DashboardConfig) -> Result<FilterCriteria, CriteriaError> {
        let window = self.window.unwrap_or(config.dashboard.default_window);
        let mut criteria = FilterCriteria::unbounded(window)
            .with_elapsed_bounds(self.min_elapsed, self.max_elapsed)?
            .with_date_range(self.from, self.to)?;
        if !self.statuses.is_empty() {
            criteria = criteria.with_statuses(self.statuses.iter().map(String::as_str));
        }
        Ok(criteria)
    }
}

fn load_config(path: Option<&Path>) -> Result<DashboardConfig> {
    match path {
        Some(p) => DashboardConfig::load(p),
        None => Ok(DashboardConfig::load_or_default()),
    }
}

/// Subscriber used only while the config (and with it the log settings) loads.
fn bootstrap_subscriber() -> impl tracing::Subscriber + Send + Sync {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish()
}

fn init_tracing(config: &DashboardConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match config.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = tracing::subscriber::with_default(bootstrap_subscriber(), || {
        load_config(cli.config.as_deref())
    })?;
    init_tracing(&config);

    match cli.command {
        Commands::Runs {
            filter,
            search,
            sort,
            order,
            json,
        } => {
            let rows = nxfdash::source::load_rows(&filter.input)?;
            let request = ViewRequest {
                criteria: filter.criteria(&config)?,
                search,
                sort,
                order,
            };
            tracing::info!(window = %request.criteria.time_window, "listing pipeline runs");
            let view = build_view(&rows, &request, chrono::Utc::now());

            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                println!(
                    "{:<24} | {:<19} | {:<10} | {:<16} | Execution Time",
                    "Query ID", "End Time", "Status", "Warehouse"
                );
                println!("{:-<24}-|-{:-<19}-|-{:-<10}-|-{:-<16}-|-{:-<14}", "", "", "", "", "");
                for row in &view.rows {
                    println!(
                        "{:<24} | {:<19} | {:<10} | {:<16} | {}",
                        row.query_id,
                        row.end_time,
                        row.status,
                        row.warehouse.as_deref().unwrap_or("-"),
                        row.execution_time
                    );
                }
                println!(
                    "\nShowing {} of {} runs ({})",
                    view.rows.len(),
                    view.loaded,
                    request.criteria.time_window.label()
                );
                if view.skipped > 0 {
                    println!("Skipped {} malformed rows", view.skipped);
                }
            }
        }
        Commands::Summary { filter, json } => {
            let rows = nxfdash::source::load_rows(&filter.input)?;
            let request = ViewRequest {
                criteria: filter.criteria(&config)?,
                ..Default::default()
            };
            let view = build_view(&rows, &request, chrono::Utc::now());
            let summary = RunSummary::from_view(&view, &config.dashboard.success_status());

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("\n=== Nextflow Pipeline Overview ===");
                println!("Source:             {}", config.warehouse.history_table);
                println!("Window:             {}", request.criteria.time_window.label());
                println!("Pipeline runs:      {}", summary.total_runs);
                println!(
                    "Outside filter:     {} (delta {:+})",
                    summary.runs_outside_filter, summary.runs_delta
                );
                println!("Avg execution time: {}", summary.avg_execution_time);
                println!("Success rate:       {:.1}%", summary.success_rate_pct);
                println!("Total compute time: {}", summary.total_compute_time);
                println!("Unique warehouses:  {}", summary.unique_warehouses);
                println!("Unique databases:   {}", summary.unique_databases);
                if !summary.daily_counts.is_empty() {
                    println!("\nDaily runs by status:");
                    for d in &summary.daily_counts {
                        println!(" - {} {:<10} {}", d.date, d.status, d.count);
                    }
                }
                if view.skipped > 0 {
                    println!("\nSkipped {} malformed rows", view.skipped);
                }
                println!("==================================\n");
            }
        }
        Commands::Format { seconds } => {
            let formatted = nxfdash::duration::format_duration(seconds)?;
            println!("{}", formatted);
        }
        Commands::Serve { input, bind } => {
            let rows = nxfdash::source::load_rows(&input)?;
            let bind = bind.unwrap_or_else(|| config.server.listen_address.clone());
            tracing::info!(%bind, "Starting nxfdash API");
            nxfdash::serve(&bind, rows, config)
                .await
                .context("API server failed")?;
        }
        Commands::Artifacts { run_name, json } => {
            let run_name = run_name.trim();
            if run_name.is_empty() {
                anyhow::bail!("run name must not be empty");
            }
            let paths = config.warehouse.artifact_paths(run_name);
            if json {
                println!("{}", serde_json::to_string_pretty(&paths)?);
            } else {
                for p in &paths {
                    println!("{:<10} {}", p.artifact, p.path);
                }
            }
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
