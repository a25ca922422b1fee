use clap::{Parser, Subcommand};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use reqbatch::aggregator::BatchResult;
use reqbatch::batch::{BatchSettings, Batcher};
use reqbatch::config::ConfigLoader;
use reqbatch::metrics::snapshot::MetricsSnapshot;
use reqbatch::output::{console::ConsoleReport, write_report, ReportHandler};
use reqbatch::request::{HttpMethod, RequestSpec};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "reqbatch")]
#[command(version = "0.1.0")]
#[command(about = "Fire a batch of HTTP requests concurrently and summarize the results", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a batch from a config file
    Run {
        /// Path to the configuration file (JSON/YAML/TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Show a progress bar (stderr)
        #[arg(short, long, default_value_t = false)]
        progress: bool,
    },
    /// Validate a configuration file
    Check {
        /// Path to the configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Send the same method to each URL given on the command line
    Fetch {
        #[arg(required = true)]
        urls: Vec<String>,

        #[arg(short, long, default_value = "GET")]
        method: HttpMethod,

        /// Maximum requests in flight (default: all at once)
        #[arg(short, long)]
        concurrency: Option<usize>,

        #[arg(short, long)]
        timeout_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        unsafe { std::env::set_var("RUST_LOG", "info"); }
    }
    let cli = Cli::parse();
    let logger = env_logger::Builder::from_default_env().build();
    let multi = Arc::new(MultiProgress::new());

    match cli.command {
        Commands::Run { config, progress } => {
            if progress {
                let level = logger.filter();
                indicatif_log_bridge::LogWrapper::new((*multi).clone(), logger).try_init()?;
                log::set_max_level(level);
            } else {
                init_plain_logger(logger)?;
            }

            log::info!("Loading config from {:?}", config);
            let config_data = ConfigLoader::load(&config)?;
            log::info!("Loaded batch: {}", config_data.name);

            let batcher = ConfigLoader::create_batcher(&config_data)?;
            let specs = ConfigLoader::request_specs(&config_data);
            let mut report = ConfigLoader::create_report(
                &config_data,
                progress.then(|| multi.clone()),
            )?;

            let progress_bar = progress.then(|| spawn_progress(&batcher, &multi));
            let result = run_until_interrupted(&batcher, specs).await?;

            if let Some((pb, task)) = progress_bar {
                task.abort();
                pb.finish_and_clear();
            }

            if let Some(result) = result {
                write_report(report.as_mut(), &result).await?;
                print_completion(&result);
            }
        }
        Commands::Check { config } => {
            init_plain_logger(logger)?;
            match ConfigLoader::load(&config) {
                Ok(cfg) => {
                    println!("✅ Config is valid:");
                    println!("   Name: {}", cfg.name);
                    println!("   Requests: {}", cfg.requests.len());
                    for spec in &cfg.requests {
                        println!("     {} {}", spec.method, spec.url);
                    }
                    match cfg.concurrency {
                        Some(n) => println!("   Concurrency: {}", n),
                        None => println!("   Concurrency: unbounded"),
                    }
                }
                Err(e) => {
                    eprintln!("❌ Config error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Fetch {
            urls,
            method,
            concurrency,
            timeout_ms,
        } => {
            init_plain_logger(logger)?;

            let mut settings = BatchSettings {
                concurrency,
                ..BatchSettings::default()
            };
            if let Some(ms) = timeout_ms {
                settings.timeout = Some(Duration::from_millis(ms));
            }
            let batcher = Batcher::new(settings)?;
            let specs: Vec<RequestSpec> = urls
                .into_iter()
                .map(|url| RequestSpec::new(method, url))
                .collect();

            if let Some(result) = run_until_interrupted(&batcher, specs).await? {
                let mut report: Box<dyn ReportHandler> = Box::new(ConsoleReport::default());
                write_report(report.as_mut(), &result).await?;
                print_completion(&result);
            }
        }
    }

    Ok(())
}

fn init_plain_logger(logger: env_logger::Logger) -> anyhow::Result<()> {
    let level = logger.filter();
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(level);
    Ok(())
}

/// Ctrl-C drops the in-flight batch and yields `None`.
async fn run_until_interrupted(
    batcher: &Batcher,
    specs: Vec<RequestSpec>,
) -> anyhow::Result<Option<BatchResult>> {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("Interrupted, abandoning in-flight requests.");
            Ok(None)
        }
        result = batcher.run(specs) => Ok(Some(result?)),
    }
}

fn spawn_progress(
    batcher: &Batcher,
    multi: &MultiProgress,
) -> (ProgressBar, tokio::task::JoinHandle<()>) {
    let pb = multi.add(ProgressBar::new(0));
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let mut metrics_rx = batcher.watch_metrics();
    let pb_clone = pb.clone();
    let task = tokio::spawn(async move {
        while metrics_rx.changed().await.is_ok() {
            let snapshot: MetricsSnapshot = metrics_rx.borrow().clone();
            pb_clone.set_length(snapshot.requests_queued);
            pb_clone.set_position(snapshot.requests_completed);
            pb_clone.set_message(format!(
                "In flight: {} | Failed: {} | RPS: {:.2}",
                snapshot.requests_in_flight, snapshot.requests_failed, snapshot.requests_per_second
            ));
        }
    });
    (pb, task)
}

fn print_completion(result: &BatchResult) {
    let stats = &result.stats;
    println!("\n✅ Batch Completed:");
    println!("   Requests: {}", stats.total_requests);
    println!("   Succeeded: {}", stats.succeeded());
    println!("   Failed: {}", stats.failed);
    println!("   Total Time: {:.3}s", stats.total_elapsed);
}
