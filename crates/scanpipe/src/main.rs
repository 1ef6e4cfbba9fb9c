//! Console front end for the scan pipeline.
//!
//! Reads one JSON request per line from stdin, e.g.
//! `{"name": "Taxes", "mode": "Color", "resolution": "200"}`, and writes every
//! status snapshot of the submitted jobs to stdout as a JSON line.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use scanpipe::config::{default_config_path, load_config};
use scanpipe::{
    CommandRunner, JobRequest, JobStatus, PipelineConfig, Requester, Scheduler, ServiceConfig,
    StatusReporter, ToolRunner,
};

#[derive(Parser, Debug)]
#[command(name = "scanpipe", version, about = "Scan documents into OCR'd PDFs")]
struct Cli {
    /// Directory for scans (overrides the config file)
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Path to a JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_logging(cli: &Cli) -> Result<()> {
    tracing_log::LogTracer::init().context("Failed to install log bridge")?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    let result = if cli.json_logs {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .try_init()
    } else {
        registry.with(fmt::layer().with_writer(io::stderr)).try_init()
    };
    result.context("Failed to initialize logging")
}

fn resolve_config(cli: &Cli) -> Result<ServiceConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => {
                info!("Using config file {}", path.display());
                load_config(&path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))?
            }
            None => ServiceConfig::default(),
        },
    };

    if let Some(dir) = &cli.dir {
        config.output_directory = dir.clone();
    }

    Ok(config)
}

fn failure_line(error: &serde_json::Error) -> Vec<u8> {
    serde_json::json!({
        "status": JobStatus::Failed,
        "message": format!("failed: {}", error),
    })
    .to_string()
    .into_bytes()
}

/// Starts the workers, serves every request line of `input` and writes the
/// resulting status lines to `output`. Jobs already submitted are always
/// drained before returning, including when reading or submitting fails.
fn run<R, W>(
    input: R,
    config: &ServiceConfig,
    runner: Arc<dyn ToolRunner>,
    output: W,
) -> Result<()>
where
    R: BufRead,
    W: Write + Send + 'static,
{
    let reporter = StatusReporter::new();
    let scheduler = Scheduler::start(
        PipelineConfig::from_config(config),
        runner,
        reporter.clone(),
    )?;

    let (requester, responses) = Requester::channel(config.requester_buffer);
    let printer = thread::spawn(move || {
        let mut out = output;
        for response in responses {
            if out
                .write_all(&response)
                .and_then(|_| out.write_all(b"\n"))
                .and_then(|_| out.flush())
                .is_err()
            {
                break;
            }
        }
    });

    let served = serve(input, config, &scheduler, &reporter, &requester);
    if let Err(e) = &served {
        error!("Stopped accepting requests: {:#}", e);
    }

    scheduler.shutdown();
    drop(requester);
    if printer.join().is_err() {
        warn!("Status printer panicked");
    }

    served
}

fn serve<R: BufRead>(
    input: R,
    config: &ServiceConfig,
    scheduler: &Scheduler,
    reporter: &StatusReporter,
    requester: &Requester,
) -> Result<()> {
    for line in input.lines() {
        let line = line.context("Failed to read request")?;
        if line.trim().is_empty() {
            continue;
        }

        match JobRequest::from_json(&line) {
            Ok(request) => {
                let mut job = request.into_job(config).with_requester(requester.clone());
                reporter.report(&mut job, JobStatus::InProgress, "queued for scanning");
                scheduler.submit(job)?;
            }
            Err(e) => {
                warn!("job request error: {}", e);
                requester.deliver(failure_line(&e));
            }
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config = resolve_config(&cli)?;
    std::fs::create_dir_all(&config.output_directory).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_directory.display()
        )
    })?;
    info!(
        "Starting scanpipe v{} writing to {}",
        env!("CARGO_PKG_VERSION"),
        config.output_directory.display()
    );

    run(io::stdin().lock(), &config, Arc::new(CommandRunner), io::stdout())
}
