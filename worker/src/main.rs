//! idproof worker: entry point for running the proofing pipeline.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use idproof_crypto::PayloadDecryptor;
use idproof_notify::HttpCallbackNotifier;
use idproof_proofing::{ProofingJob, ProofingMetrics, ProofingOrchestrator, VendorConfigResolver};
use idproof_store_lmdb::{check_integrity, LmdbEnvironment};
use idproof_types::{ApplicantIdentity, Timestamp};
use idproof_utils::{format_duration, init_logging, LogFormat};
use idproof_worker::{serve_until, spawn_workers, AppState, JobQueue, ShutdownController, WorkerConfig};

#[derive(Parser)]
#[command(name = "idproof-worker", about = "Identity-resolution proofing worker")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "IDPROOF_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the result store.
    #[arg(long, env = "IDPROOF_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "IDPROOF_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "IDPROOF_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the intake endpoint and the worker pool until SIGINT/SIGTERM.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "IDPROOF_LISTEN_ADDR")]
        listen: Option<std::net::SocketAddr>,

        /// Number of concurrent proofing runs.
        #[arg(long, env = "IDPROOF_WORKERS")]
        workers: Option<usize>,
    },
    /// Execute one job from a JSON file and print the resulting record.
    RunJob {
        #[arg(long)]
        job: PathBuf,
    },
    /// Seal an applicant (JSON on stdin) into `encrypted_arguments`.
    Encrypt {
        /// Key to seal under. Defaults to the primary key.
        #[arg(long)]
        key_id: Option<String>,
    },
    /// Remove expired results from the store.
    Purge,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => WorkerConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => WorkerConfig::default(),
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }

    init_logging(config.log_format, &config.log_level)?;
    if let Some(path) = &cli.config {
        tracing::info!("loaded config from {}", path.display());
    }

    match cli.command {
        Command::Serve { listen, workers } => {
            if let Some(listen) = listen {
                config.listen_addr = listen;
            }
            if let Some(workers) = workers {
                config.worker_count = workers;
            }
            run_serve(config).await
        }
        Command::RunJob { job } => run_job(config, job).await,
        Command::Encrypt { key_id } => encrypt(config, key_id),
        Command::Purge => purge(config),
    }
}

fn open_store(config: &WorkerConfig) -> anyhow::Result<LmdbEnvironment> {
    LmdbEnvironment::open(&config.data_dir, config.map_size)
        .with_context(|| format!("opening result store at {}", config.data_dir.display()))
}

fn build_orchestrator(
    config: &WorkerConfig,
    env: &LmdbEnvironment,
) -> anyhow::Result<ProofingOrchestrator> {
    config.validate()?;
    let decryptor = PayloadDecryptor::new(config.keyring()?);
    let resolver = VendorConfigResolver::new(config.proofing.clone())?;
    let store = Arc::new(env.result_store(config.result_ttl_secs));
    let notifier = Arc::new(HttpCallbackNotifier::with_timeout(Duration::from_millis(
        config.callback_timeout_ms,
    )));
    let metrics = Arc::new(ProofingMetrics::new()?);
    Ok(ProofingOrchestrator::new(decryptor, resolver, store, notifier, metrics)
        .with_default_adapters())
}

async fn run_serve(config: WorkerConfig) -> anyhow::Result<()> {
    let env = open_store(&config)?;
    let report = check_integrity(&env, config.result_ttl_secs, Timestamp::now())?;
    if !report.is_healthy() {
        anyhow::bail!(
            "result store has {} undecodable entries; refusing to start",
            report.corrupt_keys.len()
        );
    }
    let purged = env.result_store(config.result_ttl_secs).purge_expired()?;
    tracing::info!(
        entries = report.total_entries,
        purged,
        retention = %format_duration(config.result_ttl_secs),
        "result store ready"
    );

    let orchestrator = Arc::new(build_orchestrator(&config, &env)?);
    let (queue, receiver) = JobQueue::bounded(config.queue_capacity);
    let shutdown = ShutdownController::new();

    let mut workers = spawn_workers(
        config.worker_count,
        orchestrator.clone(),
        queue.clone(),
        receiver,
        &shutdown,
    );
    tracing::info!(
        workers = config.worker_count,
        queue_capacity = config.queue_capacity,
        "proofing workers started"
    );

    let state = AppState {
        queue,
        orchestrator,
    };
    let served = serve_until(config.listen_addr, state, &shutdown, shutdown.wait_for_signal()).await;

    while workers.join_next().await.is_some() {}
    served.with_context(|| format!("intake endpoint on {}", config.listen_addr))?;
    tracing::info!("worker stopped");
    Ok(())
}

async fn run_job(config: WorkerConfig, path: PathBuf) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("reading job file {}", path.display()))?;
    let job: ProofingJob = serde_json::from_str(&content).context("invalid job file")?;

    let env = open_store(&config)?;
    let orchestrator = build_orchestrator(&config, &env)?;
    let report = orchestrator.run(job).await?;
    tracing::info!(
        state = report.final_state.as_str(),
        replayed = report.replayed,
        notified = report.notified,
        "job finished"
    );
    println!("{}", serde_json::to_string_pretty(&report.result)?);
    Ok(())
}

fn encrypt(config: WorkerConfig, key_id: Option<String>) -> anyhow::Result<()> {
    let mut keyring = config.keyring()?;
    if let Some(id) = key_id {
        keyring.set_primary(&id)?;
    }

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("reading applicant from stdin")?;
    // serde errors can quote input values; report position only.
    let identity: ApplicantIdentity = serde_json::from_str(&input).map_err(|e| {
        anyhow::anyhow!("invalid applicant JSON at line {} column {}", e.line(), e.column())
    })?;

    let sealed = PayloadDecryptor::new(keyring).encrypt(&identity)?;
    println!("{sealed}");
    Ok(())
}

fn purge(config: WorkerConfig) -> anyhow::Result<()> {
    let env = open_store(&config)?;
    let store = env.result_store(config.result_ttl_secs);
    let removed = store.purge_expired()?;
    tracing::info!(removed, remaining = store.len()?, "purged expired results");
    println!("{removed}");
    Ok(())
}
