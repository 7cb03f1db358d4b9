use std::path::Path;

use apiprobe::config::{EngineConfig, load_config};
use apiprobe::domain::ProbeRequest;
use apiprobe::engine::{ProbeContext, ProbeEngine};
use apiprobe::error::{AppError, AppResult};
use apiprobe::logger::init_logging;
use apiprobe::wire::WireDefaults;
use apiprobe::wire::json::{BatchRequestPayload, BatchResultPayload, ProbeOutcomePayload};
use clap::Parser;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::args::{BatchArgs, Command, ProbeArgs, ProbeCliArgs};

pub(crate) fn run() -> AppResult<()> {
    let args = ProbeCliArgs::parse();

    init_logging(args.verbose, args.no_color);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(rate) = args.rate {
        config.rate_limit_per_second = rate;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(args, config))
}

async fn run_async(args: ProbeCliArgs, config: EngineConfig) -> AppResult<()> {
    let engine = ProbeEngine::new(config)?;
    let interrupted = CancellationToken::new();
    let ctx = ProbeContext::from_token(interrupted.clone());
    let interrupt = spawn_interrupt_watcher(interrupted);

    let result = match args.command {
        Command::Probe(probe) => run_probe(&engine, probe, &ctx).await,
        Command::Batch(batch) => run_batch(&engine, batch, &ctx).await,
    };
    interrupt.abort();

    if args.metrics {
        print_json(&engine.metrics_snapshot())?;
    }
    engine.shutdown();
    result
}

async fn run_probe(engine: &ProbeEngine, args: ProbeArgs, ctx: &ProbeContext) -> AppResult<()> {
    let mut request = ProbeRequest::new(args.method, args.url)
        .with_follow_redirects(!args.no_redirects && engine.config().follow_redirects)
        .with_max_retries(args.retries.unwrap_or(0));
    if let Some(timeout) = args.timeout {
        request = request.with_timeout(timeout);
    }
    if let Some(endpoint_id) = args.endpoint_id {
        request = request.with_endpoint_id(endpoint_id);
    }
    if let Some(data) = args.data {
        request = request.with_body(data);
    }
    for (name, value) in args.headers {
        request = request.with_header(name, value);
    }

    let outcome = engine.execute_one(request, ctx).await;
    print_json(&ProbeOutcomePayload::from(&outcome))
}

async fn run_batch(engine: &ProbeEngine, args: BatchArgs, ctx: &ProbeContext) -> AppResult<()> {
    let payload = read_batch_file(&args.file).await?;
    let batch = payload.into_batch(&WireDefaults::from(engine.config()))?;
    info!(
        "Running batch {} ({} requests)",
        batch.id,
        batch.requests.len()
    );
    let result = engine.execute_batch(batch, args.concurrency, ctx).await;
    info!(
        "Batch {} finished in {}ms: {}/{} successful",
        result.id,
        result.duration.as_millis(),
        result.summary.successful,
        result.summary.total
    );
    print_json(&BatchResultPayload::from(&result))
}

async fn read_batch_file(path: &Path) -> AppResult<BatchRequestPayload> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| AppError::ReadBatchFile {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(serde_json::from_str(&content)?)
}

fn spawn_interrupt_watcher(interrupted: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling in-flight probes");
            interrupted.cancel();
        }
    })
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{}", rendered);
    Ok(())
}
