use anyhow::{Context, Result};
use hostpulse::config::AppConfig;
use hostpulse::sysinfo_repo::{CounterSource, SysinfoRepo};
use hostpulse::telemetry::otlp::OtlpPipeline;
use hostpulse::version;
use hostpulse::worker::{self, Scheduler, SchedulerConfig, SchedulerDeps};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

// The OTLP exporters own a blocking HTTP client, so the pipeline is built and shut down
// outside the async runtime.
fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = AppConfig::load()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let source = SysinfoRepo::from_config(&app_config.monitoring);
    let host = runtime
        .block_on(source.host_info())
        .context("reading host info")?;
    let pipeline = OtlpPipeline::init(&app_config, &host).context("initializing OTLP export")?;
    tracing::info!(
        version = version::VERSION,
        host = %host.host_name,
        "{} initialized for service: {}",
        version::NAME,
        app_config.service.name
    );
    tracing::info!("OTLP endpoint: {}", app_config.exporter.endpoint);

    let deps = SchedulerDeps {
        source,
        metrics: pipeline.metric_sink(),
        traces: pipeline.trace_sink(),
        host,
    };
    let result = runtime.block_on(run(deps, SchedulerConfig::from_config(&app_config)));

    if let Err(e) = pipeline.shutdown() {
        tracing::warn!(error = %e, operation = "shutdown_pipeline", "telemetry flush failed");
    }
    result
}

async fn run<M, T>(
    deps: SchedulerDeps<SysinfoRepo, M, T>,
    config: SchedulerConfig,
) -> Result<()>
where
    M: hostpulse::telemetry::MetricSink + 'static,
    T: hostpulse::telemetry::TraceSink + 'static,
{
    let scheduler = Scheduler::bootstrap(deps, config)
        .await
        .context("reading initial network counters")?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = worker::spawn(scheduler, shutdown_rx);

    shutdown_signal().await;
    tracing::info!("Received shutdown signal");
    let _ = shutdown_tx.send(());
    let scheduler = handle.await?;
    tracing::debug!(state = ?scheduler.state(), "scheduler exited");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
