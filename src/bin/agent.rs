use std::sync::Arc;
use std::sync::atomic::Ordering;

use arith_dispatch::agent::{HttpTaskSource, TaskSource, spawn_worker_pool};
use arith_dispatch::config::AgentConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    arith_dispatch::init_tracing();

    let config = AgentConfig::from_env();
    config.validate()?;

    eprintln!("🛠  Arith Agent v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Orchestrator: {}", config.orchestrator_url);
    eprintln!("   Workers: {}", config.computing_power);
    eprintln!("   Backoff: {} ms\n", config.backoff.as_millis());

    let source: Arc<dyn TaskSource> = Arc::new(HttpTaskSource::new(&config.orchestrator_url));
    let pool = spawn_worker_pool(source, config.computing_power, config.backoff);
    let shutdown = pool.shutdown_flag();

    tokio::signal::ctrl_c().await?;
    tracing::info!("Ctrl+C received, stopping workers");
    shutdown.store(true, Ordering::Relaxed);

    let reports = pool.join().await;
    let completed: u64 = reports.iter().map(|r| r.completed).sum();
    let dropped: u64 = reports.iter().map(|r| r.dropped).sum();
    tracing::info!(completed, dropped, "Agent stopped");

    Ok(())
}
