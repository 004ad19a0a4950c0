use arith_dispatch::api::api_routes;
use arith_dispatch::config::OrchestratorConfig;
use arith_dispatch::scheduler::{Scheduler, spawn_lease_sweeper};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    arith_dispatch::init_tracing();

    let config = OrchestratorConfig::from_env();

    eprintln!("🧮 Arith Dispatch v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Client API: http://{}/api/v1", config.bind_addr);
    eprintln!("   Worker API: http://{}/internal/task", config.bind_addr);
    eprintln!(
        "   Simulated cost: {}..{} ms",
        config.cost_range_ms.start, config.cost_range_ms.end
    );
    eprintln!("   Decomposition: {}", config.default_mode);

    let scheduler = Scheduler::new(&config);

    // ── Lease recovery (opt-in) ─────────────────────────────────────────
    match spawn_lease_sweeper(scheduler.clone(), config.lease_sweep_interval) {
        Some(_handle) => eprintln!(
            "   Lease recovery: enabled ({}s timeout)",
            config.lease_timeout.map(|t| t.as_secs()).unwrap_or_default()
        ),
        None => eprintln!("   Lease recovery: disabled"),
    }
    eprintln!();

    let app = api_routes(scheduler);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "Orchestrator listening");
    axum::serve(listener, app).await?;

    Ok(())
}
