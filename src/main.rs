use anyhow::{Context, Result};
use clap::Parser;
use redforge_sentinel::{
    AppState, Config, LogBroadcaster, PathResolver, SandboxRoot, TechnologyRegistry, corpus,
    server, telemetry,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    let logs = LogBroadcaster::default();
    telemetry::init(&config.log_level, config.log_file.as_deref(), &logs)?;

    // Step 1: Pin the sandbox root
    let root = SandboxRoot::open(&config.files_root).with_context(|| {
        format!(
            "payload directory {} is not usable",
            config.files_root.display()
        )
    })?;
    info!(root = %root.path().display(), "Sandbox root resolved");

    // Step 2: Survey what can be served
    let registry = TechnologyRegistry::new();
    let report = corpus::audit(&root, &registry);
    info!(
        payloads = report.total_payloads(),
        technologies = report.payloads.len(),
        "Payload corpus loaded"
    );
    if report.total_payloads() == 0 {
        warn!("No servable payloads found; every request will 404");
    }

    // Step 3: Serve
    let state = AppState::new(
        PathResolver::new(registry, root),
        config.payload_rate_limit(),
        config.health_rate_limit(),
        logs,
        config.server_settings(),
    );

    server::serve(state, config.socket_addr()).await
}
