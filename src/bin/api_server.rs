//! REST API server for the fleet dashboard
//!
//! Usage:
//!   ./target/release/api_server --loads data/loads.csv --fuel data/fuel.csv [--port 8080]
//!
//! REST endpoints:
//!   GET  /api/v1/health               - Health check
//!   GET  /api/lanes?basis&start&end&drivers[]&rank_by - Lane query with Pareto flags
//!   GET  /api/v1/lanes                - Lanes under the current filters
//!   GET  /api/v1/finance?timegrain=X  - Per-truck finance rows + fleet totals
//!   GET  /api/v1/kpi                  - Fleet KPIs
//!   GET  /api/v1/filters              - Current filter state
//!   PUT  /api/v1/filters              - Replace filter state
//!   POST /api/v1/reload               - Re-read the data sources

use anyhow::Result;
use clap::Parser;
use fleet_analytics::api::{create_router, AnalyticsService};
use fleet_analytics::config::DataSources;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "api_server")]
#[command(about = "Serve fleet lane and finance views over REST")]
struct Args {
    #[command(flatten)]
    sources: DataSources,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "8080")]
    port: u16,
}

fn print_banner(port: u16, sources: &DataSources) {
    println!("============================================================");
    println!("              FLEET ANALYTICS API SERVER");
    println!("============================================================");
    println!();
    println!("  Port:     {}", port);
    println!("  REST:     http://localhost:{}/api/v1/", port);
    for (kind, source) in sources.configured() {
        println!("  {:9} {}", format!("{:?}:", kind), source);
    }
    println!();
    println!("REST Endpoints:");
    println!("  GET  /api/lanes                Lane query");
    println!("  GET  /api/v1/lanes             Dashboard lanes");
    println!("  GET  /api/v1/finance           Finance by truck");
    println!("  GET  /api/v1/kpi               Fleet KPIs");
    println!("  GET  /api/v1/filters           Filter state");
    println!("  PUT  /api/v1/filters           Update filters");
    println!("  POST /api/v1/reload            Reload sources");
    println!();
    println!("============================================================");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .init();

    let args = Args::parse();
    print_banner(args.port, &args.sources);

    let service = Arc::new(AnalyticsService::new(args.sources)?);
    service.reload().await?;

    let addr: SocketAddr = format!("0.0.0.0:{}", args.port).parse()?;
    let app = create_router(service);
    tracing::info!("Starting REST server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
