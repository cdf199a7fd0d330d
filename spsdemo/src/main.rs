use std::{fs::File, sync::Arc};

use sps_axum::{router, start_server};
use sps_bulk::BulkPricing;
use sps_pricing::PricingTables;
use sps_sandbox::Sandbox;
use spsdemo::{AppConfig, Cli};
use tracing::{Level, event};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::import()?;
    let AppConfig {
        server,
        sandbox,
        bulk,
    } = AppConfig::load(&cli)?;

    event!(
        Level::INFO,
        storefront = %sandbox.storefront,
        latency = ?sandbox.latency,
        "starting sandbox storefront"
    );
    let client = Arc::new(Sandbox::new(sandbox));
    let service = BulkPricing::new(client, &PricingTables::default(), bulk);

    // If requested, dump the schema and exit.
    if let Some(path) = cli.schema {
        let (_, schema) = router(service, server);
        serde_json::to_writer_pretty(File::create(path)?, &*schema)?;
        return Ok(());
    }

    start_server(server, service).await?;
    Ok(())
}
