//! Token ledger server binary

use token_ledger::{spawn_ledger_actor, Config, Metrics, TokenLedger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting token ledger server");

    // Load configuration
    let config = match std::env::var("TOKEN_LEDGER_CONFIG") {
        Ok(path) => Config::from_file(path)?,
        Err(_) => Config::from_env()?,
    };

    // Initialize ledger
    let ledger = TokenLedger::initialize(config.init_params())?;
    let metrics = Metrics::new()?;
    let (handle, task) = spawn_ledger_actor(ledger, config.actor.mailbox_capacity, metrics.clone());

    let metadata = handle.metadata().await?;
    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        name = %metadata.name,
        symbol = %metadata.symbol,
        decimals = metadata.decimals,
        "Ledger initialized"
    );
    for event in handle.drain_events().await? {
        let json = serde_json::to_string(&event)?;
        tracing::info!(event = %json, "Genesis event");
    }

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down token ledger server");
    handle.shutdown().await?;
    let ledger = task.await?;
    ledger.check_supply_invariant()?;
    let rendered = metrics.render()?;
    tracing::info!(metrics = %rendered, "Final metrics");

    Ok(())
}
