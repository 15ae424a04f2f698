use dotenvy::dotenv;
use invoice_desk::config::get_configuration;
use invoice_desk::services::{BillsClient, InvoiceDesk, PngExporter};
use invoice_desk::startup::build_router;
use invoice_desk::AppState;
use service_core::observability::logging::init_tracing;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "invoice-desk",
        &configuration.telemetry.log_level,
        configuration.telemetry.otlp_endpoint.as_deref(),
    )?;

    invoice_desk::services::metrics::init_metrics()?;

    let bills_client = Arc::new(BillsClient::new(
        configuration.bills_api.clone(),
        configuration.invoice.clone(),
    )?);
    let exporter = Arc::new(
        PngExporter::new(configuration.export.scale)
            .map_err(|e| anyhow::anyhow!("Invalid export settings: {}", e))?,
    );

    let desk = InvoiceDesk::start(
        bills_client,
        exporter,
        configuration.business.clone(),
        &configuration.invoice.prefix,
    )
    .await;

    let app = build_router(AppState::new(Arc::new(desk)));

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!("Starting invoice-desk on {}", address);
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
