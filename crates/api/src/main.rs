use stocktrail_infra::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stocktrail_observability::init();

    let config = AppConfig::from_env();
    let app = stocktrail_api::app::build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
