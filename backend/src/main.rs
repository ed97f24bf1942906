use bridger::{build_connection_service, handlers, utils, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_logging();

    let config = Config::from_env()?;
    let service = build_connection_service(&config).await?;

    let port = config.port;
    let app = handlers::create_router(service, &config);

    let listener = tokio::net::TcpListener::bind(&format!("0.0.0.0:{}", port)).await?;
    tracing::info!("Server running on port {} (links on {})", port, config.public_origin);

    axum::serve(listener, app).await?;

    Ok(())
}
