use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use voxbridge::bootstrap::build_application;
use voxbridge::infrastructure::observability::{TracingConfig, init_tracing};
use voxbridge::presentation::{Environment, ScaffoldConfig, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment)?;

    init_tracing(
        TracingConfig::new(
            environment.as_str(),
            settings.logging.level.clone(),
            settings.logging.enable_json,
        )
        .with_env_overrides(),
        settings.server.port,
    );

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    let application = build_application(settings, &ScaffoldConfig::default()).await?;

    let shutdown = CancellationToken::new();
    let sweeper = tokio::spawn(application.sweeper.run(shutdown.clone()));

    let router = create_router(application.state);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    let signal = shutdown.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown requested");
            signal.cancel();
        })
        .await?;

    shutdown.cancel();
    sweeper.await?;
    Ok(())
}
