use std::sync::Arc;

use routecost::{
    config::Settings,
    create_router,
    ors::{OrsClient, RoutingService},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "routecost=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env();
    let config = settings.pipeline()?;
    if let Some(path) = &settings.config_path {
        tracing::info!("loaded pipeline config from {}", path.display());
    }

    // The blocking client owns an internal runtime, so it is built before ours.
    let client = OrsClient::new(&settings.base_url, settings.api_key()?, &config.profile)?;
    let service: Arc<dyn RoutingService> = Arc::new(client);
    let state = AppState {
        service,
        config: Arc::new(config),
    };
    let app = create_router(state);
    let addr = settings.socket_addr()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("starting routecost on http://{addr}");
        axum::serve(listener, app).await
    })?;

    Ok(())
}
