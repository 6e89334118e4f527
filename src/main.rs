use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use planwise::internal::{
    api::{create_router, AppState},
    assistant::AssistantRegistry,
    model::client::ModelClient,
    tools::builtin::scheduling_assistant,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "planwise=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let model = Arc::new(ModelClient::from_env()?);
    let assistants = Arc::new(AssistantRegistry::new(scheduling_assistant(model.clone())));

    let app = create_router(AppState::new(assistants, model)).layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], 7600));
    tracing::info!("planwise API server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
