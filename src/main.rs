use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use consensus_api::{
    api::{create_router, AppState},
    config::Config,
    db::{InMemoryPreferenceStore, PreferenceStore},
    services::{
        providers::{AnthropicModel, ElasticsearchGateway},
        IntentResolver, RecommendationService, RetryPolicy,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let model = AnthropicModel::new(
        config.anthropic_api_key.clone(),
        config.anthropic_api_url.clone(),
        config.anthropic_model.clone(),
        config.llm_max_tokens,
        Duration::from_secs(config.llm_timeout_secs),
    )?;

    let gateway = ElasticsearchGateway::new(
        config.search_url.clone(),
        config.search_index.clone(),
        config.search_api_key.clone(),
        config.search_size,
        config.search_mode,
        Duration::from_secs(config.search_timeout_secs),
    )?;

    let resolver = IntentResolver::new(
        Arc::new(model),
        RetryPolicy::new(
            config.llm_max_attempts,
            Duration::from_millis(config.llm_backoff_base_ms),
        ),
    );

    let store: Arc<dyn PreferenceStore> = Arc::new(InMemoryPreferenceStore::new());
    let recommender = RecommendationService::new(
        store.clone(),
        resolver,
        Arc::new(gateway),
        config.clarify_on_intent_error,
    );

    let app = create_router(AppState::new(store, recommender));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        address = %address,
        model = %config.anthropic_model,
        index = %config.search_index,
        search_mode = ?config.search_mode,
        "Server listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
