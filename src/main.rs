mod agents;
mod config;
mod db;
mod routes;
mod service;
mod state;
mod templates;

use std::sync::Arc;

use agents::{ContentGenerator, LlmAgent, LlmGateway, RatingPredictor};
use service::SubmissionService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feedback_desk=info,tower_http=info".into()),
        )
        .init();

    let config = config::Config::from_env()?;
    let config = Arc::new(config);

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    tracing::info!("Database ready at {}", config.database_url);

    let agent = LlmAgent::new(
        config.llm_api_key.clone(),
        &config.llm_base_url,
        config.llm_model.clone(),
        config.llm_timeout,
    )?;
    tracing::info!(
        model = agent.model(),
        base_url = %config.llm_base_url,
        "LLM gateway configured"
    );
    let gateway: Arc<dyn LlmGateway> = Arc::new(agent);

    let predictor = RatingPredictor::new(gateway.clone(), config.llm_timeout, config.llm_max_attempts)
        .with_retry_delay(config.llm_retry_delay);
    let generator = ContentGenerator::new(gateway, config.llm_timeout);
    let service = Arc::new(SubmissionService::new(pool.clone(), predictor, generator));

    let state = Arc::new(state::AppState {
        pool,
        config: config.clone(),
        service,
        templates: Arc::new(templates::load()?),
    });

    let app = routes::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Feedback Desk listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
