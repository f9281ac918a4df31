use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tera::Context;

use crate::state::AppState;

/// Review form for customers.
pub async fn user_dashboard(State(state): State<Arc<AppState>>) -> Response {
    render_template(&state, "user.html")
}

/// Polling list of every submission for staff.
pub async fn admin_dashboard(State(state): State<Arc<AppState>>) -> Response {
    render_template(&state, "admin.html")
}

fn render_template(state: &AppState, name: &str) -> Response {
    let mut ctx = Context::new();
    ctx.insert("api_base_url", &state.config.public_api_base_url);

    match state.templates.render(name, &ctx) {
        Ok(rendered) => Html(rendered).into_response(),
        Err(e) => {
            tracing::error!(template = name, error = ?e, "Template render failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Template error: {}", name),
            )
                .into_response()
        }
    }
}
