use std::sync::Arc;

use axum::Router;
use axum::routing::post;
use tower_http::limit::RequestBodyLimitLayer;

use camlink_core::Publisher;

use super::handlers::webhook_handler;
use super::server::AppState;

/// Build the webhook router around a publisher.
///
/// `POST /webhook` is the only route. Public so tests and embedders can
/// drive the service without binding a socket.
pub fn build_router<P: Publisher + 'static>(publisher: Arc<P>, max_body_size: usize) -> Router {
    let state = AppState { publisher };

    Router::new()
        .route("/webhook", post(webhook_handler::<P>))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .with_state(state)
}
