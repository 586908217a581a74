//! REST API routes configuration

use crate::api::handlers::{self, ApiState};
use crate::api::websocket::ws_handler;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

/// Create the API router with all routes
pub fn create_router(state: ApiState) -> Router {
    // Configure CORS for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ws", get(ws_handler))
        // Wallet
        .route("/api/wallet", get(handlers::get_wallet))
        .route("/api/deposit", post(handlers::deposit))
        .route("/api/payouts", get(handlers::get_payouts))
        .route("/api/events", get(handlers::get_events))
        // Transactions
        .route(
            "/api/transactions",
            get(handlers::list_transactions).post(handlers::submit_transaction),
        )
        .route("/api/transactions/{id}", get(handlers::get_transaction))
        .route(
            "/api/transactions/{id}/approve",
            post(handlers::approve_transaction),
        )
        .route(
            "/api/transactions/{id}/execute",
            post(handlers::execute_transaction),
        )
        .route(
            "/api/transactions/{id}/revoke",
            post(handlers::revoke_transaction),
        )
        .with_state(state)
        .layer(cors)
}
