//! REST API module
//!
//! HTTP host for the multisig wallet. The caller identity travels in each
//! JSON request body.
//!
//! # Endpoints
//!
//! ## Wallet
//! - `GET /api/wallet` - Owners, threshold, balance
//! - `POST /api/deposit` - Send coins into the wallet
//! - `GET /api/payouts` - Coins and calls delivered by executions
//! - `GET /api/events?from=N` - Event journal
//!
//! ## Transactions
//! - `GET /api/transactions?pending=true` - List transactions
//! - `POST /api/transactions` - Submit
//! - `GET /api/transactions/{id}` - Transaction with approvals
//! - `POST /api/transactions/{id}/approve`
//! - `POST /api/transactions/{id}/execute`
//! - `POST /api/transactions/{id}/revoke`
//!
//! ## WebSocket
//! - `GET /ws` - Real-time wallet events

pub mod handlers;
pub mod routes;
pub mod websocket;

pub use handlers::ApiState;
pub use routes::create_router;
pub use websocket::WsBroadcaster;
