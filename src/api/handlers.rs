//! REST API handlers for wallet operations

use crate::api::websocket::{WsBroadcaster, WsEvent};
use crate::multisig::{EventRecord, LedgerHost, MultisigError, TransactionStatus, TxState};
use crate::storage::{Storage, StorageError, WalletState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub wallet: Arc<RwLock<WalletState>>,
    pub storage: Arc<Storage>,
    pub ws_broadcaster: Arc<WsBroadcaster>,
}

impl ApiState {
    pub fn new(wallet: WalletState, storage: Storage) -> Self {
        Self {
            wallet: Arc::new(RwLock::new(wallet)),
            storage: Arc::new(storage),
            ws_broadcaster: Arc::new(WsBroadcaster::new()),
        }
    }
}

/// Handler error: status code plus JSON body
pub type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct WalletInfo {
    pub address: String,
    pub policy: String,
    pub threshold: usize,
    pub owners: Vec<String>,
    pub effect: String,
    pub balance: u64,
    pub transactions: usize,
    pub pending: usize,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub id: u64,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: u64,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub kind: String,
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct DepositRequest {
    pub caller: String,
    pub amount: u64,
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub caller: String,
    pub to: String,
    pub value: u64,
    /// Hex payload, optional `0x` prefix
    pub data: Option<String>,
}

#[derive(Deserialize)]
pub struct CallerRequest {
    pub caller: String,
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub pending: bool,
}

#[derive(Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub from: u64,
}

// ============================================================================
// Helpers
// ============================================================================

fn error_response(status: StatusCode, kind: &str, error: String) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error,
            kind: kind.to_string(),
        }),
    )
}

/// Map a wallet error onto an HTTP status
fn multisig_error(e: MultisigError) -> (StatusCode, Json<ApiError>) {
    let status = match &e {
        MultisigError::Unauthorized(_) => StatusCode::FORBIDDEN,
        MultisigError::NotFound(_) => StatusCode::NOT_FOUND,
        MultisigError::InvalidConfig(_) | MultisigError::BalanceOverflow(_) => {
            StatusCode::BAD_REQUEST
        }
        MultisigError::EffectFailed(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::CONFLICT,
    };
    error_response(status, e.kind(), e.to_string())
}

/// Run one wallet operation: persist on success, broadcast new events
///
/// The write lock is held across the operation and the save, so calls are
/// applied in a total order. If the save fails the wallet is reloaded from
/// the last successful save.
async fn apply<T, F>(state: &ApiState, op: F) -> Result<T, (StatusCode, Json<ApiError>)>
where
    F: FnOnce(&mut WalletState) -> Result<T, MultisigError>,
{
    let mut wallet = state.wallet.write().await;
    let from = wallet.engine.events().len() as u64;

    let value = op(&mut *wallet).map_err(multisig_error)?;

    if let Err(e) = persist(&state.storage, &wallet).await {
        log::error!("Failed to persist wallet: {}", e);
        match reload(&state.storage).await {
            Ok(saved) => *wallet = saved,
            Err(e) => log::error!("Failed to reload wallet after a failed save: {}", e),
        }
        return Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "StorageError",
            format!("Failed to persist wallet: {}", e),
        ));
    }

    for record in wallet.engine.events_since(from) {
        state.ws_broadcaster.broadcast(WsEvent::Wallet {
            record: record.clone(),
        });
    }

    Ok(value)
}

/// Serialize under the lock, write on the blocking pool
async fn persist(storage: &Arc<Storage>, wallet: &WalletState) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec_pretty(wallet)?;
    let storage = Arc::clone(storage);
    tokio::task::spawn_blocking(move || storage.save_bytes(&bytes))
        .await
        .map_err(|e| StorageError::InvalidData(format!("save task failed: {}", e)))?
}

async fn reload(storage: &Arc<Storage>) -> Result<WalletState, StorageError> {
    let storage = Arc::clone(storage);
    tokio::task::spawn_blocking(move || storage.load())
        .await
        .map_err(|e| StorageError::InvalidData(format!("load task failed: {}", e)))?
}

async fn status_of(state: &ApiState, id: u64) -> ApiResult<TransactionStatus> {
    let wallet = state.wallet.read().await;
    wallet.engine.status(id).map(Json).map_err(multisig_error)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /api/wallet - Wallet configuration and balance
pub async fn get_wallet(State(state): State<ApiState>) -> Json<WalletInfo> {
    let wallet = state.wallet.read().await;
    let engine = &wallet.engine;

    Json(WalletInfo {
        address: engine.address(),
        policy: engine.registry().description(),
        threshold: engine.threshold(),
        owners: engine.registry().owners().map(str::to_string).collect(),
        effect: engine.config().effect.to_string(),
        balance: engine.balance(),
        transactions: engine.transaction_count(),
        pending: engine.pending().count(),
    })
}

/// POST /api/deposit - Send coins into the wallet
pub async fn deposit(
    State(state): State<ApiState>,
    Json(req): Json<DepositRequest>,
) -> ApiResult<BalanceResponse> {
    let balance = apply(&state, |wallet| {
        wallet.engine.receive(&req.caller, req.amount)?;
        Ok(wallet.engine.balance())
    })
    .await?;

    Ok(Json(BalanceResponse { balance }))
}

/// GET /api/transactions - List transactions
pub async fn list_transactions(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<TransactionStatus>> {
    let wallet = state.wallet.read().await;
    let engine = &wallet.engine;

    let mut statuses = Vec::with_capacity(engine.transaction_count());
    for tx in engine.transactions() {
        let status = engine.status(tx.id).map_err(multisig_error)?;
        if query.pending && status.state == TxState::Executed {
            continue;
        }
        statuses.push(status);
    }

    Ok(Json(statuses))
}

/// POST /api/transactions - Submit a transaction
pub async fn submit_transaction(
    State(state): State<ApiState>,
    Json(req): Json<SubmitRequest>,
) -> ApiResult<SubmitResponse> {
    let data = match req.data.as_deref().map(str::trim) {
        None | Some("") => Vec::new(),
        Some(s) => hex::decode(s.strip_prefix("0x").unwrap_or(s)).map_err(|e| {
            error_response(
                StatusCode::BAD_REQUEST,
                "InvalidPayload",
                format!("Invalid hex payload: {}", e),
            )
        })?,
    };

    let id = apply(&state, |wallet| {
        wallet.engine.submit(&req.caller, &req.to, req.value, data)
    })
    .await?;

    Ok(Json(SubmitResponse { id }))
}

/// GET /api/transactions/{id} - Transaction with approvals
pub async fn get_transaction(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
) -> ApiResult<TransactionStatus> {
    status_of(&state, id).await
}

/// POST /api/transactions/{id}/approve
pub async fn approve_transaction(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
    Json(req): Json<CallerRequest>,
) -> ApiResult<TransactionStatus> {
    apply(&state, |wallet| wallet.engine.approve(&req.caller, id)).await?;
    status_of(&state, id).await
}

/// POST /api/transactions/{id}/execute
pub async fn execute_transaction(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
    Json(req): Json<CallerRequest>,
) -> ApiResult<TransactionStatus> {
    apply(&state, |wallet| {
        let WalletState { engine, host } = wallet;
        engine.execute(&req.caller, id, host)
    })
    .await?;
    status_of(&state, id).await
}

/// POST /api/transactions/{id}/revoke
pub async fn revoke_transaction(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
    Json(req): Json<CallerRequest>,
) -> ApiResult<TransactionStatus> {
    apply(&state, |wallet| wallet.engine.revoke(&req.caller, id)).await?;
    status_of(&state, id).await
}

/// GET /api/events - Event journal
pub async fn get_events(
    State(state): State<ApiState>,
    Query(query): Query<EventsQuery>,
) -> Json<Vec<EventRecord>> {
    let wallet = state.wallet.read().await;
    Json(wallet.engine.events_since(query.from).to_vec())
}

/// GET /api/payouts - Coins and calls delivered by executed transactions
pub async fn get_payouts(State(state): State<ApiState>) -> Json<LedgerHost> {
    let wallet = state.wallet.read().await;
    Json(wallet.host.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multisig::{EngineConfig, MultisigEngine};
    use crate::storage::StorageConfig;

    fn test_state(dir: &std::path::Path) -> ApiState {
        let owners = vec!["alice".to_string(), "bob".to_string(), "carol".to_string()];
        let engine = MultisigEngine::with_owners(&owners, 2, EngineConfig::default()).unwrap();
        let storage = Storage::new(StorageConfig {
            data_dir: dir.to_path_buf(),
            ..Default::default()
        })
        .unwrap();
        ApiState::new(WalletState::new(engine), storage)
    }

    fn caller(name: &str) -> Json<CallerRequest> {
        Json(CallerRequest {
            caller: name.to_string(),
        })
    }

    #[tokio::test]
    async fn test_full_flow() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = test_state(temp_dir.path());
        let mut events = state.ws_broadcaster.subscribe();

        deposit(
            State(state.clone()),
            Json(DepositRequest {
                caller: "funder".to_string(),
                amount: 200,
            }),
        )
        .await
        .unwrap();

        let Json(submitted) = submit_transaction(
            State(state.clone()),
            Json(SubmitRequest {
                caller: "alice".to_string(),
                to: "dave".to_string(),
                value: 150,
                data: Some("0x00ff".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(submitted.id, 0);

        approve_transaction(State(state.clone()), Path(0), caller("alice"))
            .await
            .unwrap();
        let Err((status, Json(err))) =
            execute_transaction(State(state.clone()), Path(0), caller("bob")).await
        else {
            panic!("execute should need two approvals");
        };
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err.kind, "InsufficientApprovals");

        approve_transaction(State(state.clone()), Path(0), caller("bob"))
            .await
            .unwrap();
        let Json(done) = execute_transaction(State(state.clone()), Path(0), caller("carol"))
            .await
            .unwrap();
        assert_eq!(done.state, TxState::Executed);
        assert_eq!(done.transaction.data, vec![0x00, 0xff]);

        let Json(payouts) = get_payouts(State(state.clone())).await;
        assert_eq!(payouts.balance_of("dave"), 150);
        assert!(state.storage.exists());

        // Deposit, Submit, Approve, Approve, Execute
        let mut names = Vec::new();
        while let Ok(WsEvent::Wallet { record }) = events.try_recv() {
            names.push(record.event.name());
        }
        assert_eq!(names, vec!["Deposit", "Submit", "Approve", "Approve", "Execute"]);
    }

    #[tokio::test]
    async fn test_failed_save_reverts_operation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = test_state(temp_dir.path());

        deposit(
            State(state.clone()),
            Json(DepositRequest {
                caller: "funder".to_string(),
                amount: 200,
            }),
        )
        .await
        .unwrap();

        // A directory in the way of the temp file makes the next save fail
        std::fs::create_dir(temp_dir.path().join("wallet.tmp")).unwrap();
        let mut events = state.ws_broadcaster.subscribe();

        let Err((status, Json(err))) = submit_transaction(
            State(state.clone()),
            Json(SubmitRequest {
                caller: "alice".to_string(),
                to: "dave".to_string(),
                value: 50,
                data: None,
            }),
        )
        .await
        else {
            panic!("submit should fail when the wallet cannot be saved");
        };
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind, "StorageError");

        let wallet = state.wallet.read().await;
        assert_eq!(wallet.engine.transaction_count(), 0);
        assert_eq!(wallet.engine.balance(), 200);
        assert_eq!(wallet.engine.events().len(), 1);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = test_state(temp_dir.path());

        let Err((status, _)) = submit_transaction(
            State(state.clone()),
            Json(SubmitRequest {
                caller: "mallory".to_string(),
                to: "dave".to_string(),
                value: 1,
                data: None,
            }),
        )
        .await
        else {
            panic!("non-owner submit should fail");
        };
        assert_eq!(status, StatusCode::FORBIDDEN);

        let Err((status, _)) = get_transaction(State(state.clone()), Path(3)).await else {
            panic!("unknown id should fail");
        };
        assert_eq!(status, StatusCode::NOT_FOUND);

        let Err((status, Json(err))) = submit_transaction(
            State(state.clone()),
            Json(SubmitRequest {
                caller: "alice".to_string(),
                to: "dave".to_string(),
                value: 1,
                data: Some("zz".to_string()),
            }),
        )
        .await
        else {
            panic!("bad payload should fail");
        };
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err.kind, "InvalidPayload");

        // Nothing was persisted by the failed calls
        assert!(!state.storage.exists());
    }
}
