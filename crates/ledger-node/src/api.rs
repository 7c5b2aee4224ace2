use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ledger_core::family::{FamilyTree, Person};
use ledger_core::{Block, BlockStore, Ledger, LedgerError, Transaction, Transfer};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

/// Shared handles for request handlers. The ledger mutex serializes every
/// ledger call, mining included.
pub struct AppState<S: BlockStore> {
    ledger: Arc<Mutex<Ledger<S>>>,
    family: Arc<Mutex<FamilyTree>>,
}

impl<S: BlockStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            family: Arc::clone(&self.family),
        }
    }
}

impl<S: BlockStore> AppState<S> {
    pub fn new(ledger: Ledger<S>) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            family: Arc::new(Mutex::new(FamilyTree::new())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("The chain is invalid")]
    InvalidChain,
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: f64, available: f64 },
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidChain => StatusCode::BAD_REQUEST,
            ApiError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(msg) => {
                error!(%msg, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidChain { .. } => ApiError::InvalidChain,
            LedgerError::InsufficientFunds { needed, available } => {
                ApiError::InsufficientFunds { needed, available }
            }
            err @ LedgerError::InvalidAmount { .. } => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Deserialize)]
pub struct MineRequest {
    pub data: String,
}

#[derive(Serialize)]
struct ChainResponse {
    length: usize,
    chain: Vec<Block>,
}

#[derive(Serialize)]
struct ValidateResponse {
    valid: bool,
}

#[derive(Deserialize)]
pub struct TxIn {
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
}

#[derive(Serialize)]
struct TxAccepted {
    index: u64,
}

#[derive(Serialize)]
struct BalanceResponse {
    address: String,
    balance: f64,
}

#[derive(Deserialize)]
pub struct RelationshipIn {
    pub parent_id: String,
    pub child_id: String,
}

#[derive(Serialize)]
struct PersonResponse {
    person: Person,
    parents: Vec<Person>,
    children: Vec<Person>,
}

pub fn router<S: BlockStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(Health { status: "ok" }) }))
        .route("/mine_block", post(mine_block::<S>))
        .route("/mine_transactions", post(mine_transactions::<S>))
        .route("/chain", get(get_chain::<S>))
        .route("/chain/last", get(previous_block::<S>))
        .route("/validate", get(validate::<S>))
        .route("/transactions", post(add_transaction::<S>))
        .route("/transactions/pending", get(pending::<S>))
        .route("/send_money", post(send_money::<S>))
        .route("/balance/{address}", get(balance::<S>))
        .route("/family/people", post(add_person::<S>))
        .route("/family/people/{id}", get(get_person::<S>))
        .route("/family/relationships", post(add_relationship::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run `f` against the ledger on the blocking pool, after checking the chain.
/// An invalid chain rejects the request before `f` runs.
async fn with_ledger<S, T, F>(state: &AppState<S>, f: F) -> Result<T, ApiError>
where
    S: BlockStore + 'static,
    T: Send + 'static,
    F: FnOnce(&mut Ledger<S>) -> Result<T, LedgerError> + Send + 'static,
{
    let ledger = Arc::clone(&state.ledger);
    tokio::task::spawn_blocking(move || {
        let mut ledger = ledger
            .lock()
            .map_err(|_| ApiError::Internal("ledger lock poisoned".into()))?;
        if let Err(err) = ledger.validate() {
            warn!(%err, "rejecting request against invalid chain");
            return Err(ApiError::InvalidChain);
        }
        f(&mut ledger).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
}

async fn mine_block<S: BlockStore + 'static>(
    State(state): State<AppState<S>>,
    Json(req): Json<MineRequest>,
) -> Result<Json<Block>, ApiError> {
    with_ledger(&state, move |ledger| ledger.mine_block(req.data))
        .await
        .map(Json)
}

async fn mine_transactions<S: BlockStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<Block>, ApiError> {
    with_ledger(&state, |ledger| ledger.mine_transaction_block())
        .await
        .map(Json)
}

async fn get_chain<S: BlockStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<ChainResponse>, ApiError> {
    with_ledger(&state, |ledger| {
        Ok(ChainResponse {
            length: ledger.len(),
            chain: ledger.chain().to_vec(),
        })
    })
    .await
    .map(Json)
}

async fn previous_block<S: BlockStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<Block>, ApiError> {
    with_ledger(&state, |ledger| Ok(ledger.previous_block().clone()))
        .await
        .map(Json)
}

async fn validate<S: BlockStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<ValidateResponse>, ApiError> {
    with_ledger(&state, |_| Ok(ValidateResponse { valid: true }))
        .await
        .map(Json)
}

async fn add_transaction<S: BlockStore + 'static>(
    State(state): State<AppState<S>>,
    Json(tx): Json<TxIn>,
) -> Result<Json<TxAccepted>, ApiError> {
    with_ledger(&state, move |ledger| {
        let index = ledger.add_transaction(tx.sender, tx.recipient, tx.amount);
        Ok(TxAccepted { index })
    })
    .await
    .map(Json)
}

async fn pending<S: BlockStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    with_ledger(&state, |ledger| Ok(ledger.pending().to_vec()))
        .await
        .map(Json)
}

async fn send_money<S: BlockStore + 'static>(
    State(state): State<AppState<S>>,
    Json(tx): Json<TxIn>,
) -> Result<Json<Transfer>, ApiError> {
    with_ledger(&state, move |ledger| {
        ledger.send_money(&tx.sender, &tx.recipient, tx.amount)
    })
    .await
    .map(Json)
}

async fn balance<S: BlockStore + 'static>(
    State(state): State<AppState<S>>,
    Path(address): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    with_ledger(&state, move |ledger| {
        let balance = ledger.balance(&address);
        Ok(BalanceResponse { address, balance })
    })
    .await
    .map(Json)
}

fn family<S: BlockStore>(
    state: &AppState<S>,
) -> Result<std::sync::MutexGuard<'_, FamilyTree>, ApiError> {
    state
        .family
        .lock()
        .map_err(|_| ApiError::Internal("family tree lock poisoned".into()))
}

async fn add_person<S: BlockStore + 'static>(
    State(state): State<AppState<S>>,
    Json(person): Json<Person>,
) -> Result<(StatusCode, Json<Person>), ApiError> {
    let mut tree = family(&state)?;
    if !tree.add_person(person.clone()) {
        return Err(ApiError::Conflict(format!(
            "person {} already exists",
            person.id
        )));
    }
    Ok((StatusCode::CREATED, Json(person)))
}

async fn add_relationship<S: BlockStore + 'static>(
    State(state): State<AppState<S>>,
    Json(rel): Json<RelationshipIn>,
) -> Result<StatusCode, ApiError> {
    let mut tree = family(&state)?;
    if !tree.add_relationship(&rel.parent_id, &rel.child_id) {
        return Err(ApiError::NotFound(format!(
            "unknown person in {} -> {}",
            rel.parent_id, rel.child_id
        )));
    }
    Ok(StatusCode::OK)
}

async fn get_person<S: BlockStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<PersonResponse>, ApiError> {
    let tree = family(&state)?;
    let person = tree
        .person(&id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;
    Ok(Json(PersonResponse {
        person,
        parents: tree.parents(&id).into_iter().cloned().collect(),
        children: tree.children(&id).into_iter().cloned().collect(),
    }))
}
