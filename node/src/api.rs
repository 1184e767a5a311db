//! # REST + WebSocket API
//!
//! The node's HTTP surface. Every handler shares one [`AppState`]; all
//! ledger mutations go through the single `NodeLedger` lock, so calls are
//! applied strictly one after another.
//!
//! ## Endpoints
//!
//! | Method | Path                                         | Description                     |
//! |--------|----------------------------------------------|---------------------------------|
//! | GET    | `/health`                                    | Liveness check                  |
//! | GET    | `/status`                                    | Slot and ledger summary         |
//! | POST   | `/calls`                                     | Submit a signed call            |
//! | GET    | `/campaigns`                                 | All campaigns                   |
//! | GET    | `/campaigns/:id`                             | One campaign                    |
//! | GET    | `/campaigns/:id/contributions/:account`      | One contributor's entry         |
//! | GET    | `/accounts/:address`                         | Balance and nonce               |
//! | POST   | `/faucet`                                    | Dev-node value grant            |
//! | GET    | `/ws`                                        | Live slot and campaign events   |

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use pledge_contracts::{
    Campaign, CampaignEvent, CampaignId, CampaignStore, ErrorKind, Phase, ProcessError, Receipt,
    StoreError,
};
use pledge_protocol::call::{CallError, SignedCall};
use pledge_protocol::config::FAUCET_MAX_GRANT;
use pledge_protocol::crypto::AccountId;
use pledge_protocol::host::{Bank, ManualClock, Slot, SlotClock};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::ledger::{LedgerError, NodeLedger};
use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub version: String,
    pub ledger: Arc<Mutex<NodeLedger>>,
    /// Same clock the ledger uses; read without taking the ledger lock.
    pub clock: Arc<ManualClock>,
    pub event_tx: broadcast::Sender<NodeEvent>,
    pub metrics: SharedMetrics,
    pub faucet_enabled: bool,
}

/// Events pushed to WebSocket subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeEvent {
    /// The slot clock advanced.
    #[serde(rename = "new_slot")]
    NewSlot { slot: Slot, timestamp: u64 },
    /// An accepted call changed a campaign.
    #[serde(rename = "campaign_event")]
    Campaign { slot: Slot, event: CampaignEvent },
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/calls", post(submit_call_handler))
        .route("/campaigns", get(list_campaigns_handler))
        .route("/campaigns/:id", get(campaign_handler))
        .route(
            "/campaigns/:id/contributions/:account",
            get(contribution_handler),
        )
        .route("/accounts/:address", get(account_handler))
        .route("/faucet", post(faucet_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ApiError {
    Process(ProcessError),
    Store(StoreError),
    Ledger(LedgerError),
    BadRequest(String),
    NotFound(String),
    Forbidden(&'static str),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl From<ProcessError> for ApiError {
    fn from(e: ProcessError) -> Self {
        ApiError::Process(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e)
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        ApiError::Ledger(e)
    }
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, Option<ErrorKind>) {
        match self {
            ApiError::Process(e) => match e {
                ProcessError::Call(CallError::InvalidSignature(_)) => {
                    (StatusCode::UNAUTHORIZED, None)
                }
                ProcessError::Call(CallError::PayloadTooLarge { .. }) => {
                    (StatusCode::PAYLOAD_TOO_LARGE, None)
                }
                ProcessError::Decode(_) => (StatusCode::BAD_REQUEST, None),
                ProcessError::BadNonce { .. } => (StatusCode::CONFLICT, None),
                ProcessError::CampaignNotFound(_) => (StatusCode::NOT_FOUND, None),
                ProcessError::Crowdfund(c) => (StatusCode::UNPROCESSABLE_ENTITY, Some(c.kind())),
                ProcessError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
            },
            ApiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
            ApiError::Ledger(LedgerError::Db(_)) => (StatusCode::INTERNAL_SERVER_ERROR, None),
            ApiError::Ledger(_) => (StatusCode::BAD_REQUEST, None),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, None),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, None),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, None),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let error = match self {
            ApiError::Process(e) => e.to_string(),
            ApiError::Store(e) => e.to_string(),
            ApiError::Ledger(e) => e.to_string(),
            ApiError::BadRequest(m) | ApiError::NotFound(m) => m,
            ApiError::Forbidden(m) => m.to_string(),
        };
        if status.is_server_error() {
            tracing::error!(%error, "request failed");
        }
        let body = ErrorBody {
            error,
            kind: kind.map(|k| k.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub slot: Slot,
    pub accounts: usize,
    pub campaigns: usize,
    pub open_campaigns: usize,
    pub faucet_enabled: bool,
    pub timestamp: String,
}

/// A campaign as clients see it at the current slot.
#[derive(Debug, Serialize, Deserialize)]
pub struct CampaignView {
    pub id: CampaignId,
    pub owner: AccountId,
    pub goal: u64,
    pub deadline: Slot,
    pub total_raised: u64,
    pub total_refunded: u64,
    pub finalized: bool,
    pub successful: bool,
    pub phase: Phase,
    pub custody: AccountId,
    /// What the custody account actually holds.
    pub custody_balance: u64,
    pub contributors: usize,
    pub created_slot: Slot,
    pub created_at: DateTime<Utc>,
}

impl CampaignView {
    fn new(campaign: &Campaign, now: Slot, bank: &Bank) -> Self {
        let custody = campaign.custody();
        Self {
            id: campaign.id(),
            owner: *campaign.owner(),
            goal: campaign.goal(),
            deadline: campaign.deadline(),
            total_raised: campaign.total_raised(),
            total_refunded: campaign.total_refunded(),
            finalized: campaign.finalized(),
            successful: campaign.is_successful(),
            phase: campaign.phase(now),
            custody,
            custody_balance: bank.balance(&custody),
            contributors: campaign.contributors().len(),
            created_slot: campaign.created_slot(),
            created_at: campaign.created_at(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContributionResponse {
    pub campaign: CampaignId,
    pub contributor: AccountId,
    pub amount: u64,
    pub claimed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub address: AccountId,
    pub balance: u64,
    pub nonce: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FaucetRequest {
    pub account: AccountId,
    pub amount: u64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status`
async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let ledger = state.ledger.lock().await;
    Json(StatusResponse {
        version: state.version.clone(),
        slot: state.clock.current_slot(),
        accounts: ledger.bank().len(),
        campaigns: ledger.store().len(),
        open_campaigns: ledger.open_campaigns(),
        faucet_enabled: state.faucet_enabled,
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// `POST /calls`: Verify, apply and persist one signed call.
///
/// Accepted calls return their [`Receipt`] and fan their events out to
/// WebSocket subscribers. Rejected calls change nothing, nonce included.
async fn submit_call_handler(
    State(state): State<AppState>,
    Json(call): Json<SignedCall>,
) -> Result<Json<Receipt>, ApiError> {
    let timer = state.metrics.call_latency_seconds.start_timer();
    let mut ledger = state.ledger.lock().await;
    let result = ledger.submit(&call);
    let open = result.as_ref().ok().map(|_| ledger.open_campaigns());
    drop(ledger);
    timer.observe_duration();

    match result {
        Ok(receipt) => {
            state.metrics.record(&receipt);
            if let Some(n) = open {
                state
                    .metrics
                    .open_campaigns
                    .set(i64::try_from(n).unwrap_or(i64::MAX));
            }
            for event in &receipt.events {
                // No subscribers is not an error.
                let _ = state.event_tx.send(NodeEvent::Campaign {
                    slot: receipt.slot,
                    event: event.clone(),
                });
            }
            Ok(Json(receipt))
        }
        Err(e) => {
            let kind = match &e {
                ProcessError::Crowdfund(c) => Some(c.kind()),
                _ => None,
            };
            state.metrics.record_rejection(kind);
            tracing::debug!(call = %call.id(), error = %e, "call rejected");
            Err(e.into())
        }
    }
}

/// `GET /campaigns`
async fn list_campaigns_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<CampaignView>>, ApiError> {
    let ledger = state.ledger.lock().await;
    let now = state.clock.current_slot();
    let views = ledger
        .store()
        .list()?
        .iter()
        .map(|c| CampaignView::new(c, now, ledger.bank()))
        .collect();
    Ok(Json(views))
}

/// `GET /campaigns/:id`
async fn campaign_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CampaignView>, ApiError> {
    let id = parse_campaign_id(&id)?;
    let ledger = state.ledger.lock().await;
    let campaign = load_campaign(&ledger, &id)?;
    Ok(Json(CampaignView::new(
        &campaign,
        state.clock.current_slot(),
        ledger.bank(),
    )))
}

/// `GET /campaigns/:id/contributions/:account`
///
/// Accounts that never contributed report a zero, unclaimed entry.
async fn contribution_handler(
    Path((id, account)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<ContributionResponse>, ApiError> {
    let id = parse_campaign_id(&id)?;
    let contributor = parse_account(&account)?;
    let ledger = state.ledger.lock().await;
    let campaign = load_campaign(&ledger, &id)?;
    let (amount, claimed) = campaign
        .contribution_entry(&contributor)
        .map_or((0, false), |e| (e.amount, e.claimed));
    Ok(Json(ContributionResponse {
        campaign: id,
        contributor,
        amount,
        claimed,
    }))
}

/// `GET /accounts/:address`: Unknown accounts report zero balance and nonce.
async fn account_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<AccountResponse>, ApiError> {
    let address = parse_account(&address)?;
    let ledger = state.ledger.lock().await;
    Ok(Json(AccountResponse {
        address,
        balance: ledger.bank().balance(&address),
        nonce: ledger.bank().nonce(&address),
    }))
}

/// `POST /faucet`: Mint value into an account on a dev node.
async fn faucet_handler(
    State(state): State<AppState>,
    Json(req): Json<FaucetRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    if !state.faucet_enabled {
        return Err(ApiError::Forbidden("faucet is disabled on this node"));
    }
    if req.amount == 0 || req.amount > FAUCET_MAX_GRANT {
        return Err(ApiError::BadRequest(format!(
            "faucet amount must be between 1 and {FAUCET_MAX_GRANT}"
        )));
    }
    let mut ledger = state.ledger.lock().await;
    let balance = ledger.faucet(&req.account, req.amount)?;
    Ok(Json(AccountResponse {
        address: req.account,
        balance,
        nonce: ledger.bank().nonce(&req.account),
    }))
}

/// `GET /ws`: Push-only stream of [`NodeEvent`] JSON messages.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

async fn handle_ws_connection(mut socket: WebSocket, state: AppState) {
    let mut rx = state.event_tx.subscribe();

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(ev) => {
                        let payload = match serde_json::to_string(&ev) {
                            Ok(s) => s,
                            Err(e) => {
                                tracing::warn!(error = %e, "failed to serialize ws event");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "ws subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }
}

fn parse_campaign_id(s: &str) -> Result<CampaignId, ApiError> {
    s.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid campaign id: {s}")))
}

fn parse_account(s: &str) -> Result<AccountId, ApiError> {
    s.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid account address: {s}")))
}

fn load_campaign(ledger: &NodeLedger, id: &CampaignId) -> Result<Campaign, ApiError> {
    ledger
        .store()
        .get(id)?
        .ok_or_else(|| ApiError::NotFound(format!("campaign {id} not found")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
