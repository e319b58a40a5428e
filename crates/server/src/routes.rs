//! HTTP routes
//!
//! - `/api/rpc-url`: env-backed endpoint configuration for the resolver
//!   contract
//! - `/api/eth-price`: upstream quote proxy (Etherscan stats)
//! - `/api/pairs`, `/api/pairs/:id`: read-only session views

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use pricewall_feed::EndpointConfig;

use crate::supervisor::SessionSupervisor;

#[derive(Clone)]
pub struct AppState {
    pub supervisor: Arc<SessionSupervisor>,
    pub http: reqwest::Client,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/rpc-url", get(rpc_url))
        .route("/api/eth-price", get(eth_price))
        .route("/api/pairs", get(list_pairs))
        .route("/api/pairs/:id", get(pair_view))
        .with_state(state)
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

async fn rpc_url() -> Json<EndpointConfig> {
    Json(EndpointConfig {
        http_url: env_opt("HTTP_RPC_URL"),
        ws_url: env_opt("WSS_RPC_URL"),
        http_url_wld: env_opt("HTTP_WLD_RPC_URL"),
        ws_url_wld: env_opt("WSS_WLD_RPC_URL"),
    })
}

/// Quote as served upward: string-typed fields, the way the upstream
/// reports them.
#[derive(Debug, Clone, Serialize)]
pub struct EthPriceQuote {
    pub ethusd: String,
    pub ethbtc: String,
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    status: String,
    message: String,
    result: Option<EtherscanEthPrice>,
}

#[derive(Debug, Deserialize)]
struct EtherscanEthPrice {
    ethusd: String,
    ethbtc: String,
    ethusd_timestamp: String,
}

fn map_etherscan(response: EtherscanResponse) -> Result<EthPriceQuote, String> {
    if response.status != "1" || response.message != "OK" {
        return Err(format!(
            "upstream status {} ({})",
            response.status, response.message
        ));
    }
    let result = response.result.ok_or("upstream result missing")?;
    Ok(EthPriceQuote {
        ethusd: result.ethusd,
        ethbtc: result.ethbtc,
        timestamp: result.ethusd_timestamp,
    })
}

async fn fetch_eth_price(client: &reqwest::Client) -> Result<EthPriceQuote, String> {
    let api_key = env_opt("ETHERSCAN_API_KEY").unwrap_or_default();
    let url = format!(
        "https://api.etherscan.io/api?module=stats&action=ethprice&apikey={api_key}"
    );

    let response: EtherscanResponse = client
        .get(&url)
        .send()
        .await
        .map_err(|e| format!("request failed: {e}"))?
        .json()
        .await
        .map_err(|e| format!("malformed response: {e}"))?;

    map_etherscan(response)
}

async fn eth_price(State(state): State<AppState>) -> Response {
    match fetch_eth_price(&state.http).await {
        Ok(quote) => Json(quote).into_response(),
        Err(e) => {
            warn!(error = %e, "eth price proxy failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch ETH price" })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Serialize)]
struct PairSummary {
    id: String,
    title: String,
}

async fn list_pairs(State(state): State<AppState>) -> Json<Vec<PairSummary>> {
    let pairs = state
        .supervisor
        .pair_ids()
        .into_iter()
        .map(|(id, title)| PairSummary { id, title })
        .collect();
    Json(pairs)
}

async fn pair_view(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.supervisor.view(&id) {
        Some(view) => Json(view).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "unknown pair" })),
        )
            .into_response(),
    }
}
