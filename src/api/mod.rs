use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::core::{
    ADVISOR_GOAL, BONUS_AMOUNT, BONUS_THRESHOLD, CommissionType, Comparison, STANDARD_PLAN,
    SimulationResult, TIERS, compare, simulate,
};

mod report;

pub use report::{format_amount, format_rate, render_comparison, render_results};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliCommissionType {
    #[value(alias = "flujo")]
    Flow,
    #[value(alias = "saldo")]
    Balance,
}

impl From<CliCommissionType> for CommissionType {
    fn from(value: CliCommissionType) -> Self {
        match value {
            CliCommissionType::Flow => CommissionType::Flow,
            CliCommissionType::Balance => CommissionType::Balance,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiCommissionType {
    #[serde(alias = "flujo")]
    Flow,
    #[serde(alias = "saldo")]
    Balance,
}

impl From<ApiCommissionType> for CliCommissionType {
    fn from(value: ApiCommissionType) -> Self {
        match value {
            ApiCommissionType::Flow => CliCommissionType::Flow,
            ApiCommissionType::Balance => CliCommissionType::Balance,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    target: Option<f64>,
    locked_tier: Option<usize>,
    commission_type: Option<ApiCommissionType>,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "commission-sim",
    about = "Tiered commission simulator (flow and balance commissions, one-time flow bonus)"
)]
pub struct Cli {
    #[arg(
        long,
        default_value_t = 10000.0,
        allow_negative_numbers = true,
        help = "Target commission; negative values are treated as 0"
    )]
    target: f64,
    #[arg(long, help = "Only simulate this tier (0, 1 or 2); all tiers when omitted")]
    tier: Option<usize>,
    #[arg(long, value_enum, default_value_t = CliCommissionType::Flow)]
    commission_type: CliCommissionType,
    #[arg(long, help = "Print the flow vs balance comparison instead")]
    compare: bool,
    #[arg(long, help = "Print the API JSON response instead of a text report")]
    json: bool,
    #[arg(
        long,
        conflicts_with = "compare",
        help = "Include the per-client table in the text report"
    )]
    details: bool,
}

#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("target must be a finite amount, got {0}")]
    InvalidTarget(f64),
    #[error("lockedTier must be between 0 and {max}, got {index}")]
    UnknownTier { index: usize, max: usize },
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct ApiRequest {
    target: f64,
    locked_tier: Option<usize>,
    commission_type: CommissionType,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    target: f64,
    locked_tier: Option<usize>,
    commission_type: CommissionType,
    advisor_goal: f64,
    bonus_threshold: f64,
    bonus_amount: f64,
    results: Vec<SimulationResult>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResultSummary {
    rate: f64,
    client_count: usize,
    total_commission: f64,
    total_transfer: f64,
    meta_percent: f64,
    bonus_applied: bool,
    target_met: bool,
}

impl From<&SimulationResult> for ResultSummary {
    fn from(result: &SimulationResult) -> Self {
        Self {
            rate: result.rate,
            client_count: result.clients.len(),
            total_commission: result.total_commission,
            total_transfer: result.total_transfer,
            meta_percent: result.meta_percent,
            bonus_applied: result.bonus_applied,
            target_met: result.target_met,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ComparisonRow {
    tier_index: usize,
    label: &'static str,
    flow: ResultSummary,
    balance: ResultSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    target: f64,
    locked_tier: Option<usize>,
    rows: Vec<ComparisonRow>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_request(cli: &Cli) -> Result<ApiRequest, RequestError> {
    if !cli.target.is_finite() {
        return Err(RequestError::InvalidTarget(cli.target));
    }

    if let Some(index) = cli.tier {
        if index >= TIERS.len() {
            return Err(RequestError::UnknownTier {
                index,
                max: TIERS.len() - 1,
            });
        }
    }

    Ok(ApiRequest {
        target: cli.target.max(0.0),
        locked_tier: cli.tier,
        commission_type: cli.commission_type.into(),
    })
}

pub fn run_cli(cli: Cli) -> anyhow::Result<String> {
    let request = build_request(&cli)?;
    log::debug!("cli request: {request:?}");

    if cli.compare {
        let comparison = compare(request.target, request.locked_tier);
        if cli.json {
            let response = build_compare_response(&request, &comparison);
            return Ok(format!("{}\n", serde_json::to_string_pretty(&response)?));
        }
        return Ok(render_comparison(&comparison)?);
    }

    let results = simulate(request.target, request.locked_tier, request.commission_type);
    if cli.json {
        let response = build_simulate_response(&request, results);
        return Ok(format!("{}\n", serde_json::to_string_pretty(&response)?));
    }
    Ok(render_results(&results, cli.details)?)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route(
            "/api/compare",
            get(compare_get_handler).post(compare_post_handler),
        )
        .route("/api/tiers", get(tiers_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("Commission simulator API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/api/tiers");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn tiers_handler() -> Response {
    json_response(StatusCode::OK, STANDARD_PLAN)
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload)
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload)
}

async fn compare_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    compare_handler_impl(payload)
}

async fn compare_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    compare_handler_impl(payload)
}

fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => return rejected(err),
    };
    log::debug!("simulate: {request:?}");

    let results = simulate(request.target, request.locked_tier, request.commission_type);
    json_response(StatusCode::OK, build_simulate_response(&request, results))
}

fn compare_handler_impl(payload: SimulatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => return rejected(err),
    };
    log::debug!("compare: {request:?}");

    let comparison = compare(request.target, request.locked_tier);
    json_response(StatusCode::OK, build_compare_response(&request, &comparison))
}

fn rejected(err: RequestError) -> Response {
    log::warn!("rejected request: {err}");
    error_response(StatusCode::BAD_REQUEST, &err.to_string())
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload).map_err(|e| e.to_string())
}

fn api_request_from_payload(payload: SimulatePayload) -> Result<ApiRequest, RequestError> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.target {
        cli.target = v;
    }
    if let Some(v) = payload.locked_tier {
        cli.tier = Some(v);
    }
    if let Some(v) = payload.commission_type {
        cli.commission_type = v.into();
    }

    build_request(&cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        target: 10_000.0,
        tier: None,
        commission_type: CliCommissionType::Flow,
        compare: false,
        json: true,
        details: false,
    }
}

fn build_simulate_response(
    request: &ApiRequest,
    results: Vec<SimulationResult>,
) -> SimulateResponse {
    SimulateResponse {
        target: request.target,
        locked_tier: request.locked_tier,
        commission_type: request.commission_type,
        advisor_goal: ADVISOR_GOAL,
        bonus_threshold: BONUS_THRESHOLD,
        bonus_amount: BONUS_AMOUNT,
        results,
    }
}

fn build_compare_response(request: &ApiRequest, comparison: &Comparison) -> CompareResponse {
    let rows = comparison
        .flow
        .iter()
        .zip(comparison.balance.iter())
        .map(|(flow, balance)| ComparisonRow {
            tier_index: flow.tier_index,
            label: flow.tier.label,
            flow: flow.into(),
            balance: balance.into(),
        })
        .collect();

    CompareResponse {
        target: request.target,
        locked_tier: request.locked_tier,
        rows,
    }
}
