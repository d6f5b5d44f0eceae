use axum::{
    Router,
    extract::Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::config::{
    ConditionsSettings, ConfigError, DEFAULT_MAX_PERIODS, InvestmentSettings, TargetSettings,
    validate_max_periods,
};
use crate::core::{FireError, ResultTimeSeries, run_simulation};
use crate::report::{Chart, ScenarioSummary, chart};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Model(#[from] FireError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "rejected simulate request");
        error_response(StatusCode::BAD_REQUEST, &self.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimulatePayload {
    investment: InvestmentSettings,
    target: TargetSettings,
    conditions: ConditionsSettings,
    #[serde(default = "default_max_periods", alias = "max_periods")]
    max_periods: u32,
}

fn default_max_periods() -> u32 {
    DEFAULT_MAX_PERIODS
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PeriodSummary {
    time: u32,
    age: u32,
    fixed_total_valuation: f64,
    recurring_total_valuation: f64,
    recurring_flow_valuation: f64,
    total_valuation: f64,
    tax_paid: f64,
    is_retired: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    max_periods: u32,
    summary: ScenarioSummary,
    chart: Chart,
    periods: Vec<PeriodSummary>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router() -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/simulate", post(simulate_post_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("FIRE projection API listening on http://{addr}");
    tracing::info!("Local access: http://127.0.0.1:{port}/api/simulate");

    axum::serve(listener, router()).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    match simulate_handler_impl(payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => err.into_response(),
    }
}

fn simulate_handler_impl(payload: SimulatePayload) -> Result<SimulateResponse, ApiError> {
    let max_periods = validate_max_periods(payload.max_periods)?;
    let portfolio = payload.investment.build()?;
    let target = payload.target.build()?;
    let conditions = payload.conditions.build()?;

    tracing::info!(
        max_periods,
        target = target.value_at_retirement(),
        "simulate request"
    );
    let series = run_simulation(&portfolio, &target, &conditions, max_periods)?;

    Ok(SimulateResponse {
        max_periods,
        summary: ScenarioSummary::new(&portfolio, &target, &conditions, &series),
        chart: chart(&series),
        periods: period_summaries(&series),
    })
}

fn period_summaries(series: &ResultTimeSeries) -> Vec<PeriodSummary> {
    series
        .records()
        .iter()
        .map(|record| PeriodSummary {
            time: record.time,
            age: record.time + series.start_age(),
            fixed_total_valuation: record.fixed_total_valuation,
            recurring_total_valuation: record.recurring_total_valuation,
            recurring_flow_valuation: record.recurring_flow_valuation,
            total_valuation: record.total_valuation,
            tax_paid: record.tax_paid,
            is_retired: record.is_retired,
        })
        .collect()
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
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
