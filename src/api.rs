//! HTTP API for the CTC Engine.
//!
//! This module exposes a small REST API around the calculation engine
//! using the [`axum`](https://crates.io/crates/axum) framework.  Clients
//! may submit a fully specified calculation, a payroll run covering many
//! employees, or a salary assignment for an employee whose heads and rate
//! rules are read from the company catalogs held in the store.

use crate::engine::{calculate, run_payroll};
use crate::error::{ConfigurationError, ValidationError};
use crate::models::{
    CalculationInput, CalculationRequest, CalculationResult, EmployeeBreakdown,
    EmployeeSalaryInput, SalaryConfig, SalaryMode,
};
use crate::rates::{load_catalogs_from_dir, GratuityRule};
use crate::store::{MemoryStore, StoredBreakdown};
use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Application state shared across requests.
pub struct AppState {
    pub store: MemoryStore,
}

/// Errors returned by the handlers, rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The body is not JSON or does not have the expected shape.
    #[error("invalid request body: {}", .0.body_text())]
    Body(#[from] JsonRejection),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("{0}")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Body(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Configuration(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        let body = Json(serde_json::json!({"error": self.to_string()}));
        (status, body).into_response()
    }
}

/// Body of a salary assignment for a stored employee.
#[derive(Debug, Deserialize)]
pub struct SalaryRequest {
    pub mode: String,
    pub input_amount: Decimal,
    pub selected_head_ids: Vec<String>,
    /// Date whose rate rules apply; today when absent.
    #[serde(default)]
    pub effective_on: Option<NaiveDate>,
}

/// Build the API router around an existing state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/calculate", post(calculate_handler))
        .route("/api/payroll-runs", post(payroll_run_handler))
        .route(
            "/api/companies/:company_id/employees/:employee_id/salary",
            post(assign_salary_handler).get(get_salary_handler),
        )
        .with_state(state)
}

/// Build the API router and load company catalogs from the given
/// directory.  Returns the router and a handle to the state.
pub async fn build_router(catalog_dir: PathBuf) -> Result<(Router, Arc<AppState>)> {
    let store = MemoryStore::new();
    for catalog in load_catalogs_from_dir(&catalog_dir)? {
        tracing::info!(
            company_id = %catalog.company_id,
            heads = catalog.heads.len(),
            rates = catalog.rates.len(),
            "loaded company catalog"
        );
        store.insert_catalog(catalog).await;
    }
    let state = Arc::new(AppState { store });
    Ok((router(state.clone()), state))
}

/// Handler for POST /api/calculate
async fn calculate_handler(
    body: Result<Json<CalculationRequest>, JsonRejection>,
) -> Result<Json<CalculationResult>, ApiError> {
    let Json(request) = body?;
    let input = request.into_input()?;
    Ok(Json(calculate(&input)?))
}

/// Handler for POST /api/payroll-runs
async fn payroll_run_handler(
    body: Result<Json<Vec<EmployeeSalaryInput>>, JsonRejection>,
) -> Result<Json<Vec<EmployeeBreakdown>>, ApiError> {
    let Json(batch) = body?;
    tracing::info!(employees = batch.len(), "running payroll");
    Ok(Json(run_payroll(batch)))
}

/// Handler for POST /api/companies/:company_id/employees/:employee_id/salary
async fn assign_salary_handler(
    State(app_state): State<Arc<AppState>>,
    Path((company_id, employee_id)): Path<(String, String)>,
    body: Result<Json<SalaryRequest>, JsonRejection>,
) -> Result<Json<StoredBreakdown>, ApiError> {
    let Json(request) = body?;
    let mode: SalaryMode = request.mode.parse()?;
    let store = &app_state.store;
    let as_of = request
        .effective_on
        .unwrap_or_else(|| Local::now().date_naive());
    let input = CalculationInput {
        mode,
        input_amount: request.input_amount,
        heads: store
            .heads_for_selection(&company_id, &request.selected_head_ids)
            .await,
        selected_head_ids: request.selected_head_ids,
        pf_rule: store.latest_pf_rule(&company_id, as_of).await,
        esi_rule: store.latest_esi_rule(&company_id, as_of).await,
        gratuity_rule: GratuityRule::default(),
    };
    input.validate()?;
    let result = calculate(&input)?;
    let breakdown = StoredBreakdown {
        config: SalaryConfig::snapshot(&input, &result)?,
        company_id,
        employee_id,
        rows: result.rows,
        totals: result.totals,
    };
    if store.replace_breakdown(breakdown.clone()).await.is_some() {
        tracing::info!(
            company_id = %breakdown.company_id,
            employee_id = %breakdown.employee_id,
            "replaced previous salary breakdown"
        );
    }
    Ok(Json(breakdown))
}

/// Handler for GET /api/companies/:company_id/employees/:employee_id/salary
async fn get_salary_handler(
    State(app_state): State<Arc<AppState>>,
    Path((company_id, employee_id)): Path<(String, String)>,
) -> Result<Json<StoredBreakdown>, ApiError> {
    app_state
        .store
        .breakdown(&company_id, &employee_id)
        .await
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "no salary breakdown for employee {employee_id} of company {company_id}"
            ))
        })
}

/// Launch the API server.  This function builds the router from the
/// given catalog directory and binds to the supplied address.  It
/// blocks until the server terminates.
pub async fn serve(addr: SocketAddr, catalog_dir: PathBuf) -> Result<()> {
    let (router, _state) = build_router(catalog_dir).await?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, router).await?;
    Ok(())
}
