mod payload;
pub mod rates;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::ValueEnum;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::core::{
    AmortizationRow, AmortizationTotals, AmortizationYear, ClaimComparison, ClaimingAnalysis,
    Conversion, DebtRatios, MarginBreakdown, RateSolution, RothComparison, TaxSummary,
    TaxTableError, TaxTables, compare_claiming_options, compare_roth_vs_taxable, compute_tax,
    convert, debt_to_income, monthly_payment, optimal_claiming_age, resolve_margin, schedule,
    solve_interest_rate, summarize, yearly_summary,
};
use payload::{
    AmortizationPayload, ClaimComparePayload, ConvertPayload, DebtPayload, IncomeTaxPayload,
    InterestRatePayload, LoanQuote, MarginPayload, RatesQuery, RothPayload, SocialSecurityPayload,
};
use rates::{RateFetcher, RateQuote, RateSource};

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to load tax tables: {0}")]
    TaxTables(#[from] TaxTableError),
    #[error("failed to build rate client: {0}")]
    RateClient(#[from] reqwest::Error),
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone)]
pub struct AppState {
    tables: Arc<TaxTables>,
    rates: Arc<RateFetcher>,
}

impl AppState {
    pub fn new(tables: TaxTables, rates: RateFetcher) -> Self {
        Self {
            tables: Arc::new(tables),
            rates: Arc::new(rates),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, ServeError> {
        let tables = match &config.tax_tables_path {
            Some(path) => TaxTables::from_path(path)?,
            None => TaxTables::embedded()?,
        };
        let rates = RateFetcher::new(
            &config.rates_endpoint,
            Duration::from_secs(config.rates_timeout_secs),
        )?;
        Ok(Self::new(tables, rates))
    }

    fn default_tax_year(&self) -> u16 {
        self.tables
            .supported_years()
            .last()
            .copied()
            .unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Calculator {
    InterestRate,
    Amortization,
    IncomeTax,
    Margin,
    RothIra,
    SocialSecurity,
    ClaimCompare,
    DebtToIncome,
    Currency,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AmortizationResponse {
    monthly_payment: f64,
    annual_rate_percent: f64,
    rate_solution: Option<RateSolution>,
    totals: AmortizationTotals,
    years: Vec<AmortizationYear>,
    schedule: Option<Vec<AmortizationRow>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MarginResponse {
    resolved: Option<MarginBreakdown>,
    message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConvertResponse {
    source: RateSource,
    #[serde(flatten)]
    conversion: Conversion,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    tax_years: Vec<u16>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn interest_rate(payload: &InterestRatePayload) -> RateSolution {
    solve_interest_rate(&payload.loan_terms())
}

fn amortization(payload: &AmortizationPayload) -> AmortizationResponse {
    let (principal, term_months, payment, annual_rate_percent, rate_solution) =
        match payload.loan_quote() {
            LoanQuote::KnownRate {
                principal,
                annual_rate_percent,
                term_months,
            } => (
                principal,
                term_months,
                monthly_payment(principal, annual_rate_percent, term_months),
                annual_rate_percent,
                None,
            ),
            LoanQuote::KnownPayment(terms) => {
                let solution = solve_interest_rate(&terms);
                (
                    terms.principal,
                    terms.term_months,
                    terms.payment,
                    solution.annual_rate_percent,
                    Some(solution),
                )
            }
        };

    let unsolvable = rate_solution.is_some_and(|s| !s.is_solved());
    let rows = if unsolvable {
        Vec::new()
    } else {
        schedule(principal, annual_rate_percent / 1200.0, term_months, payment)
    };

    AmortizationResponse {
        monthly_payment: payment,
        annual_rate_percent,
        rate_solution,
        totals: summarize(&rows),
        years: yearly_summary(&rows),
        schedule: payload.include_schedule().then_some(rows),
    }
}

fn income_tax(state: &AppState, payload: &IncomeTaxPayload) -> Result<TaxSummary, String> {
    let profile = payload.tax_profile(state.default_tax_year());
    compute_tax(&profile, &state.tables).map_err(|e| e.to_string())
}

fn margin(payload: &MarginPayload) -> MarginResponse {
    match resolve_margin(&payload.facts()) {
        Ok(resolved) => MarginResponse {
            resolved: Some(resolved),
            message: None,
        },
        Err(err) => MarginResponse {
            resolved: None,
            message: Some(err.to_string()),
        },
    }
}

fn roth_ira(payload: &RothPayload) -> RothComparison {
    compare_roth_vs_taxable(&payload.growth_params(), payload.tax_rate())
}

fn social_security(payload: &SocialSecurityPayload) -> ClaimingAnalysis {
    optimal_claiming_age(&payload.claiming_profile())
}

fn claim_compare(payload: &ClaimComparePayload) -> ClaimComparison {
    let inputs = payload.inputs();
    compare_claiming_options(
        inputs.option_a,
        inputs.option_b,
        inputs.life_expectancy,
        inputs.discount_rate,
        inputs.cola_rate,
    )
}

fn debt(payload: &DebtPayload) -> DebtRatios {
    debt_to_income(&payload.debt_profile())
}

async fn currency(state: &AppState, payload: &ConvertPayload) -> Result<ConvertResponse, String> {
    let from = payload.from_code();
    let quote = state.rates.fetch(&from).await;
    let conversion = convert(payload.amount(), &from, &payload.to_code(), &quote.table)
        .map_err(|e| e.to_string())?;
    Ok(ConvertResponse {
        source: quote.source,
        conversion,
    })
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/interest-rate",
            get(interest_rate_get).post(interest_rate_post),
        )
        .route(
            "/api/amortization",
            get(amortization_get).post(amortization_post),
        )
        .route("/api/income-tax", get(income_tax_get).post(income_tax_post))
        .route("/api/margin", get(margin_get).post(margin_post))
        .route("/api/roth-ira", get(roth_get).post(roth_post))
        .route(
            "/api/social-security",
            get(social_security_get).post(social_security_post),
        )
        .route(
            "/api/social-security/compare",
            get(claim_compare_get).post(claim_compare_post),
        )
        .route("/api/debt-to-income", get(debt_get).post(debt_post))
        .route(
            "/api/currency/convert",
            get(currency_get).post(currency_post),
        )
        .route("/api/currency/rates", get(rates_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(config: &ServerConfig) -> Result<(), ServeError> {
    let state = AppState::from_config(config)?;
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(address = %listener.local_addr()?, "fincalc HTTP API listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Runs one calculator against a JSON payload and returns the JSON response body.
pub async fn run_calculator(
    state: &AppState,
    calculator: Calculator,
    payload_json: &str,
) -> Result<String, String> {
    let json = if payload_json.trim().is_empty() {
        "{}"
    } else {
        payload_json
    };
    tracing::debug!(?calculator, "running calculator");

    match calculator {
        Calculator::InterestRate => to_json(&interest_rate(&parse_payload(json)?)),
        Calculator::Amortization => to_json(&amortization(&parse_payload(json)?)),
        Calculator::IncomeTax => to_json(&income_tax(state, &parse_payload(json)?)?),
        Calculator::Margin => to_json(&margin(&parse_payload(json)?)),
        Calculator::RothIra => to_json(&roth_ira(&parse_payload(json)?)),
        Calculator::SocialSecurity => to_json(&social_security(&parse_payload(json)?)),
        Calculator::ClaimCompare => to_json(&claim_compare(&parse_payload(json)?)),
        Calculator::DebtToIncome => to_json(&debt(&parse_payload(json)?)),
        Calculator::Currency => to_json(&currency(state, &parse_payload(json)?).await?),
    }
}

fn parse_payload<T: DeserializeOwned>(json: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid JSON payload: {e}"))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("Failed to serialize response: {e}"))
}

async fn health_handler(State(state): State<AppState>) -> Response {
    json_response(
        StatusCode::OK,
        HealthResponse {
            status: "ok",
            tax_years: state.tables.supported_years(),
        },
    )
}

async fn interest_rate_get(Query(payload): Query<InterestRatePayload>) -> Response {
    json_response(StatusCode::OK, interest_rate(&payload))
}

async fn interest_rate_post(Json(payload): Json<InterestRatePayload>) -> Response {
    json_response(StatusCode::OK, interest_rate(&payload))
}

async fn amortization_get(Query(payload): Query<AmortizationPayload>) -> Response {
    json_response(StatusCode::OK, amortization(&payload))
}

async fn amortization_post(Json(payload): Json<AmortizationPayload>) -> Response {
    json_response(StatusCode::OK, amortization(&payload))
}

async fn income_tax_get(
    State(state): State<AppState>,
    Query(payload): Query<IncomeTaxPayload>,
) -> Response {
    income_tax_impl(&state, &payload)
}

async fn income_tax_post(
    State(state): State<AppState>,
    Json(payload): Json<IncomeTaxPayload>,
) -> Response {
    income_tax_impl(&state, &payload)
}

fn income_tax_impl(state: &AppState, payload: &IncomeTaxPayload) -> Response {
    match income_tax(state, payload) {
        Ok(summary) => json_response(StatusCode::OK, summary),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn margin_get(Query(payload): Query<MarginPayload>) -> Response {
    json_response(StatusCode::OK, margin(&payload))
}

async fn margin_post(Json(payload): Json<MarginPayload>) -> Response {
    json_response(StatusCode::OK, margin(&payload))
}

async fn roth_get(Query(payload): Query<RothPayload>) -> Response {
    json_response(StatusCode::OK, roth_ira(&payload))
}

async fn roth_post(Json(payload): Json<RothPayload>) -> Response {
    json_response(StatusCode::OK, roth_ira(&payload))
}

async fn social_security_get(Query(payload): Query<SocialSecurityPayload>) -> Response {
    json_response(StatusCode::OK, social_security(&payload))
}

async fn social_security_post(Json(payload): Json<SocialSecurityPayload>) -> Response {
    json_response(StatusCode::OK, social_security(&payload))
}

async fn claim_compare_get(Query(payload): Query<ClaimComparePayload>) -> Response {
    json_response(StatusCode::OK, claim_compare(&payload))
}

async fn claim_compare_post(Json(payload): Json<ClaimComparePayload>) -> Response {
    json_response(StatusCode::OK, claim_compare(&payload))
}

async fn debt_get(Query(payload): Query<DebtPayload>) -> Response {
    json_response(StatusCode::OK, debt(&payload))
}

async fn debt_post(Json(payload): Json<DebtPayload>) -> Response {
    json_response(StatusCode::OK, debt(&payload))
}

async fn currency_get(
    State(state): State<AppState>,
    Query(payload): Query<ConvertPayload>,
) -> Response {
    currency_impl(&state, &payload).await
}

async fn currency_post(
    State(state): State<AppState>,
    Json(payload): Json<ConvertPayload>,
) -> Response {
    currency_impl(&state, &payload).await
}

async fn currency_impl(state: &AppState, payload: &ConvertPayload) -> Response {
    match currency(state, payload).await {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn rates_handler(
    State(state): State<AppState>,
    Query(query): Query<RatesQuery>,
) -> Response {
    let quote: RateQuote = state.rates.fetch(&query.base_code()).await;
    json_response(StatusCode::OK, quote)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
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
