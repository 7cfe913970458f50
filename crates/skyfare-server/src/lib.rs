//! REST API server for skyfare
//!
//! Endpoints:
//! - POST /api/simplex - Solve a linear program
//! - POST /api/calculate-luggage-charge - Price luggage for a travel class
//! - GET /health - Health check endpoint

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Request, State, rejection::BytesRejection},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;
use skyfare_luggage::api::{self, ApiError, LUGGAGE_CHARGE_ROUTE, SIMPLEX_ROUTE};
use skyfare_luggage::{Config, LuggageCalculator};
use skyfare_solver::Solver;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Immutable state shared across requests
#[derive(Debug, Clone, Default)]
pub struct AppState {
    solver: Solver,
    calculator: LuggageCalculator,
}

impl AppState {
    pub fn new(solver: Solver, calculator: LuggageCalculator) -> Self {
        Self { solver, calculator }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.solver.build(), config.calculator())
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Create the REST API router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(SIMPLEX_ROUTE, post(handle_simplex))
        .route(LUGGAGE_CHARGE_ROUTE, post(handle_luggage_charge))
        .route("/health", get(handle_health))
        .layer(middleware::from_fn(log_api_requests))
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Run the REST API server until ctrl-c
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let router = create_router(AppState::from_config(config));

    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("skyfare API listening on http://{}", address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("skyfare API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
}

/// Handle POST /api/simplex requests
async fn handle_simplex(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match read_body(&headers, body) {
        Ok(body) => body,
        Err(e) => return respond::<Value>(Err(e)),
    };

    // Pivoting is CPU-bound; keep it off the async workers
    let result = tokio::task::spawn_blocking(move || api::solve_simplex(&body, &state.solver)).await;

    match result {
        Ok(result) => respond(result),
        Err(e) => {
            error!(error = %e, "simplex task failed");
            respond::<Value>(Err(ApiError::Internal("Failed to solve linear program".into())))
        }
    }
}

/// Handle POST /api/calculate-luggage-charge requests
async fn handle_luggage_charge(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let result = read_body(&headers, body)
        .and_then(|body| api::calculate_luggage_charge(&body, &state.calculator));
    respond(result)
}

/// Decode a request body as JSON.
///
/// Bodies that are empty or not sent as JSON read as `{}`, so the endpoint answers with its
/// own missing-field message.
fn read_body(
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Value, ApiError> {
    let body = body.map_err(|e| ApiError::BadRequest(format!("Invalid request body: {e}")))?;

    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("json"));
    if !is_json || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }

    serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))
}

/// Handle GET /health requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn respond<T: Serialize>(result: Result<T, ApiError>) -> Response {
    match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            let status =
                StatusCode::from_u16(e.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(e.body())).into_response()
        }
    }
}

/// Log method, path, status and elapsed milliseconds for API routes
async fn log_api_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let start = Instant::now();

    let response = next.run(request).await;

    if path.starts_with("/api") {
        let elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            %method,
            %path,
            status = response.status().as_u16(),
            elapsed_ms,
            "api request"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_respond_maps_status() {
        let response = respond::<Value>(Err(ApiError::BadRequest("bad".into())));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = respond::<Value>(Err(ApiError::Internal("boom".into())));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = respond(Ok(serde_json::json!({"ok": true})));
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_read_body() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            read_body(&headers, Ok(Bytes::from_static(b"{\"b\": 1}"))).unwrap(),
            serde_json::json!({})
        );

        headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        assert_eq!(
            read_body(&headers, Ok(Bytes::from_static(b"{\"b\": 1}"))).unwrap(),
            serde_json::json!({"b": 1})
        );
        assert_eq!(
            read_body(&headers, Ok(Bytes::from_static(b"  "))).unwrap(),
            serde_json::json!({})
        );

        let err = read_body(&headers, Ok(Bytes::from_static(b"{not json"))).unwrap_err();
        assert_eq!(err.status(), 400);
        assert!(err.to_string().starts_with("Invalid JSON body"));
    }

    #[test]
    fn test_state_from_config() {
        let config = Config::parse_toml("[solver]\nphase_one = true").unwrap();
        let state = AppState::from_config(&config);
        assert!(state.solver.phase_one());
    }
}
