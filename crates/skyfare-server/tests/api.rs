use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use skyfare_luggage::{Config, LuggageCalculator};
use skyfare_server::{AppState, create_router};
use skyfare_solver::Solver;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

fn router() -> Router {
    create_router(AppState::default())
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post(router: Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

async fn post_raw(
    path: &str,
    content_type: Option<&str>,
    body: &'static str,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method("POST").uri(path);
    if let Some(content_type) = content_type {
        request = request.header("content-type", content_type);
    }
    send(router(), request.body(Body::from(body)).unwrap()).await
}

#[tokio::test]
async fn test_simplex_optimal() {
    let (status, body) = post(
        router(),
        "/api/simplex",
        json!({
            "objective": [5, 4, 3],
            "constraints": [[2, 3, 1], [4, 1, 2], [3, 4, 2]],
            "b": [5, 11, 8]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let objective = body["objectiveValue"].as_f64().unwrap();
    assert!((objective - 13.0).abs() < 1e-6);
    assert_eq!(body["values"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_simplex_missing_parameters() {
    let (status, body) = post(router(), "/api/simplex", json!({"objective": [1]})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Missing required parameters: objective, constraints, b"
    );
}

#[tokio::test]
async fn test_simplex_without_json_content_type() {
    let (status, body) = post_raw("/api/simplex", None, r#"{"objective": [1]}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Missing required parameters: objective, constraints, b"
    );

    let (status, body) = post_raw("/api/simplex", Some("text/plain"), "objective=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Missing required parameters: objective, constraints, b"
    );
}

#[tokio::test]
async fn test_simplex_malformed_json() {
    let (status, body) = post_raw("/api/simplex", Some("application/json"), "{not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid JSON body")
    );
}

#[tokio::test]
async fn test_simplex_empty_body() {
    let (status, body) = post_raw("/api/simplex", Some("application/json"), "").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Missing required parameters: objective, constraints, b"
    );
}

#[tokio::test]
async fn test_luggage_charge_malformed_json() {
    let (status, body) = post_raw(
        "/api/calculate-luggage-charge",
        Some("application/json"),
        "[1, 2",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = post_raw("/api/calculate-luggage-charge", None, "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid luggage weight");
}

#[tokio::test]
async fn test_simplex_not_arrays() {
    let (status, body) = post(
        router(),
        "/api/simplex",
        json!({"objective": 1, "constraints": [[1]], "b": [1]}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Invalid input: objective, constraints, and b must be arrays"
    );
}

#[tokio::test]
async fn test_simplex_unbounded() {
    let (status, body) = post(
        router(),
        "/api/simplex",
        json!({"objective": [1, 1], "constraints": [[1, 0]], "b": [5]}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Problem is unbounded");
}

#[tokio::test]
async fn test_simplex_iteration_budget() {
    let state = AppState::new(Solver::new().with_max_iterations(1), LuggageCalculator::default());
    let (status, body) = post(
        create_router(state),
        "/api/simplex",
        json!({"objective": [3, 2], "constraints": [[1, 1], [1, 0], [0, 1]], "b": [4, 3, 3]}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].as_str().unwrap().contains("did not converge"));
}

#[tokio::test]
async fn test_luggage_charge_excess() {
    let (status, body) = post(
        router(),
        "/api/calculate-luggage-charge",
        json!({"luggageWeight": 25, "travelClass": "ECONOMY"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["travelClass"], "ECONOMY");
    assert_eq!(body["isExcess"], true);
    assert_eq!(body["excessWeight"], 5.0);
    assert_eq!(body["excessCharge"], 7500.0);
    assert_eq!(body["totalFare"], 17500.0);
    assert_eq!(body["breakdown"]["totalFare"], "₹17,500");
}

#[tokio::test]
async fn test_luggage_charge_uses_configured_fares() {
    let config = Config::parse_toml(
        r#"
        [fares.BUSINESS]
        standard_limit = 35.0
        base_price = 30000.0
        excess_charge_per_kg = 1000.0
        max_pieces = 2
        "#,
    )
    .unwrap();
    let (status, body) = post(
        create_router(AppState::from_config(&config)),
        "/api/calculate-luggage-charge",
        json!({"luggageWeight": 40, "travelClass": "BUSINESS"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["excessCharge"], 5000.0);
    assert_eq!(body["totalFare"], 35000.0);
}

#[tokio::test]
async fn test_luggage_charge_invalid_weight() {
    let (status, body) = post(
        router(),
        "/api/calculate-luggage-charge",
        json!({"luggageWeight": -3, "travelClass": "ECONOMY"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid luggage weight");
}

#[tokio::test]
async fn test_luggage_charge_invalid_class() {
    let (status, body) = post(
        router(),
        "/api/calculate-luggage-charge",
        json!({"luggageWeight": 10, "travelClass": "VIP"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Invalid travel class. Must be ECONOMY, BUSINESS, or FIRST"
    );
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(router(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[derive(Default, Clone)]
struct RequestLog(Arc<Mutex<Vec<(String, Option<u64>)>>>);

impl<S: Subscriber> Layer<S> for RequestLog {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        struct Fields {
            message: String,
            status: Option<u64>,
        }

        impl Visit for Fields {
            fn record_u64(&mut self, field: &Field, value: u64) {
                if field.name() == "status" {
                    self.status = Some(value);
                }
            }

            fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.message = format!("{value:?}");
                }
            }
        }

        let mut fields = Fields {
            message: String::new(),
            status: None,
        };
        event.record(&mut fields);
        self.0.lock().unwrap().push((fields.message, fields.status));
    }
}

#[tokio::test]
async fn test_api_requests_are_logged_once_with_fields() {
    let log = RequestLog::default();
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(log.clone()));

    post(
        router(),
        "/api/calculate-luggage-charge",
        json!({"luggageWeight": 10, "travelClass": "FIRST"}),
    )
    .await;

    let events = log.0.lock().unwrap();
    let requests: Vec<_> = events
        .iter()
        .filter(|(message, _)| message == "api request")
        .collect();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].1, Some(200));
}
