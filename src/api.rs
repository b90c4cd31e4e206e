//! REST API for the loading estimator.
//!
//! Provides HTTP endpoints for the supplier packaging form and dashboard.
//! Uses Axum as the web framework and supports CORS.

use std::sync::{Arc, OnceLock};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use utoipa::{OpenApi, ToSchema};

use crate::calculator::{
    CalculationEvent, CalculationInput, CalculationReport, CalculatorConfig, CatalogRollup,
    calculate, calculate_with_progress, validate_stacking,
};
use crate::config::ApiConfig;
use crate::model::{
    CONTAINER_CATALOG, ContainerFitResult, ContainerProfile, Material, PackingResult,
    StackingCheck, find_container,
};
use crate::store::{
    InMemorySubmissionStore, Submission, SubmissionDraft, SubmissionError, SubmissionStore,
    SubmissionSummary,
};
use crate::sustainability::Indicator;
use crate::types::{Dimensions3D, validation};
use crate::units::{self, UnitSystem};

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    calculator_config: CalculatorConfig,
    store: Arc<dyn SubmissionStore>,
}

impl ApiState {
    pub fn new(calculator_config: CalculatorConfig, store: Arc<dyn SubmissionStore>) -> Self {
        Self {
            calculator_config,
            store,
        }
    }

    /// State with an empty in-memory submission store.
    pub fn in_memory(calculator_config: CalculatorConfig) -> Self {
        Self::new(calculator_config, Arc::new(InMemorySubmissionStore::new()))
    }
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>pallet-fit API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                });
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Physical quantity of a conversion request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    Length,
    Mass,
}

/// Request structure for the conversion endpoint.
#[derive(Deserialize, ToSchema)]
#[schema(example = json!({ "quantity": "length", "value": 48.0, "from": "imperial", "to": "metric" }))]
pub struct ConvertRequest {
    pub quantity: Quantity,
    pub value: f64,
    pub from: UnitSystem,
    pub to: UnitSystem,
}

#[derive(Serialize, ToSchema)]
pub struct ConvertResponse {
    pub value: f64,
    pub unit: String,
}

/// Request structure for the stacking endpoint.
///
/// Values are in `unit_system` (configured default when omitted). Missing
/// limits are taken from `container`.
#[derive(Deserialize, ToSchema)]
#[schema(example = json!({
    "pallet_height": 120.0,
    "pallet_weight": 650.0,
    "quantity": 2,
    "container": "40' High Cube"
}))]
pub struct StackingRequest {
    pub pallet_height: f64,
    pub pallet_weight: f64,
    pub quantity: u64,
    #[serde(default)]
    #[schema(nullable = true)]
    pub max_height: Option<f64>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub max_weight: Option<f64>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub container: Option<String>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub unit_system: Option<UnitSystem>,
}

#[derive(Debug)]
struct StackingLimits {
    pallet_height: f64,
    pallet_weight: f64,
    quantity: u64,
    max_height: f64,
    max_weight: f64,
}

impl StackingRequest {
    /// Resolves limits and converts everything to cm/kg.
    fn into_limits(self, default_units: UnitSystem) -> Result<StackingLimits, String> {
        let unit_system = self.unit_system.unwrap_or(default_units);
        validation::validate_non_negative(self.pallet_height, "Pallet height")?;
        validation::validate_non_negative(self.pallet_weight, "Pallet weight")?;
        if let Some(max_height) = self.max_height {
            validation::validate_non_negative(max_height, "Maximum height")?;
        }
        if let Some(max_weight) = self.max_weight {
            validation::validate_non_negative(max_weight, "Maximum weight")?;
        }

        let profile = match self.container.as_deref() {
            Some(name) => Some(
                find_container(name).ok_or_else(|| format!("Unknown container type '{}'", name))?,
            ),
            None => None,
        };

        let max_height = match (self.max_height, profile) {
            (Some(raw), _) => units::to_metric_length(raw, unit_system),
            (None, Some(profile)) => profile.height,
            (None, None) => return Err("max_height or container is required".to_string()),
        };
        let max_weight = match (self.max_weight, profile) {
            (Some(raw), _) => units::to_metric_mass(raw, unit_system),
            (None, Some(profile)) => profile.max_weight,
            (None, None) => return Err("max_weight or container is required".to_string()),
        };

        Ok(StackingLimits {
            pallet_height: units::to_metric_length(self.pallet_height, unit_system),
            pallet_weight: units::to_metric_mass(self.pallet_weight, unit_system),
            quantity: self.quantity,
            max_height,
            max_weight,
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct SubmissionCreated {
    pub position: usize,
    pub submission: Submission,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn validation_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        details,
    )
}

fn parse_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(err) => Err(json_deserialize_error(err)),
    }
}

fn parse_calculation_input(
    payload: Result<Json<CalculationInput>, JsonRejection>,
) -> Result<CalculationInput, Response> {
    let input = parse_json(payload)?;
    input
        .validate()
        .map_err(|err| validation_error(err.to_string()))?;
    Ok(input)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handle_containers,
        handle_convert,
        handle_calculate,
        handle_calculate_stream,
        handle_stacking,
        handle_submit,
        handle_list_submissions,
        handle_submission_summary
    ),
    components(
        schemas(
            CalculationInput,
            CalculationReport,
            CalculationEvent,
            CatalogRollup,
            ContainerFitResult,
            ContainerProfile,
            ConvertRequest,
            ConvertResponse,
            Dimensions3D,
            ErrorResponse,
            Indicator,
            Material,
            PackingResult,
            Quantity,
            StackingCheck,
            StackingRequest,
            Submission,
            SubmissionCreated,
            SubmissionDraft,
            SubmissionSummary,
            UnitSystem
        )
    ),
    tags(
        (name = "calculation", description = "Pallet and container loading estimates"),
        (name = "submissions", description = "Supplier submissions")
    )
)]
struct ApiDoc;

/// Builds the application router.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/containers", get(handle_containers))
        .route("/convert", post(handle_convert))
        .route("/calculate", post(handle_calculate))
        .route("/calculate_stream", post(handle_calculate_stream))
        .route("/stacking", post(handle_stacking))
        .route("/submissions", post(handle_submit).get(handle_list_submissions))
        .route("/submissions/summary", get(handle_submission_summary))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server.
///
/// Blocks until the server is terminated.
pub async fn start_api_server(config: ApiConfig, state: ApiState) {
    let app = router(state);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            panic!("❌ Could not bind API server to {}: {}", addr, err);
        }
    };

    info!(
        "🚀 Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        info!("💡 Local access: http://localhost:{}", config.port());
    }
    info!("📦 API Endpoints: GET /containers, POST /convert, POST /calculate, POST /calculate_stream, POST /stacking");
    info!("🗂️ Submissions: POST /submissions, GET /submissions, GET /submissions/summary");
    info!("📑 Documentation: GET /docs, GET /docs/openapi.json");

    if let Err(err) = axum::serve(listener, app).await {
        error!("❌ API server terminated with an error: {err}");
    }
}

/// Handler for GET /containers.
#[utoipa::path(
    get,
    path = "/containers",
    responses((status = 200, description = "Container catalog", body = [ContainerProfile])),
    tag = "calculation"
)]
async fn handle_containers() -> impl IntoResponse {
    Json(CONTAINER_CATALOG.to_vec())
}

/// Handler for POST /convert.
#[utoipa::path(
    post,
    path = "/convert",
    request_body = ConvertRequest,
    responses(
        (status = 200, description = "Converted value", body = ConvertResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "calculation"
)]
async fn handle_convert(payload: Result<Json<ConvertRequest>, JsonRejection>) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let response = match request.quantity {
        Quantity::Length => ConvertResponse {
            value: units::convert_length(request.value, request.from, request.to),
            unit: request.to.length_unit().to_string(),
        },
        Quantity::Mass => ConvertResponse {
            value: units::convert_mass(request.value, request.from, request.to),
            unit: request.to.mass_unit().to_string(),
        },
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Handler for POST /calculate.
///
/// Runs packing, pallet weight and container evaluation for the whole
/// catalog.
#[utoipa::path(
    post,
    path = "/calculate",
    request_body = CalculationInput,
    responses(
        (status = 200, description = "Calculation report", body = CalculationReport),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "calculation"
)]
async fn handle_calculate(
    State(state): State<ApiState>,
    payload: Result<Json<CalculationInput>, JsonRejection>,
) -> Response {
    let input = match parse_calculation_input(payload) {
        Ok(input) => input,
        Err(response) => return response,
    };

    let report = calculate(&input, &state.calculator_config);
    info!(
        "📦 Calculation: {} boxes per pallet, best container {}",
        report.packing.total_boxes_per_pallet,
        report.rollup.best_container.as_deref().unwrap_or("none")
    );
    (StatusCode::OK, Json(report)).into_response()
}

/// Handler for POST /calculate_stream endpoint (SSE).
///
/// Streams one event per calculation step as Server-Sent Events.
#[utoipa::path(
    post,
    path = "/calculate_stream",
    request_body = CalculationInput,
    responses(
        (
            status = 200,
            description = "Streams calculation events",
            content_type = "text/event-stream",
            body = String
        ),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "calculation"
)]
async fn handle_calculate_stream(
    State(state): State<ApiState>,
    payload: Result<Json<CalculationInput>, JsonRejection>,
) -> Response {
    let input = match parse_calculation_input(payload) {
        Ok(input) => input,
        Err(response) => return response,
    };

    let (tx, rx) = mpsc::channel::<String>(16);
    let config = state.calculator_config;

    tokio::task::spawn_blocking(move || {
        calculate_with_progress(&input, &config, |evt| match serde_json::to_string(evt) {
            // A closed receiver only means the client went away.
            Ok(json) => {
                let _ = tx.blocking_send(json);
            }
            Err(err) => warn!("⚠️ Could not serialize calculation event: {}", err),
        });
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Handler for POST /stacking.
#[utoipa::path(
    post,
    path = "/stacking",
    request_body = StackingRequest,
    responses(
        (status = 200, description = "Stacking validation in cm/kg", body = StackingCheck),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "calculation"
)]
async fn handle_stacking(
    State(state): State<ApiState>,
    payload: Result<Json<StackingRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let limits = match request.into_limits(state.calculator_config.default_unit_system) {
        Ok(limits) => limits,
        Err(details) => return validation_error(details),
    };

    let check = validate_stacking(
        limits.pallet_height,
        limits.pallet_weight,
        limits.quantity,
        limits.max_height,
        limits.max_weight,
    );
    if !check.is_ok() {
        info!(
            "📏 Stack of {} pallets exceeds limits (height ok: {}, weight ok: {})",
            limits.quantity, check.height_ok, check.weight_ok
        );
    }
    (StatusCode::OK, Json(check)).into_response()
}

/// Handler for POST /submissions.
///
/// Validates the draft, calculates, snapshots the result and appends it to
/// the store.
#[utoipa::path(
    post,
    path = "/submissions",
    request_body = SubmissionDraft,
    responses(
        (status = 201, description = "Submission saved", body = SubmissionCreated),
        (status = UNPROCESSABLE_ENTITY, description = "Missing or invalid fields", body = ErrorResponse)
    ),
    tag = "submissions"
)]
async fn handle_submit(
    State(state): State<ApiState>,
    payload: Result<Json<SubmissionDraft>, JsonRejection>,
) -> Response {
    let draft = match parse_json(payload) {
        Ok(draft) => draft,
        Err(response) => return response,
    };

    let submission = match draft.into_submission(&state.calculator_config) {
        Ok(submission) => submission,
        Err(err @ SubmissionError::InvalidInput(_)) => return validation_error(err.to_string()),
        Err(err) => {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Submission rejected",
                err.to_string(),
            );
        }
    };

    let position = state.store.append(submission.clone());
    info!(
        "📥 Submission #{} saved for supplier '{}'",
        position, submission.supplier_name
    );
    (
        StatusCode::CREATED,
        Json(SubmissionCreated {
            position,
            submission,
        }),
    )
        .into_response()
}

/// Handler for GET /submissions: ordered JSON export.
#[utoipa::path(
    get,
    path = "/submissions",
    responses((status = 200, description = "All submissions in insertion order", body = [Submission])),
    tag = "submissions"
)]
async fn handle_list_submissions(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.store.list())
}

/// Handler for GET /submissions/summary.
#[utoipa::path(
    get,
    path = "/submissions/summary",
    responses((status = 200, description = "Dashboard figures", body = SubmissionSummary)),
    tag = "submissions"
)]
async fn handle_submission_summary(State(state): State<ApiState>) -> impl IntoResponse {
    Json(SubmissionSummary::from_submissions(&state.store.list()))
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        router(ApiState::in_memory(CalculatorConfig::default()))
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn sample_packaging() -> Value {
        json!({
            "unit_system": "metric",
            "primary_dims": { "length": 40.0, "width": 30.0, "height": 20.0 },
            "primary_weight": 5.0,
            "quantity_per_primary": 10,
            "material": "Metal",
            "pallet_dims": { "length": 120.0, "width": 100.0, "height": 150.0 },
            "indicators": ["Recyclable", "Reusable", "Biodegradable"]
        })
    }

    #[test]
    fn openapi_doc_lists_expected_paths() {
        let doc = openapi_doc();
        let paths = &doc.paths.paths;
        for path in [
            "/containers",
            "/convert",
            "/calculate",
            "/calculate_stream",
            "/stacking",
            "/submissions",
            "/submissions/summary",
        ] {
            assert!(
                paths.contains_key(path),
                "OpenAPI documentation is missing the {} path",
                path
            );
        }
    }

    #[test]
    fn openapi_doc_contains_key_schemas() {
        let doc = openapi_doc();
        let components = doc
            .components
            .as_ref()
            .expect("OpenAPI documentation contains no components");
        let schemas = &components.schemas;
        for name in [
            "CalculationInput",
            "CalculationReport",
            "SubmissionDraft",
            "ErrorResponse",
        ] {
            assert!(
                schemas.contains_key(name),
                "Expected schema '{}' is missing from OpenAPI spec",
                name
            );
        }
    }

    #[test]
    fn stacking_request_falls_back_to_container_limits() {
        let request: StackingRequest = serde_json::from_value(json!({
            "pallet_height": 120.0,
            "pallet_weight": 650.0,
            "quantity": 2,
            "container": "40' High Cube"
        }))
        .expect("Should parse valid JSON");
        let limits = request.into_limits(UnitSystem::Metric).unwrap();
        assert_eq!(limits.max_height, 270.0);
        assert_eq!(limits.max_weight, 26_500.0);
    }

    #[test]
    fn stacking_request_converts_imperial_values() {
        let request: StackingRequest = serde_json::from_value(json!({
            "pallet_height": 10.0,
            "pallet_weight": 2.20462,
            "quantity": 1,
            "max_height": 100.0,
            "max_weight": 22.0462,
            "unit_system": "imperial"
        }))
        .unwrap();
        let limits = request.into_limits(UnitSystem::Metric).unwrap();
        assert!((limits.pallet_height - 25.4).abs() < 1e-9);
        assert!((limits.pallet_weight - 1.0).abs() < 1e-9);
        assert!((limits.max_height - 254.0).abs() < 1e-9);
        assert!((limits.max_weight - 10.0).abs() < 1e-9);
    }

    #[test]
    fn stacking_request_requires_limits() {
        let request: StackingRequest = serde_json::from_value(json!({
            "pallet_height": 120.0,
            "pallet_weight": 650.0,
            "quantity": 2
        }))
        .unwrap();
        assert!(request.into_limits(UnitSystem::Metric).is_err());
    }

    #[tokio::test]
    async fn containers_endpoint_lists_catalog() {
        let (status, body) = send(app(), "GET", "/containers", None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["40' Standard", "40' High Cube", "53' Trailer"]);
    }

    #[tokio::test]
    async fn convert_endpoint_converts_inches() {
        let (status, body) = send(
            app(),
            "POST",
            "/convert",
            Some(json!({ "quantity": "length", "value": 1.0, "from": "imperial", "to": "metric" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["value"], 2.54);
        assert_eq!(body["unit"], "cm");
    }

    #[tokio::test]
    async fn calculate_endpoint_returns_report() {
        let (status, body) = send(app(), "POST", "/calculate", Some(sample_packaging())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["packing"]["boxes_per_layer"], 9);
        assert_eq!(body["packing"]["layers"], 7);
        assert_eq!(body["packing"]["total_boxes_per_pallet"], 63);
        assert_eq!(body["packing"]["quantity_per_secondary"], 630);
        assert_eq!(body["sustainability_score"], 99);
        assert_eq!(body["estimated_cost"], 6.0);
        let standard = &body["rollup"]["fits"][0];
        assert_eq!(standard["container"], "40' Standard");
        assert_eq!(standard["pallets_per_container"], 20);
    }

    #[tokio::test]
    async fn calculate_endpoint_rejects_negative_dimensions() {
        let mut payload = sample_packaging();
        payload["pallet_dims"]["width"] = json!(-100.0);
        let (status, body) = send(app(), "POST", "/calculate", Some(payload)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Invalid input data");
    }

    #[tokio::test]
    async fn calculate_endpoint_rejects_malformed_json() {
        let (status, body) = send(
            app(),
            "POST",
            "/calculate",
            Some(json!({ "primary_dims": "large" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Invalid JSON data");
    }

    #[tokio::test]
    async fn calculate_endpoint_accepts_zero_dimensions() {
        let mut payload = sample_packaging();
        payload["primary_dims"]["height"] = json!(0.0);
        let (status, body) = send(app(), "POST", "/calculate", Some(payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["packing"]["total_boxes_per_pallet"], 0);
        assert_eq!(body["secondary_weight_kg"], 0.0);
    }

    #[tokio::test]
    async fn stacking_endpoint_reports_both_flags() {
        let (status, body) = send(
            app(),
            "POST",
            "/stacking",
            Some(json!({
                "pallet_height": 150.0,
                "pallet_weight": 500.0,
                "quantity": 3,
                "max_height": 400.0,
                "max_weight": 1000.0
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["height_ok"], false);
        assert_eq!(body["weight_ok"], false);
        assert_eq!(body["total_stack_height"], 450.0);
    }

    #[test]
    fn stacking_request_rejects_negative_values() {
        for field in ["pallet_height", "pallet_weight", "max_height", "max_weight"] {
            let mut body = json!({
                "pallet_height": 150.0,
                "pallet_weight": 500.0,
                "quantity": 3,
                "max_height": 400.0,
                "max_weight": 1000.0
            });
            body[field] = json!(-1.0);
            let request: StackingRequest = serde_json::from_value(body).unwrap();
            let err = request.into_limits(UnitSystem::Metric).unwrap_err();
            assert!(err.contains("must not be negative"), "{}: {}", field, err);
        }
    }

    #[tokio::test]
    async fn stacking_endpoint_rejects_negative_pallet() {
        let (status, body) = send(
            app(),
            "POST",
            "/stacking",
            Some(json!({
                "pallet_height": -150.0,
                "pallet_weight": -500.0,
                "quantity": 3,
                "max_height": 400.0,
                "max_weight": 1000.0
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Invalid input data");
    }

    #[tokio::test]
    async fn stacking_endpoint_rejects_unknown_container() {
        let (status, _) = send(
            app(),
            "POST",
            "/stacking",
            Some(json!({
                "pallet_height": 150.0,
                "pallet_weight": 500.0,
                "quantity": 1,
                "container": "Shoebox"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn submissions_are_stored_and_summarized() {
        let app = app();
        let draft = json!({
            "supplier_name": "Acme",
            "selected_container": "40' Standard",
            "packaging": sample_packaging()
        });

        let (status, body) = send(app.clone(), "POST", "/submissions", Some(draft.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["position"], 1);
        assert_eq!(body["submission"]["Quantity per Secondary"], 630);
        assert_eq!(body["submission"]["Pallets per Container"], 20);

        let (status, _) = send(app.clone(), "POST", "/submissions", Some(draft)).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(app.clone(), "GET", "/submissions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (status, body) = send(app, "GET", "/submissions/summary", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_submissions"], 2);
        assert_eq!(body["unique_suppliers"], 1);
    }

    #[tokio::test]
    async fn submission_without_supplier_is_rejected() {
        let app = app();
        let draft = json!({
            "supplier_name": "",
            "selected_container": "40' Standard",
            "packaging": sample_packaging()
        });
        let (status, body) = send(app.clone(), "POST", "/submissions", Some(draft)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["details"], "Supplier name is required");

        let (_, body) = send(app, "GET", "/submissions", None).await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn calculate_stream_emits_events() {
        let request = Request::builder()
            .method("POST")
            .uri("/calculate_stream")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(sample_packaging().to_string()))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let events: Vec<Value> = text
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|data| serde_json::from_str(data.trim_start()).unwrap())
            .collect();
        assert_eq!(events.first().unwrap()["type"], "PackingComputed");
        assert_eq!(events.last().unwrap()["type"], "Finished");
        let evaluated = events
            .iter()
            .filter(|evt| evt["type"] == "ContainerEvaluated")
            .count();
        assert_eq!(evaluated, CONTAINER_CATALOG.len());
    }
}
