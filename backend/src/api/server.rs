//! HTTP Server for the UMUD catalog API.
//!
//! # API Endpoints
//!
//! | Method | Path                               | Description                          |
//! |--------|------------------------------------|--------------------------------------|
//! | GET    | `/health`                          | Health check                         |
//! | GET    | `/api/schema`                      | Field table for the contribution form |
//! | POST   | `/api/validate`                    | Validate a submission without storing |
//! | POST   | `/api/datasets`                    | Validate and store a submission      |
//! | GET    | `/api/datasets?field=value`        | Filter the catalog                   |
//! | GET    | `/api/datasets/export.csv`         | Filtered catalog as CSV              |
//! | GET    | `/api/fields/{field}/values`       | Distinct values of a field           |
//! | GET    | `/api/stats/group-count`           | Grouped counts for charts            |
//! | GET    | `/api/stats/histogram`             | Binned numeric distribution per group |
//! | GET    | `/api/logs`                        | SSE stream of catalog activity       |
//!
//! Store access runs on the blocking thread pool, because [`JsonDirStore`]
//! reads and writes files.

use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::signal;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use super::logs::{log_error, log_success, log_warning, log_warning_indent, LOG_BROADCASTER};
use super::types::{error_response, DatasetsResponse, SubmissionResponse};
use crate::catalog::{criteria_from_pairs, Catalog, GroupCounts, Histogram, DEFAULT_BINS};
use crate::config::Config;
use crate::error::{CatalogError, ServerError, ServerResult, StoreError};
use crate::export::{records_to_csv, CSV_FILENAME};
use crate::schema::{describe, FieldDescription};
use crate::store::{CatalogStore, JsonDirStore};
use crate::validation::validate;

/// Shared handler state: the store, owned by whoever built the router.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
}

impl AppState {
    pub fn new(store: impl CatalogStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Run a catalog operation on the blocking thread pool.
    async fn with_catalog<R, F>(&self, op: F) -> ServerResult<R>
    where
        F: FnOnce(Catalog<'_, dyn CatalogStore>) -> R + Send + 'static,
        R: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(Catalog::new(store.as_ref())))
            .await
            .map_err(|e| ServerError::Internal(format!("catalog task failed: {}", e)))
    }
}

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/schema", get(schema))
        .route("/api/validate", post(validate_submission))
        .route("/api/datasets", get(list_datasets).post(submit_dataset))
        .route("/api/datasets/export.csv", get(export_csv))
        .route("/api/fields/{field}/values", get(field_values))
        .route("/api/stats/group-count", get(group_count))
        .route("/api/stats/histogram", get(histogram))
        .route("/api/logs", get(sse_logs))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server over a JSON directory store.
pub async fn start_server(config: Config) -> ServerResult<()> {
    let state = AppState::new(JsonDirStore::with_dir(&config.data_dir));
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("UMUD catalog running on http://localhost:{}", config.port);
    info!("Data directory: {}", config.data_dir.display());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if signal::ctrl_c().await.is_err() {
        // Without a handler the server runs until killed.
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "umud",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "schema": "GET /api/schema",
            "validate": "POST /api/validate",
            "datasets": "GET|POST /api/datasets",
            "stats": "GET /api/stats/group-count, GET /api/stats/histogram",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

async fn schema() -> Json<Vec<FieldDescription>> {
    Json(describe())
}

async fn validate_submission(Json(raw): Json<Value>) -> (StatusCode, Json<SubmissionResponse>) {
    let submission_id = Uuid::new_v4();
    match validate(&raw) {
        Ok(record) => (StatusCode::OK, Json(SubmissionResponse::valid(submission_id, record))),
        Err(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(SubmissionResponse::invalid(submission_id, errors)),
        ),
    }
}

async fn submit_dataset(
    State(state): State<AppState>,
    Json(raw): Json<Value>,
) -> ServerResult<(StatusCode, Json<SubmissionResponse>)> {
    let submission_id = Uuid::new_v4();

    match state.with_catalog(move |catalog| catalog.submit(&raw)).await? {
        Ok((id, record)) => {
            log_success(format!("Stored {} as {} [{}]", record.name, id, submission_id));
            Ok((
                StatusCode::CREATED,
                Json(SubmissionResponse::stored(submission_id, id, record)),
            ))
        }
        Err(CatalogError::Invalid(failure)) => {
            log_warning(format!(
                "Rejected submission [{}]: {} error(s)",
                submission_id,
                failure.0.len()
            ));
            for error in &failure.0 {
                log_warning_indent(error.to_string(), 1);
            }
            Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(SubmissionResponse::invalid(submission_id, failure.0)),
            ))
        }
        Err(e) => {
            match &e {
                CatalogError::Store(StoreError::Duplicate(name)) => {
                    log_warning(format!("Duplicate submission of {} [{}]", name, submission_id))
                }
                other => log_error(format!("Submission [{}] failed: {}", submission_id, other)),
            }
            Err(e.into())
        }
    }
}

async fn list_datasets(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ServerResult<Json<DatasetsResponse>> {
    let criteria = criteria_from_pairs(pairs);
    let records = state.with_catalog(move |catalog| catalog.filter(&criteria)).await??;
    Ok(Json(DatasetsResponse {
        total: records.len(),
        records,
    }))
}

async fn export_csv(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ServerResult<Response> {
    let criteria = criteria_from_pairs(pairs);
    let records = state.with_catalog(move |catalog| catalog.filter(&criteria)).await??;
    let csv = records_to_csv(&records)?;
    let disposition = format!("attachment; filename=\"{}\"", CSV_FILENAME);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

async fn field_values(
    State(state): State<AppState>,
    Path(field): Path<String>,
) -> ServerResult<Json<Value>> {
    let key = field.clone();
    let values = state.with_catalog(move |catalog| catalog.distinct(&key)).await??;
    Ok(Json(json!({ "field": field, "values": values })))
}

#[derive(Debug, Deserialize)]
struct GroupCountQuery {
    group: Option<String>,
    value: Option<String>,
}

async fn group_count(
    State(state): State<AppState>,
    Query(query): Query<GroupCountQuery>,
) -> ServerResult<Json<GroupCounts>> {
    let (Some(group), Some(value)) = (query.group, query.value) else {
        return Err(ServerError::BadRequest(
            "both 'group' and 'value' parameters are required".into(),
        ));
    };
    let counts = state
        .with_catalog(move |catalog| catalog.group_count(&group, &value))
        .await??;
    Ok(Json(counts))
}

#[derive(Debug, Deserialize)]
struct HistogramQuery {
    group: Option<String>,
    field: Option<String>,
    bins: Option<usize>,
}

/// Age distribution by default: `participantAge` in 20 bins.
async fn histogram(
    State(state): State<AppState>,
    Query(query): Query<HistogramQuery>,
) -> ServerResult<Json<Histogram>> {
    let Some(group) = query.group else {
        return Err(ServerError::BadRequest("the 'group' parameter is required".into()));
    };
    let field = query.field.unwrap_or_else(|| "participantAge".to_string());
    let bins = query.bins.unwrap_or(DEFAULT_BINS);

    let hist = state
        .with_catalog(move |catalog| catalog.histogram(&group, &field, bins))
        .await??;
    Ok(Json(hist))
}

/// SSE endpoint for the activity feed
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

// =============================================================================
// Error Responses
// =============================================================================

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_)
            | ServerError::Catalog(CatalogError::NotNumeric(_))
            | ServerError::Catalog(CatalogError::InvalidBins(_)) => StatusCode::BAD_REQUEST,
            ServerError::Catalog(CatalogError::UnknownField(_)) => StatusCode::NOT_FOUND,
            ServerError::Catalog(CatalogError::Invalid(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Catalog(CatalogError::Store(StoreError::Duplicate(_)))
            | ServerError::Store(StoreError::Duplicate(_)) => StatusCode::CONFLICT,
            ServerError::Catalog(CatalogError::Store(StoreError::Unavailable(_)))
            | ServerError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{record_with, valid_input};
    use crate::store::MemoryStore;
    use axum::body::Body;
    use tempfile::tempdir;
    use axum::http::Request;
    use tower::util::ServiceExt;

    fn app_with(records: Vec<crate::models::DatasetMetadataRecord>) -> Router {
        build_router(AppState::new(MemoryStore::with_records(records)))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app_with(vec![]).oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "umud");
    }

    #[tokio::test]
    async fn test_schema_lists_fields() {
        let response = app_with(vec![]).oneshot(get_request("/api/schema")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 29);
        assert_eq!(body[0]["name"], "name");
    }

    #[tokio::test]
    async fn test_validate_endpoint() {
        let app = app_with(vec![]);
        let response = app.clone().oneshot(post_json("/api/validate", &valid_input())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "valid");
        assert_eq!(body["record"]["imageCount"], 1772);

        let mut input = valid_input();
        input["participantHeightCm"] = json!(30);
        let response = app.oneshot(post_json("/api/validate", &input)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["errors"][0]["field"], "participantHeightCm");
        assert_eq!(body["errors"][0]["rule"], "implausible");
    }

    #[tokio::test]
    async fn test_submit_then_duplicate() {
        let app = app_with(vec![]);

        let response = app.clone().oneshot(post_json("/api/datasets", &valid_input())).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["id"], "deepacsa-2022");

        let response = app.clone().oneshot(post_json("/api/datasets", &valid_input())).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app.clone().oneshot(post_json("/api/datasets", &json!({}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["status"], "invalid");
        assert!(body["errors"].as_array().unwrap().len() > 3);

        let response = app.oneshot(get_request("/api/datasets")).await.unwrap();
        assert_eq!(body_json(response).await["total"], 1);
    }

    #[tokio::test]
    async fn test_filter_endpoint() {
        let app = app_with(vec![
            record_with("First_2020", &["Soleus"], &["GE"]),
            record_with("Second_2021", &["Soleus"], &["Siemens"]),
        ]);

        let response = app
            .clone()
            .oneshot(get_request("/api/datasets?muscle=Soleus&device=GE"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["records"][0]["name"], "First_2020");

        let response = app
            .oneshot(get_request("/api/datasets?muscle=Soleus&device="))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["total"], 2);
    }

    #[tokio::test]
    async fn test_export_csv() {
        let app = app_with(vec![
            record_with("First_2020", &["Soleus"], &["GE"]),
            record_with("Second_2021", &["Soleus"], &["Siemens"]),
        ]);

        let response = app
            .oneshot(get_request("/api/datasets/export.csv?device=Siemens"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv"));

        let text = String::from_utf8(body_bytes(response).await).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().nth(1).unwrap().starts_with("Second_2021,"));
    }

    #[tokio::test]
    async fn test_field_values() {
        let app = app_with(vec![
            record_with("First_2020", &["Soleus", "Gastrocnemius"], &["GE"]),
            record_with("Second_2021", &["Soleus"], &["Siemens"]),
        ]);

        let response = app.clone().oneshot(get_request("/api/fields/muscles/values")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["values"], json!(["Gastrocnemius", "Soleus"]));

        let response = app.oneshot(get_request("/api/fields/colour/values")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_group_count_endpoint() {
        let app = app_with(vec![record_with("One_2020", &["Soleus", "Gastrocnemius"], &["GE"])]);

        let response = app
            .clone()
            .oneshot(get_request("/api/stats/group-count?group=device&value=muscles"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "GE": { "Gastrocnemius": 1, "Soleus": 1 } })
        );

        let response = app
            .oneshot(get_request("/api/stats/group-count?group=device"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_histogram_endpoint() {
        let mut young = record_with("Young_2020", &["Soleus"], &["GE"]);
        young.participant_age = Some(20.0);
        let mut old = record_with("Old_2021", &["Soleus", "Gastrocnemius"], &["GE"]);
        old.participant_age = Some(60.0);
        let app = app_with(vec![young, old]);

        let response = app
            .clone()
            .oneshot(get_request("/api/stats/histogram?group=muscle&bins=4"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["edges"], json!([20.0, 30.0, 40.0, 50.0, 60.0]));
        assert_eq!(body["counts"]["Soleus"], json!([1, 0, 0, 1]));
        assert_eq!(body["counts"]["Gastrocnemius"], json!([0, 0, 0, 1]));

        let response = app
            .clone()
            .oneshot(get_request("/api/stats/histogram?group=participantSex"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["edges"].as_array().unwrap().len(), DEFAULT_BINS + 1);

        for uri in [
            "/api/stats/histogram",
            "/api/stats/histogram?group=device&field=muscles",
            "/api/stats/histogram?group=device&bins=0",
        ] {
            let response = app.clone().oneshot(get_request(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        }

        let response = app
            .oneshot(get_request("/api/stats/histogram?group=colour"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_json_dir_store_behind_router() {
        let dir = tempdir().unwrap();
        let app = build_router(AppState::new(JsonDirStore::with_dir(dir.path())));

        let response = app.clone().oneshot(post_json("/api/datasets", &valid_input())).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(dir.path().join("deepacsa-2022.json").exists());

        let response = app.clone().oneshot(post_json("/api/datasets", &valid_input())).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .oneshot(get_request("/api/fields/participantAge/values"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["values"], json!(["38.2"]));
    }
}
