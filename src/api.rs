// 🌐 Web API - axum routes over the session store
//
// The browser keeps the plain form fields. The server keeps each session's
// person list and does every calculation.

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{delete, get, patch, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::path::Path as FsPath;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::calculator::{compute, BudgetInputs, BudgetResult};
use crate::config::ServerConfig;
use crate::error::BudgetError;
use crate::person::{PersonEntry, PersonField, PersonId};
use crate::report::BudgetReport;
use crate::session::{SessionId, SessionStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(sessions: SessionStore) -> Self {
        AppState { sessions }
    }
}

// ============================================================================
// Response types
// ============================================================================

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Host-layer failure rendered as an ApiResponse
pub struct ApiError(BudgetError);

impl From<BudgetError> for ApiError {
    fn from(err: BudgetError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            tracing::error!(error = %self.0, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (status, Json(ApiResponse::<()>::err(self.0.to_string()))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: SessionId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PersonRemoved {
    pub removed: bool,
    pub persons: Vec<PersonEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PersonUpdated {
    pub updated: bool,
    pub person: Option<PersonEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CalculationResponse {
    pub result: BudgetResult,
    pub report: BudgetReport,
    /// Sum of the session's person debts (display only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_debt: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePersonRequest {
    pub field: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/sessions - Start a session with an empty person list
async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let session_id = state.sessions.create();
    (
        StatusCode::CREATED,
        Json(ApiResponse::ok(SessionCreated { session_id })),
    )
}

/// DELETE /api/sessions/:session_id - Tear the session down
async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<bool> {
    if state.sessions.remove(session_id) {
        Ok(Json(ApiResponse::ok(true)))
    } else {
        Err(BudgetError::SessionNotFound(session_id).into())
    }
}

/// GET /api/sessions/:session_id/persons - Person entries in display order
async fn list_persons(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<Vec<PersonEntry>> {
    let persons = state
        .sessions
        .with_session(session_id, |s| s.registry.entries().to_vec())?;
    Ok(Json(ApiResponse::ok(persons)))
}

/// POST /api/sessions/:session_id/persons - "+ Adicionar pessoa"
async fn add_person(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<impl IntoResponse, ApiError> {
    let person = state.sessions.with_session(session_id, |s| {
        let id = s.registry.add_person();
        s.registry.get(id).cloned()
    })?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(person))))
}

/// DELETE /api/sessions/:session_id/persons/:person_id - Unknown ids are a no-op
async fn remove_person(
    State(state): State<AppState>,
    Path((session_id, person_id)): Path<(SessionId, PersonId)>,
) -> ApiResult<PersonRemoved> {
    let response = state.sessions.with_session(session_id, |s| PersonRemoved {
        removed: s.registry.remove_person(person_id),
        persons: s.registry.entries().to_vec(),
    })?;
    Ok(Json(ApiResponse::ok(response)))
}

/// PATCH /api/sessions/:session_id/persons/:person_id - Edit one field
async fn update_person(
    State(state): State<AppState>,
    Path((session_id, person_id)): Path<(SessionId, PersonId)>,
    Json(request): Json<UpdatePersonRequest>,
) -> ApiResult<PersonUpdated> {
    let field = PersonField::from_raw(&request.field, &request.value);

    let response = state.sessions.with_session(session_id, |s| {
        let updated = match field {
            Some(field) => s.registry.update_field(person_id, field),
            None => {
                tracing::debug!(field = %request.field, "ignoring unknown person field");
                false
            }
        };
        PersonUpdated {
            updated,
            person: s.registry.get(person_id).cloned(),
        }
    })?;
    Ok(Json(ApiResponse::ok(response)))
}

/// POST /api/sessions/:session_id/calculate - "Calcular"
async fn calculate_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Json(form): Json<BudgetInputs>,
) -> ApiResult<CalculationResponse> {
    let (result, total_debt) = state
        .sessions
        .with_session(session_id, |s| (s.calculate(&form), s.registry.total_debt()))?;

    let report = BudgetReport::from_result(&result);
    Ok(Json(ApiResponse::ok(CalculationResponse {
        result,
        report,
        total_debt: Some(total_debt),
    })))
}

/// POST /api/calculate - Stateless calculation from a full snapshot
async fn calculate_snapshot(Json(inputs): Json<BudgetInputs>) -> ApiResult<CalculationResponse> {
    let result = compute(&inputs);
    let report = BudgetReport::from_result(&result);
    Ok(Json(ApiResponse::ok(CalculationResponse {
        result,
        report,
        total_debt: None,
    })))
}

/// GET / - Serve the budget page
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

// ============================================================================
// Router & server
// ============================================================================

pub fn create_router(state: AppState, static_dir: &FsPath) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/calculate", post(calculate_snapshot))
        .route("/sessions", post(create_session))
        .route("/sessions/:session_id", delete(delete_session))
        .route(
            "/sessions/:session_id/persons",
            get(list_persons).post(add_person),
        )
        .route(
            "/sessions/:session_id/persons/:person_id",
            patch(update_person).delete(remove_person),
        )
        .route("/sessions/:session_id/calculate", post(calculate_session))
        .with_state(state);

    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process is stopped
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::new(SessionStore::with_idle_minutes(config.session_idle_minutes)?);
    let app = create_router(state, &config.static_dir);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Starting server on http://{}", addr);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let state = AppState::new(SessionStore::with_idle_minutes(120).unwrap());
        create_router(state, FsPath::new("web"))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn new_session(app: &Router) -> String {
        let (status, body) = send(app, Method::POST, "/api/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["session_id"].as_str().unwrap().to_string()
    }

    async fn add_person_with_payment(app: &Router, session: &str, payment: f64) -> u64 {
        let (status, body) = send(app, Method::POST, &format!("/api/sessions/{}/persons", session), None).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["id"].as_u64().unwrap();

        let (status, _) = send(
            app,
            Method::PATCH,
            &format!("/api/sessions/{}/persons/{}", session, id),
            Some(json!({ "field": "monthly_payment", "value": payment })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        id
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, body) = send(&app(), Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_index_page_served() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("ORGANIZADOR FINANCEIRO MENSAL"));
        // Edits and calculations go through one ordered queue; a lost session is rebuilt
        assert!(html.contains("function enqueue(task)"));
        assert!(html.contains("async function restoreSession()"));
    }

    #[tokio::test]
    async fn test_stateless_calculate_reference_scenario() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/api/calculate",
            Some(json!({
                "salary": 3000,
                "bolsa_familia": 0,
                "internet_received": 50,
                "rent_current": 1000,
                "rent_new": 800,
                "internet_cost": 100,
                "electricity": 150,
                "personal_payments": [200, 100],
                "groceries": 500,
                "delivery": 50,
                "mobility": 80
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let result = &body["data"]["result"];
        assert_eq!(result["income_total"], 3050.0);
        assert_eq!(result["expenses_current"], 2180.0);
        assert_eq!(result["balance_new"], 1070.0);
        assert_eq!(
            body["data"]["report"]["balance_current"]["text"],
            "SALDO FINAL (Atual): R$ 870,00"
        );
        assert!(body["data"].get("total_debt").is_none());
    }

    #[tokio::test]
    async fn test_stateless_calculate_lenient_body() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/api/calculate",
            Some(json!({ "salary": "1.500,00", "groceries": "abc", "mobility": null })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["result"]["income_total"], 1500.0);
        assert_eq!(body["data"]["result"]["food_total"], 0.0);
    }

    #[tokio::test]
    async fn test_session_person_flow() {
        let app = app();
        let session = new_session(&app).await;

        let first = add_person_with_payment(&app, &session, 200.0).await;
        let second = add_person_with_payment(&app, &session, 100.0).await;
        assert!(second > first);

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/sessions/{}/calculate", session),
            Some(json!({
                "salary": 3000,
                "internet_received": 50,
                "rent_current": 1000,
                "rent_new": 800,
                "internet_cost": 100,
                "electricity": 150,
                "groceries": 500,
                "delivery": 50,
                "mobility": 80
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["result"]["personal_total"], 300.0);
        assert_eq!(body["data"]["result"]["balance_current"], 870.0);
        assert_eq!(body["data"]["total_debt"], 0.0);

        // Remove the first person; the second keeps its id and position
        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/api/sessions/{}/persons/{}", session, first),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["removed"], true);
        let persons = body["data"]["persons"].as_array().unwrap();
        assert_eq!(persons.len(), 1);
        assert_eq!(persons[0]["id"].as_u64().unwrap(), second);

        // A new person never reuses the removed id
        let third = add_person_with_payment(&app, &session, 0.0).await;
        assert!(third > second);
    }

    #[tokio::test]
    async fn test_remove_unknown_person_is_noop() {
        let app = app();
        let session = new_session(&app).await;
        add_person_with_payment(&app, &session, 40.0).await;

        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/api/sessions/{}/persons/999", session),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["removed"], false);
        assert_eq!(body["data"]["persons"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_unknown_person_or_field_is_noop() {
        let app = app();
        let session = new_session(&app).await;
        let id = add_person_with_payment(&app, &session, 40.0).await;

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("/api/sessions/{}/persons/999", session),
            Some(json!({ "field": "name", "value": "Ana" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["updated"], false);
        assert!(body["data"]["person"].is_null());

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("/api/sessions/{}/persons/{}", session, id),
            Some(json!({ "field": "shoe_size", "value": 42 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["updated"], false);
        assert_eq!(body["data"]["person"]["monthly_payment"], 40.0);
    }

    #[tokio::test]
    async fn test_update_person_name_and_debt() {
        let app = app();
        let session = new_session(&app).await;
        let id = add_person_with_payment(&app, &session, 0.0).await;

        send(
            &app,
            Method::PATCH,
            &format!("/api/sessions/{}/persons/{}", session, id),
            Some(json!({ "field": "name", "value": "Carlos" })),
        )
        .await;
        let (_, body) = send(
            &app,
            Method::PATCH,
            &format!("/api/sessions/{}/persons/{}", session, id),
            Some(json!({ "field": "total_debt", "value": "2.500,00" })),
        )
        .await;

        assert_eq!(body["data"]["updated"], true);
        assert_eq!(body["data"]["person"]["name"], "Carlos");
        assert_eq!(body["data"]["person"]["total_debt"], 2500.0);

        let (_, body) = send(&app, Method::GET, &format!("/api/sessions/{}/persons", session), None).await;
        assert_eq!(body["data"][0]["name"], "Carlos");
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let app = app();
        let missing = uuid::Uuid::new_v4();

        let (status, body) = send(&app, Method::GET, &format!("/api/sessions/{}/persons", missing), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("Session not found"));

        let (status, _) = send(&app, Method::DELETE, &format!("/api/sessions/{}", missing), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_deleted_session_is_gone() {
        let app = app();
        let session = new_session(&app).await;

        let (status, _) = send(&app, Method::DELETE, &format!("/api/sessions/{}", session), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::POST, &format!("/api/sessions/{}/persons", session), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_persons() {
        let app = app();
        let a = new_session(&app).await;
        let b = new_session(&app).await;
        add_person_with_payment(&app, &a, 500.0).await;

        let (_, body) = send(
            &app,
            Method::POST,
            &format!("/api/sessions/{}/calculate", b),
            Some(json!({})),
        )
        .await;
        assert_eq!(body["data"]["result"]["personal_total"], 0.0);
    }

    #[tokio::test]
    async fn test_keystroke_edits_apply_in_order() {
        let app = app();
        let session = new_session(&app).await;
        let person = add_person_with_payment(&app, &session, 0.0).await;
        let uri = format!("/api/sessions/{}/persons/{}", session, person);

        for typed in ["1", "12"] {
            let (status, _) = send(
                &app,
                Method::PATCH,
                &uri,
                Some(json!({ "field": "monthly_payment", "value": typed })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, body) = send(
            &app,
            Method::POST,
            &format!("/api/sessions/{}/calculate", session),
            Some(json!({})),
        )
        .await;
        assert_eq!(body["data"]["result"]["personal_total"], 12.0);
    }

    #[tokio::test]
    async fn test_lost_session_is_rebuilt_from_screen_values() {
        let app = app();
        let lost = new_session(&app).await;
        let person = add_person_with_payment(&app, &lost, 200.0).await;
        send(&app, Method::DELETE, &format!("/api/sessions/{}", lost), None).await;

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("/api/sessions/{}/persons/{}", lost, person),
            Some(json!({ "field": "monthly_payment", "value": "250" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        // Fresh session, rows re-added and their values sent again
        let session = new_session(&app).await;
        add_person_with_payment(&app, &session, 250.0).await;

        let (_, body) = send(
            &app,
            Method::POST,
            &format!("/api/sessions/{}/calculate", session),
            Some(json!({ "salary": 1000 })),
        )
        .await;
        assert_eq!(body["data"]["result"]["personal_total"], 250.0);
        assert_eq!(body["data"]["result"]["balance_current"], 750.0);
    }
}
