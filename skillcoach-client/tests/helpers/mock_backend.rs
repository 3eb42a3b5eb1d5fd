//! In-process stand-in for the coaching backend
//!
//! Serves a scripted subset of `/api/v1` on an ephemeral localhost port and
//! records every request so tests can assert on what the client sent.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, OriginalUri, Path, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use skillcoach_client::{ApiClient, Session};
use skillcoach_common::config::ClientConfig;

pub const VALID_PASSWORD: &str = "secret";
pub const ACCESS_TOKEN: &str = "mock-token";

/// One multipart upload as received
#[derive(Debug, Clone, Default)]
pub struct RecordedUpload {
    pub path: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub messages: Option<String>,
}

/// JSON body received on a write endpoint
#[derive(Debug, Clone)]
pub struct RecordedBody {
    pub path: String,
    pub body: Value,
}

#[derive(Debug, Default)]
struct Recorded {
    requests: Vec<String>,
    calls: Vec<String>,
    bodies: Vec<RecordedBody>,
    uploads: Vec<RecordedUpload>,
    status_calls: HashMap<String, u32>,
}

#[derive(Clone, Default)]
struct MockState {
    inner: Arc<Mutex<Recorded>>,
}

impl MockState {
    fn with<R>(&self, f: impl FnOnce(&mut Recorded) -> R) -> R {
        let mut guard = self.inner.lock().unwrap();
        f(&mut guard)
    }
}

/// Running mock backend; the server task stops on drop
pub struct MockBackend {
    base_url: String,
    state: MockState,
    handle: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = MockState::default();

        let api = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/me", get(me))
            .route("/chat/send", post(chat_send))
            .route("/chat/voice", post(voice_upload))
            .route("/tests/simulations/:scenario/voice-reply", post(voice_upload))
            .route("/tests/:test_id", get(get_test))
            .route("/tests/:test_id/submit", post(submit_test))
            .route("/tests/:test_id/case/submit", post(submit_case))
            .route("/tests/simulations/:scenario/reply", post(simulation_reply))
            .route("/tests/simulations/:scenario/submit", post(simulation_submit))
            .route("/analysis/status/:task_id", get(analysis_status))
            .route("/plans/me/active", get(active_plan))
            .route("/plans/me/tasks/:task_id/complete", post(complete_task))
            .route("/plans/me/generate", post(generate_plan))
            .route("/admin/users", get(admin_users))
            .route("/admin/users/:user_id/password", post(admin_set_password))
            .route("/admin/users/:user_id/plan", get(admin_user_plan))
            .route("/admin/users/:user_id/materials", post(admin_add_material))
            .route("/admin/users/:user_id/materials/:material_id", delete(admin_delete_item))
            .route("/admin/users/:user_id/tasks/:task_id", patch(admin_update_task))
            .route("/admin/tests/:test_id", patch(admin_update_test))
            .route(
                "/admin/tests/:test_id/questions",
                get(admin_questions).post(admin_create_question),
            )
            .fallback(not_found)
            .layer(middleware::from_fn_with_state(state.clone(), record_request))
            .with_state(state.clone());

        let app = Router::new().nest("/api/v1", api);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api/v1", addr),
            state,
            handle,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Config aimed at this backend with fast polling
    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            poll_interval_ms: 20,
            poll_timeout_secs: 5,
            request_timeout_secs: 5,
            ..ClientConfig::with_base_url(self.base_url.clone())
        }
    }

    /// Client with an in-memory session
    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.config(), Arc::new(Session::anonymous())).unwrap()
    }

    /// Request paths in arrival order, without the `/api/v1` prefix
    pub fn requests(&self) -> Vec<String> {
        self.state.with(|r| r.requests.clone())
    }

    /// `METHOD /path` in arrival order
    pub fn calls(&self) -> Vec<String> {
        self.state.with(|r| r.calls.clone())
    }

    /// Last JSON body received on `path` (without the `/api/v1` prefix)
    pub fn body(&self, path: &str) -> Option<Value> {
        self.state.with(|r| {
            r.bodies
                .iter()
                .rev()
                .find(|b| b.path == path)
                .map(|b| b.body.clone())
        })
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.state.with(|r| r.uploads.clone())
    }

    pub fn status_calls(&self, task_id: &str) -> u32 {
        self.state
            .with(|r| r.status_calls.get(task_id).copied().unwrap_or(0))
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn record_request(State(state): State<MockState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let call = format!("{} {}", request.method(), path);
    state.with(|r| {
        r.requests.push(path);
        r.calls.push(call);
    });
    next.run(request).await
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", ACCESS_TOKEN))
        .unwrap_or(false)
}

fn unauthorized() -> Response {
    detail(StatusCode::UNAUTHORIZED, "Could not validate credentials")
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn login(Form(form): Form<LoginForm>) -> Response {
    if form.username.is_empty() || form.password != VALID_PASSWORD {
        return detail(StatusCode::UNAUTHORIZED, "Incorrect email or password");
    }
    Json(json!({ "access_token": ACCESS_TOKEN, "token_type": "bearer" })).into_response()
}

async fn me(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(user_json()).into_response()
}

async fn chat_send(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let message = body["message"].as_str().unwrap_or_default();
    if message.trim().is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "detail": [
                    { "loc": ["body", "message"], "msg": "field required", "type": "value_error.missing" }
                ]
            })),
        )
            .into_response();
    }
    Json(json!({
        "response": format!("You said: {}", message),
        "task_id": "task-ok",
        "status": "pending"
    }))
    .into_response()
}

async fn voice_upload(
    State(state): State<MockState>,
    headers: HeaderMap,
    request_path: OriginalUri,
    mut multipart: Multipart,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let mut upload = RecordedUpload {
        path: request_path.0.path().to_string(),
        ..RecordedUpload::default()
    };
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                upload.file_name = field.file_name().map(str::to_string);
                upload.content_type = field.content_type().map(str::to_string);
                upload.bytes = field.bytes().await.unwrap().to_vec();
            }
            "messages" => upload.messages = Some(field.text().await.unwrap()),
            _ => {}
        }
    }

    if upload.bytes.is_empty() {
        return detail(StatusCode::BAD_REQUEST, "Empty audio file");
    }

    let is_simulation = upload.path.contains("/simulations/");
    state.with(|r| r.uploads.push(upload));

    if is_simulation {
        Json(json!({ "transcript": "I would start with the budget", "reply": "Why the budget?" }))
            .into_response()
    } else {
        Json(json!({
            "user_text": "how do I run a meeting",
            "response": "Start with an agenda.",
            "task_id": "task-ok",
            "status": "pending"
        }))
        .into_response()
    }
}

async fn get_test(Path(test_id): Path<i64>) -> Response {
    if test_id == 99 {
        return detail(StatusCode::NOT_FOUND, "Test not found");
    }
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
}

fn completed_result(task_id: &str) -> Value {
    json!({
        "id": 1,
        "task_id": task_id,
        "user_id": 7,
        "communication_score": 82.0,
        "emotional_intelligence_score": 64.0,
        "critical_thinking_score": 71.0,
        "time_management_score": 45.0,
        "leadership_score": 58.0,
        "feedback": "Clear structure, vague on deadlines.",
        "strengths": ["communication"],
        "weaknesses": ["time_management"],
        "created_at": "2026-03-01T10:00:00"
    })
}

/// Scripted task lifecycles:
/// - `task-ok`: pending, processing, then completed
/// - `task-flaky`: one 500, then completed
/// - `task-failed`: failed
/// - `task-noresult`: completed without a result twice, then with one
/// - `task-stuck`: pending forever
/// - anything else: 404
async fn analysis_status(State(state): State<MockState>, Path(task_id): Path<String>) -> Response {
    let call = state.with(|r| {
        let count = r.status_calls.entry(task_id.clone()).or_insert(0);
        *count += 1;
        *count
    });

    let status = |status: &str| json!({ "task_id": task_id, "status": status });
    let body = match (task_id.as_str(), call) {
        ("task-ok", 1) => status("pending"),
        ("task-ok", 2) => status("processing"),
        ("task-ok", _) => {
            json!({ "task_id": task_id, "status": "completed", "result": completed_result(&task_id) })
        }
        ("task-flaky", 1) => {
            return detail(StatusCode::INTERNAL_SERVER_ERROR, "database is restarting");
        }
        ("task-flaky", _) => {
            json!({ "task_id": task_id, "status": "completed", "result": completed_result(&task_id) })
        }
        ("task-failed", _) => status("failed"),
        ("task-noresult", 1..=2) => status("completed"),
        ("task-noresult", _) => {
            json!({ "task_id": task_id, "status": "completed", "result": completed_result(&task_id) })
        }
        ("task-stuck", _) => status("pending"),
        _ => return detail(StatusCode::NOT_FOUND, "Task not found"),
    };
    Json(body).into_response()
}

async fn active_plan(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(Value::Null).into_response()
}

fn record_body(state: &MockState, uri: &OriginalUri, body: &Value) {
    let path = uri.0.path().trim_start_matches("/api/v1").to_string();
    let body = body.clone();
    state.with(|r| r.bodies.push(RecordedBody { path, body }));
}

fn user_json() -> Value {
    json!({
        "id": 7,
        "email": "ada@example.com",
        "full_name": "Ada Lovelace",
        "is_active": true,
        "role": "user"
    })
}

async fn submit_test(
    State(state): State<MockState>,
    headers: HeaderMap,
    uri: OriginalUri,
    Path(test_id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    record_body(&state, &uri, &body);
    if !body["answers"].is_object() {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "answers must be an object");
    }
    Json(json!({
        "result_id": 100 + test_id,
        "task_id": "task-ok",
        "status": "pending",
        "message": "Answers submitted for analysis"
    }))
    .into_response()
}

async fn submit_case(
    State(state): State<MockState>,
    headers: HeaderMap,
    uri: OriginalUri,
    Path(test_id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    record_body(&state, &uri, &body);
    Json(json!({ "solution_id": 200 + test_id, "task_id": "task-ok", "status": "pending" }))
        .into_response()
}

/// Partner echoes the last user turn
async fn simulation_reply(
    State(state): State<MockState>,
    headers: HeaderMap,
    uri: OriginalUri,
    Path(scenario): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    record_body(&state, &uri, &body);
    let last_user = body["messages"]
        .as_array()
        .and_then(|messages| messages.iter().rev().find(|m| m["role"] == "user"))
        .and_then(|m| m["text"].as_str())
        .unwrap_or_default()
        .to_string();
    Json(json!({ "reply": format!("[{}] Why {}?", scenario, last_user.to_lowercase()) }))
        .into_response()
}

async fn simulation_submit(
    State(state): State<MockState>,
    headers: HeaderMap,
    uri: OriginalUri,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    record_body(&state, &uri, &body);
    Json(json!({ "test_id": 3, "solution_id": 300, "task_id": "task-ok", "status": "pending" }))
        .into_response()
}

async fn complete_task(headers: HeaderMap, Path(task_id): Path<String>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "task_id": task_id,
        "status": "completed",
        "completed_at": "2026-03-02T09:30:00",
        "plan_progress": 50.0
    }))
    .into_response()
}

async fn generate_plan(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({ "message": "Plan generation started", "status": "processing" })).into_response()
}

async fn admin_users(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!([
        {
            "user": user_json(),
            "analysis_count": 4,
            "test_results_count": 2,
            "case_solutions_count": 1
        }
    ]))
    .into_response()
}

async fn admin_set_password(
    State(state): State<MockState>,
    headers: HeaderMap,
    uri: OriginalUri,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    record_body(&state, &uri, &body);
    Json(json!({ "status": "ok", "message": "Password updated" })).into_response()
}

async fn admin_update_test(
    State(state): State<MockState>,
    headers: HeaderMap,
    uri: OriginalUri,
    Path(test_id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    record_body(&state, &uri, &body);
    Json(json!({
        "id": test_id,
        "title": body["title"].as_str().unwrap_or("Active listening"),
        "description": "Unchanged",
        "type": body["type"].as_str().unwrap_or("quiz"),
        "questions": []
    }))
    .into_response()
}

async fn admin_questions(headers: HeaderMap, Path(test_id): Path<i64>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!([
        {
            "id": 31,
            "test_id": test_id,
            "text": "How do you open a difficult conversation?",
            "type": "multiple_choice",
            "options": [{ "text": "With the facts", "value": "a" }]
        }
    ]))
    .into_response()
}

async fn admin_create_question(
    State(state): State<MockState>,
    headers: HeaderMap,
    uri: OriginalUri,
    Path(test_id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    record_body(&state, &uri, &body);
    let mut question = body.clone();
    question["id"] = json!(32);
    question["test_id"] = json!(test_id);
    Json(question).into_response()
}

async fn admin_user_plan(headers: HeaderMap, Path(user_id): Path<i64>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "id": 5,
        "user_id": user_id,
        "generated_at": "2026-03-01T08:00:00",
        "is_archived": false,
        "content": { "materials": [], "tasks": [] }
    }))
    .into_response()
}

async fn admin_add_material(
    State(state): State<MockState>,
    headers: HeaderMap,
    uri: OriginalUri,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    record_body(&state, &uri, &body);
    Json(body).into_response()
}

async fn admin_update_task(
    State(state): State<MockState>,
    headers: HeaderMap,
    uri: OriginalUri,
    Path((_user_id, task_id)): Path<(i64, String)>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    record_body(&state, &uri, &body);
    Json(json!({
        "id": task_id,
        "description": "Run a retro",
        "skill": "leadership",
        "status": body["status"].as_str().unwrap_or("pending"),
        "completed_at": body["completed_at"]
    }))
    .into_response()
}

async fn admin_delete_item(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({ "status": "deleted" })).into_response()
}

async fn not_found() -> Response {
    detail(StatusCode::NOT_FOUND, "Not Found")
}
