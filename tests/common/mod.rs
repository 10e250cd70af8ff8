#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use school_admin::api::ApiClient;
use school_admin::auth::{MemoryTokenStorage, SessionStore, TokenStorage};
use school_admin::AdminPanel;

pub const SECRET: &[u8] = b"backend-signing-secret";

/// Sign a token the way the backend does
pub fn token(id: &str, role: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    encode(
        &Header::default(),
        &json!({ "id": id, "role": role, "iat": now, "exp": now + 86_400 }),
        &EncodingKey::from_secret(SECRET),
    )
    .expect("token signing")
}

struct Account {
    password: String,
    id: String,
    role: String,
    /// Overrides the signed token, to simulate a broken backend
    token_override: Option<String>,
}

/// Backend state the tests inspect and script
#[derive(Default)]
pub struct MockState {
    accounts: Mutex<HashMap<String, Account>>,
    permissions: Mutex<HashMap<String, Value>>,
    students: Mutex<Vec<Value>>,
    staff: Mutex<Vec<Value>>,
    calls: Mutex<Vec<String>>,
    authorization: Mutex<Vec<Option<String>>>,
    pub fail_permissions: AtomicBool,
    next_id: AtomicUsize,
}

impl MockState {
    pub fn add_account(&self, email: &str, password: &str, id: &str, role: &str) {
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                id: id.to_string(),
                role: role.to_string(),
                token_override: None,
            },
        );
    }

    pub fn add_broken_account(&self, email: &str, password: &str, token: &str) {
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                id: String::new(),
                role: String::new(),
                token_override: Some(token.to_string()),
            },
        );
    }

    /// Store flags in the read-path shape
    pub fn set_permissions(&self, user_id: &str, permission: Value) {
        self.permissions.lock().unwrap().insert(user_id.to_string(), permission);
    }

    pub fn permission_record(&self, user_id: &str) -> Option<Value> {
        self.permissions.lock().unwrap().get(user_id).cloned()
    }

    pub fn add_student(&self, id: &str, name: &str) {
        self.students.lock().unwrap().push(json!({
            "_id": id,
            "name": name,
            "guardianName": "Guardian",
            "guardianPhone": "9876543210",
            "standard": "5",
            "age": 10
        }));
    }

    pub fn student_count(&self) -> usize {
        self.students.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|call| call.starts_with(prefix))
    }

    pub fn last_authorization(&self) -> Option<String> {
        self.authorization.lock().unwrap().last().cloned().flatten()
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/permission/get/:id", get(get_permission))
            .route("/api/permission/:id", post(set_permission))
            .route("/api/student/get", get(list_students))
            .route("/api/student/create", post(create_student))
            .route("/api/student/edit/:id", put(update_student))
            .route("/api/student/delete/:id", delete(delete_student))
            .route("/api/staff/get", get(list_staff))
            .route("/api/staff/create", post(create_staff))
            .route("/api/staff/edit/:id", put(update_staff))
            .route("/api/staff/delete/:id", delete(delete_staff))
            .layer(middleware::from_fn_with_state(state.clone(), record))
            .layer(TraceLayer::new_for_http())
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind mock backend")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url: format!("http://127.0.0.1:{}/api", port),
            state,
        })
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url, Duration::from_secs(5)).expect("client")
    }

    /// A fresh process: new session store over the given storage
    pub fn panel_with(&self, storage: Arc<dyn TokenStorage>) -> AdminPanel {
        AdminPanel::new(SessionStore::with_storage(storage), self.client())
    }

    pub fn panel(&self) -> AdminPanel {
        self.panel_with(Arc::new(MemoryTokenStorage::new()))
    }
}

async fn record(State(state): State<Arc<MockState>>, request: Request, next: Next) -> Response {
    let call = format!("{} {}", request.method(), request.uri().path());
    let authorization = request
        .headers()
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    state.calls.lock().unwrap().push(call);
    state.authorization.lock().unwrap().push(authorization);
    next.run(request).await
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let accounts = state.accounts.lock().unwrap();
    match accounts.get(email) {
        Some(account) if account.password == password => {
            let token = account
                .token_override
                .clone()
                .unwrap_or_else(|| token(&account.id, &account.role));
            Json(json!({
                "token": token,
                "user": { "id": account.id, "email": email, "role": account.role }
            }))
            .into_response()
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid credentials" })),
        )
            .into_response(),
    }
}

async fn get_permission(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Response {
    if state.fail_permissions.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "permission store unavailable" })),
        )
            .into_response();
    }

    let permission = state.permission_record(&id).unwrap_or(Value::Null);
    Json(json!({ "permission": permission })).into_response()
}

// The write path says canViewStudent, the read path answers canReadStudent
async fn set_permission(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let stored = json!({
        "canCreateStudent": body["canCreateStudent"],
        "canReadStudent": body["canViewStudent"],
        "canUpdateStudent": body["canUpdateStudent"],
        "canDeleteStudent": body["canDeleteStudent"],
    });
    state.set_permissions(&id, stored);
    Json(json!({ "message": "Permissions updated" })).into_response()
}

async fn list_students(State(state): State<Arc<MockState>>) -> Json<Value> {
    Json(Value::Array(state.students.lock().unwrap().clone()))
}

async fn create_student(State(state): State<Arc<MockState>>, Json(mut body): Json<Value>) -> Json<Value> {
    body["_id"] = json!(state.next_id("s"));
    state.students.lock().unwrap().push(body.clone());
    Json(body)
}

async fn update_student(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    Json(mut body): Json<Value>,
) -> Response {
    let mut students = state.students.lock().unwrap();
    match students.iter_mut().find(|student| student["_id"] == json!(id)) {
        Some(student) => {
            body["_id"] = json!(id);
            *student = body.clone();
            Json(body).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "Student not found" }))).into_response(),
    }
}

async fn delete_student(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Response {
    let mut students = state.students.lock().unwrap();
    let before = students.len();
    students.retain(|student| student["_id"] != json!(id));
    if students.len() == before {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "Student not found" }))).into_response();
    }
    Json(json!({ "message": "Student deleted" })).into_response()
}

async fn list_staff(State(state): State<Arc<MockState>>) -> Json<Value> {
    Json(Value::Array(state.staff.lock().unwrap().clone()))
}

async fn create_staff(State(state): State<Arc<MockState>>, Json(mut body): Json<Value>) -> Json<Value> {
    body["_id"] = json!(state.next_id("st"));
    if let Some(object) = body.as_object_mut() {
        object.remove("password");
    }
    state.staff.lock().unwrap().push(body.clone());
    Json(body)
}

async fn update_staff(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    Json(mut body): Json<Value>,
) -> Json<Value> {
    body["_id"] = json!(id);
    if let Some(object) = body.as_object_mut() {
        object.remove("password");
    }
    let mut staff = state.staff.lock().unwrap();
    staff.retain(|member| member["_id"] != json!(id));
    staff.push(body.clone());
    Json(body)
}

async fn delete_staff(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> StatusCode {
    state.staff.lock().unwrap().retain(|member| member["_id"] != json!(id));
    StatusCode::NO_CONTENT
}
