//! HTTP client integration tests against an in-process fake API.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use vitae_core::auth::IdentityGate;
use vitae_core::document::{Basics, Document, DocumentPatch, DocumentRepository, SectionKey};
use vitae_core::render::RenderService;
use vitae_core::tailor::TailorService;
use vitae_infrastructure::FileCredentialRepository;
use vitae_infrastructure::http::{
    HttpAuthClient, HttpDocumentRepository, HttpRenderService, HttpTailorService, build_client,
};

const GOOD_TOKEN: &str = "tok-good";

#[derive(Default)]
struct FakeApi {
    documents: Mutex<HashMap<String, Value>>,
    patches: Mutex<Vec<Value>>,
    next_id: AtomicUsize,
    hits: AtomicUsize,
    /// Delay before `GET /documents` answers 401.
    reject_delay_ms: AtomicU64,
}

impl FakeApi {
    fn authorized(&self, headers: &HeaderMap) -> bool {
        self.hits.fetch_add(1, Ordering::SeqCst);
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == format!("Bearer {}", GOOD_TOKEN))
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Could not validate credentials" })),
    )
        .into_response()
}

async fn list_documents(State(api): State<Arc<FakeApi>>, headers: HeaderMap) -> Response {
    if !api.authorized(&headers) {
        let delay = api.reject_delay_ms.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        return unauthorized();
    }
    let docs: Vec<Value> = api.documents.lock().unwrap().values().cloned().collect();
    Json(docs).into_response()
}

async fn create_document(
    State(api): State<Arc<FakeApi>>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    let id = format!("r{}", api.next_id.fetch_add(1, Ordering::SeqCst) + 1);
    body["id"] = json!(id);
    body["updated_at"] = json!("2024-05-01T10:00:00");
    api.documents.lock().unwrap().insert(id, body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn get_document(
    State(api): State<Arc<FakeApi>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    match api.documents.lock().unwrap().get(&id) {
        Some(doc) => Json(doc.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Resume not found" })),
        )
            .into_response(),
    }
}

async fn patch_document(
    State(api): State<Arc<FakeApi>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    api.patches.lock().unwrap().push(body.clone());
    let mut documents = api.documents.lock().unwrap();
    let Some(doc) = documents.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if let (Some(target), Some(fields)) = (doc.as_object_mut(), body.as_object()) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
    Json(doc.clone()).into_response()
}

async fn delete_document(
    State(api): State<Arc<FakeApi>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    api.documents.lock().unwrap().remove(&id);
    StatusCode::NO_CONTENT.into_response()
}

async fn render(Json(body): Json<Value>) -> Response {
    if body["basics"]["name"] == "Broken" {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "LaTeX compilation failed" })),
        )
            .into_response();
    }
    (
        [(header::CONTENT_TYPE, "application/pdf")],
        b"%PDF-1.7 fake".to_vec(),
    )
        .into_response()
}

async fn token(Form(form): Form<HashMap<String, String>>) -> Response {
    if form.get("password").map(String::as_str) == Some("secret") {
        Json(json!({ "access_token": GOOD_TOKEN, "token_type": "bearer" })).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Incorrect username or password" })),
        )
            .into_response()
    }
}

async fn register(Json(body): Json<Value>) -> Response {
    if body["email"] == "taken@example.com" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Email already registered" })),
        )
            .into_response();
    }
    Json(json!({ "id": 1, "email": body["email"] })).into_response()
}

async fn tailor(Json(body): Json<Value>) -> Response {
    let mut tailored = json!({
        "basics": body["resume"]["basics"],
        "skills": [{ "name": "Rust", "keywords": ["tokio"] }],
    });
    tailored["job_description"] = body["job_description"].clone();
    Json(tailored).into_response()
}

struct TestServer {
    addr: SocketAddr,
    api: Arc<FakeApi>,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl TestServer {
    fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }
}

async fn start_test_server() -> TestServer {
    let api = Arc::new(FakeApi::default());
    let app = Router::new()
        .route("/api/documents", get(list_documents).post(create_document))
        .route(
            "/api/documents/{id}",
            get(get_document)
                .patch(patch_document)
                .delete(delete_document),
        )
        .route("/api/render", post(render))
        .route("/api/auth/token", post(token))
        .route("/api/auth/register", post(register))
        .route("/api/tailor", post(tailor))
        .with_state(api.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Failed to get addr");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestServer { addr, api, handle }
}

struct Clients {
    gate: Arc<IdentityGate>,
    documents: HttpDocumentRepository,
    renderer: HttpRenderService,
    tailor: HttpTailorService,
    auth: HttpAuthClient,
    _temp_dir: tempfile::TempDir,
}

fn clients(server: &TestServer) -> Clients {
    let temp_dir = tempfile::tempdir().unwrap();
    let credentials = Arc::new(FileCredentialRepository::new(
        temp_dir.path().join("auth-storage.toml"),
    ));
    let gate = Arc::new(IdentityGate::new(credentials));
    let client = build_client(Duration::from_secs(5)).unwrap();
    let base = server.base_url();
    Clients {
        documents: HttpDocumentRepository::new(client.clone(), base.clone(), gate.clone()),
        renderer: HttpRenderService::new(client.clone(), base.clone(), gate.clone()),
        tailor: HttpTailorService::new(client.clone(), base.clone(), gate.clone()),
        auth: HttpAuthClient::new(client, base),
        gate,
        _temp_dir: temp_dir,
    }
}

async fn signed_in(server: &TestServer) -> Clients {
    let clients = clients(server);
    let token = clients.auth.login("ada@example.com", "secret").await.unwrap();
    clients
        .gate
        .login(token.access_token, "ada@example.com")
        .await
        .unwrap();
    clients
}

#[tokio::test]
async fn list_without_credential_fails_before_any_request() {
    let server = start_test_server().await;
    let clients = clients(&server);

    let err = clients.documents.list().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(server.api.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn document_crud_round_trip() {
    let server = start_test_server().await;
    let clients = signed_in(&server).await;

    let created = clients
        .documents
        .create(&Document::new("Untitled Resume", Basics::placeholder()))
        .await
        .unwrap();
    let id = created.id.clone().unwrap();
    assert_eq!(created.basics.name, "New User");

    let mut patch = DocumentPatch::new();
    patch.set_section(
        SectionKey::Basics,
        json!({ "name": "Ada Lovelace", "email": "" }),
    );
    let updated = clients.documents.patch(&id, &patch).await.unwrap();
    assert_eq!(updated.basics.name, "Ada Lovelace");
    assert_eq!(
        server.api.patches.lock().unwrap()[0],
        json!({ "basics": { "name": "Ada Lovelace", "email": "" } })
    );

    let fetched = clients.documents.get(&id).await.unwrap();
    assert_eq!(fetched.title, "Untitled Resume");

    let summaries = clients.documents.list().await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].id, id);

    clients.documents.delete(&id).await.unwrap();
    let err = clients.documents.get(&id).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("Resume not found"));
}

#[tokio::test]
async fn rejected_credential_ends_session() {
    let server = start_test_server().await;
    let clients = clients(&server);
    clients.gate.login("tok-expired", "ada@example.com").await.unwrap();

    let err = clients.documents.list().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(clients.gate.current_credential().is_none());
    let hits = server.api.hits.load(Ordering::SeqCst);

    let err = clients.documents.get("r1").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(server.api.hits.load(Ordering::SeqCst), hits);
}

#[tokio::test]
async fn late_rejection_of_old_token_keeps_new_session() {
    let server = start_test_server().await;
    server.api.reject_delay_ms.store(300, Ordering::SeqCst);
    let clients = clients(&server);
    clients.gate.login("tok-expired", "ada@example.com").await.unwrap();

    let stale = tokio::spawn({
        let documents = clients.documents.clone();
        async move { documents.list().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    clients.gate.login(GOOD_TOKEN, "ada@example.com").await.unwrap();

    let err = stale.await.unwrap().unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(clients.gate.current_credential().unwrap().expose(), GOOD_TOKEN);
    assert!(clients.documents.list().await.is_ok());
}

#[tokio::test]
async fn render_returns_artifact_and_maps_detail() {
    let server = start_test_server().await;
    let clients = clients(&server);

    let artifact = clients
        .renderer
        .render(&Document::new("CV", Basics::placeholder()))
        .await
        .unwrap();
    assert_eq!(artifact.content_type, "application/pdf");
    assert!(artifact.bytes.starts_with(b"%PDF"));

    let broken = Document::new(
        "CV",
        Basics {
            name: "Broken".to_string(),
            ..Basics::default()
        },
    );
    let err = clients.renderer.render(&broken).await.unwrap_err();
    assert!(err.to_string().contains("LaTeX compilation failed"));
}

#[tokio::test]
async fn login_and_register_errors_carry_detail() {
    let server = start_test_server().await;
    let clients = clients(&server);

    let err = clients.auth.login("ada@example.com", "wrong").await.unwrap_err();
    assert!(err.to_string().contains("Incorrect username or password"));
    assert!(clients.gate.current_credential().is_none());

    let err = clients
        .auth
        .register("taken@example.com", "secret")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Email already registered"));

    clients
        .auth
        .register("new@example.com", "secret")
        .await
        .unwrap();
}

#[tokio::test]
async fn tailor_returns_tailored_resume() {
    let server = start_test_server().await;
    let clients = signed_in(&server).await;

    let tailored = clients
        .tailor
        .tailor(
            &Document::new("CV", Basics::placeholder()),
            "Systems engineer, Rust",
        )
        .await
        .unwrap();

    assert_eq!(tailored.basics.name, "New User");
    assert_eq!(tailored.skills[0].name.as_deref(), Some("Rust"));
    assert_eq!(
        tailored.job_description.as_deref(),
        Some("Systems engineer, Rust")
    );
}
