//! In-memory stand-in for the dashboard backend.
//!
//! Implements the slice of the API the client's integration tests drive
//! (session and bearer auth, projects, clusters, releases) plus `/faults/*`
//! routes that force a status, return malformed JSON or bytes that are not
//! UTF-8, never answer, or echo the request back.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{header, HeaderMap, HeaderName, Method, StatusCode, Uri},
    routing::{any, delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Bearer token accepted as the seeded admin user.
pub const API_TOKEN: &str = "mock-api-token";
pub const SESSION_COOKIE: &str = "porter";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "hunter2";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: u64,
    pub project_id: u64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub name: String,
    pub namespace: String,
    pub chart: String,
    pub version: u64,
    pub status: String,
    pub cluster_id: u64,
    #[serde(skip)]
    pub project_id: u64,
    #[serde(skip)]
    pub updated: u64,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct CreateProject {
    pub name: String,
}

#[derive(Deserialize)]
pub struct DeployTemplate {
    #[serde(rename = "templateName")]
    pub template_name: String,
    pub namespace: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct Upgrade {
    pub namespace: String,
    pub values: String,
}

#[derive(Deserialize)]
pub struct Rollback {
    pub namespace: String,
    pub revision: u64,
}

struct Account {
    user: User,
    password: String,
}

struct OwnedProject {
    owner: u64,
    project: Project,
}

/// Everything the backend knows; one instance per `app()`.
pub struct Backend {
    accounts: BTreeMap<u64, Account>,
    sessions: HashMap<String, u64>,
    projects: BTreeMap<u64, OwnedProject>,
    clusters: Vec<Cluster>,
    releases: Vec<Release>,
    webhook_tokens: HashMap<(u64, String), String>,
    next_user_id: u64,
    next_project_id: u64,
    next_cluster_id: u64,
    clock: u64,
}

impl Backend {
    /// Fresh backend holding only the admin account (user id 1).
    pub fn new() -> Self {
        let mut backend = Self {
            accounts: BTreeMap::new(),
            sessions: HashMap::new(),
            projects: BTreeMap::new(),
            clusters: Vec::new(),
            releases: Vec::new(),
            webhook_tokens: HashMap::new(),
            next_user_id: 1,
            next_project_id: 1,
            next_cluster_id: 1,
            clock: 0,
        };
        backend.register(ADMIN_EMAIL, ADMIN_PASSWORD);
        backend
    }

    fn register(&mut self, email: &str, password: &str) -> User {
        let user = User {
            id: self.next_user_id,
            email: email.to_string(),
        };
        self.next_user_id += 1;
        self.accounts.insert(
            user.id,
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        user
    }

    fn authenticate(&self, headers: &HeaderMap) -> Option<User> {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if bearer == Some(API_TOKEN) {
            return self.accounts.get(&1).map(|a| a.user.clone());
        }
        let session = session_id(headers)?;
        let user_id = self.sessions.get(&session)?;
        self.accounts.get(user_id).map(|a| a.user.clone())
    }

    fn project(&self, id: u64, user: &User) -> Result<&Project, Failure> {
        match self.projects.get(&id) {
            Some(owned) if owned.owner == user.id => Ok(&owned.project),
            Some(_) => Err(failure(StatusCode::FORBIDDEN, "Forbidden")),
            None => Err(failure(StatusCode::NOT_FOUND, "project not found")),
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::new()
    }
}

pub type Db = Arc<RwLock<Backend>>;

/// Error response: a status plus `{"error": "..."}`.
pub type Failure = (StatusCode, Json<Value>);

fn failure(status: StatusCode, message: &str) -> Failure {
    (status, Json(json!({ "error": message })))
}

fn forbidden() -> Failure {
    failure(StatusCode::FORBIDDEN, "Forbidden")
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Backend::new()));
    Router::new()
        .route("/api/auth/check", get(check_auth))
        .route("/api/users", post(register_user))
        .route("/api/users/{id}", get(get_user))
        .route("/api/users/{id}/projects", get(list_projects))
        .route("/api/login", post(log_in))
        .route("/api/logout", post(log_out))
        .route("/api/projects", post(create_project))
        .route("/api/projects/{id}", delete(delete_project))
        .route("/api/projects/{id}/clusters", get(list_clusters))
        .route("/api/projects/{id}/releases", get(list_releases))
        .route("/api/projects/{id}/releases/{name}/rollback", post(rollback_release))
        .route("/api/projects/{id}/releases/{name}/upgrade", post(upgrade_release))
        .route("/api/projects/{id}/releases/{name}/webhook_token", get(release_token))
        .route("/api/projects/{id}/deploy/{name}", post(uninstall_release))
        .route("/api/projects/{id}/deploy/{name}/{version}", post(deploy_template))
        .route("/faults/status/{code}", get(fault_status))
        .route("/faults/malformed", get(fault_malformed))
        .route("/faults/invalid-utf8", get(fault_invalid_utf8))
        .route("/faults/hang", get(fault_hang))
        .route("/faults/echo", any(echo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// ---------------------------------------------------------------------------
// Auth and users
// ---------------------------------------------------------------------------

async fn check_auth(State(db): State<Db>, headers: HeaderMap) -> Result<Json<User>, Failure> {
    db.read().await.authenticate(&headers).map(Json).ok_or_else(forbidden)
}

async fn register_user(
    State(db): State<Db>,
    Json(input): Json<Credentials>,
) -> Result<(StatusCode, Json<User>), Failure> {
    let mut backend = db.write().await;
    if backend.accounts.values().any(|a| a.user.email == input.email) {
        return Err(failure(StatusCode::CONFLICT, "email already registered"));
    }
    let user = backend.register(&input.email, &input.password);
    tracing::debug!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    State(db): State<Db>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Result<Json<User>, Failure> {
    let user = db.read().await.authenticate(&headers).ok_or_else(forbidden)?;
    if user.id != id {
        return Err(forbidden());
    }
    Ok(Json(user))
}

async fn log_in(
    State(db): State<Db>,
    Json(input): Json<Credentials>,
) -> Result<([(HeaderName, String); 1], Json<User>), Failure> {
    let mut backend = db.write().await;
    let user = backend
        .accounts
        .values()
        .find(|a| a.user.email == input.email && a.password == input.password)
        .map(|a| a.user.clone())
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "invalid email or password"))?;

    let session = Uuid::new_v4().to_string();
    backend.sessions.insert(session.clone(), user.id);
    let cookie = format!("{SESSION_COOKIE}={session}; Path=/; HttpOnly");
    Ok(([(header::SET_COOKIE, cookie)], Json(user)))
}

async fn log_out(State(db): State<Db>, headers: HeaderMap) -> StatusCode {
    if let Some(session) = session_id(&headers) {
        db.write().await.sessions.remove(&session);
    }
    StatusCode::OK
}

fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

// ---------------------------------------------------------------------------
// Projects and clusters
// ---------------------------------------------------------------------------

async fn create_project(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateProject>,
) -> Result<(StatusCode, Json<Project>), Failure> {
    let mut backend = db.write().await;
    let user = backend.authenticate(&headers).ok_or_else(forbidden)?;
    if input.name.is_empty() {
        return Err(failure(StatusCode::BAD_REQUEST, "project name is required"));
    }

    let project = Project {
        id: backend.next_project_id,
        name: input.name,
    };
    backend.next_project_id += 1;
    let cluster = Cluster {
        id: backend.next_cluster_id,
        project_id: project.id,
        name: format!("{}-cluster", project.name),
    };
    backend.next_cluster_id += 1;
    backend.clusters.push(cluster);
    backend.projects.insert(
        project.id,
        OwnedProject {
            owner: user.id,
            project: project.clone(),
        },
    );
    tracing::debug!(project_id = project.id, "project created");
    Ok((StatusCode::CREATED, Json(project)))
}

async fn list_projects(
    State(db): State<Db>,
    Path(user_id): Path<u64>,
    headers: HeaderMap,
) -> Result<Json<Vec<Project>>, Failure> {
    let backend = db.read().await;
    let user = backend.authenticate(&headers).ok_or_else(forbidden)?;
    if user.id != user_id {
        return Err(forbidden());
    }
    let projects = backend
        .projects
        .values()
        .filter(|owned| owned.owner == user_id)
        .map(|owned| owned.project.clone())
        .collect();
    Ok(Json(projects))
}

async fn delete_project(
    State(db): State<Db>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Result<Json<Project>, Failure> {
    let mut backend = db.write().await;
    let user = backend.authenticate(&headers).ok_or_else(forbidden)?;
    let project = backend.project(id, &user)?.clone();
    backend.projects.remove(&id);
    backend.clusters.retain(|c| c.project_id != id);
    backend.releases.retain(|r| r.project_id != id);
    Ok(Json(project))
}

async fn list_clusters(
    State(db): State<Db>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Result<Json<Vec<Cluster>>, Failure> {
    let backend = db.read().await;
    let user = backend.authenticate(&headers).ok_or_else(forbidden)?;
    backend.project(id, &user)?;
    let clusters = backend
        .clusters
        .iter()
        .filter(|c| c.project_id == id)
        .cloned()
        .collect();
    Ok(Json(clusters))
}

// ---------------------------------------------------------------------------
// Releases
// ---------------------------------------------------------------------------

/// Decoded query string; keys may repeat.
struct Query(Vec<(String, String)>);

impl Query {
    fn parse(raw: Option<String>) -> Self {
        let pairs = raw
            .map(|raw| url::form_urlencoded::parse(raw.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Query(pairs)
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    fn all(&self, key: &str) -> Vec<&str> {
        self.0.iter().filter(|(k, _)| k == key).map(|(_, v)| v.as_str()).collect()
    }

    fn number(&self, key: &str) -> Result<Option<u64>, Failure> {
        self.get(key)
            .map(|v| {
                v.parse()
                    .map_err(|_| failure(StatusCode::BAD_REQUEST, &format!("invalid {key}")))
            })
            .transpose()
    }

    fn cluster_id(&self) -> Result<u64, Failure> {
        self.number("cluster_id")?
            .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "cluster_id is required"))
    }
}

async fn list_releases(
    State(db): State<Db>,
    Path(id): Path<u64>,
    RawQuery(raw): RawQuery,
    headers: HeaderMap,
) -> Result<Json<Vec<Release>>, Failure> {
    let query = Query::parse(raw);
    let backend = db.read().await;
    let user = backend.authenticate(&headers).ok_or_else(forbidden)?;
    backend.project(id, &user)?;

    let cluster_id = query.cluster_id()?;
    let namespace = query.get("namespace").unwrap_or_default();
    let statuses = query.all("statusFilter");
    let mut releases: Vec<Release> = backend
        .releases
        .iter()
        .filter(|r| r.project_id == id && r.cluster_id == cluster_id)
        .filter(|r| namespace.is_empty() || r.namespace == namespace)
        .filter(|r| statuses.is_empty() || statuses.contains(&r.status.as_str()))
        .cloned()
        .collect();

    if query.get("byDate") == Some("true") {
        releases.sort_by(|a, b| b.updated.cmp(&a.updated));
    } else {
        releases.sort_by(|a, b| a.name.cmp(&b.name));
    }
    let skip = query.number("skip")?.unwrap_or(0) as usize;
    let limit = query.number("limit")?.unwrap_or(0) as usize;
    let releases = releases.into_iter().skip(skip);
    let releases = if limit > 0 {
        releases.take(limit).collect()
    } else {
        releases.collect()
    };
    Ok(Json(releases))
}

async fn deploy_template(
    State(db): State<Db>,
    Path((id, template, version)): Path<(u64, String, String)>,
    RawQuery(raw): RawQuery,
    headers: HeaderMap,
    Json(input): Json<DeployTemplate>,
) -> Result<StatusCode, Failure> {
    let query = Query::parse(raw);
    let mut backend = db.write().await;
    let user = backend.authenticate(&headers).ok_or_else(forbidden)?;
    backend.project(id, &user)?;
    let cluster_id = query.cluster_id()?;
    if input.template_name != template {
        return Err(failure(StatusCode::BAD_REQUEST, "template name mismatch"));
    }
    if backend
        .releases
        .iter()
        .any(|r| r.project_id == id && r.cluster_id == cluster_id && r.name == input.name)
    {
        return Err(failure(StatusCode::CONFLICT, "release already exists"));
    }

    let updated = backend.tick();
    backend.releases.push(Release {
        name: input.name,
        namespace: input.namespace,
        chart: format!("{template}-{version}"),
        version: 1,
        status: "deployed".to_string(),
        cluster_id,
        project_id: id,
        updated,
    });
    Ok(StatusCode::OK)
}

async fn uninstall_release(
    State(db): State<Db>,
    Path((id, name)): Path<(u64, String)>,
    RawQuery(raw): RawQuery,
    headers: HeaderMap,
) -> Result<StatusCode, Failure> {
    let query = Query::parse(raw);
    let mut backend = db.write().await;
    let user = backend.authenticate(&headers).ok_or_else(forbidden)?;
    backend.project(id, &user)?;
    let cluster_id = query.cluster_id()?;
    let namespace = query.get("namespace").unwrap_or_default().to_string();

    let before = backend.releases.len();
    backend
        .releases
        .retain(|r| !(r.project_id == id && r.cluster_id == cluster_id && r.name == name && r.namespace == namespace));
    if backend.releases.len() == before {
        return Err(failure(StatusCode::NOT_FOUND, "release not found"));
    }
    Ok(StatusCode::OK)
}

async fn upgrade_release(
    State(db): State<Db>,
    Path((id, name)): Path<(u64, String)>,
    RawQuery(raw): RawQuery,
    headers: HeaderMap,
    Json(input): Json<Upgrade>,
) -> Result<StatusCode, Failure> {
    let query = Query::parse(raw);
    let mut backend = db.write().await;
    let user = backend.authenticate(&headers).ok_or_else(forbidden)?;
    backend.project(id, &user)?;
    let cluster_id = query.cluster_id()?;
    let updated = backend.tick();

    let release = backend
        .releases
        .iter_mut()
        .find(|r| r.project_id == id && r.cluster_id == cluster_id && r.name == name && r.namespace == input.namespace)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "release not found"))?;
    tracing::debug!(release = %name, values_len = input.values.len(), "release upgraded");
    release.version += 1;
    release.updated = updated;
    Ok(StatusCode::OK)
}

async fn rollback_release(
    State(db): State<Db>,
    Path((id, name)): Path<(u64, String)>,
    RawQuery(raw): RawQuery,
    headers: HeaderMap,
    Json(input): Json<Rollback>,
) -> Result<StatusCode, Failure> {
    let query = Query::parse(raw);
    let mut backend = db.write().await;
    let user = backend.authenticate(&headers).ok_or_else(forbidden)?;
    backend.project(id, &user)?;
    let cluster_id = query.cluster_id()?;
    let updated = backend.tick();

    let release = backend
        .releases
        .iter_mut()
        .find(|r| r.project_id == id && r.cluster_id == cluster_id && r.name == name && r.namespace == input.namespace)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "release not found"))?;
    if input.revision == 0 || input.revision >= release.version {
        return Err(failure(StatusCode::BAD_REQUEST, "invalid revision"));
    }
    release.version += 1;
    release.status = "deployed".to_string();
    release.updated = updated;
    Ok(StatusCode::OK)
}

async fn release_token(
    State(db): State<Db>,
    Path((id, name)): Path<(u64, String)>,
    RawQuery(raw): RawQuery,
    headers: HeaderMap,
) -> Result<Json<Value>, Failure> {
    let query = Query::parse(raw);
    let mut backend = db.write().await;
    let user = backend.authenticate(&headers).ok_or_else(forbidden)?;
    backend.project(id, &user)?;
    let cluster_id = query.cluster_id()?;
    if !backend
        .releases
        .iter()
        .any(|r| r.project_id == id && r.cluster_id == cluster_id && r.name == name)
    {
        return Err(failure(StatusCode::NOT_FOUND, "release not found"));
    }
    let token = backend
        .webhook_tokens
        .entry((id, name))
        .or_insert_with(|| Uuid::new_v4().to_string())
        .clone();
    Ok(Json(json!({ "webhook_token": token })))
}

// ---------------------------------------------------------------------------
// Faults
// ---------------------------------------------------------------------------

async fn fault_status(Path(code): Path<u16>) -> Result<Failure, StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok(failure(status, "boom"))
}

async fn fault_malformed() -> ([(HeaderName, &'static str); 1], &'static str) {
    ([(header::CONTENT_TYPE, "application/json")], "{\"id\": 1,")
}

async fn fault_invalid_utf8() -> ([(HeaderName, &'static str); 1], &'static [u8]) {
    ([(header::CONTENT_TYPE, "application/json")], &b"{\"name\":\"a\xff\xfeb\"}"[..])
}

async fn fault_hang() -> StatusCode {
    std::future::pending::<()>().await;
    StatusCode::OK
}

/// Reflects what the server received.
async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let value_of = |name: HeaderName| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
    };
    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "authorization": value_of(header::AUTHORIZATION),
        "content_type": value_of(header::CONTENT_TYPE),
        "cookie": value_of(header::COOKIE),
        "body": body,
    }))
}
