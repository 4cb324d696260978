//! Mock Prisma Postgres Management API
//!
//! An axum server bound to an ephemeral local port that keeps projects,
//! databases and connections in memory and answers the same routes as the
//! real API. Tests point a client at [`MockApiServer::url`].
//!
//! Behaviour mirrors the real service where the provider depends on it:
//!
//! - secrets (connection strings, passwords) only appear in create responses
//! - an empty `region` on database creation becomes `us-east-1`
//! - deleting a project or database cascades to its children
//! - unknown routes and ids answer `404 {"error": "not found"}`
//! - a wrong bearer token answers `401`

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Token the server accepts unless started with another one
pub const TEST_TOKEN: &str = "test-token";

/// `createdAt` of every entity the mock creates
pub const CREATED_AT: &str = "2025-01-07T00:00:00Z";

pub const DEFAULT_REGION: &str = "us-east-1";

/// A request as seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Header names are lowercase
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn header_count(&self, name: &str) -> usize {
        let name = name.to_ascii_lowercase();
        self.headers.iter().filter(|(k, _)| *k == name).count()
    }
}

#[derive(Default)]
struct Store {
    token: String,
    projects: BTreeMap<String, Value>,
    /// database id -> (project id, full create response)
    databases: BTreeMap<String, (String, Value)>,
    /// (database id, full create response), creation order
    connections: Vec<(String, Value)>,
    regions: Vec<Value>,
    database_status: String,
    counters: HashMap<&'static str, u64>,
    queued_ids: HashMap<&'static str, VecDeque<String>>,
    overrides: HashMap<String, (u16, String)>,
    requests: Vec<RecordedRequest>,
}

impl Store {
    fn next_id(&mut self, kind: &'static str) -> String {
        if let Some(id) = self.queued_ids.get_mut(kind).and_then(|q| q.pop_front()) {
            return id;
        }
        let counter = self.counters.entry(kind).or_insert(0);
        *counter += 1;
        let prefix = match kind {
            "project" => "proj",
            "database" => "db",
            _ => "conn",
        };
        format!("{}_test{}", prefix, counter)
    }
}

type Shared = Arc<Mutex<Store>>;

/// Running mock server; shuts down on drop
pub struct MockApiServer {
    url: String,
    store: Shared,
    handle: JoinHandle<()>,
}

impl MockApiServer {
    /// Start a server accepting [`TEST_TOKEN`]
    pub async fn start() -> Self {
        Self::start_with_token(TEST_TOKEN).await
    }

    pub async fn start_with_token(token: &str) -> Self {
        let store = Arc::new(Mutex::new(Store {
            token: token.to_string(),
            regions: default_regions(),
            database_status: "ready".to_string(),
            ..Default::default()
        }));

        let app = Router::new().fallback(dispatch).with_state(store.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock API listener");
        let addr = listener
            .local_addr()
            .expect("mock API listener has no local address");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("mock API server stopped: {}", e);
            }
        });

        Self {
            url: format!("http://{}", addr),
            store,
            handle,
        }
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().expect("mock store poisoned")
    }

    /// Base URL, e.g. `http://127.0.0.1:41234`
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Replace the region list returned by `GET /v1/regions/postgres`
    pub fn set_regions(&self, regions: Vec<Value>) {
        self.store().regions = regions;
    }

    /// Status reported for newly created databases (default `ready`)
    pub fn set_database_status(&self, status: &str) {
        self.store().database_status = status.to_string();
    }

    /// Use `id` for the next created entity of `kind`
    /// (`"project"`, `"database"` or `"connection"`)
    pub fn queue_id(&self, kind: &'static str, id: &str) {
        self.store()
            .queued_ids
            .entry(kind)
            .or_default()
            .push_back(id.to_string());
    }

    /// Answer every `method path` request with a canned status and raw body
    pub fn respond_with(&self, method: &str, path: &str, status: u16, body: &str) {
        self.store().overrides.insert(
            format!("{} {}", method.to_ascii_uppercase(), path),
            (status, body.to_string()),
        );
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.store().requests.clone()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.store().requests.last().cloned()
    }

    pub fn project(&self, id: &str) -> Option<Value> {
        self.store().projects.get(id).cloned()
    }

    pub fn database(&self, id: &str) -> Option<Value> {
        self.store().databases.get(id).map(|(_, db)| db.clone())
    }

    pub fn connection(&self, id: &str) -> Option<Value> {
        self.store()
            .connections
            .iter()
            .find(|(_, c)| c["id"] == id)
            .map(|(_, c)| c.clone())
    }

    pub fn project_count(&self) -> usize {
        self.store().projects.len()
    }

    pub fn database_count(&self) -> usize {
        self.store().databases.len()
    }

    pub fn connection_count(&self) -> usize {
        self.store().connections.len()
    }

    /// Delete a project behind the client's back (with its children)
    pub fn remove_project(&self, id: &str) {
        remove_project(&mut self.store(), id);
    }

    /// Delete a database behind the client's back (with its connections)
    pub fn remove_database(&self, id: &str) {
        remove_database(&mut self.store(), id);
    }

    pub fn remove_connection(&self, id: &str) {
        self.store().connections.retain(|(_, c)| c["id"] != id);
    }
}

impl Drop for MockApiServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn default_regions() -> Vec<Value> {
    vec![
        json!({"id": "us-east-1", "type": "region", "name": "US East (N. Virginia)", "status": "available"}),
        json!({"id": "us-west-1", "type": "region", "name": "US West (N. California)", "status": "available"}),
        json!({"id": "eu-west-3", "type": "region", "name": "Europe (Paris)", "status": "available"}),
    ]
}

fn region_name(store: &Store, id: &str) -> String {
    store
        .regions
        .iter()
        .find(|r| r["id"] == id)
        .and_then(|r| r["name"].as_str())
        .unwrap_or("Test Region")
        .to_string()
}

fn remove_project(store: &mut Store, id: &str) -> bool {
    let existed = store.projects.remove(id).is_some();
    let children: Vec<String> = store
        .databases
        .iter()
        .filter(|(_, (project_id, _))| project_id == id)
        .map(|(db_id, _)| db_id.clone())
        .collect();
    for db_id in children {
        remove_database(store, &db_id);
    }
    existed
}

fn remove_database(store: &mut Store, id: &str) -> bool {
    let existed = store.databases.remove(id).is_some();
    store.connections.retain(|(db_id, _)| db_id != id);
    existed
}

/// Strip the fields the real API only returns on creation
fn without_secrets(mut entity: Value) -> Value {
    if let Some(obj) = entity.as_object_mut() {
        for key in [
            "connectionString",
            "directConnection",
            "apiKeys",
            "host",
            "user",
            "pass",
        ] {
            obj.remove(key);
        }
    }
    entity
}

struct Reply {
    status: u16,
    body: String,
}

impl Reply {
    fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    fn data(body: Value) -> Self {
        Self::json(200, json!({ "data": body }))
    }

    fn no_content() -> Self {
        Self {
            status: 204,
            body: String::new(),
        }
    }

    fn not_found() -> Self {
        Self::json(404, json!({"error": "not found"}))
    }

    fn bad_request() -> Self {
        Self::json(400, json!({"error": "invalid request"}))
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if self.body.is_empty() {
            return status.into_response();
        }
        (status, [(header::CONTENT_TYPE, "application/json")], self.body).into_response()
    }
}

async fn dispatch(
    State(store): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Reply {
    let mut store = match store.lock() {
        Ok(store) => store,
        Err(_) => return Reply::json(500, json!({"error": "mock store poisoned"})),
    };

    let path = uri.path().to_string();
    let body: Option<Value> = if body.is_empty() {
        None
    } else {
        serde_json::from_slice(&body).ok()
    };

    store.requests.push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        headers: headers
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    v.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect(),
        body: body.clone(),
    });

    if let Some((status, raw)) = store.overrides.get(&format!("{} {}", method, path)) {
        return Reply {
            status: *status,
            body: raw.clone(),
        };
    }

    let expected = format!("Bearer {}", store.token);
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        return Reply::json(401, json!({"error": "unauthorized"}));
    }

    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

    match (method.as_str(), segments.as_slice()) {
        ("POST", ["v1", "projects"]) => create_project(&mut store, body),
        ("GET", ["v1", "projects", id]) => match store.projects.get(*id) {
            Some(project) => Reply::data(without_secrets(project.clone())),
            None => Reply::not_found(),
        },
        ("DELETE", ["v1", "projects", id]) => {
            if remove_project(&mut store, id) {
                Reply::no_content()
            } else {
                Reply::not_found()
            }
        }
        ("POST", ["v1", "projects", id, "databases"]) => {
            create_database(&mut store, id, body, false)
        }
        ("GET", ["v1", "databases", id]) => get_database(&store, id),
        ("DELETE", ["v1", "databases", id]) => {
            if remove_database(&mut store, id) {
                Reply::no_content()
            } else {
                Reply::not_found()
            }
        }
        ("POST", ["v1", "databases", id, "connections"]) => {
            create_connection(&mut store, id, body)
        }
        ("GET", ["v1", "databases", id, "connections"]) => list_connections(&store, id),
        ("DELETE", ["v1", "connections", id]) => {
            let before = store.connections.len();
            store.connections.retain(|(_, c)| c["id"] != *id);
            if store.connections.len() < before {
                Reply::no_content()
            } else {
                Reply::not_found()
            }
        }
        ("GET", ["v1", "regions", "postgres"]) => Reply::json(
            200,
            json!({ "data": store.regions.clone() }),
        ),
        _ => Reply::not_found(),
    }
}

fn create_project(store: &mut Store, body: Option<Value>) -> Reply {
    let Some(req) = body else {
        return Reply::bad_request();
    };
    let Some(name) = req["name"].as_str().filter(|n| !n.is_empty()) else {
        return Reply::bad_request();
    };

    let id = store.next_id("project");
    let mut project = json!({
        "id": id,
        "type": "project",
        "name": name,
        "createdAt": CREATED_AT,
        "workspace": { "id": "wksp_test", "name": "Test Workspace" }
    });
    store.projects.insert(id.clone(), project.clone());

    if req["createDatabase"].as_bool().unwrap_or(false) {
        let db_req = json!({ "name": name });
        if let Reply { status: 200, body } = create_database(store, &id, Some(db_req), true) {
            if let Ok(created) = serde_json::from_str::<Value>(&body) {
                project["database"] = created["data"].clone();
            }
        }
    }

    Reply::data(project)
}

fn create_database(
    store: &mut Store,
    project_id: &str,
    body: Option<Value>,
    is_default: bool,
) -> Reply {
    if !store.projects.contains_key(project_id) {
        return Reply::not_found();
    }
    let Some(req) = body else {
        return Reply::bad_request();
    };
    let Some(name) = req["name"].as_str().filter(|n| !n.is_empty()) else {
        return Reply::bad_request();
    };

    let region = req["region"]
        .as_str()
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_REGION)
        .to_string();

    let id = store.next_id("database");
    let database = json!({
        "id": id,
        "type": "database",
        "name": name,
        "status": store.database_status,
        "createdAt": CREATED_AT,
        "isDefault": is_default,
        "connectionString": format!("prisma+postgres://accelerate.prisma-data.net/?api_key={}_key", id),
        "directConnection": {
            "host": format!("{}.db.prisma-data.net", region),
            "user": "prisma_user",
            "pass": format!("{}_password", id)
        },
        "region": { "id": region, "name": region_name(store, &region) }
    });

    store
        .databases
        .insert(id, (project_id.to_string(), database.clone()));
    Reply::data(database)
}

fn get_database(store: &Store, id: &str) -> Reply {
    let Some((project_id, database)) = store.databases.get(id) else {
        return Reply::not_found();
    };
    let mut database = without_secrets(database.clone());
    if let Some(project) = store.projects.get(project_id) {
        database["project"] = json!({ "id": project["id"], "name": project["name"] });
    }
    Reply::data(database)
}

fn create_connection(store: &mut Store, database_id: &str, body: Option<Value>) -> Reply {
    let Some(db_name) = store
        .databases
        .get(database_id)
        .map(|(_, db)| db["name"].clone())
    else {
        return Reply::not_found();
    };
    let Some(req) = body else {
        return Reply::bad_request();
    };
    let Some(name) = req["name"].as_str().filter(|n| !n.is_empty()) else {
        return Reply::bad_request();
    };

    let id = store.next_id("connection");
    let connection = json!({
        "id": id,
        "type": "connection",
        "name": name,
        "createdAt": CREATED_AT,
        "database": { "id": database_id, "name": db_name },
        "connectionString": format!("prisma+postgres://accelerate.prisma-data.net/?api_key={}_key", id),
        "host": "accelerate.prisma-data.net",
        "user": "prisma",
        "pass": format!("{}_password", id)
    });

    store
        .connections
        .push((database_id.to_string(), connection.clone()));
    Reply::data(connection)
}

fn list_connections(store: &Store, database_id: &str) -> Reply {
    if !store.databases.contains_key(database_id) {
        return Reply::not_found();
    }
    let data: Vec<Value> = store
        .connections
        .iter()
        .filter(|(db_id, _)| db_id == database_id)
        .map(|(_, c)| without_secrets(c.clone()))
        .collect();
    Reply::json(
        200,
        json!({ "data": data, "pagination": { "hasMore": false } }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let server = MockApiServer::start().await;
        let resp = reqwest::Client::new()
            .get(format!("{}/v2/whatever", server.url()))
            .bearer_auth(TEST_TOKEN)
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status().as_u16(), 404);
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_token_is_401() {
        let server = MockApiServer::start().await;
        let resp = reqwest::Client::new()
            .get(format!("{}/v1/regions/postgres", server.url()))
            .bearer_auth("nope")
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status().as_u16(), 401);
    }

    #[tokio::test]
    async fn test_project_delete_cascades() {
        let server = MockApiServer::start().await;
        let client = reqwest::Client::new();

        let project: Value = client
            .post(format!("{}/v1/projects", server.url()))
            .bearer_auth(TEST_TOKEN)
            .json(&json!({"name": "p", "createDatabase": true}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        let project_id = project["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(project["data"]["database"]["isDefault"], true);
        assert_eq!(server.database_count(), 1);

        server.remove_project(&project_id);
        assert_eq!(server.project_count(), 0);
        assert_eq!(server.database_count(), 0);
    }
}
