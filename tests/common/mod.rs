// Copyright (c) 2025 ADBC Drivers Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! In-memory Dremio service used by the integration tests.
//!
//! Covers the catalog (with version tags), collaboration metadata, SQL jobs
//! driven by scripted state sequences, paged results, users and login.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dremio_adbc::client::{ApiRequest, ApiResponse, Method, Transport};
use dremio_adbc::jobs::PollPolicy;
use dremio_adbc::{ClientConfig, Credentials, Dremio, Result};
use serde_json::{json, Map, Value};

pub const USERNAME: &str = "dremio";
pub const PASSWORD: &str = "dremio123";
const SESSION_TOKEN: &str = "fake-session";

/// How a submitted job behaves: the states reported by successive polls
/// (the last one repeats) and the rows it returns.
#[derive(Debug, Clone)]
pub struct JobScript {
    pub states: Vec<String>,
    pub schema: Vec<Value>,
    pub rows: Vec<Value>,
    pub error_message: Option<String>,
}

impl JobScript {
    pub fn rows(schema: &[(&str, &str)], rows: Vec<Value>) -> Self {
        Self {
            states: vec!["RUNNING".into(), "COMPLETED".into()],
            schema: schema
                .iter()
                .map(|(name, type_name)| json!({"name": name, "type": {"name": type_name}}))
                .collect(),
            rows,
            error_message: None,
        }
    }

    pub fn states(states: &[&str]) -> Self {
        Self {
            states: states.iter().map(|s| s.to_string()).collect(),
            schema: Vec::new(),
            rows: Vec::new(),
            error_message: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            error_message: Some(message.to_string()),
            ..Self::states(&["RUNNING", "FAILED"])
        }
    }

    pub fn with_states(mut self, states: &[&str]) -> Self {
        self.states = states.iter().map(|s| s.to_string()).collect();
        self
    }
}

#[derive(Debug, Clone)]
struct Entity {
    id: String,
    entity_type: String,
    path: Vec<String>,
    version: u64,
    body: Map<String, Value>,
}

impl Entity {
    fn tag(&self) -> String {
        self.version.to_string()
    }

    fn is_dataset(&self) -> bool {
        self.entity_type == "dataset"
    }

    fn as_child(&self) -> Value {
        let mut child = json!({"id": self.id, "path": self.path, "tag": self.tag()});
        if self.is_dataset() {
            let virtual_dataset =
                self.body.get("type").and_then(Value::as_str) == Some("VIRTUAL_DATASET");
            child["type"] = json!("DATASET");
            child["datasetType"] = json!(if virtual_dataset { "VIRTUAL" } else { "PROMOTED" });
        } else {
            child["type"] = json!("CONTAINER");
            child["containerType"] = json!(self.entity_type.to_uppercase());
        }
        child
    }
}

#[derive(Debug)]
struct RunningJob {
    script: JobScript,
    polls: usize,
    cancelled: bool,
}

#[derive(Debug, Default)]
struct State {
    entities: BTreeMap<String, Entity>,
    next_id: u64,
    failing_deletes: HashSet<Vec<String>>,
    metadata: HashMap<(String, String), (Value, u64)>,
    scripts: Vec<(String, JobScript)>,
    jobs: HashMap<String, RunningJob>,
    next_job: u64,
    submitted: Vec<Value>,
    users: BTreeMap<String, Value>,
    requests: Vec<(Method, String)>,
    result_windows: Vec<(usize, usize)>,
}

fn ok(body: Value) -> ApiResponse {
    ApiResponse::new(200, body)
}

fn no_content() -> ApiResponse {
    ApiResponse::new(204, Value::Null)
}

fn error(status: u16, message: impl Into<String>) -> ApiResponse {
    ApiResponse::new(status, json!({"errorMessage": message.into()}))
}

fn path_of(body: &Map<String, Value>) -> Vec<String> {
    match (body.get("path"), body.get("name")) {
        (Some(path), _) => serde_json::from_value(path.clone()).unwrap_or_default(),
        (None, Some(Value::String(name))) => vec![name.clone()],
        _ => Vec::new(),
    }
}

/// The body fields the fake stores verbatim.
fn stored_fields(body: &Map<String, Value>) -> Map<String, Value> {
    let mut stored = body.clone();
    for key in ["entityType", "id", "path", "name", "tag", "children"] {
        stored.remove(key);
    }
    stored
}

impl State {
    fn handle(&mut self, request: &ApiRequest) -> ApiResponse {
        let segments: Vec<&str> = request.segments.iter().map(String::as_str).collect();
        if segments != ["apiv2", "login"] && !authorized(request.authorization.as_deref()) {
            return error(401, "not authenticated");
        }
        let body = request.body.as_ref().and_then(Value::as_object);

        match (request.method, segments.as_slice()) {
            (Method::Post, ["apiv2", "login"]) => login(body),
            (Method::Get, ["api", "v3", "catalog"]) => {
                let data: Vec<Value> = self
                    .entities
                    .values()
                    .filter(|e| e.path.len() == 1)
                    .map(Entity::as_child)
                    .collect();
                ok(json!({ "data": data }))
            }
            (Method::Get, ["api", "v3", "catalog", "by-path", path @ ..]) => {
                match self.find_by_path(path) {
                    Some(id) => ok(self.render(&id)),
                    None => error(404, format!("path {} not found", path.join("/"))),
                }
            }
            (Method::Post, ["api", "v3", "catalog"]) => self.create(body),
            (Method::Get, ["api", "v3", "catalog", id]) => {
                if self.entities.contains_key(*id) {
                    ok(self.render(id))
                } else {
                    error(404, format!("id {id} not found"))
                }
            }
            (Method::Put, ["api", "v3", "catalog", id]) => self.update(id, body),
            (Method::Delete, ["api", "v3", "catalog", id]) => {
                self.delete(id, request.query_param("tag"))
            }
            (Method::Post, ["api", "v3", "catalog", id, "refresh"]) => {
                if self.entities.contains_key(*id) {
                    no_content()
                } else {
                    error(404, format!("id {id} not found"))
                }
            }
            (method, ["api", "v3", "catalog", id, "collaboration", resource]) => {
                self.collaboration(method, id, resource, body)
            }
            (Method::Post, ["api", "v3", "sql"]) => self.submit(body),
            (Method::Get, ["api", "v3", "job", id]) => self.poll(id),
            (Method::Get, ["api", "v3", "job", id, "results"]) => self.results(
                id,
                request.query_param("offset"),
                request.query_param("limit"),
            ),
            (Method::Post, ["api", "v3", "job", id, "cancel"]) => match self.jobs.get_mut(*id) {
                Some(job) => {
                    job.cancelled = true;
                    no_content()
                }
                None => error(404, format!("job {id} not found")),
            },
            (Method::Post, ["api", "v3", "user"]) => self.create_user(body),
            (Method::Get, ["api", "v3", "user", "by-name", name]) => self
                .users
                .values()
                .find(|u| u["name"] == json!(name))
                .cloned()
                .map(ok)
                .unwrap_or_else(|| error(404, format!("user {name} not found"))),
            (Method::Get, ["api", "v3", "user", id]) => self
                .users
                .get(*id)
                .cloned()
                .map(ok)
                .unwrap_or_else(|| error(404, format!("user {id} not found"))),
            (Method::Put, ["api", "v3", "user", id]) => self.update_user(id, body),
            (Method::Delete, ["api", "v3", "user", id]) => {
                self.delete_user(id, request.query_param("version"))
            }
            (method, _) => error(400, format!("unsupported request {method} {}", request.path())),
        }
    }

    fn find_by_path<S: AsRef<str>>(&self, path: &[S]) -> Option<String> {
        self.entities
            .values()
            .find(|e| {
                e.path.len() == path.len()
                    && e.path.iter().zip(path).all(|(a, b)| a == b.as_ref())
            })
            .map(|e| e.id.clone())
    }

    fn insert(&mut self, entity_type: &str, path: Vec<String>, body: Map<String, Value>) -> String {
        self.next_id += 1;
        let id = format!("{:08}-0000-4000-8000-000000000000", self.next_id);
        self.entities.insert(
            id.clone(),
            Entity {
                id: id.clone(),
                entity_type: entity_type.to_string(),
                path,
                version: 1,
                body,
            },
        );
        id
    }

    fn render(&self, id: &str) -> Value {
        let Some(entity) = self.entities.get(id) else {
            return Value::Null;
        };
        let mut out = entity.body.clone();
        out.insert("entityType".into(), json!(entity.entity_type));
        out.insert("id".into(), json!(entity.id));
        out.insert("tag".into(), json!(entity.tag()));
        if entity.path.len() == 1 && !entity.is_dataset() {
            out.insert("name".into(), json!(entity.path[0]));
        } else {
            out.insert("path".into(), json!(entity.path));
        }
        if !entity.is_dataset() {
            let children: Vec<Value> = self
                .entities
                .values()
                .filter(|e| e.path.len() == entity.path.len() + 1 && e.path.starts_with(&entity.path))
                .map(Entity::as_child)
                .collect();
            out.insert("children".into(), Value::Array(children));
        }
        Value::Object(out)
    }

    fn create(&mut self, body: Option<&Map<String, Value>>) -> ApiResponse {
        let Some(body) = body else {
            return error(400, "missing body");
        };
        let entity_type = body
            .get("entityType")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let path = path_of(body);
        if path.is_empty() {
            return error(400, "path is required");
        }
        if self.find_by_path(&path).is_some() {
            return error(409, format!("{} already exists", path.join(".")));
        }
        if path.len() > 1 && self.find_by_path(&path[..path.len() - 1]).is_none() {
            return error(404, "parent container not found");
        }
        let id = self.insert(&entity_type, path, stored_fields(body));
        ok(self.render(&id))
    }

    fn update(&mut self, id: &str, body: Option<&Map<String, Value>>) -> ApiResponse {
        let Some(current) = self.entities.get(id).cloned() else {
            return error(404, format!("id {id} not found"));
        };
        let Some(body) = body else {
            return error(400, "missing body");
        };
        if body.get("tag").and_then(Value::as_str) != Some(current.tag().as_str()) {
            return error(409, "tag mismatch");
        }
        let path = path_of(body);
        if path.is_empty() {
            return error(400, "path is required");
        }
        if path != current.path {
            if self.find_by_path(&path).is_some() {
                return error(409, format!("{} already exists", path.join(".")));
            }
            for entity in self.entities.values_mut() {
                if entity.path.len() > current.path.len() && entity.path.starts_with(&current.path) {
                    let rest = entity.path.split_off(current.path.len());
                    entity.path = path.iter().cloned().chain(rest).collect();
                }
            }
        }
        if let Some(entity) = self.entities.get_mut(id) {
            entity.path = path;
            entity.body = stored_fields(body);
            entity.version += 1;
        }
        ok(self.render(id))
    }

    fn delete(&mut self, id: &str, tag: Option<&str>) -> ApiResponse {
        let Some(entity) = self.entities.get(id).cloned() else {
            return error(404, format!("id {id} not found"));
        };
        if self.failing_deletes.contains(&entity.path) {
            return error(500, "injected failure");
        }
        if tag.is_some_and(|tag| tag != entity.tag()) {
            return error(409, "tag mismatch");
        }
        self.entities
            .retain(|_, e| !e.path.starts_with(&entity.path));
        self.metadata.retain(|(owner, _), _| owner != id);
        no_content()
    }

    fn collaboration(
        &mut self,
        method: Method,
        id: &str,
        resource: &str,
        body: Option<&Map<String, Value>>,
    ) -> ApiResponse {
        if !self.entities.contains_key(id) {
            return error(404, format!("id {id} not found"));
        }
        let version_value = |version: u64| {
            if resource == "wiki" {
                json!(version)
            } else {
                json!(version.to_string())
            }
        };
        let key = (id.to_string(), resource.to_string());
        match method {
            Method::Get => match self.metadata.get(&key) {
                Some((stored, version)) => {
                    let mut out = stored.clone();
                    out["version"] = version_value(*version);
                    ok(out)
                }
                None => error(404, format!("no {resource} for {id}")),
            },
            Method::Post => {
                let Some(body) = body else {
                    return error(400, "missing body");
                };
                let sent = body.get("version").cloned().unwrap_or(Value::Null);
                let next = match self.metadata.get(&key) {
                    Some((_, version)) if sent != version_value(*version) => {
                        return error(409, "version mismatch")
                    }
                    Some((_, version)) => version + 1,
                    None => 0,
                };
                let mut stored = Value::Object(body.clone());
                if let Some(map) = stored.as_object_mut() {
                    map.remove("version");
                }
                self.metadata.insert(key, (stored.clone(), next));
                stored["version"] = version_value(next);
                ok(stored)
            }
            _ => error(405, "method not allowed"),
        }
    }

    fn submit(&mut self, body: Option<&Map<String, Value>>) -> ApiResponse {
        let Some(body) = body else {
            return error(400, "missing body");
        };
        let sql = body.get("sql").and_then(Value::as_str).unwrap_or_default();
        let script = self
            .scripts
            .iter()
            .rev()
            .find(|(prefix, _)| sql.trim_start().starts_with(prefix.as_str()))
            .map(|(_, script)| script.clone())
            .unwrap_or_else(|| JobScript::states(&["COMPLETED"]));
        self.submitted.push(Value::Object(body.clone()));
        self.next_job += 1;
        let id = format!("job-{}", self.next_job);
        self.jobs.insert(
            id.clone(),
            RunningJob {
                script,
                polls: 0,
                cancelled: false,
            },
        );
        ok(json!({ "id": id }))
    }

    fn poll(&mut self, id: &str) -> ApiResponse {
        let Some(job) = self.jobs.get_mut(id) else {
            return error(404, format!("job {id} not found"));
        };
        let state = if job.cancelled {
            "CANCELED".to_string()
        } else {
            let index = job.polls.min(job.script.states.len().saturating_sub(1));
            job.script
                .states
                .get(index)
                .cloned()
                .unwrap_or_else(|| "COMPLETED".to_string())
        };
        job.polls += 1;
        let mut out = json!({ "jobState": state, "queryType": "REST" });
        match state.as_str() {
            "COMPLETED" => out["rowCount"] = json!(job.script.rows.len()),
            "FAILED" => out["errorMessage"] = json!(job.script.error_message),
            "CANCELED" => out["cancellationReason"] = json!("Query cancelled by user"),
            _ => {}
        }
        ok(out)
    }

    fn results(&mut self, id: &str, offset: Option<&str>, limit: Option<&str>) -> ApiResponse {
        let offset: usize = offset.and_then(|o| o.parse().ok()).unwrap_or(0);
        let limit: usize = limit.and_then(|l| l.parse().ok()).unwrap_or(100);
        self.result_windows.push((offset, limit));
        let Some(job) = self.jobs.get(id) else {
            return error(404, format!("job {id} not found"));
        };
        let rows = &job.script.rows;
        let page: Vec<Value> = rows.iter().skip(offset).take(limit).cloned().collect();
        ok(json!({
            "rowCount": rows.len(),
            "schema": job.script.schema,
            "rows": page,
        }))
    }

    fn create_user(&mut self, body: Option<&Map<String, Value>>) -> ApiResponse {
        let Some(body) = body else {
            return error(400, "missing body");
        };
        let name = body.get("name").cloned().unwrap_or(Value::Null);
        if self.users.values().any(|u| u["name"] == name) {
            return error(409, "user name is taken");
        }
        self.next_id += 1;
        let id = format!("user-{}", self.next_id);
        let mut user = body.clone();
        user.remove("password");
        user.insert("id".into(), json!(id));
        user.insert("tag".into(), json!("1"));
        user.insert("active".into(), json!(true));
        self.users.insert(id, Value::Object(user.clone()));
        ok(Value::Object(user))
    }

    fn update_user(&mut self, id: &str, body: Option<&Map<String, Value>>) -> ApiResponse {
        let (Some(current), Some(body)) = (self.users.get(id).cloned(), body) else {
            return error(404, format!("user {id} not found"));
        };
        if body.get("tag") != current.get("tag") {
            return error(409, "tag mismatch");
        }
        let next: u64 = current["tag"]
            .as_str()
            .and_then(|t| t.parse().ok())
            .unwrap_or(0)
            + 1;
        let mut user = body.clone();
        user.insert("tag".into(), json!(next.to_string()));
        self.users.insert(id.to_string(), Value::Object(user.clone()));
        ok(Value::Object(user))
    }

    fn delete_user(&mut self, id: &str, version: Option<&str>) -> ApiResponse {
        let Some(current) = self.users.get(id) else {
            return error(404, format!("user {id} not found"));
        };
        if current["tag"].as_str() != version {
            return error(409, "version mismatch");
        }
        self.users.remove(id);
        no_content()
    }
}

fn authorized(authorization: Option<&str>) -> bool {
    match authorization {
        Some(header) => {
            header == format!("_dremio{SESSION_TOKEN}") || header.starts_with("Bearer ")
        }
        None => false,
    }
}

fn login(body: Option<&Map<String, Value>>) -> ApiResponse {
    let field = |key: &str| body.and_then(|b| b.get(key)).and_then(Value::as_str);
    if field("userName") == Some(USERNAME) && field("password") == Some(PASSWORD) {
        ok(json!({ "token": SESSION_TOKEN, "userName": USERNAME }))
    } else {
        error(401, "Invalid username or password")
    }
}

/// The fake service. Share it through an `Arc` to inspect it after calls.
#[derive(Debug, Default)]
pub struct FakeDremio {
    state: Mutex<State>,
}

impl Transport for FakeDremio {
    fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let mut state = self.state.lock().unwrap();
        state.requests.push((request.method, request.path()));
        Ok(state.handle(&request))
    }
}

impl FakeDremio {
    pub fn new() -> Arc<Self> {
        let fake = Self::default();
        fake.script_job(
            "SELECT 1",
            JobScript::rows(&[("EXPR$0", "INTEGER")], vec![json!({"EXPR$0": 1})]),
        );
        Arc::new(fake)
    }

    pub fn config() -> ClientConfig {
        Self::config_with_page_size(500)
    }

    pub fn config_with_page_size(page_size: u32) -> ClientConfig {
        ClientConfig::builder("http://localhost:9047", Credentials::password(USERNAME, PASSWORD))
            .with_poll_policy(PollPolicy::fixed(Duration::from_millis(1)))
            .with_page_size(page_size)
            .build()
            .unwrap()
    }

    /// Logs in with the fake's credentials.
    pub fn connect(self: &Arc<Self>) -> Dremio {
        Dremio::connect_with(Self::config(), self.clone()).unwrap()
    }

    pub fn connect_with_page_size(self: &Arc<Self>, page_size: u32) -> Dremio {
        Dremio::connect_with(Self::config_with_page_size(page_size), self.clone()).unwrap()
    }

    /// Jobs whose SQL starts with `prefix` follow `script`. Later scripts win.
    pub fn script_job(&self, prefix: &str, script: JobScript) {
        let mut state = self.state.lock().unwrap();
        state.scripts.push((prefix.to_string(), script));
    }

    pub fn seed_space(&self, name: &str) -> String {
        self.seed("space", &[name], Map::new())
    }

    pub fn seed_folder(&self, path: &[&str]) -> String {
        self.seed("folder", path, Map::new())
    }

    pub fn seed_virtual_dataset(&self, path: &[&str], sql: &str) -> String {
        let body = json!({"type": "VIRTUAL_DATASET", "sql": sql});
        self.seed("dataset", path, body.as_object().cloned().unwrap_or_default())
    }

    pub fn seed_physical_dataset(&self, path: &[&str], fields: &[(&str, &str)]) -> String {
        let fields: Vec<Value> = fields
            .iter()
            .map(|(name, type_name)| json!({"name": name, "type": {"name": type_name}}))
            .collect();
        let body = json!({"type": "PHYSICAL_DATASET", "fields": fields});
        self.seed("dataset", path, body.as_object().cloned().unwrap_or_default())
    }

    fn seed(&self, entity_type: &str, path: &[&str], body: Map<String, Value>) -> String {
        let mut state = self.state.lock().unwrap();
        state.insert(
            entity_type,
            path.iter().map(|s| s.to_string()).collect(),
            body,
        )
    }

    /// Makes every delete of `path` fail with a server error.
    pub fn fail_delete(&self, path: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state
            .failing_deletes
            .insert(path.iter().map(|s| s.to_string()).collect());
    }

    /// Simulates a concurrent writer by bumping the version tag.
    pub fn touch(&self, path: &[&str]) {
        let mut state = self.state.lock().unwrap();
        if let Some(id) = state.find_by_path(path) {
            if let Some(entity) = state.entities.get_mut(&id) {
                entity.version += 1;
            }
        }
    }

    pub fn exists(&self, path: &[&str]) -> bool {
        self.state.lock().unwrap().find_by_path(path).is_some()
    }

    /// Stored body of the object at `path`.
    pub fn object(&self, path: &[&str]) -> Option<Value> {
        let state = self.state.lock().unwrap();
        state.find_by_path(path).map(|id| state.render(&id))
    }

    pub fn submitted_sql(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .submitted
            .iter()
            .filter_map(|body| body["sql"].as_str().map(str::to_string))
            .collect()
    }

    pub fn submitted(&self) -> Vec<Value> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn requests(&self) -> Vec<(Method, String)> {
        self.state.lock().unwrap().requests.clone()
    }

    /// `(offset, limit)` of every results request, in order.
    pub fn result_windows(&self) -> Vec<(usize, usize)> {
        self.state.lock().unwrap().result_windows.clone()
    }

    /// Number of requests with `method` whose path starts with `prefix`.
    pub fn count(&self, method: Method, prefix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|(m, path)| *m == method && path.starts_with(prefix))
            .count()
    }
}
