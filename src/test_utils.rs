// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses.

use http::{Request, Response};
use http_body_util::BodyExt;
use kube::client::Body;
use kube::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

type Routes = HashMap<(String, String), (u16, Vec<u8>)>;

/// A mock HTTP service that returns predefined responses based on request paths
/// and records every request it receives.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<Routes>>,
    requests: Arc<Mutex<Vec<String>>>,
    queries: Arc<Mutex<Vec<(String, String)>>>,
    bodies: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            queries: Arc::new(Mutex::new(Vec::new())),
            bodies: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn on(self, method: &str, path: &str, status: u16, body: &[u8]) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_vec()));
        self
    }

    /// Add a response for GET requests matching the path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body.as_bytes())
    }

    /// Add a raw, possibly non UTF-8, response for GET requests
    pub fn on_get_bytes(self, path: &str, status: u16, body: &[u8]) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for POST requests matching the path
    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body.as_bytes())
    }

    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, status, body.as_bytes())
    }

    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body.as_bytes())
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    /// Requests received so far, formatted as "METHOD /path"
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Decoded query parameters of each request made to `path`, in order
    pub fn query_params(&self, path: &str) -> Vec<HashMap<String, String>> {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, query)| url::form_urlencoded::parse(query.as_bytes()).into_owned().collect())
            .collect()
    }

    /// Body of the most recent request with the given method
    pub fn last_body(&self, method: &str) -> Option<String> {
        self.bodies
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(m, _)| m == method)
            .map(|(_, body)| body.clone())
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, Vec<u8>)> {
        // Exact matches only: discovery paths are prefixes of resource paths
        self.responses
            .lock()
            .unwrap()
            .get(&(method.to_string(), path.to_string()))
            .cloned()
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        self.requests
            .lock()
            .unwrap()
            .push(format!("{} {}", method, path));
        self.queries
            .lock()
            .unwrap()
            .push((path.clone(), req.uri().query().unwrap_or_default().to_string()));
        let response = self.find_response(&method, &path);
        let bodies = self.bodies.clone();

        Box::pin(async move {
            let bytes = req.into_body().collect().await?.to_bytes();
            bodies
                .lock()
                .unwrap()
                .push((method, String::from_utf8_lossy(&bytes).into_owned()));

            let (status, body) = response.unwrap_or_else(|| {
                (404, status_json(404, "NotFound", "not found").into_bytes())
            });
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap())
        })
    }
}

/// Create a Status response body
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// Create a discovery response listing the given namespaced kinds
pub fn api_resource_list_json(group_version: &str, kinds: &[&str]) -> String {
    scoped_api_resource_list_json(group_version, kinds, true)
}

/// Create a discovery response listing the given kinds with an explicit scope
pub fn scoped_api_resource_list_json(group_version: &str, kinds: &[&str], namespaced: bool) -> String {
    let resources: Vec<serde_json::Value> = kinds
        .iter()
        .map(|kind| {
            let singular = kind.to_lowercase();
            serde_json::json!({
                "name": format!("{}s", singular),
                "singularName": singular,
                "namespaced": namespaced,
                "kind": kind,
                "verbs": ["create", "delete", "get", "list", "update"]
            })
        })
        .collect();

    serde_json::json!({
        "kind": "APIResourceList",
        "apiVersion": "v1",
        "groupVersion": group_version,
        "resources": resources
    })
    .to_string()
}

/// Create a list response wrapping the given items
pub fn list_json(api_version: &str, kind: &str, items: Vec<serde_json::Value>) -> String {
    serde_json::json!({
        "apiVersion": api_version,
        "kind": format!("{}List", kind),
        "metadata": { "resourceVersion": "1" },
        "items": items
    })
    .to_string()
}
