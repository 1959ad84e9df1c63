// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! In-memory platform used by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use geti_client::{
    Error, HttpRequest, HttpResponse, HttpTransport, Method, RequestBody, ResponseCookie,
    ServerConfig, Session, StatusCode,
};
use serde_json::{Value, json};

pub const HOST: &str = "https://geti.example.com";
pub const DATASET_URL: &str = "workspaces/w1/projects/p1/datasets/d1";

type Handler = Box<dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync>;

struct Route {
    method: Method,
    suffix: String,
    handler: Handler,
}

/// Answers requests by the longest matching path suffix and records every
/// request. Among routes with the same suffix the last one registered wins.
/// Unrouted requests get a 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(MockTransport::default())
    }

    pub fn on<F>(&self, method: Method, suffix: &str, handler: F)
    where
        F: Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    {
        self.routes.lock().unwrap().push(Route {
            method,
            suffix: suffix.to_string(),
            handler: Box::new(handler),
        });
    }

    pub fn on_json(&self, method: Method, suffix: &str, status: StatusCode, body: Value) {
        self.on(method, suffix, move |_| {
            HttpResponse::new(status).with_json(&body)
        });
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of recorded requests with `method` whose path ends with
    /// `suffix`.
    pub fn count(&self, method: Method, suffix: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && path(&r.url).ends_with(suffix))
            .count()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn respond(&self, request: &HttpRequest) -> HttpResponse {
        let routes = self.routes.lock().unwrap();
        routes
            .iter()
            .filter(|route| route.method == request.method && path(&request.url).ends_with(&route.suffix))
            .max_by_key(|route| route.suffix.len())
            .map(|route| (route.handler)(request))
            .unwrap_or_else(|| HttpResponse::new(StatusCode::NOT_FOUND))
    }
}

impl HttpTransport for MockTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, Error>> {
        let response = self.respond(&request);
        self.requests.lock().unwrap().push(request);
        Box::pin(futures::future::ready(Ok(response)))
    }
}

/// Path of an absolute URL without query string.
pub fn path(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// JSON body of a recorded request.
pub fn json_body(request: &HttpRequest) -> Value {
    match &request.body {
        Some(RequestBody::Json(value)) => value.clone(),
        other => panic!("expected a JSON body, got {:?}", other),
    }
}

pub fn config() -> ServerConfig {
    ServerConfig::new(HOST, "annotator", "secret")
}

/// Routes for login (three cookies), product information, sign-out and the
/// workspace listing.
pub fn mock_platform() -> Arc<MockTransport> {
    let transport = MockTransport::new();

    transport.on(Method::POST, "/dex/auth/regular/login", |request| {
        match &request.body {
            Some(RequestBody::Form(fields))
                if fields.contains(&("login".to_string(), "annotator".to_string()))
                    && fields.contains(&("password".to_string(), "secret".to_string())) =>
            {
                HttpResponse::new(StatusCode::SEE_OTHER)
                    .with_cookie(ResponseCookie::new("geti-cookie", "session-token"))
                    .with_cookie(ResponseCookie::new("oauth2_proxy", "proxy-token"))
                    .with_cookie(ResponseCookie::new("_csrf", "csrf-token"))
            }
            _ => HttpResponse::new(StatusCode::UNAUTHORIZED),
        }
    });

    transport.on_json(
        Method::GET,
        "/api/v1/product_info",
        StatusCode::OK,
        json!({"product-version": "1.2.0-release-20220620", "build-version": "1.2.0"}),
    );

    transport.on(Method::GET, "/oauth2/sign_out", |_| {
        HttpResponse::new(StatusCode::FOUND).with_cookie(ResponseCookie::removed("oauth2_proxy"))
    });

    transport.on_json(
        Method::GET,
        "/api/v1/workspaces",
        StatusCode::OK,
        json!({"items": [{"id": "w1", "name": "Default workspace"}]}),
    );

    transport
}

pub async fn connect(transport: &Arc<MockTransport>) -> Session {
    Session::connect(config(), transport.clone())
        .await
        .expect("login against the mock platform")
}

pub fn project() -> geti_client::Project {
    serde_json::from_value(json!({
        "id": "p1",
        "name": "Pets",
        "datasets": [{"id": "d1", "name": "Dataset"}],
        "pipeline": {
            "tasks": [
                {"id": "t0", "title": "Dataset", "task_type": "dataset"},
                {
                    "id": "t1",
                    "title": "Detection",
                    "task_type": "detection",
                    "labels": [
                        {"id": "l-dog", "name": "dog", "color": "#ff0000ff", "group": "default"},
                        {"id": "l-cat", "name": "cat", "color": "#00ff00ff", "group": "default"}
                    ]
                }
            ]
        }
    }))
    .expect("valid project")
}

/// A local annotation file body with one rectangle per label name.
pub fn annotation_file(labels: &[&str]) -> String {
    let annotations: Vec<Value> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            json!({
                "labels": [{"name": label, "probability": 1.0}],
                "shape": {"type": "RECTANGLE", "x": i as f64 * 10.0, "y": 5.5, "width": 20, "height": 30}
            })
        })
        .collect();
    json!({ "annotations": annotations }).to_string()
}

/// Echoes the posted scene back with a server id, like the platform does.
pub fn echo_scene(request: &HttpRequest) -> HttpResponse {
    let mut scene = json_body(request);
    scene["id"] = json!("server-scene");
    HttpResponse::new(StatusCode::OK).with_json(&scene)
}
