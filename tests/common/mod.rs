// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;
use tripmate::config::Config;
use tripmate::db::MemoryDb;
use tripmate::routes::create_router;
use tripmate::services::completion::{CompletionError, CompletionRequest};
use tripmate::services::{
    AuthService, CompletionClient, GroupService, IdentityProvider, MemoryIdentity,
    SummaryService,
};
use tripmate::AppState;

/// Completion client that answers with a canned reply and records prompts.
#[allow(dead_code)]
pub struct FakeCompletion {
    pub reply: Result<String, u16>,
    pub prompts: std::sync::Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl FakeCompletion {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            prompts: Default::default(),
        })
    }

    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(status),
            prompts: Default::default(),
        })
    }
}

#[async_trait]
impl CompletionClient for FakeCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(CompletionError::Api {
                status: *status,
                message: "upstream failure".to_string(),
            }),
        }
    }
}

/// Test app pieces: the router plus handles on the in-memory backends.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub db: Arc<MemoryDb>,
}

/// Create a test app with in-memory identity and store, and no AI client.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    build_app(Arc::new(MemoryIdentity::new()), None)
}

/// Create a test app on a custom identity provider.
#[allow(dead_code)]
pub fn create_test_app_with_identity(identity: Arc<dyn IdentityProvider>) -> TestApp {
    build_app(identity, None)
}

/// Create a test app whose summaries come from `client`.
#[allow(dead_code)]
pub fn create_test_app_with_completion(client: Arc<dyn CompletionClient>) -> TestApp {
    build_app(Arc::new(MemoryIdentity::new()), Some(client))
}

fn build_app(
    identity: Arc<dyn IdentityProvider>,
    completion: Option<Arc<dyn CompletionClient>>,
) -> TestApp {
    let config = Config::test_default();
    let db = Arc::new(MemoryDb::new());
    let group_service = GroupService::new(db.clone());

    let state = Arc::new(AppState {
        auth_service: AuthService::new(identity, &config.app_base_url),
        summary_service: SummaryService::new(group_service.clone(), completion),
        group_service,
        config,
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        db,
    }
}

/// POST a urlencoded form.
#[allow(dead_code)]
pub async fn post_form(app: &Router, uri: &str, body: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Send a request with an optional bearer token.
#[allow(dead_code)]
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    json: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match json {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

/// GET without credentials.
#[allow(dead_code)]
pub async fn get(app: &Router, uri: &str) -> Response {
    send(app, "GET", uri, None, None).await
}

/// POST with no body and no credentials.
#[allow(dead_code)]
pub async fn post(app: &Router, uri: &str) -> Response {
    send(app, "POST", uri, None, None).await
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Read a response body as text.
#[allow(dead_code)]
pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Sign up, verify and log in; returns the access token.
#[allow(dead_code)]
pub async fn signed_in_user(app: &Router, email: &str) -> String {
    let creds = format!("email={email}&password=hunter22");

    let response = post_form(app, "/auth/signup", &creds).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(app, &format!("/auth/verify?email={email}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_form(app, "/auth/login", &creds).await;
    assert_eq!(response.status(), StatusCode::OK);

    access_token_from(&response)
}

/// Extract the access token from a login response's Set-Cookie headers.
#[allow(dead_code)]
pub fn access_token_from(response: &Response) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| v.strip_prefix("sb-access-token="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
        .unwrap_or_else(|| panic!("missing access token cookie"))
}
