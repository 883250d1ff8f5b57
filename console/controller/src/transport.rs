use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use std::fmt;
use tracing::debug;

use crate::config::ConsoleConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// A request against the backend, addressed by raw path segments.
///
/// Segments are percent-encoded by the transport, so a function name is
/// always a single segment no matter what characters it contains. A
/// trailing empty segment produces a trailing slash.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn get<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method: Method::Get,
            segments: segments.into_iter().map(Into::into).collect(),
            body: None,
        }
    }

    pub fn post<I, S>(segments: I, body: serde_json::Value) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method: Method::Post,
            segments: segments.into_iter().map(Into::into).collect(),
            body: Some(body),
        }
    }

    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Status and raw body of a completed round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub status: u16,
    pub body: String,
}

impl BackendResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

/// Moves requests to the backend. An `Err` means no response was obtained.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<BackendResponse>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(config: &ConsoleConfig) -> Result<Self> {
        let base_url = Url::parse(&config.api_url)
            .with_context(|| format!("invalid API url '{}'", config.api_url))?;
        if base_url.cannot_be_a_base() {
            bail!("API url '{}' cannot be used as a base", config.api_url);
        }

        let client = reqwest::Client::builder()
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, request: &ApiRequest) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("API url cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(&request.segments);
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<BackendResponse> {
        let url = self.url_for(&request)?;
        debug!("{} {}", request.method, url);

        let builder = match request.method {
            Method::Get => self.client.get(url.clone()),
            Method::Post => self.client.post(url.clone()),
        };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .with_context(|| format!("{} {} failed", request.method, url))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read response body from {}", url))?;

        debug!("{} {} -> {} ({} bytes)", request.method, url, status, body.len());
        Ok(BackendResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};

    async fn spawn_backend() -> String {
        let app = Router::new()
            .route(
                "/functions/runtimes",
                get(|| async {
                    Json(json!({
                        "runtimes": [{ "value": "python3.11", "label": "Python 3.11" }],
                        "default": "python3.11",
                    }))
                }),
            )
            .route(
                "/functions/",
                post(|Json(body): Json<Value>| async move {
                    (
                        StatusCode::CREATED,
                        Json(json!({ "status": "saved", "func_id": body["func_id"] })),
                    )
                }),
            )
            .route(
                "/functions/{func_id}",
                get(|Path(func_id): Path<String>| async move {
                    if func_id == "missing" {
                        (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" })))
                    } else {
                        (StatusCode::OK, Json(json!({ "_id": func_id })))
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn transport_for(url: &str) -> HttpTransport {
        HttpTransport::new(&ConsoleConfig::new(url)).unwrap()
    }

    #[test]
    fn test_url_building() {
        let transport = transport_for("http://localhost:8000/api/");

        let url = transport
            .url_for(&ApiRequest::get(["functions", "runtimes"]))
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/functions/runtimes");

        let url = transport
            .url_for(&ApiRequest::post(["functions", ""], json!({})))
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/functions/");

        let url = transport
            .url_for(&ApiRequest::get(["functions", "a/b c"]))
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/functions/a%2Fb%20c");
    }

    #[test]
    fn test_rejects_invalid_url() {
        assert!(HttpTransport::new(&ConsoleConfig::new("not a url")).is_err());
        assert!(HttpTransport::new(&ConsoleConfig::new("mailto:ops@example.com")).is_err());
    }

    #[tokio::test]
    async fn test_round_trips_against_http_backend() {
        let base = spawn_backend().await;
        let transport = transport_for(&base);

        let response = transport
            .send(ApiRequest::get(["functions", "runtimes"]))
            .await
            .unwrap();
        assert!(response.is_success());
        let catalog: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(catalog["default"], "python3.11");

        let response = transport
            .send(ApiRequest::post(
                ["functions", ""],
                json!({ "func_id": "hello", "runtime": "python3.11", "entrypoint": "main", "code": "" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status, 201);
        assert!(response.body.contains("\"saved\""));

        let response = transport
            .send(ApiRequest::get(["functions", "my fn"]))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert!(response.body.contains("my fn"));

        let response = transport
            .send(ApiRequest::get(["functions", "missing"]))
            .await
            .unwrap();
        assert!(response.is_not_found());
    }

    #[tokio::test]
    async fn test_connection_refused_is_an_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = transport_for(&format!("http://{}", addr));
        let err = transport
            .send(ApiRequest::get(["functions", "runtimes"]))
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("GET"));
    }
}
