use std::{future::Future, pin::Pin, sync::Arc, time::Instant};

use bytes::Bytes;
use reqwest::header::HeaderValue;
use reqwest::{Client as ReqwestClient, Method};
use serde::de::DeserializeOwned;
use thiserror::Error;

pub type ApiBytes = Bytes;
pub type ApiFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiErrorKind {
    Connect,
    Send,
    Receive,
    Parse,
    Internal,
}

/// Failure surfaced by a transport or by response parsing. Carries the HTTP
/// status only when the underlying error had one; the client itself never
/// inspects statuses.
#[derive(Clone, Debug, Error)]
#[error("anvil api error {kind:?} status={status:?} {message}")]
pub struct ApiError {
    kind: ApiErrorKind,
    status: Option<u16>,
    message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }

    pub(crate) fn from_reqwest(kind: ApiErrorKind, err: reqwest::Error) -> Self {
        let kind = if err.is_connect() {
            ApiErrorKind::Connect
        } else {
            kind
        };
        Self {
            kind,
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }

    pub fn from_json(err: sonic_rs::Error) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            status: None,
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, ApiBytes)>,
    pub body: Option<ApiBytes>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<ApiBytes>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<ApiBytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, ApiBytes)>,
    pub body: ApiBytes,
    pub elapsed: std::time::Duration,
}

impl ApiResponse {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        sonic_rs::from_slice(&self.body).map_err(ApiError::from_json)
    }
}

pub trait Transport: Send + Sync {
    fn execute(&self, request: ApiRequest) -> ApiFuture<ApiResult<ApiResponse>>;
}

pub type SharedTransport = Arc<dyn Transport + Send + Sync>;

#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: ReqwestClient::new(),
        }
    }

    pub fn with_client(client: ReqwestClient) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: ApiRequest) -> ApiFuture<ApiResult<ApiResponse>> {
        let client = self.client.clone();
        Box::pin(async move {
            let start = Instant::now();
            let mut req = client.request(request.method.clone(), &request.url);

            for (key, value) in request.headers {
                let value = HeaderValue::from_bytes(value.as_ref()).map_err(|err| {
                    ApiError::new(ApiErrorKind::Internal, None, err.to_string())
                })?;
                req = req.header(key, value);
            }

            if let Some(body) = request.body {
                req = req.body(body);
            }

            let resp = req
                .send()
                .await
                .map_err(|err| ApiError::from_reqwest(ApiErrorKind::Send, err))?;

            let status = resp.status().as_u16();
            let headers = resp
                .headers()
                .iter()
                .map(|(name, value)| (name.to_string(), Bytes::copy_from_slice(value.as_ref())))
                .collect();
            let body = resp
                .bytes()
                .await
                .map_err(|err| ApiError::from_reqwest(ApiErrorKind::Receive, err))?;
            let elapsed = start.elapsed();

            Ok(ApiResponse {
                status,
                headers,
                body,
                elapsed,
            })
        })
    }
}
