use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Instant,
};

use bytes::Bytes;
use reqwest::Method;
use serde::Serialize;
use sonic_rs::to_vec;

use crate::transport::{
    ApiBytes, ApiError, ApiErrorKind, ApiFuture, ApiRequest, ApiResponse, ApiResult, Transport,
};

/// What the mock does with the next request. Failures map onto the same
/// [`ApiErrorKind`]s the real transport produces.
#[derive(Clone, Debug, Default)]
pub enum MockBehavior {
    #[default]
    Pass,
    ConnectError {
        reason: String,
    },
    SendError {
        reason: String,
    },
    ReceiveError {
        reason: String,
    },
}

impl MockBehavior {
    pub fn pass() -> Self {
        Self::Pass
    }

    pub fn connect_error(reason: impl Into<String>) -> Self {
        Self::ConnectError {
            reason: reason.into(),
        }
    }

    pub fn send_error(reason: impl Into<String>) -> Self {
        Self::SendError {
            reason: reason.into(),
        }
    }

    pub fn receive_error(reason: impl Into<String>) -> Self {
        Self::ReceiveError {
            reason: reason.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, ApiBytes)>,
    pub body: ApiBytes,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<ApiBytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<ApiBytes>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, body.into())
    }

    pub fn json<T: Serialize>(status: u16, payload: &T) -> ApiResult<Self> {
        let body = to_vec(payload).map_err(ApiError::from_json)?;
        Ok(Self::new(status, body))
    }
}

#[derive(Clone, Debug)]
pub struct MockStateSnapshot {
    pub request_count: usize,
    pub last_url: Option<String>,
    pub last_status: Option<u16>,
    pub last_error: Option<String>,
    pub response_queue_len: usize,
    pub outbound_count: usize,
}

#[derive(Debug, Default)]
struct MockState {
    request_count: usize,
    last_url: Option<String>,
    last_status: Option<u16>,
    last_error: Option<String>,
    behaviors: VecDeque<MockBehavior>,
    default_response_queue: VecDeque<MockResponse>,
    route_response_queues: HashMap<(Method, String), VecDeque<MockResponse>>,
    outbound_log: Vec<ApiRequest>,
}

impl MockState {
    fn snapshot(&self) -> MockStateSnapshot {
        MockStateSnapshot {
            request_count: self.request_count,
            last_url: self.last_url.clone(),
            last_status: self.last_status,
            last_error: self.last_error.clone(),
            response_queue_len: self.default_response_queue.len()
                + self.route_response_queues.values().map(VecDeque::len).sum::<usize>(),
            outbound_count: self.outbound_log.len(),
        }
    }
}

/// In-memory [`Transport`]: serves queued responses, optionally injects
/// failures, and records every outbound request for assertions. Clones share
/// state, so tests keep a handle to the same adapter they hand to the client.
#[derive(Clone, Debug)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        let mock = Self::new();
        mock.push_behavior(behavior);
        mock
    }

    pub fn push_behavior(&self, behavior: MockBehavior) {
        self.state
            .lock()
            .expect("mock transport mutex poisoned while queueing behavior")
            .behaviors
            .push_back(behavior);
    }

    pub fn queue_response(&self, response: MockResponse) {
        self.state
            .lock()
            .expect("mock transport mutex poisoned while queueing response")
            .default_response_queue
            .push_back(response);
    }

    pub fn queue_response_for(
        &self,
        method: Method,
        url: impl Into<String>,
        response: MockResponse,
    ) {
        let key = (method, url.into());
        self.state
            .lock()
            .expect("mock transport mutex poisoned while queueing response by route")
            .route_response_queues
            .entry(key)
            .or_default()
            .push_back(response);
    }

    pub fn queue_post_response(&self, url: impl Into<String>, response: MockResponse) {
        self.queue_response_for(Method::POST, url, response);
    }

    pub fn queue_get_response(&self, url: impl Into<String>, response: MockResponse) {
        self.queue_response_for(Method::GET, url, response);
    }

    /// Every request the mock has executed, oldest first.
    pub fn outbound(&self) -> Vec<ApiRequest> {
        self.state
            .lock()
            .expect("mock transport mutex poisoned while reading outbound log")
            .outbound_log
            .clone()
    }

    pub fn snapshot(&self) -> MockStateSnapshot {
        self.state
            .lock()
            .expect("mock transport mutex poisoned while taking snapshot")
            .snapshot()
    }

    fn pop_behavior(&self) -> MockBehavior {
        self.state
            .lock()
            .expect("mock transport mutex poisoned while reading behavior queue")
            .behaviors
            .pop_front()
            .unwrap_or_default()
    }

    fn record_request(&self, request: &ApiRequest) {
        let mut state = self
            .state
            .lock()
            .expect("mock transport mutex poisoned while recording request");
        state.request_count += 1;
        state.last_url = Some(request.url.clone());
        state.last_error = None;
        state.outbound_log.push(request.clone());
    }

    fn next_response(&self, request: &ApiRequest) -> Option<MockResponse> {
        let mut state = self
            .state
            .lock()
            .expect("mock transport mutex poisoned while selecting response");
        let route_key = (request.method.clone(), request.url.clone());
        if let Some(queue) = state.route_response_queues.get_mut(&route_key) {
            if let Some(response) = queue.pop_front() {
                return Some(response);
            }
        }
        state.default_response_queue.pop_front()
    }

    fn fail(&self, kind: ApiErrorKind, reason: String) -> ApiError {
        let mut state = self
            .state
            .lock()
            .expect("mock transport mutex poisoned while recording error");
        state.last_error = Some(reason.clone());
        state.last_status = None;
        ApiError::new(kind, None, reason)
    }

    fn record_response(&self, response: &ApiResponse) {
        let mut state = self
            .state
            .lock()
            .expect("mock transport mutex poisoned while recording response");
        state.last_status = Some(response.status);
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: ApiRequest) -> ApiFuture<ApiResult<ApiResponse>> {
        let mock = self.clone();
        Box::pin(async move {
            let start = Instant::now();
            let behavior = mock.pop_behavior();
            mock.record_request(&request);

            match behavior {
                MockBehavior::Pass => {}
                MockBehavior::ConnectError { reason } => {
                    return Err(mock.fail(ApiErrorKind::Connect, reason));
                }
                MockBehavior::SendError { reason } => {
                    return Err(mock.fail(ApiErrorKind::Send, reason));
                }
                MockBehavior::ReceiveError { reason } => {
                    return Err(mock.fail(ApiErrorKind::Receive, reason));
                }
            }

            // Empty queues fall back to an empty 200, same as an endpoint that
            // replied with no body.
            let queued = mock
                .next_response(&request)
                .unwrap_or_else(|| MockResponse::new(200, Bytes::new()));

            let response = ApiResponse {
                status: queued.status,
                headers: queued.headers,
                body: queued.body,
                elapsed: start.elapsed(),
            };
            mock.record_response(&response);
            Ok(response)
        })
    }
}
