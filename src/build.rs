use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::transport::{ApiError, ApiRequest, ApiResult, ReqwestTransport, SharedTransport, Transport};

/// Base URL of the preprod deployment of the transaction service.
pub const PREPROD_URL: &str = "https://preprod.api.ada-anvil.app/v2/services";

/// Body of a `transactions/build` call. Serializes to the exact wire document
/// the service expects:
///
/// ```json
/// {"changeAddress": "...", "outputs": [{"address": "...", "lovelace": 10000000}]}
/// ```
///
/// Field declaration order is serialization order, so identical requests
/// always produce identical bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxBuildRequest {
    pub change_address: String,
    pub outputs: Vec<Output>,
}

/// One payment: `lovelace` is the amount in the smallest currency unit, and
/// the unsigned type is what keeps it non-negative. Address validation is the
/// service's job, not ours.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub address: String,
    pub lovelace: u64,
}

impl TxBuildRequest {
    pub fn new(change_address: impl Into<String>) -> Self {
        Self {
            change_address: change_address.into(),
            outputs: Vec::new(),
        }
    }

    pub fn with_output(mut self, address: impl Into<String>, lovelace: u64) -> Self {
        self.outputs.push(Output {
            address: address.into(),
            lovelace,
        });
        self
    }
}

/// Client for the transaction REST service. Holds the API key and base URL
/// and issues each call through a pluggable [`Transport`].
#[derive(Clone)]
pub struct AnvilClient {
    transport: SharedTransport,
    base_url: String,
    api_key: String,
}

impl AnvilClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_transport(api_key, ReqwestTransport::new())
    }

    pub fn with_transport<T>(api_key: impl Into<String>, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        Self {
            transport: std::sync::Arc::new(transport),
            base_url: PREPROD_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds a transaction: one POST of the serialized request, then the
    /// response body parsed as JSON into `T`.
    ///
    /// The HTTP status is deliberately not inspected. A non-2xx reply whose
    /// body is valid JSON (the service reports failures as
    /// `{"error": "..."}`) comes back as that parsed value; only a body that
    /// is not JSON at all turns into a `Parse` error.
    pub async fn build_transaction<T>(&self, request: &TxBuildRequest) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let body = sonic_rs::to_vec(request).map_err(ApiError::from_json)?;
        let request = ApiRequest::post(format!("{}/transactions/build", self.base_url))
            .with_header("Content-Type", Bytes::from_static(b"application/json"))
            .with_header("x-api-key", self.api_key.clone())
            .with_body(body);

        self.transport.execute(request).await?.json::<T>()
    }

    /// Service liveness probe: GET `/health`, raw body returned as text.
    pub async fn health(&self) -> ApiResult<String> {
        let request = ApiRequest::get(format!("{}/health", self.base_url))
            .with_header("x-api-key", self.api_key.clone());

        Ok(self.transport.execute(request).await?.text())
    }
}
