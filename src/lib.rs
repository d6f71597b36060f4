//! Client for the ada-anvil transaction build REST service, with an in-memory
//! mock transport for fully deterministic tests.

pub mod build;
pub mod mock;
pub mod transport;

pub use reqwest::Method;

pub use build::{AnvilClient, Output, TxBuildRequest, PREPROD_URL};
pub use mock::{MockBehavior, MockResponse, MockStateSnapshot, MockTransport};
pub use transport::{
    ApiBytes, ApiError, ApiErrorKind, ApiFuture, ApiRequest, ApiResponse, ApiResult,
    ReqwestTransport, Transport,
};
