//! `fetch-http` is a small async HTTP client with functional options.
//!
//! A [`Fetch`] handle is bound to a base URL and configured once with
//! client options:
//! - [`with_retry`] — extra attempts for transport failures and non-2xx responses
//! - [`with_timeout`] — per-attempt timeout
//! - [`with_default_request_opts`] — decorators applied to every request
//!
//! Each call can add request options such as [`with_header`],
//! [`with_basic_auth`] and [`with_json_body`].
//!
//! ```no_run
//! use fetch_http::{encode_data, with_json_body, with_retry, Fetch};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct User {
//!     name: String,
//! }
//!
//! # async fn run() -> fetch_http::Result<()> {
//! let api = Fetch::new("https://api.example.com", [with_retry(2)]);
//! let body = encode_data(&User { name: "Kit".to_owned() })?;
//! let created: User = api
//!     .post("/users", body, &[with_json_body()])
//!     .await?
//!     .decode_json()
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod context;
mod encode;
mod error;
mod options;
mod response;

pub use client::Fetch;
pub use context::{CancelGuard, Context, ContextError};
pub use encode::{decode_json, encode_data};
pub use error::FetchError;
pub use options::{
    with_basic_auth, with_default_request_opts, with_header, with_http_client, with_json_body,
    with_retry, with_timeout, ClientConfig, ClientOption, RequestOption,
};
pub use reqwest::{Method, StatusCode};
pub use response::FetchResponse;

pub type Result<T> = std::result::Result<T, FetchError>;
