use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Request;

use crate::{FetchError, Result};

/// Settings shared by every call made through one [`Fetch`](crate::Fetch) handle.
#[derive(Clone)]
pub struct ClientConfig {
    pub(crate) base_url: String,
    pub(crate) attempts: u32,
    pub(crate) timeout: Duration,
    pub(crate) request_opts: Vec<RequestOption>,
    pub(crate) http: reqwest::Client,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("attempts", &self.attempts)
            .field("timeout", &self.timeout)
            .field("request_opts", &self.request_opts.len())
            .finish()
    }
}

impl ClientConfig {
    pub(crate) fn new(base_url: String) -> Self {
        Self {
            base_url,
            attempts: 1,
            timeout: Duration::ZERO,
            request_opts: Vec::new(),
            http: reqwest::Client::new(),
        }
    }

    pub(crate) fn apply<I>(mut self, opts: I) -> Self
    where
        I: IntoIterator<Item = ClientOption>,
    {
        for opt in opts {
            (opt.0)(&mut self);
        }
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Total number of attempts per call, always at least one.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Per-attempt timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        (!self.timeout.is_zero()).then_some(self.timeout)
    }

    /// Decorators applied to every request before the call-site ones.
    pub fn default_request_opts(&self) -> &[RequestOption] {
        &self.request_opts
    }
}

/// Client-level option, applied once when a client is built.
pub struct ClientOption(Box<dyn FnOnce(&mut ClientConfig) + Send>);

impl ClientOption {
    pub fn new(f: impl FnOnce(&mut ClientConfig) + Send + 'static) -> Self {
        Self(Box::new(f))
    }
}

impl fmt::Debug for ClientOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClientOption")
    }
}

/// Retries a failed call `retries` more times, for `retries + 1` attempts.
pub fn with_retry(retries: u32) -> ClientOption {
    ClientOption::new(move |config| config.attempts = retries.saturating_add(1))
}

/// Bounds each attempt by `timeout`. `Duration::ZERO` turns the bound off.
pub fn with_timeout(timeout: Duration) -> ClientOption {
    ClientOption::new(move |config| config.timeout = timeout)
}

/// Replaces the decorators applied to every request from the client.
pub fn with_default_request_opts<I>(opts: I) -> ClientOption
where
    I: IntoIterator<Item = RequestOption>,
{
    let opts: Vec<RequestOption> = opts.into_iter().collect();
    ClientOption::new(move |config| config.request_opts = opts)
}

/// Sends requests through `client` instead of a default `reqwest::Client`.
pub fn with_http_client(client: reqwest::Client) -> ClientOption {
    ClientOption::new(move |config| config.http = client)
}

type Decorator = dyn Fn(&mut Request) -> Result<()> + Send + Sync;

/// Decorator applied to an outgoing request.
#[derive(Clone)]
pub struct RequestOption(Arc<Decorator>);

impl RequestOption {
    pub fn new(f: impl Fn(&mut Request) -> Result<()> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn apply(&self, request: &mut Request) -> Result<()> {
        (self.0)(request)
    }
}

impl fmt::Debug for RequestOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RequestOption")
    }
}

/// Appends a header. Values for a repeated key accumulate in call order.
pub fn with_header(key: impl Into<String>, value: impl Into<String>) -> RequestOption {
    let key = key.into();
    let value = value.into();
    RequestOption::new(move |request| {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|err| FetchError::InvalidRequest(format!("header name '{key}': {err}")))?;
        let value = HeaderValue::from_str(&value)
            .map_err(|err| FetchError::InvalidRequest(format!("header '{key}' value: {err}")))?;
        request.headers_mut().append(name, value);
        Ok(())
    })
}

/// Sets `Authorization` using the basic scheme, replacing any previous value.
pub fn with_basic_auth(user: impl Into<String>, pass: impl Into<String>) -> RequestOption {
    let (user, pass): (String, String) = (user.into(), pass.into());
    let credentials = STANDARD.encode(format!("{user}:{pass}"));
    RequestOption::new(move |request| {
        let mut value = HeaderValue::from_str(&format!("Basic {credentials}"))
            .map_err(|err| FetchError::InvalidRequest(format!("basic auth: {err}")))?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    })
}

/// Marks the request body as JSON.
pub fn with_json_body() -> RequestOption {
    RequestOption::new(|request| {
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(())
    })
}
