use std::fmt;
use std::time::Duration;

use reqwest::{Body, Method, Request, Response};

use crate::{
    with_retry, with_timeout, CancelGuard, ClientConfig, ClientOption, Context,
    FetchError, FetchResponse, RequestOption, Result,
};

#[derive(Clone)]
/// HTTP client bound to a base URL.
///
/// Cloning is cheap enough to hand one copy to every task; the
/// configuration is never mutated after construction.
pub struct Fetch {
    config: ClientConfig,
}

impl fmt::Debug for Fetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetch").field("config", &self.config).finish()
    }
}

impl Fetch {
    /// Creates a client for `base_url`.
    ///
    /// Without options every call makes a single attempt with no timeout.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use fetch_http::{with_retry, with_timeout, Fetch};
    ///
    /// let api = Fetch::new(
    ///     "https://api.example.com",
    ///     [with_retry(2), with_timeout(Duration::from_secs(5))],
    /// );
    /// ```
    pub fn new<I>(base_url: impl Into<String>, opts: I) -> Self
    where
        I: IntoIterator<Item = ClientOption>,
    {
        Self {
            config: ClientConfig::new(base_url.into()).apply(opts),
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `FETCH_BASE_URL` — base URL every path is appended to
    /// - `FETCH_RETRIES` — optional retry count
    /// - `FETCH_TIMEOUT_MS` — optional per-attempt timeout in milliseconds
    pub fn from_env() -> std::result::Result<Self, String> {
        let (base_url, opts) = options_from_lookup(|key| std::env::var(key).ok())?;
        Ok(Self::new(base_url, opts))
    }

    /// Returns a new client with `opts` layered over this one's settings.
    ///
    /// `self` is left untouched.
    pub fn set_options<I>(&self, opts: I) -> Self
    where
        I: IntoIterator<Item = ClientOption>,
    {
        Self {
            config: self.config.clone().apply(opts),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn get(&self, path: &str, opts: &[RequestOption]) -> Result<FetchResponse> {
        self.request(&Context::background(), Method::GET, path, None, opts)
            .await
    }

    /// Like [`Fetch::get`], bounded by the caller's context.
    pub async fn get_with_context(
        &self,
        ctx: &Context,
        path: &str,
        opts: &[RequestOption],
    ) -> Result<FetchResponse> {
        self.request(ctx, Method::GET, path, None, opts).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: impl Into<Body>,
        opts: &[RequestOption],
    ) -> Result<FetchResponse> {
        self.request(&Context::background(), Method::POST, path, Some(body.into()), opts)
            .await
    }

    pub async fn put(
        &self,
        path: &str,
        body: impl Into<Body>,
        opts: &[RequestOption],
    ) -> Result<FetchResponse> {
        self.request(&Context::background(), Method::PUT, path, Some(body.into()), opts)
            .await
    }

    pub async fn patch(
        &self,
        path: &str,
        body: impl Into<Body>,
        opts: &[RequestOption],
    ) -> Result<FetchResponse> {
        self.request(&Context::background(), Method::PATCH, path, Some(body.into()), opts)
            .await
    }

    pub async fn delete(&self, path: &str, opts: &[RequestOption]) -> Result<FetchResponse> {
        self.request(&Context::background(), Method::DELETE, path, None, opts)
            .await
    }

    /// Builds and decorates one request, then runs it through the retry loop.
    ///
    /// Every method is retried the same way, POST included. Callers that
    /// cannot tolerate duplicate side effects should not enable retries.
    pub async fn request(
        &self,
        ctx: &Context,
        method: Method,
        path: &str,
        body: Option<Body>,
        opts: &[RequestOption],
    ) -> Result<FetchResponse> {
        let url = format!("{}{}", self.config.base_url, path);
        let mut builder = self.config.http.request(method, &url);
        if let Some(body) = body {
            builder = builder.body(body);
        }
        let mut request = builder
            .build()
            .map_err(|err| FetchError::InvalidRequest(format!("{url}: {err}")))?;

        for opt in self.config.request_opts.iter().chain(opts) {
            opt.apply(&mut request)?;
        }

        self.execute_with_retry(ctx, request).await
    }

    async fn execute_with_retry(&self, ctx: &Context, request: Request) -> Result<FetchResponse> {
        let attempts = self.config.attempts.max(1);
        let mut template = Some(request);
        let mut guard: Option<CancelGuard> = None;
        let mut last: Option<Result<Response>> = None;

        for attempt in 1..=attempts {
            if last.is_some() && ctx.err().is_some() {
                break;
            }
            let Some(request) = next_request(&mut template, attempt < attempts) else {
                #[cfg(feature = "tracing")]
                tracing::debug!(attempt, "request body cannot be replayed, not retrying");
                break;
            };

            // At most one per-attempt context is alive at a time.
            drop(guard.take());
            let attempt_ctx = match self.config.timeout() {
                Some(timeout) => {
                    let (attempt_ctx, attempt_guard) = ctx.with_timeout(timeout);
                    guard = Some(attempt_guard);
                    attempt_ctx
                }
                None => ctx.clone(),
            };

            let result = self.send(&attempt_ctx, request).await;
            #[cfg(feature = "tracing")]
            log_attempt(attempt, &result);
            let success = matches!(&result, Ok(response) if response.status().is_success());
            last = Some(result);
            if success {
                break;
            }
        }

        let response = match last {
            Some(result) => result?,
            None => {
                return Err(FetchError::InvalidRequest(
                    "request was not attempted".to_owned(),
                ))
            }
        };
        let status = response.status();
        let response = FetchResponse::new(response, guard);
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                response: Box::new(response),
            });
        }
        Ok(response)
    }

    async fn send(&self, ctx: &Context, request: Request) -> Result<Response> {
        tokio::select! {
            biased;
            reason = ctx.done() => Err(reason.into()),
            response = self.config.http.execute(request) => response.map_err(FetchError::Transport),
        }
    }
}

#[cfg(feature = "tracing")]
fn log_attempt(attempt: u32, result: &Result<Response>) {
    match result {
        Ok(response) if !response.status().is_success() => tracing::debug!(
            attempt,
            status = %response.status(),
            "request attempt returned non-success status"
        ),
        Ok(_) => {}
        Err(err) => tracing::warn!(attempt, error = %err, "request attempt failed"),
    }
}

/// Returns the request for the next attempt.
///
/// While more attempts may follow, a replay is sent and the original is kept.
/// The final attempt, or a body that cannot be replayed, consumes the
/// original.
fn next_request(template: &mut Option<Request>, more: bool) -> Option<Request> {
    let replay = if more {
        template.as_ref().and_then(Request::try_clone)
    } else {
        None
    };
    replay.or_else(|| template.take())
}

fn options_from_lookup<F>(lookup: F) -> std::result::Result<(String, Vec<ClientOption>), String>
where
    F: Fn(&str) -> Option<String>,
{
    let base_url = lookup("FETCH_BASE_URL")
        .ok_or_else(|| "missing FETCH_BASE_URL environment variable".to_owned())?;
    if base_url.trim().is_empty() {
        return Err("FETCH_BASE_URL is set but empty".to_owned());
    }

    let mut opts = Vec::new();
    if let Some(retries) = lookup("FETCH_RETRIES") {
        let retries = retries
            .trim()
            .parse::<u32>()
            .map_err(|err| format!("FETCH_RETRIES is not a valid retry count: {err}"))?;
        opts.push(with_retry(retries));
    }
    if let Some(timeout_ms) = lookup("FETCH_TIMEOUT_MS") {
        let timeout_ms = timeout_ms
            .trim()
            .parse::<u64>()
            .map_err(|err| format!("FETCH_TIMEOUT_MS is not a valid duration: {err}"))?;
        opts.push(with_timeout(Duration::from_millis(timeout_ms)));
    }

    Ok((base_url, opts))
}
