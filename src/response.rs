use std::ops::Deref;

use reqwest::header::HeaderMap;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::context::CancelGuard;
use crate::{encode, Result};

/// Final response of a call.
///
/// Holds the response together with the cancellation guard of the attempt
/// that produced it. Consuming the response (or dropping it) releases both.
#[derive(Debug)]
pub struct FetchResponse {
    response: Response,
    cancel: Option<CancelGuard>,
}

impl FetchResponse {
    pub(crate) fn new(response: Response, cancel: Option<CancelGuard>) -> Self {
        Self { response, cancel }
    }

    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    /// Decodes the body as JSON, then releases the response.
    pub async fn decode_json<T: DeserializeOwned>(self) -> Result<T> {
        let Self { response, cancel } = self;
        let decoded = encode::decode_json(response).await;
        drop(cancel);
        decoded
    }

    /// Reads the body as text.
    pub async fn text(self) -> Result<String> {
        let Self { response, cancel } = self;
        let text = response.text().await.map_err(crate::FetchError::Transport);
        drop(cancel);
        text
    }

    /// Reads the full body.
    pub async fn bytes(self) -> Result<Vec<u8>> {
        let Self { response, cancel } = self;
        let bytes = response
            .bytes()
            .await
            .map(|body| body.to_vec())
            .map_err(crate::FetchError::Transport);
        drop(cancel);
        bytes
    }

    /// Releases the cancellation guard and returns the raw response.
    pub fn into_inner(self) -> Response {
        self.response
    }
}

impl Deref for FetchResponse {
    type Target = Response;

    fn deref(&self) -> &Response {
        &self.response
    }
}

impl From<Response> for FetchResponse {
    fn from(response: Response) -> Self {
        Self::new(response, None)
    }
}
