use reqwest::Response;
use serde::{de::DeserializeOwned, Serialize};

use crate::{FetchError, Result};

/// Serializes `data` as a JSON request body.
pub fn encode_data<T: Serialize + ?Sized>(data: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(data).map_err(FetchError::Encode)
}

/// Reads the whole response body and parses it as JSON.
pub async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response
        .bytes()
        .await
        .map_err(|err| FetchError::Decode(format!("failed to read response body: {err}")))?;
    serde_json::from_slice(&body).map_err(|err| {
        FetchError::Decode(format!(
            "invalid JSON response: {err}; body: {}",
            String::from_utf8_lossy(&body)
        ))
    })
}
