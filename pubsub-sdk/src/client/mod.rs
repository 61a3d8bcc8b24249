//! HTTP clients for the broker's REST API.
//!
//! Gated behind the `client` cargo feature so downstream crates that only
//! need the wire types do not pull in `reqwest`.

mod endpoint;
mod publisher;
mod subscriber;
#[cfg(test)]
mod test_server;

pub use endpoint::{Endpoint, PRODUCTION_BASE_URL, REQUEST_TIMEOUT};
pub use publisher::PublisherClient;
pub use reqwest::StatusCode;
pub use subscriber::SubscriberClient;

/// Errors produced by the SDK HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, connection reset, …).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The broker returned a non-2xx status code.
    #[error("api error: status {status}, body: {body}")]
    Api { status: StatusCode, body: String },

    /// Response body could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The base URL could not be joined with the resource path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// A publish call succeeded but returned no message id.
    #[error("publish response contained no message id")]
    EmptyPublishResponse,
}

impl ClientError {
    /// `true` when the broker answered `404 Not Found`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api { status, .. } if *status == StatusCode::NOT_FOUND)
    }

    /// `true` when repeating the same request cannot succeed.
    ///
    /// 4xx answers are permanent except `408 Request Timeout` and
    /// `429 Too Many Requests`. Transport failures and 5xx are not.
    pub fn is_permanent(&self) -> bool {
        match self {
            ClientError::Api { status, .. } => {
                status.is_client_error()
                    && *status != StatusCode::REQUEST_TIMEOUT
                    && *status != StatusCode::TOO_MANY_REQUESTS
            }
            ClientError::Url(_) => true,
            ClientError::Http(_) | ClientError::Json(_) | ClientError::EmptyPublishResponse => {
                false
            }
        }
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api { status, body });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}

/// Map a `GET` on a resource to an existence flag.
async fn parse_exists(resp: reqwest::Response) -> Result<bool, ClientError> {
    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(false);
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api { status, body });
    }
    Ok(true)
}
