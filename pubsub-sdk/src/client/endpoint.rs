use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use url::Url;

use super::ClientError;
use crate::resource::ResourcePath;

/// Root URL of the managed broker.
pub const PRODUCTION_BASE_URL: &str = "https://pubsub.googleapis.com/";

/// Per-request deadline. Longer than the broker holds a pull open waiting
/// for messages.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Where requests go and how they are authorized.
///
/// Shared by [`PublisherClient`](super::PublisherClient) and
/// [`SubscriberClient`](super::SubscriberClient).
#[derive(Debug, Clone)]
pub struct Endpoint {
    http: Client,
    base_url: Url,
    access_token: Option<String>,
}

impl Endpoint {
    /// Create an endpoint for an arbitrary base URL.
    pub fn new(base_url: Url) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url,
            access_token: None,
        })
    }

    /// The managed broker at [`PRODUCTION_BASE_URL`].
    pub fn production() -> Result<Self, ClientError> {
        Self::new(Url::parse(PRODUCTION_BASE_URL)?)
    }

    /// A local emulator listening on `host` (e.g. `localhost:8085`).
    ///
    /// The emulator speaks plain HTTP and ignores credentials.
    pub fn emulator(host: &str) -> Result<Self, ClientError> {
        Self::new(Url::parse(&format!("http://{host}/"))?)
    }

    /// Attach a pre-minted OAuth bearer token to every request.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `v1/{resource}{verb}` against the base URL.
    ///
    /// `verb` is either empty or a custom method such as `:pull`.
    pub(super) fn url(&self, resource: &ResourcePath, verb: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(&format!("v1/{resource}{verb}"))?)
    }

    pub(super) fn get(&self, url: Url) -> RequestBuilder {
        self.authorize(self.http.get(url))
    }

    pub(super) fn post(&self, url: Url) -> RequestBuilder {
        self.authorize(self.http.post(url))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}
