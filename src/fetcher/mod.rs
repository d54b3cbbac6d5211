pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;

/// A fetched HTTP response.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    /// Final URL after redirects, used as the base for relative links.
    pub url: String,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn ok(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            url: url.into(),
            body: body.into(),
        }
    }
}

/// Transport capability used by the source parser.
///
/// Implementations return any HTTP status as a response and only fail on
/// transport errors (DNS, refused connections, timeouts).
#[async_trait]
pub trait Fetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse>;
}
