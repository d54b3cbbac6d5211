//! Fetching a source and turning the response into news items.

use std::sync::Arc;

use async_trait::async_trait;

use crate::app::{NewsAggError, Result};
use crate::domain::{NewsItem, Source};
use crate::fetcher::Fetcher;
use crate::normalizer::{rss, HtmlExtractor};

/// Produces the news items currently published by a source.
#[async_trait]
pub trait Parser {
    async fn parse(&self, source: &Source) -> Result<Vec<NewsItem>>;
}

/// Fetches a source and dispatches the body to the RSS decoder or the HTML
/// extractor. No retries and no caching: every call hits the network.
pub struct SourceParser {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
}

impl SourceParser {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Parser for SourceParser {
    async fn parse(&self, source: &Source) -> Result<Vec<NewsItem>> {
        let response = self.fetcher.get(&source.url).await?;

        if response.status != 200 {
            return Err(NewsAggError::UnexpectedStatus {
                code: response.status,
            });
        }

        let items = if source.is_feed {
            rss::decode(&response.body)?
        } else {
            HtmlExtractor::new(&source.rules)?.extract(&response.body, &response.url)?
        };

        tracing::debug!(
            "Parsed {} items from {} source {}",
            items.len(),
            source.kind(),
            source.url
        );

        Ok(items)
    }
}
