use serde::{Deserialize, Serialize};

use crate::app::{NewsAggError, Result};

/// CSS selectors locating the fields of a news item inside an HTML page.
///
/// `item` selects the container of each news item; the other selectors are
/// evaluated inside that container. An empty selector leaves the field empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorRules {
    pub item: String,
    pub title: String,
    pub description: String,
    pub link: String,
    pub date: String,
    pub image: String,
}

/// A configured origin to scrape: an RSS feed or an HTML page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub url: String,
    pub is_feed: bool,
    /// Only meaningful when `is_feed` is false.
    pub rules: SelectorRules,
}

impl Source {
    pub fn feed(url: impl Into<String>) -> Self {
        Self {
            id: 0,
            url: url.into(),
            is_feed: true,
            rules: SelectorRules::default(),
        }
    }

    pub fn page(url: impl Into<String>, rules: SelectorRules) -> Self {
        Self {
            id: 0,
            url: url.into(),
            is_feed: false,
            rules,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(NewsAggError::InvalidSource("fetch URL is empty".into()));
        }
        if !self.is_feed && self.rules.item.trim().is_empty() {
            return Err(NewsAggError::InvalidSource(format!(
                "{}: HTML source needs an item selector",
                self.url
            )));
        }
        Ok(())
    }

    pub fn kind(&self) -> &'static str {
        if self.is_feed {
            "rss"
        } else {
            "html"
        }
    }
}
