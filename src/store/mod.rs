pub mod sqlite;

use crate::app::Result;
use crate::domain::{NewsItem, Source};

pub use sqlite::SqliteStore;

/// The list of sources to parse on every pass.
pub trait SourceCatalog {
    fn list_sources(&self) -> Result<Vec<Source>>;
}

/// Persistence boundary for news items, keyed by link.
pub trait NewsSink {
    fn news_exists(&self, link: &str) -> Result<bool>;
    fn insert_news(&self, item: &NewsItem) -> Result<()>;
}
