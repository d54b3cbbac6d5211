use std::sync::Arc;

use crate::app::error::{NewsAggError, Result};
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::parser::SourceParser;
use crate::scheduler::{Aggregator, Scheduler, SchedulerConfig};
use crate::store::sqlite::SqliteStore;

pub struct AppContext {
    pub store: Arc<SqliteStore>,
    pub parser: Arc<SourceParser>,
    pub config: Config,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let db_path = config
            .database_path()
            .map_err(|e| NewsAggError::Config(e.to_string()))?;
        let store = Arc::new(SqliteStore::new(&db_path)?);
        tracing::debug!("Using database {}", db_path.display());

        Self::with_store(config, store)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Self::with_store(config, store)
    }

    fn with_store(config: Config, store: Arc<SqliteStore>) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.http)?);
        let parser = Arc::new(SourceParser::new(fetcher));

        Ok(Self {
            store,
            parser,
            config,
        })
    }

    /// An aggregator reading sources from and writing news to the store.
    pub fn aggregator(&self) -> Aggregator {
        Aggregator::new(self.parser.clone(), self.store.clone(), self.store.clone())
    }

    pub fn scheduler(&self, config: SchedulerConfig) -> Result<Scheduler> {
        Scheduler::new(self.aggregator(), config)
    }
}
