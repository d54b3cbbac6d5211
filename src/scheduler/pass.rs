use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::domain::Source;
use crate::parser::Parser;
use crate::store::{NewsSink, SourceCatalog};

/// Outcome of one source within a pass.
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub source_id: i64,
    pub url: String,
    pub inserted: usize,
    /// Parse failure, if the source could not be parsed at all.
    pub error: Option<String>,
}

/// Outcome of a full pass over the catalog.
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    pub sources: Vec<SourceReport>,
    /// Set when the catalog could not be listed; nothing was parsed.
    pub catalog_error: Option<String>,
    /// Set when a stop request cut the pass short.
    pub interrupted: bool,
}

impl PassReport {
    pub fn total_inserted(&self) -> usize {
        self.sources.iter().map(|s| s.inserted).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources.iter().filter(|s| s.error.is_some())
    }
}

/// Runs parsing passes over the catalog and forwards new items to the sink.
///
/// Every failure below the catalog level is logged and turned into a skip:
/// a failing source never stops the pass, a failing item never stops its
/// source.
pub struct Aggregator {
    parser: Arc<dyn Parser + Send + Sync>,
    catalog: Arc<dyn SourceCatalog + Send + Sync>,
    sink: Arc<dyn NewsSink + Send + Sync>,
}

impl Aggregator {
    pub fn new(
        parser: Arc<dyn Parser + Send + Sync>,
        catalog: Arc<dyn SourceCatalog + Send + Sync>,
        sink: Arc<dyn NewsSink + Send + Sync>,
    ) -> Self {
        Self {
            parser,
            catalog,
            sink,
        }
    }

    /// Runs a single pass to completion.
    pub async fn run_pass(&self) -> PassReport {
        let (_stop_tx, stop_rx) = watch::channel(false);
        self.run_pass_until(&stop_rx).await
    }

    /// Runs a pass, checking `stop` before each source. A source already
    /// started is always finished.
    pub async fn run_pass_until(&self, stop: &watch::Receiver<bool>) -> PassReport {
        let start = Utc::now();
        let mut report = PassReport::default();

        let sources = match self.catalog.list_sources() {
            Ok(sources) => sources,
            Err(e) => {
                error!("Failed to get sources from catalog: {}", e);
                report.catalog_error = Some(e.to_string());
                return report;
            }
        };

        if sources.is_empty() {
            info!("No sources to parse");
            return report;
        }

        for (done, source) in sources.iter().enumerate() {
            if stop_requested(stop) {
                info!(
                    "Stop requested, pass abandoned after {} of {} sources",
                    done,
                    sources.len()
                );
                report.interrupted = true;
                break;
            }

            report.sources.push(self.process_source(source).await);
        }

        let elapsed = Utc::now().signed_duration_since(start);
        info!(
            "Pass complete: {} new items, {} errors ({:.1}s)",
            report.total_inserted(),
            report.failures().count(),
            elapsed.num_milliseconds() as f64 / 1000.0
        );

        report
    }

    async fn process_source(&self, source: &Source) -> SourceReport {
        let mut report = SourceReport {
            source_id: source.id,
            url: source.url.clone(),
            inserted: 0,
            error: None,
        };

        let items = match self.parser.parse(source).await {
            Ok(items) => items,
            Err(e) => {
                warn!("parse failed for source {}: {}", source.id, e);
                report.error = Some(e.to_string());
                return report;
            }
        };

        for mut item in items {
            item.source_id = source.id;

            match self.sink.news_exists(&item.link) {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    error!("Failed to check news {} in sink: {}", item.link, e);
                    continue;
                }
            }

            match self.sink.insert_news(&item) {
                Ok(()) => report.inserted += 1,
                Err(e) => error!("Failed to add news {} to sink: {}", item.link, e),
            }
        }

        info!(
            "Complete parse of source {} ({}): added {} news",
            source.id, source.url, report.inserted
        );

        report
    }
}

fn stop_requested(stop: &watch::Receiver<bool>) -> bool {
    *stop.borrow()
}
