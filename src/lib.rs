//! # news-agg
//!
//! Periodically collects news from RSS feeds and HTML pages, deduplicates
//! them by link and stores the new ones.
//!
//! ## Architecture
//!
//! ```text
//! Catalog → Fetcher → Parser (RSS decoder | HTML extractor) → Sink
//!                        ↑ driven by the Scheduler on an interval
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! # Add an RSS feed
//! news-agg sources add https://news.rambler.ru/rss/world/ --feed
//!
//! # Add an HTML page described by CSS selectors
//! news-agg sources add https://www.e1.ru/news/ \
//!     --item article.e1-article_news --title .e1-article__tit \
//!     --link .e1-article__link --date .e1-article__date-text --image .e1-article__img
//!
//! # Parse every source once, or keep parsing every 10 minutes
//! news-agg update
//! news-agg run --interval 10m
//!
//! # Browse what was collected
//! news-agg news --search rust
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the store,
/// fetcher and parser.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loaded from `~/.config/news-agg/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Source`](domain::Source): a feed or page with its selector rules
/// - [`NewsItem`](domain::NewsItem): one extracted article, keyed by link
pub mod domain;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): async trait for the transport
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// RSS decoding, HTML extraction and link resolution.
pub mod normalizer;

/// Fetch, status check and dispatch of a single source.
pub mod parser;

/// Periodic passes over the catalog with per-source failure isolation.
pub mod scheduler;

/// Source catalog and news sink contracts, with a SQLite implementation.
pub mod store;
