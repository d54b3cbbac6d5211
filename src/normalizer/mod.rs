//! Turning fetched payloads into news items.
//!
//! - [`rss`]: RSS 2.0 documents, fields copied verbatim
//! - [`html`]: HTML pages described by per-source CSS selectors
//! - [`link`]: resolution of relative links found in HTML pages

pub mod html;
pub mod link;
pub mod rss;

pub use html::HtmlExtractor;
pub use link::resolve;
