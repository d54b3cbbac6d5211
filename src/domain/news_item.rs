use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One extracted article.
///
/// The `link` is the natural key: two items with the same link are the same
/// item regardless of the other fields. `date` is kept as the text found in
/// the source and is never parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: i64,
    pub source_id: i64,
    pub title: String,
    pub description: String,
    pub link: String,
    pub date: String,
    pub image: String,
    pub fetched_at: DateTime<Utc>,
}

impl NewsItem {
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            id: 0,
            source_id: 0,
            title: String::new(),
            description: String::new(),
            link: link.into(),
            date: String::new(),
            image: String::new(),
            fetched_at: Utc::now(),
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }
}
