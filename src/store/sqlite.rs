use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{NewsAggError, Result};
use crate::domain::{NewsItem, SelectorRules, Source};
use crate::store::{NewsSink, SourceCatalog};

const SOURCE_COLUMNS: &str = "id, url, is_feed, item_selector, title_selector, \
     description_selector, link_selector, date_selector, image_selector";

const NEWS_COLUMNS: &str =
    "id, source_id, title, description, link, date, image, fetched_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        register_functions(&conn)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;

        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| NewsAggError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            NewsAggError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    /// Adds a source, or returns the id of the source already stored under
    /// the same URL.
    pub fn add_source(&self, source: &Source) -> Result<i64> {
        source.validate()?;
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO sources (url, is_feed, item_selector, title_selector,
                 description_selector, link_selector, date_selector, image_selector, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(url) DO NOTHING",
            params![
                source.url,
                source.is_feed,
                source.rules.item,
                source.rules.title,
                source.rules.description,
                source.rules.link,
                source.rules.date,
                source.rules.image,
                Utc::now().to_rfc3339()
            ],
        )?;

        let id = conn.query_row(
            "SELECT id FROM sources WHERE url = ?1",
            params![source.url],
            |row| row.get(0),
        )?;

        Ok(id)
    }

    pub fn get_source(&self, id: i64) -> Result<Option<Source>> {
        let conn = self.conn()?;

        let source = conn
            .query_row(
                &format!("SELECT {} FROM sources WHERE id = ?1", SOURCE_COLUMNS),
                params![id],
                source_from_row,
            )
            .optional()?;

        Ok(source)
    }

    /// Sources ordered newest first.
    pub fn get_sources(&self) -> Result<Vec<Source>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sources ORDER BY id DESC",
            SOURCE_COLUMNS
        ))?;

        let sources = stmt
            .query_map([], source_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(sources)
    }

    /// Deletes a source together with its news.
    pub fn delete_source(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;

        let deleted = conn.execute("DELETE FROM sources WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(NewsAggError::SourceNotFound(id));
        }
        Ok(())
    }

    /// A page of news, newest first, optionally filtered by a
    /// case-insensitive title substring.
    pub fn get_news(&self, offset: usize, limit: usize, search: Option<&str>) -> Result<Vec<NewsItem>> {
        let conn = self.conn()?;

        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(&s.to_lowercase())));

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM news
             WHERE ?1 IS NULL OR unicode_lower(title) LIKE ?1 ESCAPE '\\'
             ORDER BY id DESC
             LIMIT ?2 OFFSET ?3",
            NEWS_COLUMNS
        ))?;

        let news = stmt
            .query_map(params![pattern, limit as i64, offset as i64], news_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(news)
    }

    pub fn count_news(&self, source_id: i64) -> Result<i64> {
        let conn = self.conn()?;

        let count = conn.query_row(
            "SELECT COUNT(*) FROM news WHERE source_id = ?1",
            params![source_id],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    fn has_link(&self, link: &str) -> Result<bool> {
        let conn = self.conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM news WHERE link = ?1",
            params![link],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    fn add_news(&self, item: &NewsItem) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO news (source_id, title, description, link, date, image, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                item.source_id,
                item.title,
                item.description,
                item.link,
                item.date,
                item.image,
                item.fetched_at.to_rfc3339()
            ],
        )?;

        Ok(())
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }
}

impl SourceCatalog for SqliteStore {
    fn list_sources(&self) -> Result<Vec<Source>> {
        self.get_sources()
            .map_err(|e| NewsAggError::Catalog(e.to_string()))
    }
}

impl NewsSink for SqliteStore {
    fn news_exists(&self, link: &str) -> Result<bool> {
        self.has_link(link)
            .map_err(|e| NewsAggError::Sink(e.to_string()))
    }

    fn insert_news(&self, item: &NewsItem) -> Result<()> {
        self.add_news(item)
            .map_err(|e| NewsAggError::Sink(e.to_string()))
    }
}

fn source_from_row(row: &Row<'_>) -> rusqlite::Result<Source> {
    Ok(Source {
        id: row.get(0)?,
        url: row.get(1)?,
        is_feed: row.get(2)?,
        rules: SelectorRules {
            item: row.get(3)?,
            title: row.get(4)?,
            description: row.get(5)?,
            link: row.get(6)?,
            date: row.get(7)?,
            image: row.get(8)?,
        },
    })
}

fn news_from_row(row: &Row<'_>) -> rusqlite::Result<NewsItem> {
    Ok(NewsItem {
        id: row.get(0)?,
        source_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        link: row.get(4)?,
        date: row.get(5)?,
        image: row.get(6)?,
        fetched_at: row
            .get::<_, String>(7)
            .ok()
            .and_then(|s| SqliteStore::parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    })
}

/// `unicode_lower(text)`: full Unicode lowercasing, where SQLite's own
/// `lower()` and `LIKE` only fold ASCII.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html_source(url: &str) -> Source {
        Source::page(
            url,
            SelectorRules {
                item: "article".into(),
                title: "h3".into(),
                link: "a".into(),
                ..Default::default()
            },
        )
    }

    fn news(source_id: i64, link: &str, title: &str) -> NewsItem {
        let mut item = NewsItem::new(link);
        item.source_id = source_id;
        item.title = title.into();
        item
    }

    #[test]
    fn test_add_and_get_source() {
        let store = SqliteStore::in_memory().unwrap();
        let id = store.add_source(&html_source("https://example.com/news")).unwrap();

        let source = store.get_source(id).unwrap().unwrap();
        assert_eq!(source.url, "https://example.com/news");
        assert!(!source.is_feed);
        assert_eq!(source.rules.item, "article");
        assert_eq!(source.rules.title, "h3");
    }

    #[test]
    fn test_add_source_is_first_or_create() {
        let store = SqliteStore::in_memory().unwrap();
        let first = store.add_source(&Source::feed("https://example.com/rss")).unwrap();
        let second = store.add_source(&Source::feed("https://example.com/rss")).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.get_sources().unwrap().len(), 1);
    }

    #[test]
    fn test_add_source_rejects_empty_url() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(matches!(
            store.add_source(&Source::feed("")),
            Err(NewsAggError::InvalidSource(_))
        ));
    }

    #[test]
    fn test_sources_newest_first() {
        let store = SqliteStore::in_memory().unwrap();
        let a = store.add_source(&Source::feed("https://a.ru/rss")).unwrap();
        let b = store.add_source(&Source::feed("https://b.ru/rss")).unwrap();

        let ids: Vec<i64> = store.list_sources().unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![b, a]);
    }

    #[test]
    fn test_insert_and_exists() {
        let store = SqliteStore::in_memory().unwrap();
        let source_id = store.add_source(&Source::feed("https://a.ru/rss")).unwrap();

        assert!(!store.news_exists("https://a.ru/1").unwrap());
        store.insert_news(&news(source_id, "https://a.ru/1", "One")).unwrap();
        assert!(store.news_exists("https://a.ru/1").unwrap());
        assert_eq!(store.count_news(source_id).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_link_is_sink_error() {
        let store = SqliteStore::in_memory().unwrap();
        let source_id = store.add_source(&Source::feed("https://a.ru/rss")).unwrap();

        store.insert_news(&news(source_id, "https://a.ru/1", "One")).unwrap();
        let err = store
            .insert_news(&news(source_id, "https://a.ru/1", "Again"))
            .unwrap_err();
        assert!(matches!(err, NewsAggError::Sink(_)));
    }

    #[test]
    fn test_insert_for_unknown_source_fails() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.insert_news(&news(99, "https://a.ru/1", "One")).is_err());
    }

    #[test]
    fn test_delete_source_cascades() {
        let store = SqliteStore::in_memory().unwrap();
        let source_id = store.add_source(&Source::feed("https://a.ru/rss")).unwrap();
        store.insert_news(&news(source_id, "https://a.ru/1", "One")).unwrap();

        store.delete_source(source_id).unwrap();
        assert!(store.get_source(source_id).unwrap().is_none());
        assert!(!store.news_exists("https://a.ru/1").unwrap());
        assert!(matches!(
            store.delete_source(source_id),
            Err(NewsAggError::SourceNotFound(_))
        ));
    }

    #[test]
    fn test_get_news_paging_and_search() {
        let store = SqliteStore::in_memory().unwrap();
        let source_id = store.add_source(&Source::feed("https://a.ru/rss")).unwrap();
        for i in 0..5 {
            let title = if i % 2 == 0 { format!("Rust {}", i) } else { format!("Go {}", i) };
            store
                .insert_news(&news(source_id, &format!("https://a.ru/{}", i), &title))
                .unwrap();
        }

        let page = store.get_news(0, 2, None).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].link, "https://a.ru/4");
        assert_eq!(page[1].link, "https://a.ru/3");

        let rest = store.get_news(4, 2, None).unwrap();
        assert_eq!(rest.len(), 1);

        let found = store.get_news(0, 10, Some("rust")).unwrap();
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|n| n.title.starts_with("Rust")));

        assert!(store.get_news(0, 10, Some("100%")).unwrap().is_empty());
    }

    #[test]
    fn test_search_ignores_cyrillic_case() {
        let store = SqliteStore::in_memory().unwrap();
        let source_id = store.add_source(&Source::feed("https://a.ru/rss")).unwrap();
        store
            .insert_news(&news(source_id, "https://a.ru/1", "Россия и мир"))
            .unwrap();
        store
            .insert_news(&news(source_id, "https://a.ru/2", "Погода"))
            .unwrap();

        for query in ["россия", "Россия", "РОССИЯ", "и МИР"] {
            let found = store.get_news(0, 10, Some(query)).unwrap();
            assert_eq!(found.len(), 1, "query {:?}", query);
            assert_eq!(found[0].link, "https://a.ru/1");
        }
    }
}
