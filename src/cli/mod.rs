pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "news-agg")]
#[command(about = "Periodically collects news from RSS feeds and HTML pages", long_about = None)]
pub struct Cli {
    /// Path to the config file (default: ~/.config/news-agg/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database path, overrides the config file
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage the sources to parse
    Sources {
        #[command(subcommand)]
        action: SourceAction,
    },
    /// Browse collected news, newest first
    News {
        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// News per page
        #[arg(long, default_value_t = 10)]
        per_page: usize,

        /// Only show news whose title contains this text
        #[arg(short, long)]
        search: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Parse every source once
    Update,
    /// Run the scheduler until interrupted
    Run {
        /// Pass interval (e.g., "30s", "10m", "1h"), overrides the config file
        #[arg(short, long)]
        interval: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum SourceAction {
    /// Add an RSS feed or an HTML page
    Add(AddSource),
    /// Remove a source and its news
    Remove {
        /// Source id, as shown by `sources list`
        id: i64,
    },
    /// List sources
    List,
}

#[derive(Args)]
pub struct AddSource {
    /// URL to fetch
    pub url: String,

    /// The URL is an RSS feed; selectors are ignored
    #[arg(long)]
    pub feed: bool,

    /// CSS selector of each news item container
    #[arg(long, default_value = "")]
    pub item: String,

    /// CSS selector of the title inside an item
    #[arg(long, default_value = "")]
    pub title: String,

    /// CSS selector of the description inside an item
    #[arg(long, default_value = "")]
    pub description: String,

    /// CSS selector of the link (`href`) inside an item
    #[arg(long, default_value = "")]
    pub link: String,

    /// CSS selector of the date inside an item
    #[arg(long, default_value = "")]
    pub date: String,

    /// CSS selector of the image (`src`) inside an item
    #[arg(long, default_value = "")]
    pub image: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_html_source() {
        let cli = Cli::try_parse_from([
            "news-agg",
            "sources",
            "add",
            "https://www.e1.ru/news/",
            "--item",
            "article.e1-article_news",
            "--title",
            ".e1-article__tit",
            "--link",
            ".e1-article__link",
        ])
        .unwrap();

        match cli.command {
            Commands::Sources {
                action: SourceAction::Add(add),
            } => {
                assert_eq!(add.url, "https://www.e1.ru/news/");
                assert!(!add.feed);
                assert_eq!(add.item, "article.e1-article_news");
                assert_eq!(add.description, "");
            }
            _ => panic!("expected sources add"),
        }
    }

    #[test]
    fn test_parse_news_defaults() {
        let cli = Cli::try_parse_from(["news-agg", "news"]).unwrap();
        match cli.command {
            Commands::News {
                page,
                per_page,
                search,
                json,
            } => {
                assert_eq!(page, 1);
                assert_eq!(per_page, 10);
                assert!(search.is_none());
                assert!(!json);
            }
            _ => panic!("expected news"),
        }
    }

    #[test]
    fn test_global_database_flag() {
        let cli = Cli::try_parse_from(["news-agg", "run", "--database", "/tmp/n.db", "-i", "5m"])
            .unwrap();
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/n.db")));
        assert!(matches!(cli.command, Commands::Run { interval: Some(ref i) } if i == "5m"));
    }
}
