pub mod news_item;
pub mod source;

pub use news_item::NewsItem;
pub use source::{SelectorRules, Source};
