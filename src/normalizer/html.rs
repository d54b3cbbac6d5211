use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::app::{NewsAggError, Result};
use crate::domain::{NewsItem, SelectorRules};
use crate::normalizer::link;

/// Extracts news items from an HTML page using a source's selector rules.
///
/// Selectors are compiled once in [`HtmlExtractor::new`]; an empty selector
/// string compiles to `None` and leaves its field empty.
pub struct HtmlExtractor {
    item: Option<Selector>,
    title: Option<Selector>,
    description: Option<Selector>,
    link: Option<Selector>,
    date: Option<Selector>,
    image: Option<Selector>,
}

impl HtmlExtractor {
    pub fn new(rules: &SelectorRules) -> Result<Self> {
        Ok(Self {
            item: compile(&rules.item)?,
            title: compile(&rules.title)?,
            description: compile(&rules.description)?,
            link: compile(&rules.link)?,
            date: compile(&rules.date)?,
            image: compile(&rules.image)?,
        })
    }

    /// Extracts one item per node matching the item selector, in document
    /// order. Links and images are resolved against `base_url`.
    ///
    /// The body is decoded with the charset declared in the page (UTF-8 when
    /// none is declared); invalid byte sequences become U+FFFD.
    pub fn extract(&self, body: &[u8], base_url: &str) -> Result<Vec<NewsItem>> {
        let Some(item_selector) = self.item.as_ref() else {
            return Ok(Vec::new());
        };

        let text = decode(body, base_url);
        let document = Html::parse_document(&text);

        let items = document
            .select(item_selector)
            .map(|node| {
                let mut item = NewsItem::new(
                    first_attr(node, self.link.as_ref(), "href")
                        .map(|href| link::resolve(base_url, &href))
                        .unwrap_or_default(),
                );
                item.title = first_text(node, self.title.as_ref());
                item.description = first_text(node, self.description.as_ref());
                item.date = first_text(node, self.date.as_ref());
                item.image = first_attr(node, self.image.as_ref(), "src")
                    .map(|src| link::resolve(base_url, &src))
                    .unwrap_or_default();
                item
            })
            .collect();

        Ok(items)
    }
}

/// Convenience wrapper compiling `rules` and extracting in one call.
pub fn extract(body: &[u8], base_url: &str, rules: &SelectorRules) -> Result<Vec<NewsItem>> {
    HtmlExtractor::new(rules)?.extract(body, base_url)
}

fn compile(selector: &str) -> Result<Option<Selector>> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Ok(None);
    }
    Selector::parse(selector)
        .map(Some)
        .map_err(|e| NewsAggError::InvalidSelector {
            selector: selector.to_string(),
            reason: format!("{:?}", e),
        })
}

fn decode<'a>(body: &'a [u8], base_url: &str) -> Cow<'a, str> {
    let encoding = declared_charset(body).unwrap_or(UTF_8);
    let (text, used, had_errors) = encoding.decode(body);
    if had_errors {
        debug!("Replaced malformed {} sequences in {}", used.name(), base_url);
    }
    text
}

/// Looks for a `charset=` declaration (meta tag or http-equiv) near the top
/// of the page.
fn declared_charset(body: &[u8]) -> Option<&'static Encoding> {
    let head = String::from_utf8_lossy(&body[..body.len().min(1024)]).to_ascii_lowercase();
    let start = head.find("charset=")? + "charset=".len();
    let label: String = head[start..]
        .trim_start_matches(|c: char| c == '"' || c == '\'')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    Encoding::for_label(label.as_bytes())
}

fn first_match<'a>(node: ElementRef<'a>, selector: Option<&Selector>) -> Option<ElementRef<'a>> {
    let selector = selector?;
    node.select(selector).find(|el| el.id() != node.id())
}

fn first_text(node: ElementRef<'_>, selector: Option<&Selector>) -> String {
    first_match(node, selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn first_attr(node: ElementRef<'_>, selector: Option<&Selector>, attr: &str) -> Option<String> {
    first_match(node, selector)?
        .value()
        .attr(attr)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
}
