use html_escape::decode_html_entities;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::app::{NewsAggError, Result};
use crate::domain::NewsItem;

#[derive(Debug, Clone, Copy)]
enum Field {
    Title,
    Description,
    Link,
    Date,
    Image,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Field::Title),
            b"description" => Some(Field::Description),
            b"link" => Some(Field::Link),
            b"pubDate" => Some(Field::Date),
            b"image" => Some(Field::Image),
            _ => None,
        }
    }
}

#[derive(Default)]
struct PendingItem {
    item: Option<NewsItem>,
    field: Option<Field>,
    text: String,
    enclosure_image: Option<String>,
}

impl PendingItem {
    fn start(&mut self) {
        self.item = Some(NewsItem::new(""));
        self.field = None;
        self.text.clear();
        self.enclosure_image = None;
    }

    fn finish_field(&mut self) {
        let (Some(item), Some(field)) = (self.item.as_mut(), self.field.take()) else {
            return;
        };
        let value = std::mem::take(&mut self.text);
        match field {
            Field::Title => item.title = value,
            Field::Description => item.description = value,
            Field::Link => item.link = value,
            Field::Date => item.date = value,
            Field::Image => item.image = value,
        }
    }

    fn finish(&mut self) -> Option<NewsItem> {
        let mut item = self.item.take()?;
        if item.image.is_empty() {
            if let Some(image) = self.enclosure_image.take() {
                item.image = image;
            }
        }
        Some(item)
    }
}

/// Decodes an RSS 2.0 document (`rss > channel > item*`) into news items.
///
/// Fields are copied as found in the document: links are not resolved and
/// dates are not parsed. Missing elements leave the field empty.
pub fn decode(body: &[u8]) -> Result<Vec<NewsItem>> {
    let mut reader = Reader::from_reader(body);
    let mut buf = Vec::new();

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut saw_rss = false;
    let mut saw_channel = false;
    let mut pending = PendingItem::default();
    let mut items = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| malformed(format!("{} at byte {}", e, reader.buffer_position())))?;

        match event {
            Event::Start(e) => {
                let name = e.name().as_ref().to_vec();
                open_element(&stack, &name, &mut saw_rss, &mut saw_channel, &mut pending)?;
                stack.push(name);
            }
            Event::Empty(e) => {
                let name = e.name().as_ref().to_vec();
                open_element(&stack, &name, &mut saw_rss, &mut saw_channel, &mut pending)?;
                match stack.len() {
                    2 if name == b"item" => items.extend(pending.finish()),
                    3 if name == b"enclosure" => {
                        if pending.enclosure_image.is_none() {
                            pending.enclosure_image = enclosure_image(&e);
                        }
                    }
                    3 => pending.finish_field(),
                    _ => {}
                }
            }
            Event::End(_) => {
                stack.pop();
                match stack.len() {
                    3 => pending.finish_field(),
                    2 => items.extend(pending.finish()),
                    _ => {}
                }
            }
            Event::Text(t) => {
                if pending.field.is_some() {
                    let raw = std::str::from_utf8(&t)
                        .map_err(|e| malformed(format!("invalid UTF-8 in text: {}", e)))?;
                    pending.text.push_str(&decode_html_entities(raw));
                }
            }
            Event::CData(t) => {
                if pending.field.is_some() {
                    let raw = std::str::from_utf8(&t)
                        .map_err(|e| malformed(format!("invalid UTF-8 in CDATA: {}", e)))?;
                    pending.text.push_str(raw);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(malformed("unexpected end of document".into()));
    }
    if !saw_rss {
        return Err(malformed("missing <rss> root element".into()));
    }
    if !saw_channel {
        return Err(malformed("missing <channel> element".into()));
    }

    Ok(items)
}

fn open_element(
    stack: &[Vec<u8>],
    name: &[u8],
    saw_rss: &mut bool,
    saw_channel: &mut bool,
    pending: &mut PendingItem,
) -> Result<()> {
    match stack.len() {
        0 => {
            if name != b"rss" {
                return Err(malformed(format!(
                    "unexpected root element <{}>",
                    String::from_utf8_lossy(name)
                )));
            }
            *saw_rss = true;
        }
        1 if name == b"channel" => *saw_channel = true,
        2 if name == b"item" && stack[1] == b"channel" => pending.start(),
        3 if pending.item.is_some() => {
            pending.field = Field::from_name(name);
            pending.text.clear();
        }
        _ => {}
    }
    Ok(())
}

fn enclosure_image(e: &BytesStart) -> Option<String> {
    let mut url = None;
    let mut is_image = false;
    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value);
        match attr.key.as_ref() {
            b"url" => url = Some(decode_html_entities(&value).to_string()),
            b"type" => is_image = value.starts_with("image/"),
            _ => {}
        }
    }
    url.filter(|_| is_image)
}

fn malformed(msg: String) -> NewsAggError {
    NewsAggError::MalformedFeed(msg)
}
