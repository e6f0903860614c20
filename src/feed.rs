//! Support for creating RSS 2.0 feeds from a list of documents.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rss::{Channel, Error as RssError, Guid, Item};
use std::fmt;
use std::io::Write;
use url::Url;

use crate::document::Document;

/// RFC 1123 with a numeric zone, e.g. `Mon, 02 Jan 2006 15:04:05 +0000`.
const RFC1123Z: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Bundled configuration for creating a feed.
pub struct FeedConfig<'a> {
    pub title: &'a str,
    pub link: &'a Url,
    pub description: &'a str,
    pub build_time: DateTime<Utc>,
}

/// A syndication projection of a document. `guid` and `link` are the same
/// absolute URL, so they stay stable across builds.
#[derive(Clone, Debug, PartialEq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: String,
    pub guid: String,
}

/// Projects already-ordered documents into feed items, keeping their order.
pub fn feed_items<D: Document>(base_url: &Url, documents: &[D]) -> Result<Vec<FeedItem>> {
    documents
        .iter()
        .map(|d| {
            // `url_path` is site-absolute; joining it relative keeps any
            // path the base URL carries.
            let link = base_url
                .join(d.url_path().trim_start_matches('/'))?
                .to_string();
            Ok(FeedItem {
                title: d.title().to_owned(),
                link: link.clone(),
                description: d.content_html().to_owned(),
                pub_date: rfc1123z(d.timestamp()),
                guid: link,
            })
        })
        .collect()
}

fn rfc1123z(t: NaiveDateTime) -> String {
    Utc.from_utc_datetime(&t).format(RFC1123Z).to_string()
}

/// Builds the channel for `items`.
pub fn channel(config: &FeedConfig, items: &[FeedItem]) -> Channel {
    let mut channel = Channel::default();
    channel.set_title(config.title);
    channel.set_link(config.link.as_str());
    channel.set_description(config.description);
    channel.set_language(Some("en-us".to_owned()));
    channel.set_last_build_date(Some(config.build_time.format(RFC1123Z).to_string()));
    channel.set_items(
        items
            .iter()
            .map(|i| {
                let mut guid = Guid::default();
                guid.set_value(i.guid.as_str());
                guid.set_permalink(true);

                let mut item = Item::default();
                item.set_title(Some(i.title.clone()));
                item.set_link(Some(i.link.clone()));
                item.set_description(Some(i.description.clone()));
                item.set_pub_date(Some(i.pub_date.clone()));
                item.set_guid(Some(guid));
                item
            })
            .collect::<Vec<Item>>(),
    );
    channel
}

/// Creates a feed from some configuration ([`FeedConfig`]) and a list of
/// [`FeedItem`]s and writes the result to a [`std::io::Write`].
pub fn write_feed<W: Write>(config: &FeedConfig, items: &[FeedItem], w: W) -> Result<()> {
    channel(config, items).pretty_write_to(w, b' ', 2)?;
    Ok(())
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is an RSS serialization error.
    Rss(RssError),

    /// Returned when a document URL can't be built from the base URL.
    UrlParse(url::ParseError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Rss(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Rss(err) => Some(err),
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<RssError> for Error {
    /// Converts [`RssError`]s into [`Error`]. This allows us to use the `?`
    /// operator in fallible feed operations.
    fn from(err: RssError) -> Error {
        Error::Rss(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::document::{parse_date, parse_date_time, Article, Author, Note};
    use std::path::PathBuf;

    fn note(slug: &str, date: &str) -> Note {
        Note {
            slug: slug.to_owned(),
            title: format!("Title {}", slug),
            date: date.to_owned(),
            author: Author::default(),
            tags: Vec::new(),
            source: None,
            content_html: format!("<p>{} & more</p>", slug),
            timestamp: parse_date_time(date).unwrap(),
            source_path: PathBuf::new(),
        }
    }

    #[test]
    fn test_feed_items() -> Result<()> {
        let base = Url::parse("https://example.com/")?;
        let items = feed_items(
            &base,
            &[note("b", "2024-01-02T15:04"), note("a", "2023-06-01")],
        )?;
        assert_eq!(
            vec![
                FeedItem {
                    title: "Title b".to_owned(),
                    link: "https://example.com/notes/b/".to_owned(),
                    description: "<p>b & more</p>".to_owned(),
                    pub_date: "Tue, 02 Jan 2024 15:04:00 +0000".to_owned(),
                    guid: "https://example.com/notes/b/".to_owned(),
                },
                FeedItem {
                    title: "Title a".to_owned(),
                    link: "https://example.com/notes/a/".to_owned(),
                    description: "<p>a & more</p>".to_owned(),
                    pub_date: "Thu, 01 Jun 2023 00:00:00 +0000".to_owned(),
                    guid: "https://example.com/notes/a/".to_owned(),
                },
            ],
            items
        );
        Ok(())
    }

    #[test]
    fn test_feed_items_keep_base_path() -> Result<()> {
        let base = Url::parse("https://example.com/blog/")?;
        let article = Article {
            slug: "x".to_owned(),
            title: "X".to_owned(),
            subtitle: None,
            date: "2024-01-01".to_owned(),
            updated: None,
            author: Author::default(),
            summary: None,
            tags: Vec::new(),
            hero: None,
            canonical_url: None,
            css: None,
            reading_time: 1,
            content_html: String::new(),
            timestamp: parse_date("2024-01-01").unwrap(),
            source_path: PathBuf::new(),
        };
        let items = feed_items(&base, &[article])?;
        assert_eq!("https://example.com/blog/articles/x/", items[0].link);
        Ok(())
    }

    #[test]
    fn test_write_feed() -> Result<()> {
        let base = Url::parse("https://example.com/")?;
        let items = feed_items(&base, &[note("b", "2024-01-02")])?;
        let config = FeedConfig {
            title: "Notes",
            link: &base,
            description: "Quick notes",
            build_time: Utc.timestamp_opt(0, 0).unwrap(),
        };
        let mut out = Vec::new();
        write_feed(&config, &items, &mut out)?;
        let xml = String::from_utf8(out).unwrap();

        assert!(xml.contains(r#"<rss version="2.0""#), "{}", xml);
        assert!(xml.contains("<language>en-us</language>"), "{}", xml);
        assert!(
            xml.contains("<lastBuildDate>Thu, 01 Jan 1970 00:00:00 +0000</lastBuildDate>"),
            "{}",
            xml
        );
        assert!(xml.contains("https://example.com/notes/b/</guid>"), "{}", xml);
        assert!(
            xml.contains("b &amp; more") || xml.contains("<![CDATA[<p>b & more</p>]]>"),
            "{}",
            xml
        );
        Ok(())
    }
}
