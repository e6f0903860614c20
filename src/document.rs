//! Defines the content model: [`Article`], [`Note`], and the pieces they share
//! ([`Author`], [`Tag`], [`Hero`]). The [`Document`] trait abstracts over both
//! variants so ordering and indexing can be written once.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};

/// The kind of a [`Document`]. Rendered into list items so templates can
/// style articles and notes differently.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Article,
    Note,
}

impl Kind {
    /// The URL path segment under which documents of this kind are
    /// published (e.g., `/articles/{slug}/`).
    pub fn section(self) -> &'static str {
        match self {
            Kind::Article => "articles",
            Kind::Note => "notes",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Article => "article",
            Kind::Note => "note",
        }
    }
}

/// The person credited for a document.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Author {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub url: Option<String>,
}

/// Represents a document tag. The `slug` is the indexing key; the `name` is
/// the human label. Tags whose source omits the slug get one derived from the
/// name.
#[derive(Clone, Debug)]
pub struct Tag {
    pub name: String,
    pub slug: String,
}

impl Tag {
    pub fn new(name: &str, slug: Option<&str>) -> Tag {
        Tag {
            name: name.to_owned(),
            slug: match slug {
                Some(slug) if !slug.is_empty() => slug.to_owned(),
                _ => slug::slugify(name),
            },
        }
    }

    /// The site-relative URL of the tag's listing page.
    pub fn url(&self) -> String {
        format!("/tag/{}/", self.slug)
    }
}

impl Hash for Tag {
    /// Implements [`Hash`] for [`Tag`] by delegating directly to the `slug`
    /// field.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slug.hash(state)
    }
}

impl PartialEq for Tag {
    /// Tags are equal when their slugs are equal, regardless of label.
    fn eq(&self, other: &Self) -> bool {
        self.slug == other.slug
    }
}
impl Eq for Tag {}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Tag, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            name: String,
            #[serde(default)]
            slug: Option<String>,
        }

        let raw = Raw::deserialize(deserializer)?;
        Ok(Tag::new(&raw.name, raw.slug.as_deref()))
    }
}

/// The illustration at the top of an article.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Hero {
    pub src: String,

    #[serde(default)]
    pub alt: String,
}

/// A long-form, dated post.
#[derive(Clone, Debug)]
pub struct Article {
    pub slug: String,
    pub title: String,
    pub subtitle: Option<String>,

    /// The publish date exactly as written in the source (`YYYY-MM-DD`).
    pub date: String,
    pub updated: Option<String>,
    pub author: Author,
    pub summary: Option<String>,
    pub tags: Vec<Tag>,
    pub hero: Option<Hero>,
    pub canonical_url: Option<String>,
    pub css: Option<String>,
    pub reading_time: u32,
    pub content_html: String,

    /// The parsed form of `date`.
    pub timestamp: NaiveDateTime,

    /// The file the article was loaded from.
    pub source_path: PathBuf,
}

/// A short note, optionally time-stamped and attributed to a source.
#[derive(Clone, Debug)]
pub struct Note {
    pub slug: String,
    pub title: String,

    /// The publish date exactly as written in the source (`YYYY-MM-DD` or
    /// `YYYY-MM-DDTHH:MM`).
    pub date: String,
    pub author: Author,
    pub tags: Vec<Tag>,

    /// Free-text provenance: a URL, a book, or a person.
    pub source: Option<String>,
    pub content_html: String,
    pub timestamp: NaiveDateTime,
    pub source_path: PathBuf,
}

/// The operations ordering, indexing, and feed assembly need from either
/// document variant.
pub trait Document {
    const KIND: Kind;

    fn slug(&self) -> &str;
    fn title(&self) -> &str;
    fn iso_date(&self) -> &str;
    fn timestamp(&self) -> NaiveDateTime;
    fn tags(&self) -> &[Tag];
    fn content_html(&self) -> &str;
    fn source_path(&self) -> &std::path::Path;

    /// The site-relative URL of the document's page, e.g. `/notes/{slug}/`.
    fn url_path(&self) -> String {
        format!("/{}/{}/", Self::KIND.section(), self.slug())
    }

    fn human_date(&self) -> String {
        human_date(self.timestamp())
    }
}

impl Document for Article {
    const KIND: Kind = Kind::Article;

    fn slug(&self) -> &str {
        &self.slug
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn iso_date(&self) -> &str {
        &self.date
    }
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
    fn tags(&self) -> &[Tag] {
        &self.tags
    }
    fn content_html(&self) -> &str {
        &self.content_html
    }
    fn source_path(&self) -> &std::path::Path {
        &self.source_path
    }
}

impl Document for Note {
    const KIND: Kind = Kind::Note;

    fn slug(&self) -> &str {
        &self.slug
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn iso_date(&self) -> &str {
        &self.date
    }
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
    fn tags(&self) -> &[Tag] {
        &self.tags
    }
    fn content_html(&self) -> &str {
        &self.content_html
    }
    fn source_path(&self) -> &std::path::Path {
        &self.source_path
    }
}

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Parses an article date (`YYYY-MM-DD`) into a midnight timestamp.
pub fn parse_date(s: &str) -> Result<NaiveDateTime, DateError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| DateError(s.to_owned()))
}

/// Parses a note date, which may carry a time (`YYYY-MM-DDTHH:MM`) or be a
/// plain date.
pub fn parse_date_time(s: &str) -> Result<NaiveDateTime, DateError> {
    match NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT) {
        Ok(t) => Ok(t),
        Err(_) => parse_date(s),
    }
}

/// Formats a timestamp as e.g. `January 2, 2006`.
pub fn human_date(t: NaiveDateTime) -> String {
    t.format("%B %-d, %Y").to_string()
}

/// Returned when a date field can't be parsed.
#[derive(Debug, PartialEq)]
pub struct DateError(pub String);

impl fmt::Display for DateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "bad date {:?}", self.0)
    }
}

impl std::error::Error for DateError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_date() {
        let t = parse_date("2024-03-09").unwrap();
        assert_eq!("2024-03-09 00:00:00", t.to_string());
        assert_eq!("March 9, 2024", human_date(t));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(
            Err(DateError("09/03/2024".to_owned())),
            parse_date("09/03/2024")
        );
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn test_parse_date_time_with_and_without_time() {
        let t = parse_date_time("2024-03-09T14:05").unwrap();
        assert_eq!("2024-03-09 14:05:00", t.to_string());
        let t = parse_date_time("2024-03-09").unwrap();
        assert_eq!("2024-03-09 00:00:00", t.to_string());
        assert!(parse_date_time("2024-03-09 14:05").is_err());
    }

    #[test]
    fn test_tag_slug_fallback() {
        let tag: Tag = serde_yaml::from_str("name: Rust Lang").unwrap();
        assert_eq!("rust-lang", tag.slug);
        let tag: Tag =
            serde_yaml::from_str("{name: Golang, slug: go}").unwrap();
        assert_eq!("go", tag.slug);
        assert_eq!("/tag/go/", tag.url());
        assert_eq!(Tag::new("Go", Some("go")), tag);
    }
}
