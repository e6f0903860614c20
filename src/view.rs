//! Plain-data view-models handed to the renderer, and their conversion into
//! template [`Value`]s. Views own their data; the only relationship they
//! carry is an article's resolved previous/next links.

use std::collections::HashMap;

use gtmpl_value::Value;

use crate::document::{human_date, Article, Author, Hero, Note, Tag};
use crate::index::{ListItem, Month, NotePage, TagBucket};
use crate::order::Chronology;

/// Site-wide values made available to every page as `site`.
#[derive(Clone, Debug, PartialEq)]
pub struct SiteView {
    pub title: String,
    pub subtitle: String,
    pub base_url: String,
}

/// A link to a neighboring article.
#[derive(Clone, Debug, PartialEq)]
pub struct NavLink {
    pub slug: String,
    pub title: String,
    pub url: String,
}

impl NavLink {
    fn to(article: &Article) -> NavLink {
        NavLink {
            slug: article.slug.clone(),
            title: article.title.clone(),
            url: format!("/articles/{}/", article.slug),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArticleView {
    pub slug: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub date: String,
    pub date_human: String,
    pub updated: Option<String>,
    pub author: Author,
    pub summary: Option<String>,
    pub tags: Vec<Tag>,
    pub hero: Option<Hero>,
    pub canonical_url: Option<String>,
    pub css: Option<String>,
    pub reading_time: u32,
    pub content_html: String,

    /// The chronologically older article.
    pub prev: Option<NavLink>,

    /// The chronologically newer article.
    pub next: Option<NavLink>,
}

impl ArticleView {
    /// Builds the view of the article at position `i`, resolving its
    /// neighbor links.
    pub fn new(articles: &Chronology<Article>, i: usize) -> ArticleView {
        let a = &articles.documents()[i];
        ArticleView {
            slug: a.slug.clone(),
            title: a.title.clone(),
            subtitle: a.subtitle.clone(),
            date: a.date.clone(),
            date_human: human_date(a.timestamp),
            updated: a.updated.clone(),
            author: a.author.clone(),
            summary: a.summary.clone(),
            tags: a.tags.clone(),
            hero: a.hero.clone(),
            canonical_url: a.canonical_url.clone(),
            css: a.css.clone(),
            reading_time: a.reading_time,
            content_html: a.content_html.clone(),
            prev: articles.prev(i).map(NavLink::to),
            next: articles.next(i).map(NavLink::to),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NoteView {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub date_human: String,
    pub author: Author,
    pub tags: Vec<Tag>,
    pub source: Option<String>,

    /// Whether `source` is an `http(s)` URL and can be linked.
    pub source_is_url: bool,
    pub content_html: String,
}

impl From<&Note> for NoteView {
    fn from(n: &Note) -> NoteView {
        NoteView {
            slug: n.slug.clone(),
            title: n.title.clone(),
            date: n.date.clone(),
            date_human: human_date(n.timestamp),
            author: n.author.clone(),
            tags: n.tags.clone(),
            source: n.source.clone(),
            source_is_url: n
                .source
                .as_deref()
                .map(|s| s.starts_with("http://") || s.starts_with("https://"))
                .unwrap_or(false),
            content_html: n.content_html.clone(),
        }
    }
}

/// A titled list of items: tag pages, archive pages, and the home page.
#[derive(Clone, Debug, PartialEq)]
pub struct ListView {
    pub title: String,
    pub subtitle: String,
    pub items: Vec<ListItem>,
}

impl ListView {
    pub fn tag(bucket: &TagBucket) -> ListView {
        ListView {
            title: format!("Tag: {}", bucket.label),
            subtitle: String::new(),
            items: bucket.items.clone(),
        }
    }

    pub fn month(month: &Month) -> ListView {
        ListView {
            title: format!("Archive {}", month.label),
            subtitle: String::new(),
            items: month.items.clone(),
        }
    }

    pub fn archive(months: &[Month]) -> ListView {
        ListView {
            title: String::from("Archive"),
            subtitle: String::from("By month"),
            items: months.iter().map(Month::to_list_item).collect(),
        }
    }
}

/// One page of the note listing.
#[derive(Clone, Debug, PartialEq)]
pub struct NoteListView {
    pub title: String,
    pub subtitle: String,
    pub items: Vec<ListItem>,
    pub current_page: usize,
    pub total_pages: usize,
    pub prev_url: String,
    pub next_url: String,
}

impl From<&NotePage<'_>> for NoteListView {
    fn from(page: &NotePage) -> NoteListView {
        NoteListView {
            title: String::from("Notes"),
            subtitle: String::from("Quick reference notes"),
            items: page.items.to_vec(),
            current_page: page.number,
            total_pages: page.total,
            prev_url: page.prev_url.clone(),
            next_url: page.next_url.clone(),
        }
    }
}

/// Every kind of page the site has. Each variant is rendered with its own
/// template.
#[derive(Clone, Debug, PartialEq)]
pub enum View {
    Article(ArticleView),
    Note(NoteView),
    List(ListView),
    NoteList(NoteListView),
    NotFound,
}

impl View {
    /// The name of the template this view is rendered with.
    pub fn template(&self) -> &'static str {
        match self {
            View::Article(_) => "article",
            View::Note(_) => "note",
            View::List(_) => "list",
            View::NoteList(_) => "note_list",
            View::NotFound => "404",
        }
    }

    /// Converts the view into a template value, adding `site` alongside the
    /// view's own fields.
    pub fn to_value(&self, site: &SiteView) -> Value {
        let mut m = match self {
            View::Article(v) => v.fields(),
            View::Note(v) => v.fields(),
            View::List(v) => v.fields(),
            View::NoteList(v) => v.fields(),
            View::NotFound => object(vec![("title", string("Not found"))]),
        };
        m.insert("site".to_owned(), site.to_value());
        Value::Object(m)
    }
}

fn string(s: &str) -> Value {
    Value::String(s.to_owned())
}

fn optional(s: &Option<String>) -> Value {
    match s {
        Some(s) => string(s),
        None => Value::Nil,
    }
}

fn object(fields: Vec<(&str, Value)>) -> HashMap<String, Value> {
    fields
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect()
}

impl SiteView {
    fn to_value(&self) -> Value {
        Value::Object(object(vec![
            ("title", string(&self.title)),
            ("subtitle", string(&self.subtitle)),
            ("base_url", string(&self.base_url)),
        ]))
    }
}

impl From<&Author> for Value {
    fn from(a: &Author) -> Value {
        Value::Object(object(vec![
            ("name", string(&a.name)),
            ("url", optional(&a.url)),
        ]))
    }
}

impl From<&Tag> for Value {
    /// Converts [`Tag`]s into [`Value`]s for templating.
    fn from(t: &Tag) -> Value {
        Value::Object(object(vec![
            ("name", string(&t.name)),
            ("slug", string(&t.slug)),
            ("url", Value::String(t.url())),
        ]))
    }
}

impl From<&ListItem> for Value {
    fn from(i: &ListItem) -> Value {
        Value::Object(object(vec![
            ("title", string(&i.title)),
            ("url", string(&i.url)),
            ("iso_date", string(&i.iso_date)),
            ("human_date", string(&i.human_date)),
            (
                "kind",
                string(i.kind.map(|k| k.as_str()).unwrap_or_default()),
            ),
        ]))
    }
}

fn tags(tags: &[Tag]) -> Value {
    Value::Array(tags.iter().map(Value::from).collect())
}

fn items(items: &[ListItem]) -> Value {
    Value::Array(items.iter().map(Value::from).collect())
}

fn nav(link: &Option<NavLink>) -> Value {
    match link {
        Some(l) => Value::Object(object(vec![
            ("slug", string(&l.slug)),
            ("title", string(&l.title)),
            ("url", string(&l.url)),
        ])),
        None => Value::Nil,
    }
}

impl ArticleView {
    fn fields(&self) -> HashMap<String, Value> {
        object(vec![
            ("slug", string(&self.slug)),
            ("title", string(&self.title)),
            ("subtitle", optional(&self.subtitle)),
            ("date", string(&self.date)),
            ("date_human", string(&self.date_human)),
            ("updated", optional(&self.updated)),
            ("author", Value::from(&self.author)),
            ("summary", optional(&self.summary)),
            ("tags", tags(&self.tags)),
            (
                "hero",
                match &self.hero {
                    Some(h) => Value::Object(object(vec![
                        ("src", string(&h.src)),
                        ("alt", string(&h.alt)),
                    ])),
                    None => Value::Nil,
                },
            ),
            ("canonical_url", optional(&self.canonical_url)),
            ("css", optional(&self.css)),
            ("reading_time", Value::from(i64::from(self.reading_time))),
            ("content_html", string(&self.content_html)),
            ("prev", nav(&self.prev)),
            ("next", nav(&self.next)),
        ])
    }
}

impl NoteView {
    fn fields(&self) -> HashMap<String, Value> {
        object(vec![
            ("slug", string(&self.slug)),
            ("title", string(&self.title)),
            ("date", string(&self.date)),
            ("date_human", string(&self.date_human)),
            ("author", Value::from(&self.author)),
            ("tags", tags(&self.tags)),
            ("source", optional(&self.source)),
            ("source_is_url", Value::Bool(self.source_is_url)),
            ("content_html", string(&self.content_html)),
        ])
    }
}

impl ListView {
    fn fields(&self) -> HashMap<String, Value> {
        object(vec![
            ("title", string(&self.title)),
            ("subtitle", string(&self.subtitle)),
            ("items", items(&self.items)),
        ])
    }
}

impl NoteListView {
    fn fields(&self) -> HashMap<String, Value> {
        object(vec![
            ("title", string(&self.title)),
            ("subtitle", string(&self.subtitle)),
            ("items", items(&self.items)),
            ("current_page", Value::from(self.current_page as i64)),
            ("total_pages", Value::from(self.total_pages as i64)),
            ("prev_url", string(&self.prev_url)),
            ("next_url", string(&self.next_url)),
        ])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::document::parse_date;
    use std::path::PathBuf;

    fn article(slug: &str, date: &str) -> Article {
        Article {
            slug: slug.to_owned(),
            title: slug.to_uppercase(),
            subtitle: None,
            date: date.to_owned(),
            updated: None,
            author: Author::default(),
            summary: None,
            tags: Vec::new(),
            hero: Some(Hero {
                src: "/images/h.webp".to_owned(),
                alt: "h".to_owned(),
            }),
            canonical_url: None,
            css: None,
            reading_time: 3,
            content_html: "<p>x</p>".to_owned(),
            timestamp: parse_date(date).unwrap(),
            source_path: PathBuf::new(),
        }
    }

    #[test]
    fn test_article_view_links() {
        let articles = Chronology::new(vec![
            article("a", "2020-01-01"),
            article("b", "2021-01-01"),
            article("c", "2022-01-01"),
        ]);
        let v = ArticleView::new(&articles, 1);
        assert_eq!("b", v.slug);
        assert_eq!("January 1, 2021", v.date_human);
        assert_eq!("/articles/a/", v.prev.unwrap().url);
        assert_eq!("/articles/c/", v.next.unwrap().url);

        let newest = ArticleView::new(&articles, 0);
        assert_eq!(None, newest.next);
        let oldest = ArticleView::new(&articles, 2);
        assert_eq!(None, oldest.prev);
    }

    #[test]
    fn test_note_view_source_is_url() {
        let mut note = Note {
            slug: "n".to_owned(),
            title: "N".to_owned(),
            date: "2024-01-01".to_owned(),
            author: Author::default(),
            tags: Vec::new(),
            source: Some("https://example.org/book".to_owned()),
            content_html: String::new(),
            timestamp: parse_date("2024-01-01").unwrap(),
            source_path: PathBuf::new(),
        };
        assert!(NoteView::from(&note).source_is_url);
        note.source = Some("A Book".to_owned());
        assert!(!NoteView::from(&note).source_is_url);
        note.source = None;
        assert!(!NoteView::from(&note).source_is_url);
    }

    #[test]
    fn test_to_value_includes_site_and_fields() {
        let articles = Chronology::new(vec![article("only", "2020-01-01")]);
        let site = SiteView {
            title: "Site".to_owned(),
            subtitle: String::new(),
            base_url: "https://example.com/".to_owned(),
        };
        match View::Article(ArticleView::new(&articles, 0)).to_value(&site) {
            Value::Object(m) => {
                assert!(matches!(m.get("site"), Some(Value::Object(_))));
                assert!(matches!(m.get("prev"), Some(Value::Nil)));
                assert!(matches!(m.get("hero"), Some(Value::Object(_))));
                match m.get("title") {
                    Some(Value::String(s)) => assert_eq!("ONLY", s),
                    _ => panic!("title should be a string"),
                }
            }
            _ => panic!("wanted an object"),
        }
    }

    #[test]
    fn test_not_found_has_title() {
        let site = SiteView {
            title: "Site".to_owned(),
            subtitle: String::new(),
            base_url: "https://example.com/".to_owned(),
        };
        match View::NotFound.to_value(&site) {
            Value::Object(m) => {
                assert!(matches!(m.get("site"), Some(Value::Object(_))));
                match m.get("title") {
                    Some(Value::String(s)) => assert_eq!("Not found", s),
                    _ => panic!("title should be a string"),
                }
            }
            _ => panic!("wanted an object"),
        }
    }
}
