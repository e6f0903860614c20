//! Defines the [`Loader`] and its [`Error`] type: the logic for reading
//! [`Article`] and [`Note`] sources from the file system into memory. The
//! loader applies the per-variant defaults and derivations (slug fallback,
//! date parsing, reading time, asset rewriting) so that everything downstream
//! sees fully-populated documents.

use std::{
    collections::HashMap,
    fmt,
    fs,
    path::{Path, PathBuf},
};

use log::debug;
use serde::{de::DeserializeOwned, Deserialize};
use walkdir::WalkDir;

use crate::derive::{self, AssetRewriter};
use crate::document::{self, Article, Author, DateError, Document, Hero, Note, Tag};
use crate::markup::Markup;

const MARKDOWN_EXTENSION: &str = "md";
const JSON_EXTENSION: &str = "json";

/// The two source formats a content directory may hold.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Format {
    /// JSON carrying the body as already-rendered HTML.
    Prerendered,

    /// Fenced YAML front matter followed by a Markdown body.
    Markdown,
}

impl Format {
    fn of(path: &Path) -> Option<Format> {
        match path.extension()?.to_str()? {
            JSON_EXTENSION => Some(Format::Prerendered),
            MARKDOWN_EXTENSION => Some(Format::Markdown),
            _ => None,
        }
    }
}

/// Parses [`Article`] and [`Note`] objects from source files.
pub struct Loader<'a, M: Markup> {
    /// `markup` splits front matter and converts Markdown bodies.
    markup: &'a M,

    /// `rewriter` points raster image references at converted images.
    rewriter: &'a AssetRewriter,
}

impl<'a, M: Markup> Loader<'a, M> {
    pub fn new(markup: &'a M, rewriter: &'a AssetRewriter) -> Loader<'a, M> {
        Loader { markup, rewriter }
    }

    /// Loads every non-draft article under `dir`, in file-name order. A
    /// missing directory holds no articles.
    pub fn load_articles(&self, dir: &Path) -> Result<Vec<Article>> {
        self.load_all(dir)
    }

    /// Loads every non-draft note under `dir`, in file-name order. A missing
    /// directory holds no notes.
    pub fn load_notes(&self, dir: &Path) -> Result<Vec<Note>> {
        self.load_all(dir)
    }

    fn load_all<D: Source>(&self, dir: &Path) -> Result<Vec<D>> {
        let mut documents: Vec<D> = Vec::new();
        if !dir.is_dir() {
            debug!("no {} directory at `{}`", D::KIND.section(), dir.display());
            return Ok(documents);
        }

        for result in WalkDir::new(dir).sort_by_file_name() {
            let entry = result?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let format = match Format::of(path) {
                Some(format) => format,
                None => continue,
            };
            if let Some(document) = self.load(path, format)? {
                documents.push(document);
            }
        }

        check_unique_slugs(&documents)?;
        Ok(documents)
    }

    /// Loads a single document. Returns [`None`] for drafts and for Markdown
    /// files without front matter.
    fn load<D: Source>(&self, path: &Path, format: Format) -> Result<Option<D>> {
        match self._load(path, format) {
            Ok(d) => Ok(d),
            Err(e) => Err(Error::Annotated(
                format!("loading {} `{}`", D::KIND.as_str(), path.display()),
                Box::new(e),
            )),
        }
    }

    fn _load<D: Source>(&self, path: &Path, format: Format) -> Result<Option<D>> {
        let contents = fs::read_to_string(path)?;

        let (meta, content_html) = match format {
            Format::Prerendered => {
                let draft = serde_json::from_str::<DraftFlag>(&contents)
                    .map(|f| f.draft)
                    .unwrap_or(false);
                if draft {
                    debug!("skipping draft `{}`", path.display());
                    return Ok(None);
                }
                let p: Prerendered<D::Meta> = serde_json::from_str(&contents)?;
                (p.meta, p.content_html)
            }
            Format::Markdown => {
                let (yaml, body) = match self.markup.parse_front_matter(&contents) {
                    Some(parts) => parts,
                    None => {
                        debug!("skipping `{}`: no front matter", path.display());
                        return Ok(None);
                    }
                };
                let draft = serde_yaml::from_str::<DraftFlag>(yaml)
                    .map(|f| f.draft)
                    .unwrap_or(false);
                if draft {
                    debug!("skipping draft `{}`", path.display());
                    return Ok(None);
                }
                let meta: D::Meta = serde_yaml::from_str(yaml)?;
                (meta, self.markup.render(body))
            }
        };

        let content_html = self.rewriter.rewrite_html(&content_html);
        D::build(meta, content_html, path, self.rewriter).map(Some)
    }
}

fn check_unique_slugs<D: Document>(documents: &[D]) -> Result<()> {
    let mut seen: HashMap<&str, &Path> = HashMap::with_capacity(documents.len());
    for d in documents {
        if let Some(first) = seen.insert(d.slug(), d.source_path()) {
            return Err(Error::DuplicateSlug {
                slug: d.slug().to_owned(),
                first: first.to_owned(),
                second: d.source_path().to_owned(),
            });
        }
    }
    Ok(())
}

// A slug written in the source wins; otherwise it comes from the file stem.
fn slug_or_stem(slug: String, path: &Path) -> String {
    if !slug.is_empty() {
        return slug;
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    slug::slugify(stem)
}

/// The pre-rendered format: metadata and body HTML in one JSON object.
#[derive(Deserialize)]
struct Prerendered<M> {
    #[serde(flatten)]
    meta: M,

    #[serde(default)]
    content_html: String,
}

/// A document variant the loader can produce from metadata plus body HTML.
trait Source: Document + Sized {
    type Meta: DeserializeOwned;

    fn build(
        meta: Self::Meta,
        content_html: String,
        path: &Path,
        rewriter: &AssetRewriter,
    ) -> Result<Self>;
}

/// Read on its own before the metadata, so a draft is dropped even when the
/// rest of its fields are still missing or malformed. A flag that can't be
/// read counts as not a draft; the full parse then reports the problem.
#[derive(Deserialize)]
struct DraftFlag {
    draft: bool,
}

#[derive(Deserialize)]
struct ArticleMeta {
    #[serde(default)]
    slug: String,
    title: String,
    #[serde(default)]
    subtitle: Option<String>,
    date: String,
    #[serde(default)]
    updated: Option<String>,
    #[serde(default)]
    author: Author,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    tags: Vec<Tag>,
    #[serde(default)]
    hero: Option<Hero>,
    #[serde(default)]
    canonical_url: Option<String>,
    #[serde(default)]
    css: Option<String>,
    #[serde(default)]
    reading_time_min: Option<i64>,
}

impl Source for Article {
    type Meta = ArticleMeta;

    fn build(
        meta: ArticleMeta,
        content_html: String,
        path: &Path,
        rewriter: &AssetRewriter,
    ) -> Result<Article> {
        let timestamp = document::parse_date(&meta.date)
            .map_err(|err| Error::Date { field: "date", err })?;
        Ok(Article {
            slug: slug_or_stem(meta.slug, path),
            title: meta.title,
            subtitle: meta.subtitle,
            date: meta.date,
            updated: meta.updated,
            author: meta.author,
            summary: meta.summary,
            tags: meta.tags,
            hero: meta.hero.map(|hero| Hero {
                src: rewriter.rewrite_path(&hero.src),
                alt: hero.alt,
            }),
            canonical_url: meta.canonical_url,
            css: meta.css,
            reading_time: derive::reading_time_or(
                meta.reading_time_min,
                &content_html,
            ),
            content_html,
            timestamp,
            source_path: path.to_owned(),
        })
    }
}

#[derive(Deserialize)]
struct NoteMeta {
    #[serde(default)]
    slug: String,
    title: String,
    date: String,
    #[serde(default)]
    author: Author,
    #[serde(default)]
    tags: Vec<Tag>,
    #[serde(default)]
    source: Option<String>,
}

impl Source for Note {
    type Meta = NoteMeta;

    fn build(
        meta: NoteMeta,
        content_html: String,
        path: &Path,
        _rewriter: &AssetRewriter,
    ) -> Result<Note> {
        let timestamp = document::parse_date_time(&meta.date)
            .map_err(|err| Error::Date { field: "date", err })?;
        Ok(Note {
            slug: slug_or_stem(meta.slug, path),
            title: meta.title,
            date: meta.date,
            author: meta.author,
            tags: meta.tags,
            source: meta.source,
            content_html,
            timestamp,
            source_path: path.to_owned(),
        })
    }
}

/// Represents the result of a load operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading documents.
#[derive(Debug)]
pub enum Error {
    /// Returned when a date field can't be parsed.
    Date { field: &'static str, err: DateError },

    /// Returned when two documents of the same variant share a slug.
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Returned when there was an error parsing front matter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when there was an error parsing a pre-rendered document.
    DeserializeJson(serde_json::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Date { field, err } => write!(f, "field `{}`: {}", field, err),
            Error::DuplicateSlug {
                slug,
                first,
                second,
            } => write!(
                f,
                "duplicate slug `{}` in `{}` and `{}`",
                slug,
                first.display(),
                second.display(),
            ),
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::DeserializeJson(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Date { field: _, err } => Some(err),
            Error::DuplicateSlug { .. } => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::DeserializeJson(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::DeserializeJson(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`].
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
