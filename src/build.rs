//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: loading documents
//! ([`crate::parser`]), ordering and indexing them ([`crate::order`],
//! [`crate::index`]), rendering every page ([`crate::write`]), writing the RSS
//! feeds ([`crate::feed`]), and copying the static directories into the output
//! directory.
//!
//! Everything that can fail on bad content (loading, date parsing, template
//! parsing, URL construction) happens before the output directory is touched.

use crate::config::Config;
use crate::derive::AssetRewriter;
use crate::feed::{self, Error as FeedError, FeedConfig, FeedItem};
use crate::index::{self, ListItem, TagIndex};
use crate::markup::{CommonMark, Markup};
use crate::order::Chronology;
use crate::parser::{Error as ParseError, Loader};
use crate::view::SiteView;
use crate::write::{Error as WriteError, Render, Templates, Writer};
use log::{debug, info};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Counts describing a finished build.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Summary {
    pub articles: usize,
    pub notes: usize,
    pub tags: usize,
    pub months: usize,
    pub note_pages: usize,
    pub label_conflicts: usize,
}

/// Builds the site from a [`Config`] object with the Markdown converter and
/// the templates under [`Config::templates_directory`].
pub fn build_site(config: &Config) -> Result<Summary> {
    let templates = Templates::load(&config.templates_directory, site_view(config))?;
    build_with(config, &CommonMark, &templates)
}

/// The site-wide values every page receives.
pub fn site_view(config: &Config) -> SiteView {
    SiteView {
        title: config.title.clone(),
        subtitle: config.subtitle.clone(),
        base_url: config.base_url.to_string(),
    }
}

/// Builds the site with an injected Markdown capability and renderer.
pub fn build_with<M: Markup, R: Render>(
    config: &Config,
    markup: &M,
    renderer: &R,
) -> Result<Summary> {
    let rewriter = AssetRewriter::new(&config.asset_prefix, &config.image_extension);
    let loader = Loader::new(markup, &rewriter);

    // collect all documents
    let articles = Chronology::new(loader.load_articles(&config.articles_directory)?);
    let notes = Chronology::new(loader.load_notes(&config.notes_directory)?);
    info!("loaded {} articles and {} notes", articles.len(), notes.len());

    // Articles are indexed before notes, each newest first. That order
    // decides which label a shared tag keeps.
    let mut tags = TagIndex::new();
    tags.add(articles.documents());
    tags.add(notes.documents());
    let tags = tags.finish();

    let months = index::archive(articles.documents());
    let note_items: Vec<ListItem> = notes.documents().iter().map(ListItem::of).collect();
    let note_pages = index::paginate(&note_items, config.notes_page_size);
    let home = index::latest(articles.documents(), config.home_page_size);

    let article_feed = feed::feed_items(&config.base_url, articles.documents())?;
    let note_feed = feed::feed_items(&config.base_url, notes.documents())?;
    let notes_url = config.base_url.join("notes/").map_err(FeedError::from)?;

    // Blow away the old output so pages of deleted documents don't linger.
    rmdir(&config.output_directory)?;

    let writer = Writer {
        renderer,
        output_directory: &config.output_directory,
    };
    writer.write_articles(&articles)?;
    writer.write_notes(notes.documents())?;
    writer.write_tags(&tags)?;
    writer.write_archive(&months)?;
    writer.write_note_listing(&note_pages)?;
    writer.write_home(&config.title, &config.subtitle, home)?;
    writer.write_not_found()?;

    // create the RSS feeds
    write_feed(
        &config.output_directory.join("feed.xml"),
        &FeedConfig {
            title: &config.articles_feed_title,
            link: &config.base_url,
            description: &config.articles_feed_description,
            build_time: config.build_time,
        },
        &article_feed,
    )?;
    write_feed(
        &config.output_directory.join("notes").join("feed.xml"),
        &FeedConfig {
            title: &config.notes_feed_title,
            link: &notes_url,
            description: &config.notes_feed_description,
            build_time: config.build_time,
        },
        &note_feed,
    )?;

    // copy static directories
    for dir in &config.static_directories {
        if dir.is_dir() {
            if let Some(name) = dir.file_name() {
                copy_dir(dir, &config.output_directory.join(name))?;
            }
        }
    }

    let summary = Summary {
        articles: articles.len(),
        notes: notes.len(),
        tags: tags.len(),
        months: months.len(),
        note_pages: note_pages.len(),
        label_conflicts: tags.conflicts().len(),
    };
    info!(
        "wrote {} tags, {} archive months, {} note pages to `{}`",
        summary.tags,
        summary.months,
        summary.note_pages,
        config.output_directory.display()
    );
    Ok(summary)
}

fn write_feed(path: &Path, config: &FeedConfig, items: &[FeedItem]) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|err| Error::Output {
            path: dir.to_owned(),
            err,
        })?;
    }
    let mut xml = Vec::new();
    feed::write_feed(config, items, &mut xml)?;
    fs::write(path, xml).map_err(|err| Error::Output {
        path: path.to_owned(),
        err,
    })?;
    debug!("wrote feed `{}` with {} items", path.display(), items.len());
    Ok(())
}

/// Copies `src` into `dst` recursively. Symbolic links are skipped.
fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    for result in WalkDir::new(src).sort_by_file_name() {
        let entry = result?;
        if entry.path_is_symlink() {
            continue;
        }
        // strip_prefix shouldn't fail since `src` is always an ancestor of
        // `entry.path()`
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let out = dst.join(relative);
        let copied = if entry.file_type().is_dir() {
            fs::create_dir_all(&out)
        } else {
            fs::copy(entry.path(), &out).map(|_| ())
        };
        copied.map_err(|err| Error::Output { path: out, err })?;
    }
    debug!("copied `{}` to `{}`", src.display(), dst.display());
    Ok(())
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during loading, writing,
/// feed creation, cleaning the output directory, and copying static files.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors during loading.
    Parse(ParseError),

    /// Returned for errors parsing templates or writing pages to disk.
    Write(WriteError),

    /// Returned for errors creating or writing a feed.
    Feed(FeedError),

    /// Returned for I/O problems while cleaning the output directory.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems writing feeds or static files.
    Output { path: PathBuf, err: std::io::Error },

    /// Returned for errors walking a static directory.
    WalkDir(walkdir::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Feed(err) => write!(f, "Writing feed: {}", err),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::Output { path, err } => {
                write!(f, "Writing '{}': {}", path.display(), err)
            }
            Error::WalkDir(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Feed(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::Output { path: _, err } => Some(err),
            Error::WalkDir(err) => Some(err),
        }
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<FeedError> for Error {
    /// Converts [`FeedError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: FeedError) -> Error {
        Error::Feed(err)
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::view::View;
    use chrono::{TimeZone, Utc};
    use std::cell::RefCell;

    struct Fixed;

    impl Markup for Fixed {
        fn render(&self, markdown: &str) -> String {
            format!("<p>{}</p>", markdown.trim())
        }
    }

    /// Renders each view as its debug representation.
    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<View>>,
    }

    impl Render for Recorder {
        fn render(&self, view: &View) -> crate::write::Result<String> {
            self.seen.borrow_mut().push(view.clone());
            Ok(format!("{:?}", view))
        }
    }

    fn write(root: &Path, name: &str, contents: &str) {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn site(root: &Path) -> Config {
        Config::new(root, Utc.timestamp_opt(1_700_000_000, 0).unwrap())
    }

    fn note(i: usize) -> String {
        format!(
            "---\nslug: n{}\ntitle: Note {}\ndate: 2024-01-{:02}T08:00\ntags: [{{name: Go, slug: go}}]\n---\nbody {}",
            i,
            i,
            i % 28 + 1,
            i
        )
    }

    #[test]
    fn test_build_writes_every_artifact() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "articles/a.md", "---\ntitle: A\ndate: 2024-02-01\ntags: [{name: Go, slug: go}]\n---\nA");
        write(root, "articles/b.md", "---\ntitle: B\ndate: 2024-03-01\n---\nB");
        write(root, "articles/d.md", "---\ntitle: D\ndate: 2024-04-01\ndraft: true\ntags: [{name: Secret, slug: secret}]\n---\nD");
        for i in 0..45 {
            write(root, &format!("notes/n{}.md", i), &note(i));
        }
        write(root, "css/site.css", "body {}");
        write(root, "images/x.png", "png");

        let config = site(root);
        let summary = build_with(&config, &Fixed, &Recorder::default())?;
        assert_eq!(
            Summary {
                articles: 2,
                notes: 45,
                tags: 1,
                months: 2,
                note_pages: 3,
                label_conflicts: 0,
            },
            summary
        );

        let out = &config.output_directory;
        for path in &[
            "articles/a/index.html",
            "articles/b/index.html",
            "notes/n0/index.html",
            "tag/go/index.html",
            "archive/2024/02/index.html",
            "archive/2024/03/index.html",
            "archive/index.html",
            "notes/index.html",
            "notes/page/2/index.html",
            "notes/page/3/index.html",
            "index.html",
            "404.html",
            "feed.xml",
            "notes/feed.xml",
            "css/site.css",
            "images/x.png",
        ] {
            assert!(out.join(path).is_file(), "missing {}", path);
        }
        assert!(!out.join("articles/d").exists());
        assert!(!out.join("tag/secret").exists());
        assert!(!out.join("notes/page/4").exists());

        let feed = fs::read_to_string(out.join("feed.xml")).unwrap();
        assert!(feed.contains("https://example.com/articles/b/"));
        assert!(!feed.contains("articles/d/"));
        Ok(())
    }

    #[test]
    fn test_bad_date_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "articles/ok.md", "---\ntitle: OK\ndate: 2024-02-01\n---\n");
        write(root, "notes/bad.md", "---\ntitle: Bad\ndate: yesterday\n---\n");

        let config = site(root);
        let err = build_with(&config, &Fixed, &Recorder::default()).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert!(err.to_string().contains("bad.md"), "{}", err);
        assert!(!config.output_directory.exists());
    }

    #[test]
    fn test_build_cleans_stale_output() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "public/articles/gone/index.html", "stale");
        let config = site(root);
        build_with(&config, &Fixed, &Recorder::default())?;
        assert!(!config.output_directory.join("articles/gone").exists());
        assert!(config.output_directory.join("notes/index.html").is_file());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_dir_skips_symlinks() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("images");
        write(&src, "a/b.jpg", "jpg");
        std::os::unix::fs::symlink(src.join("a/b.jpg"), src.join("link.jpg")).unwrap();
        let dst = dir.path().join("out");
        copy_dir(&src, &dst)?;
        assert_eq!("jpg", fs::read_to_string(dst.join("a/b.jpg")).unwrap());
        assert!(!dst.join("link.jpg").exists());
        Ok(())
    }
}
