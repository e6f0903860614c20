//! Defines [`Config`], every path and constant a build needs. The defaults
//! describe a site rooted at the working directory; an optional `site.yaml`
//! in the root overrides the site-level settings.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the optional project file in the site root.
pub const PROJECT_FILE: &str = "site.yaml";

/// Site-level settings readable from [`PROJECT_FILE`]. Every field is
/// optional.
#[derive(Deserialize, Default)]
#[serde(default)]
struct Project {
    base_url: Option<Url>,
    title: Option<String>,
    subtitle: Option<String>,
    articles_feed_title: Option<String>,
    articles_feed_description: Option<String>,
    notes_feed_title: Option<String>,
    notes_feed_description: Option<String>,
    notes_page_size: Option<usize>,
    home_page_size: Option<usize>,
}

/// Bundled configuration for a single build.
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory holding article sources.
    pub articles_directory: PathBuf,

    /// Directory holding note sources.
    pub notes_directory: PathBuf,

    /// Directory holding the page templates and their `partials/`.
    pub templates_directory: PathBuf,

    /// Directory the site is written to. It's removed before each build.
    pub output_directory: PathBuf,

    /// Directories copied verbatim into the output directory (under their
    /// own names) when they exist.
    pub static_directories: Vec<PathBuf>,

    /// The absolute site URL. Feed links and GUIDs are built from it, so it
    /// must stay stable across builds.
    pub base_url: Url,

    pub title: String,
    pub subtitle: String,
    pub articles_feed_title: String,
    pub articles_feed_description: String,
    pub notes_feed_title: String,
    pub notes_feed_description: String,

    /// The number of notes per listing page.
    pub notes_page_size: usize,

    /// The number of articles on the home page.
    pub home_page_size: usize,

    /// The URL prefix under which raster images are rewritten.
    pub asset_prefix: String,

    /// The extension raster images are rewritten to.
    pub image_extension: String,

    /// Stamped into each feed's `lastBuildDate`. Fixing it makes the output
    /// tree reproducible.
    pub build_time: DateTime<Utc>,
}

impl Config {
    /// Returns the default layout for a site rooted at `root`.
    pub fn new(root: &Path, build_time: DateTime<Utc>) -> Config {
        Config {
            articles_directory: root.join("articles"),
            notes_directory: root.join("notes"),
            templates_directory: root.join("templates"),
            output_directory: root.join("public"),
            static_directories: vec![root.join("css"), root.join("images")],
            // Parsing a literal URL can't fail.
            base_url: Url::parse("https://example.com/").unwrap(),
            title: String::from("Quill"),
            subtitle: String::new(),
            articles_feed_title: String::from("Articles"),
            articles_feed_description: String::from("Articles and posts"),
            notes_feed_title: String::from("Notes"),
            notes_feed_description: String::from("Quick reference notes"),
            notes_page_size: 20,
            home_page_size: 12,
            asset_prefix: String::from("/images/"),
            image_extension: String::from("webp"),
            build_time,
        }
    }

    /// Loads the configuration for the site rooted at `root`, applying
    /// [`PROJECT_FILE`] when present.
    pub fn from_directory(root: &Path, build_time: DateTime<Utc>) -> Result<Config> {
        let mut config = Config::new(root, build_time);
        let path = root.join(PROJECT_FILE);
        if path.is_file() {
            let file = File::open(&path).map_err(|err| Error::Open {
                path: path.clone(),
                err,
            })?;
            let project: Project = serde_yaml::from_reader(file)
                .map_err(|err| Error::Parse { path, err })?;
            config.apply(project)?;
        }
        Ok(config)
    }

    fn apply(&mut self, project: Project) -> Result<()> {
        if let Some(base_url) = project.base_url {
            self.base_url = with_trailing_slash(base_url);
        }
        if let Some(page_size) = project.notes_page_size {
            if page_size < 1 {
                return Err(Error::InvalidPageSize(page_size));
            }
            self.notes_page_size = page_size;
        }
        let fields = [
            (project.title, &mut self.title),
            (project.subtitle, &mut self.subtitle),
            (project.articles_feed_title, &mut self.articles_feed_title),
            (
                project.articles_feed_description,
                &mut self.articles_feed_description,
            ),
            (project.notes_feed_title, &mut self.notes_feed_title),
            (
                project.notes_feed_description,
                &mut self.notes_feed_description,
            ),
        ];
        for (value, field) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
        if let Some(home_page_size) = project.home_page_size {
            self.home_page_size = home_page_size;
        }
        Ok(())
    }
}

// `Url::join` treats the last segment of a slash-less base as a file name.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the configuration.
#[derive(Debug)]
pub enum Error {
    /// Returned when the project file exists but can't be opened.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when the project file isn't valid YAML for [`Project`].
    Parse { path: PathBuf, err: serde_yaml::Error },

    /// Returned when the notes page size is zero.
    InvalidPageSize(usize),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Open { path, err } => {
                write!(f, "Opening project file '{}': {}", path.display(), err)
            }
            Error::Parse { path, err } => {
                write!(f, "Parsing project file '{}': {}", path.display(), err)
            }
            Error::InvalidPageSize(size) => {
                write!(f, "notes_page_size must be at least 1, got {}", size)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Open { path: _, err } => Some(err),
            Error::Parse { path: _, err } => Some(err),
            Error::InvalidPageSize(_) => None,
        }
    }
}
