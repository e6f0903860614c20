//! Maps views to output files and hands them to a [`Render`] implementation.
//! [`Templates`] is the gtmpl-backed renderer used by the binary; tests can
//! plug in anything that turns a [`View`] into a string.

use crate::document::{Article, Note};
use crate::index::{ListItem, Month, NotePage, TagIndex};
use crate::order::Chronology;
use crate::view::{ArticleView, ListView, NoteListView, NoteView, SiteView, View};
use gtmpl::Template;
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// Turns a [`View`] into markup.
pub trait Render {
    fn render(&self, view: &View) -> Result<String>;
}

/// The templates of a site, one per [`View`] kind.
pub struct Templates {
    templates: HashMap<&'static str, Template>,
    site: SiteView,
}

/// The view kinds, named as their template files (`{name}.html.tmpl`).
const TEMPLATE_NAMES: &[&str] = &["article", "note", "list", "note_list", "404"];
const TEMPLATE_EXTENSION: &str = ".html.tmpl";
const PARTIALS_DIRECTORY: &str = "partials";

impl Templates {
    /// Parses every template under `dir`. Each is combined with all files in
    /// `dir/partials/` (in file-name order) so pages can share definitions.
    pub fn load(dir: &Path, site: SiteView) -> Result<Templates> {
        let partials = partial_files(&dir.join(PARTIALS_DIRECTORY))?;
        let mut templates = HashMap::with_capacity(TEMPLATE_NAMES.len());
        for name in TEMPLATE_NAMES {
            let main = dir.join(format!("{}{}", name, TEMPLATE_EXTENSION));
            let files = std::iter::once(main).chain(partials.iter().cloned());
            templates.insert(*name, parse_template(files)?);
        }
        Ok(Templates { templates, site })
    }
}

impl Render for Templates {
    fn render(&self, view: &View) -> Result<String> {
        let template = self
            .templates
            .get(view.template())
            .ok_or_else(|| Error::Template(format!("no template `{}`", view.template())))?;
        let context = gtmpl::Context::from(view.to_value(&self.site))?;
        let mut out = Vec::new();
        template.execute(&mut out, &context)?;
        String::from_utf8(out).map_err(|e| Error::Template(e.to_string()))
    }
}

fn partial_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|err| Error::Open {
        path: dir.to_owned(),
        err,
    })? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

// Loads the template file contents, concatenates them, and parses the result
// into a template.
fn parse_template<P: AsRef<Path>>(template_files: impl Iterator<Item = P>) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        use std::io::Read;
        let template_file = template_file.as_ref();
        File::open(&template_file)
            .map_err(|e| Error::Open {
                path: template_file.to_owned(),
                err: e,
            })?
            .read_to_string(&mut contents)?;
        contents.push(' ');
    }

    let mut template = Template::default();
    template.parse(&contents)?;
    Ok(template)
}

/// Maps a site-relative page URL to its file under the output directory,
/// e.g. `/notes/page/2/` to `notes/page/2/index.html`.
pub fn output_path(url: &str) -> PathBuf {
    let mut path: PathBuf = url.split('/').filter(|s| !s.is_empty()).collect();
    path.push("index.html");
    path
}

/// The path of the not-found page, relative to the output directory.
pub const NOT_FOUND_PATH: &str = "404.html";

/// Responsible for writing every page of the site to disk.
pub struct Writer<'a, R: Render> {
    pub renderer: &'a R,

    /// The root of the output tree.
    pub output_directory: &'a Path,
}

impl<R: Render> Writer<'_, R> {
    /// Renders one view and writes it to `relative_path` under the output
    /// directory.
    fn write_page(&self, relative_path: &Path, view: &View) -> Result<()> {
        let path = self.output_directory.join(relative_path);
        let html = self
            .renderer
            .render(view)
            .map_err(|e| Error::Annotated(format!("rendering `{}`", path.display()), Box::new(e)))?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|err| Error::Write {
                path: dir.to_owned(),
                err,
            })?;
        }
        fs::write(&path, html).map_err(|err| Error::Write { path, err })
    }

    /// Writes `/articles/{slug}/index.html` for every article.
    pub fn write_articles(&self, articles: &Chronology<Article>) -> Result<()> {
        for (i, a) in articles.documents().iter().enumerate() {
            let view = View::Article(ArticleView::new(articles, i));
            self.write_page(&output_path(&format!("/articles/{}/", a.slug)), &view)?;
        }
        debug!("wrote {} article pages", articles.len());
        Ok(())
    }

    /// Writes `/notes/{slug}/index.html` for every note.
    pub fn write_notes(&self, notes: &[Note]) -> Result<()> {
        for n in notes {
            let view = View::Note(NoteView::from(n));
            self.write_page(&output_path(&format!("/notes/{}/", n.slug)), &view)?;
        }
        debug!("wrote {} note pages", notes.len());
        Ok(())
    }

    /// Writes `/tag/{slug}/index.html` for every tag bucket.
    pub fn write_tags(&self, tags: &TagIndex) -> Result<()> {
        for (slug, bucket) in tags.iter() {
            let view = View::List(ListView::tag(bucket));
            self.write_page(&output_path(&format!("/tag/{}/", slug)), &view)?;
        }
        Ok(())
    }

    /// Writes one page per month plus the `/archive/` index.
    pub fn write_archive(&self, months: &[Month]) -> Result<()> {
        for m in months {
            self.write_page(&output_path(&m.url()), &View::List(ListView::month(m)))?;
        }
        self.write_page(
            &output_path("/archive/"),
            &View::List(ListView::archive(months)),
        )
    }

    /// Writes every page of the note listing.
    pub fn write_note_listing(&self, pages: &[NotePage]) -> Result<()> {
        for page in pages {
            let view = View::NoteList(NoteListView::from(page));
            self.write_page(&output_path(&page.url()), &view)?;
        }
        Ok(())
    }

    /// Writes the home page listing `items`.
    pub fn write_home(&self, title: &str, subtitle: &str, items: Vec<ListItem>) -> Result<()> {
        let view = View::List(ListView {
            title: title.to_owned(),
            subtitle: subtitle.to_owned(),
            items,
        });
        self.write_page(&output_path("/"), &view)
    }

    pub fn write_not_found(&self) -> Result<()> {
        self.write_page(Path::new(NOT_FOUND_PATH), &View::NotFound)
    }
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error parsing or executing a template.
    Template(String),

    /// Returned for I/O problems while opening template files.
    Open { path: PathBuf, err: io::Error },

    /// Returned when an output file or directory can't be written.
    Write { path: PathBuf, err: io::Error },

    /// Returned for other I/O errors.
    Io(io::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::Open { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::Write { path, err } => {
                write!(f, "Writing '{}': {}", path.display(), err)
            }
            Error::Io(err) => err.fmt(f),
            Error::Annotated(annotation, err) => write!(f, "{}: {}", annotation, err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(_) => None,
            Error::Open { path: _, err } => Some(err),
            Error::Write { path: _, err } => Some(err),
            Error::Io(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}
