//! The markup capability the loader depends on: splitting front matter from a
//! body and converting a Markdown body into HTML. [`Markup`] is a trait so
//! tests can inject fixed output instead of exercising a real converter.

use pulldown_cmark::{html, Options, Parser};

/// The fence separating front matter from the body. It must appear at least
/// twice in a source file.
pub const FENCE: &str = "---";

/// Front-matter splitting and Markdown rendering.
pub trait Markup {
    /// Splits `input` into `(metadata, body)`. Returns [`None`] when the
    /// input doesn't have the fenced structure, in which case the file is
    /// not a document.
    fn parse_front_matter<'a>(&self, input: &'a str) -> Option<(&'a str, &'a str)> {
        split_front_matter(input)
    }

    /// Converts a Markdown body to HTML.
    fn render(&self, markdown: &str) -> String;
}

/// Splits on the first two fences. Anything before the first fence is
/// discarded; further fences stay in the body.
pub fn split_front_matter(input: &str) -> Option<(&str, &str)> {
    let mut parts = input.splitn(3, FENCE);
    let _preamble = parts.next()?;
    let metadata = parts.next()?;
    let body = parts.next()?;
    Some((metadata, body))
}

/// CommonMark with strikethrough, tables, task lists, and footnotes. Raw HTML
/// in the source passes through untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommonMark;

impl Markup for CommonMark {
    fn render(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, Parser::new_ext(markdown, options));
        out
    }
}
