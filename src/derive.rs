//! Values computed from a document rather than read from it: the reading-time
//! estimate and the image-path rewriting that points raster images at their
//! converted counterparts. Everything here is a pure string transform.

use once_cell::sync::Lazy;
use regex::Regex;

/// Words per minute used by [`reading_time`].
pub const WORDS_PER_MINUTE: usize = 220;

static SCRIPT_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script[^>]*>.*?</script>|<style[^>]*>.*?</style>")
        .expect("valid script/style pattern")
});

static MARKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<[^>]+>").expect("valid markup pattern"));

/// Raster extensions that get rewritten, in the exact spellings recognized.
const RASTER_EXTENSIONS: &[&str] = &["png", "PNG", "jpg", "JPG", "jpeg", "JPEG"];

/// Estimates minutes to read `html`: script and style blocks and all tags
/// are stripped, the remaining words counted, and the count divided by
/// [`WORDS_PER_MINUTE`] rounding up. Never less than one minute.
pub fn reading_time(html: &str) -> u32 {
    let text = SCRIPT_STYLE.replace_all(html, "");
    let text = MARKUP.replace_all(&text, "");
    let words = text.split_whitespace().count();
    let minutes = (words + WORDS_PER_MINUTE - 1) / WORDS_PER_MINUTE;
    minutes.max(1) as u32
}

/// Returns `explicit` when it's a usable override (at least one minute), and
/// derives the estimate from `html` otherwise.
pub fn reading_time_or(explicit: Option<i64>, html: &str) -> u32 {
    match explicit {
        Some(minutes) if minutes >= 1 => {
            u32::try_from(minutes).unwrap_or(u32::MAX)
        }
        _ => reading_time(html),
    }
}

/// Rewrites raster image references under an asset prefix to a converted
/// format.
#[derive(Debug)]
pub struct AssetRewriter {
    prefix: String,
    extension: String,
    src: Regex,
}

impl AssetRewriter {
    /// `prefix` is the URL prefix of rewritable assets (e.g., `/images/`)
    /// and `extension` the target extension without its dot (e.g., `webp`).
    pub fn new(prefix: &str, extension: &str) -> AssetRewriter {
        let pattern = format!(
            r#"(src=["']{}[^"']+)\.({})(["'])"#,
            regex::escape(prefix),
            RASTER_EXTENSIONS.join("|"),
        );
        AssetRewriter {
            prefix: prefix.to_owned(),
            extension: extension.to_owned(),
            // The prefix is escaped and the rest is fixed.
            src: Regex::new(&pattern).expect("valid asset pattern"),
        }
    }

    /// Rewrites a single path, e.g. a hero image reference. Paths outside the
    /// prefix or without a raster extension are returned unchanged.
    pub fn rewrite_path(&self, path: &str) -> String {
        if path.starts_with(&self.prefix) {
            for ext in RASTER_EXTENSIONS {
                if let Some(stem) = path.strip_suffix(ext) {
                    if let Some(stem) = stem.strip_suffix('.') {
                        return format!("{}.{}", stem, self.extension);
                    }
                }
            }
        }
        path.to_owned()
    }

    /// Rewrites every matching `src` attribute in rendered HTML.
    pub fn rewrite_html(&self, html: &str) -> String {
        let replacement = format!("${{1}}.{}${{3}}", self.extension);
        self.src.replace_all(html, replacement.as_str()).into_owned()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn test_reading_time_boundaries() {
        assert_eq!(1, reading_time(""));
        assert_eq!(1, reading_time(&words(1)));
        assert_eq!(1, reading_time(&words(220)));
        assert_eq!(2, reading_time(&words(221)));
        assert_eq!(3, reading_time(&words(441)));
    }

    #[test]
    fn test_reading_time_ignores_markup() {
        let html = format!(
            "<p>{}</p><script>var a = 1; {}</script><style>p {{}}</style>",
            words(220),
            words(500),
        );
        assert_eq!(1, reading_time(&html));
        assert_eq!(1, reading_time("<p>\n  <em></em>\n</p>"));
    }

    #[test]
    fn test_reading_time_override() {
        assert_eq!(7, reading_time_or(Some(7), ""));
        assert_eq!(2, reading_time_or(Some(0), &words(300)));
        assert_eq!(2, reading_time_or(Some(-4), &words(300)));
        assert_eq!(2, reading_time_or(None, &words(300)));
    }

    #[test]
    fn test_rewrite_path() {
        let r = AssetRewriter::new("/images/", "webp");
        assert_eq!("/images/foo.webp", r.rewrite_path("/images/foo.PNG"));
        assert_eq!("/images/a/b.webp", r.rewrite_path("/images/a/b.jpeg"));
        assert_eq!("/static/foo.png", r.rewrite_path("/static/foo.png"));
        assert_eq!("/images/foo.webp", r.rewrite_path("/images/foo.webp"));
        assert_eq!("/images/foo.Png", r.rewrite_path("/images/foo.Png"));
        assert_eq!("/images/foopng", r.rewrite_path("/images/foopng"));
    }

    #[test]
    fn test_rewrite_html() {
        let r = AssetRewriter::new("/images/", "webp");
        let html = concat!(
            r#"<img src="/images/a.jpg" alt=""> "#,
            r#"<img src='/images/b/c.JPEG'> "#,
            r#"<img src="https://cdn.example.com/images/d.png"> "#,
            r#"<a href="/images/e.png">e</a>"#,
        );
        let wanted = concat!(
            r#"<img src="/images/a.webp" alt=""> "#,
            r#"<img src='/images/b/c.webp'> "#,
            r#"<img src="https://cdn.example.com/images/d.png"> "#,
            r#"<a href="/images/e.png">e</a>"#,
        );
        let once = r.rewrite_html(html);
        assert_eq!(wanted, once);
        assert_eq!(once, r.rewrite_html(&once));
    }
}
