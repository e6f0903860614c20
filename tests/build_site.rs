use chrono::{TimeZone, Utc};
use quill::build::build_site;
use quill::config::Config;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

fn demo() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demo")
}

// Copies the demo site into a fresh directory so each build owns its output.
fn stage(dst: &Path) {
    let src = demo();
    for entry in WalkDir::new(&src) {
        let entry = entry.unwrap();
        let out = dst.join(entry.path().strip_prefix(&src).unwrap());
        if entry.file_type().is_dir() {
            fs::create_dir_all(&out).unwrap();
        } else {
            fs::copy(entry.path(), &out).unwrap();
        }
    }
}

fn build(root: &Path) -> Config {
    stage(root);
    let config = Config::from_directory(root, Utc.timestamp_opt(1_710_000_000, 0).unwrap()).unwrap();
    build_site(&config).unwrap();
    config
}

fn tree(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(dir)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let relative = e.path().strip_prefix(dir).unwrap().to_owned();
            (relative, fs::read(e.path()).unwrap())
        })
        .collect()
}

fn read(config: &Config, path: &str) -> String {
    fs::read_to_string(config.output_directory.join(path)).unwrap()
}

#[test]
fn test_rebuild_is_byte_identical() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let a = build(first.path());
    let b = build(second.path());

    let a = tree(&a.output_directory);
    let b = tree(&b.output_directory);
    assert_eq!(a.keys().collect::<Vec<_>>(), b.keys().collect::<Vec<_>>());
    for (path, contents) in &a {
        assert!(&b[path] == contents, "{} differs between builds", path.display());
    }
}

#[test]
fn test_demo_site_pages() {
    let dir = tempfile::tempdir().unwrap();
    let config = build(dir.path());

    let hello = read(&config, "articles/hello-world/index.html");
    assert!(hello.contains("Hello, world | Quill Demo"));
    assert!(hello.contains("March 2, 2024"));
    assert!(hello.contains("/images/hello.webp"));
    assert!(hello.contains("/images/inline.webp"));
    assert!(hello.contains("<table>"));
    assert!(hello.contains("/articles/prerendered/"), "missing prev link");

    let prerendered = read(&config, "articles/prerendered/index.html");
    assert!(prerendered.contains("<p>This body was rendered elsewhere.</p>"));
    assert!(prerendered.contains("4 min read"));

    assert!(!config.output_directory.join("articles/unfinished").exists());

    let rust = read(&config, "tag/rust/index.html");
    assert!(rust.contains("/articles/prerendered/"));
    assert!(rust.contains("/notes/borrowing/"));

    let note = read(&config, "notes/borrowing/index.html");
    assert!(note.contains(r#"<a href="https://doc.rust-lang.org/book/">"#));
    let quote = read(&config, "notes/quote/index.html");
    assert!(quote.contains("Source: A conversation with a friend"));

    let listing = read(&config, "notes/index.html");
    assert!(listing.contains("Page 1 of 1"));
    assert!(!listing.contains(r#"rel="next""#));

    let archive = read(&config, "archive/index.html");
    assert!(archive.contains("/archive/2024/03/"));
    assert!(archive.contains("/archive/2024/02/"));

    let feed = read(&config, "feed.xml");
    assert!(feed.contains("https://example.com/articles/hello-world/"));
    assert!(!feed.contains("unfinished"));
    let notes_feed = read(&config, "notes/feed.xml");
    assert!(notes_feed.contains("https://example.com/notes/quote/"));

    assert!(config.output_directory.join("404.html").is_file());
    assert!(config.output_directory.join("css/site.css").is_file());
}
