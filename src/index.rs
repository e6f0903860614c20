//! Builds the secondary indexes over the ordered documents: the tag index
//! (articles and notes), the monthly archive (articles only), the paginated
//! note listing, and the home listing. Every index is a fresh value returned
//! to the caller; nothing is kept between builds.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Datelike;
use log::warn;

use crate::document::{Document, Kind};

/// The base URL of the note listing. Page 1 lives here; later pages live
/// under `{NOTES_URL}page/{n}/`.
pub const NOTES_URL: &str = "/notes/";

/// A lightweight projection of a document (or archive month) for listing
/// pages.
#[derive(Clone, Debug, PartialEq)]
pub struct ListItem {
    pub title: String,
    pub url: String,

    /// Sort key. ISO dates (and `YYYY/MM` keys) sort lexically.
    pub iso_date: String,
    pub human_date: String,
    pub kind: Option<Kind>,
}

impl ListItem {
    pub fn of<D: Document>(d: &D) -> ListItem {
        ListItem {
            title: d.title().to_owned(),
            url: d.url_path(),
            iso_date: d.iso_date().to_owned(),
            human_date: d.human_date(),
            kind: Some(D::KIND),
        }
    }
}

fn sort_by_iso_date_desc(items: &mut [ListItem]) {
    items.sort_by(|a, b| b.iso_date.cmp(&a.iso_date));
}

/// The documents carrying one tag.
#[derive(Clone, Debug, PartialEq)]
pub struct TagBucket {
    /// The display label, taken from the first document indexed with the
    /// tag.
    pub label: String,
    pub items: Vec<ListItem>,
}

/// Records a document that labels an already-seen tag slug differently.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelConflict {
    pub slug: String,
    pub kept: String,
    pub ignored: String,
    pub document: PathBuf,
}

/// Maps tag slugs to their buckets. Add documents in a fixed order with
/// [`TagIndex::add`], then call [`TagIndex::finish`].
#[derive(Debug, Default)]
pub struct TagIndex {
    buckets: BTreeMap<String, TagBucket>,
    conflicts: Vec<LabelConflict>,
}

impl TagIndex {
    pub fn new() -> TagIndex {
        TagIndex::default()
    }

    /// Appends each document to the bucket of every tag it carries.
    pub fn add<D: Document>(&mut self, documents: &[D]) {
        for d in documents {
            let item = ListItem::of(d);
            for tag in d.tags() {
                let bucket = self
                    .buckets
                    .entry(tag.slug.clone())
                    .or_insert_with(|| TagBucket {
                        label: tag.name.clone(),
                        items: Vec::new(),
                    });
                if bucket.label != tag.name {
                    self.conflicts.push(LabelConflict {
                        slug: tag.slug.clone(),
                        kept: bucket.label.clone(),
                        ignored: tag.name.clone(),
                        document: d.source_path().to_owned(),
                    });
                }
                bucket.items.push(item.clone());
            }
        }
    }

    /// Sorts every bucket newest-first and logs label conflicts.
    pub fn finish(mut self) -> TagIndex {
        for bucket in self.buckets.values_mut() {
            sort_by_iso_date_desc(&mut bucket.items);
        }
        for c in &self.conflicts {
            warn!(
                "tag `{}` is labelled {:?} in `{}`; keeping {:?}",
                c.slug,
                c.ignored,
                c.document.display(),
                c.kept,
            );
        }
        self
    }

    pub fn get(&self, slug: &str) -> Option<&TagBucket> {
        self.buckets.get(slug)
    }

    /// Iterates buckets in slug order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagBucket)> {
        self.buckets.iter().map(|(slug, b)| (slug.as_str(), b))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn conflicts(&self) -> &[LabelConflict] {
        &self.conflicts
    }
}

/// The articles published in one calendar month.
#[derive(Clone, Debug, PartialEq)]
pub struct Month {
    pub year: i32,
    pub month: u32,

    /// e.g. `January 2006`.
    pub label: String,
    pub items: Vec<ListItem>,
}

impl Month {
    /// The bucket key, `YYYY/MM`.
    pub fn key(&self) -> String {
        format!("{:04}/{:02}", self.year, self.month)
    }

    pub fn url(&self) -> String {
        format!("/archive/{}/", self.key())
    }

    /// The projection shown on the archive index page.
    pub fn to_list_item(&self) -> ListItem {
        ListItem {
            title: self.label.clone(),
            url: self.url(),
            iso_date: self.key(),
            human_date: self.label.clone(),
            kind: None,
        }
    }
}

/// Buckets documents by month, newest month first, each month's items
/// newest first.
pub fn archive<D: Document>(documents: &[D]) -> Vec<Month> {
    let mut months: BTreeMap<(i32, u32), Month> = BTreeMap::new();
    for d in documents {
        let t = d.timestamp();
        months
            .entry((t.year(), t.month()))
            .or_insert_with(|| Month {
                year: t.year(),
                month: t.month(),
                label: t.format("%B %Y").to_string(),
                items: Vec::new(),
            })
            .items
            .push(ListItem::of(d));
    }

    let mut months: Vec<Month> = months.into_values().rev().collect();
    for m in &mut months {
        sort_by_iso_date_desc(&mut m.items);
    }
    months
}

/// One page of the note listing.
#[derive(Clone, Debug, PartialEq)]
pub struct NotePage<'a> {
    /// 1-based page number.
    pub number: usize,
    pub total: usize,
    pub items: &'a [ListItem],

    /// Empty on the first page.
    pub prev_url: String,

    /// Empty on the last page.
    pub next_url: String,
}

impl NotePage<'_> {
    pub fn url(&self) -> String {
        page_url(self.number)
    }
}

fn page_url(number: usize) -> String {
    match number {
        1 => NOTES_URL.to_owned(),
        n => format!("{}page/{}/", NOTES_URL, n),
    }
}

/// Slices `items` into pages of `page_size`. There is always at least one
/// page, even when `items` is empty.
pub fn paginate(items: &[ListItem], page_size: usize) -> Vec<NotePage<'_>> {
    let page_size = page_size.max(1);
    let total = ((items.len() + page_size - 1) / page_size).max(1);

    (1..=total)
        .map(|number| {
            let start = (number - 1) * page_size;
            let end = (start + page_size).min(items.len());
            NotePage {
                number,
                total,
                items: &items[start..end],
                prev_url: match number {
                    1 => String::new(),
                    n => page_url(n - 1),
                },
                next_url: match number < total {
                    true => page_url(number + 1),
                    false => String::new(),
                },
            }
        })
        .collect()
}

/// The first `n` documents as list items.
pub fn latest<D: Document>(documents: &[D], n: usize) -> Vec<ListItem> {
    documents.iter().take(n).map(ListItem::of).collect()
}
