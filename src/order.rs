//! Orders documents newest-first and links articles to their chronological
//! neighbors. Links are positions in the sorted slice, so nothing holds a
//! reference into the collection it belongs to.

use crate::document::Document;

/// Sorts `documents` by timestamp, newest first. The sort is stable, so
/// documents with equal timestamps keep their load order.
pub fn sort_newest_first<D: Document>(documents: &mut [D]) {
    documents.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
}

/// Positions of a document's neighbors in a newest-first slice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Neighbors {
    /// The chronologically newer neighbor (index - 1).
    pub next: Option<usize>,

    /// The chronologically older neighbor (index + 1).
    pub prev: Option<usize>,
}

/// A sorted collection together with the neighbor links of each position.
/// Built once by [`Chronology::new`] and read-only afterwards.
#[derive(Debug)]
pub struct Chronology<D> {
    documents: Vec<D>,
    links: Vec<Neighbors>,
}

impl<D: Document> Chronology<D> {
    /// Sorts `documents` with [`sort_newest_first`] and computes the links.
    pub fn new(mut documents: Vec<D>) -> Chronology<D> {
        sort_newest_first(&mut documents);
        let len = documents.len();
        let links = (0..len)
            .map(|i| Neighbors {
                next: i.checked_sub(1),
                prev: if i + 1 < len { Some(i + 1) } else { None },
            })
            .collect();
        Chronology { documents, links }
    }
}

impl<D> Chronology<D> {
    pub fn documents(&self) -> &[D] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn neighbors(&self, i: usize) -> Neighbors {
        self.links.get(i).copied().unwrap_or_default()
    }

    /// The newer neighbor of the document at position `i`.
    pub fn next(&self, i: usize) -> Option<&D> {
        self.neighbors(i).next.map(|j| &self.documents[j])
    }

    /// The older neighbor of the document at position `i`.
    pub fn prev(&self, i: usize) -> Option<&D> {
        self.neighbors(i).prev.map(|j| &self.documents[j])
    }
}
