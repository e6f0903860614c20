//! The library code for the `quill` static site generator. A build is one
//! stateless pass from the content directories to the output directory:
//!
//! 1. Loading articles and notes from source files ([`crate::parser`]),
//!    deriving reading times and rewriting image paths on the way
//!    ([`crate::derive`])
//! 2. Ordering each variant newest-first and linking articles to their
//!    neighbors ([`crate::order`])
//! 3. Indexing: tags, the monthly archive, the paginated note listing
//!    ([`crate::index`])
//! 4. Rendering every page and the RSS feeds to disk ([`crate::write`],
//!    [`crate::feed`])
//!
//! Nothing is written until steps 1 through 3 have succeeded, so bad content
//! fails the build without touching the previous output.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod derive;
pub mod document;
pub mod feed;
pub mod index;
pub mod markup;
pub mod order;
pub mod parser;
pub mod view;
pub mod write;
