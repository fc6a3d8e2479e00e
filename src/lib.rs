//! Streaming XML output restricted to a set of element paths.
//!
//! [`FilteringWriter`] wraps any [`XmlStreamWriter`] and forwards only the
//! calls that belong to elements selected by [`LocationPath`]s, which makes
//! it possible to project a large GML/XML export onto a few element paths
//! without building the document in memory.

pub mod config;
pub mod copy;
pub mod error;
pub mod filter;
pub mod matcher;
pub mod name;
pub mod path;
pub mod stack;
pub mod writer;

pub use config::FilterOptions;
pub use copy::{copy_events, filter_document, filter_file};
pub use error::{Error, Result};
pub use filter::{FilterSummary, FilteringWriter};
pub use matcher::PathMatcher;
pub use name::QName;
pub use path::{Anchor, LocationPath};
pub use stack::PathStack;
pub use writer::{DocumentWriter, NamespaceContext, XmlStreamWriter};
