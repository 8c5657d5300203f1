//! # elemtree
//!
//! A mutable element-tree document model: elements, text, and attributes
//! in an arena-backed tree with O(1) structural splicing, directional and
//! filtered child iteration, a pluggable child-selector registry, and
//! streaming adapters that build a tree from a pull reader and render one
//! back through a push writer.
//!
//! ## Quick Start
//!
//! ```
//! use elemtree::{read_document, serialize};
//!
//! let doc = read_document("<root><child>Hello</child></root>").unwrap();
//! let root = doc.root().unwrap();
//! assert_eq!(doc.name(root), Some("root"));
//! assert!(serialize(&doc).unwrap().contains("<child>Hello</child>"));
//! ```
//!
//! Trees can also be assembled directly and edited in place:
//!
//! ```
//! use elemtree::Document;
//!
//! let mut doc = Document::new();
//! let root = doc.new_element_with("foo", &[("bar", "baz")], vec!["grault".into()]).unwrap();
//! let corge = doc.new_element("corge").unwrap();
//! doc.prepend(root, corge).unwrap();
//! doc.append(root, "tail").unwrap();
//! assert_eq!(doc.children(root).count(), 3);
//! ```

pub mod build;
pub mod error;
pub mod reader;
pub mod select;
pub mod serial;
pub mod tree;

// Re-export primary types at the crate root for convenience.
pub use build::{read_document, read_document_with, BuildOptions};
pub use error::{Error, SourceLocation};
pub use serial::{serialize, serialize_with_options, write_document};
pub use tree::{Attribute, Document, NodeId, NodeKind, NodeOrText};
