//! Streaming tree builder.
//!
//! Consumes a [`PullReader`] event stream and assembles a [`Document`]:
//! a recursive-descent consumer keyed on element/end-element boundaries.
//! The reader does the tokenizing; this module only decides what becomes
//! a node.
//!
//! # Examples
//!
//! ```
//! use elemtree::build::read_document;
//!
//! let doc = read_document("<root><child>Hello</child></root>").unwrap();
//! let root = doc.root().unwrap();
//! assert_eq!(doc.name(root), Some("root"));
//! ```

use crate::error::{Error, SourceLocation};
use crate::reader::{NodeType, PullReader, TextReader};
use crate::tree::{Document, NodeId};

/// Options controlling how a tree is built from an event stream.
///
/// # Examples
///
/// ```
/// use elemtree::build::{read_document_with, BuildOptions};
///
/// let opts = BuildOptions::default().ignore_whitespace(true);
/// let doc = read_document_with("<a>\n  <b/>\n</a>", &opts).unwrap();
/// let root = doc.root().unwrap();
/// assert_eq!(doc.children(root).count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Whether whitespace-only text events are dropped instead of
    /// becoming text nodes. Defaults to `false` (whitespace preserved).
    pub ignore_whitespace: bool,
}

impl BuildOptions {
    /// Enables or disables dropping whitespace-only text nodes.
    #[must_use]
    pub fn ignore_whitespace(mut self, ignore: bool) -> Self {
        self.ignore_whitespace = ignore;
        self
    }
}

/// Reads a document from a string source with default options.
///
/// # Errors
///
/// Returns a malformed-input error if the source is empty, contains no
/// element, or is not a single well-formed element tree.
pub fn read_document(source: &str) -> Result<Document, Error> {
    read_document_with(source, &BuildOptions::default())
}

/// Reads a document from a string source.
///
/// # Errors
///
/// Same failure modes as [`read_document`].
pub fn read_document_with(source: &str, options: &BuildOptions) -> Result<Document, Error> {
    let mut reader = TextReader::new(source);
    from_reader(&mut reader, options)
}

/// Builds a document from any [`PullReader`].
///
/// Leading non-element events (declaration, doctype, comments,
/// processing instructions, stray text) are skipped; the first element
/// start becomes the root. The stream ending before an element start,
/// or inside element content, is a malformed-input error.
///
/// # Errors
///
/// Propagates reader errors and returns malformed-input errors for the
/// conditions above.
pub fn from_reader<R: PullReader>(reader: &mut R, options: &BuildOptions) -> Result<Document, Error> {
    loop {
        if !reader.read()? {
            return Err(Error::malformed(
                "no element found in input",
                SourceLocation::default(),
            ));
        }
        if reader.node_type() == NodeType::Element {
            break;
        }
    }

    let mut doc = Document::new();
    let root = build_element(&mut doc, reader, options)?;
    doc.set_root(root)?;
    Ok(doc)
}

/// Builds the element the reader is currently positioned on, including
/// its attributes and (unless self-closing) its content up to the
/// matching end tag.
fn build_element<R: PullReader>(
    doc: &mut Document,
    reader: &mut R,
    options: &BuildOptions,
) -> Result<NodeId, Error> {
    let name = reader
        .name()
        .ok_or_else(|| Error::malformed("element event without a name", SourceLocation::default()))?
        .to_string();
    let elem = doc.new_element(&name)?;

    // The attribute cursor repositions the reader, so the self-closing
    // flag must be captured first.
    let is_empty = reader.is_empty_element();

    if reader.move_to_first_attribute() {
        loop {
            if let Some(attr_name) = reader.name() {
                let attr_name = attr_name.to_string();
                let attr_value = reader.value().unwrap_or_default().to_string();
                doc.set_attribute(elem, &attr_name, attr_value)?;
            }
            if !reader.move_to_next_attribute() {
                break;
            }
        }
    }

    if is_empty {
        return Ok(elem);
    }

    loop {
        if !reader.read()? {
            return Err(Error::malformed(
                format!("unexpected end of input: <{name}> is never closed"),
                SourceLocation::default(),
            ));
        }
        match reader.node_type() {
            NodeType::EndElement => break,
            NodeType::Element => {
                let child = build_element(doc, reader, options)?;
                doc.append(elem, child)?;
            }
            NodeType::Text | NodeType::CData => {
                let content = reader.value().unwrap_or_default().to_string();
                doc.append(elem, content)?;
            }
            NodeType::Whitespace => {
                if !options.ignore_whitespace {
                    let content = reader.value().unwrap_or_default().to_string();
                    doc.append(elem, content)?;
                }
            }
            // Comments and processing instructions have no tree
            // representation.
            NodeType::Comment | NodeType::ProcessingInstruction => {}
            other => {
                return Err(Error::malformed(
                    format!("unexpected {other} event in element content"),
                    SourceLocation::default(),
                ));
            }
        }
    }

    Ok(elem)
}
