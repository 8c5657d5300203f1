//! Streaming tree serializer.
//!
//! Walks a tree depth-first in document order and emits push calls on a
//! [`PushWriter`]: start-element, one write-attribute per entry, the
//! children, then end-element; text nodes become a single write-text
//! call. The walker holds no state beyond the recursion stack.
//!
//! [`XmlWriter`] is the bundled sink, rendering the call sequence to a
//! string; [`serialize`] wires the two together.

mod xml;

pub use xml::{SerializeOptions, XmlWriter};

use crate::error::Error;
use crate::tree::{Document, NodeId, NodeKind};

/// A push-style document sink.
///
/// The serializer drives this trait; any output format that can accept
/// element/attribute/text events can implement it. Calls cannot fail:
/// sinks with fallible backends buffer internally and surface errors at
/// their own boundary.
pub trait PushWriter {
    /// Called once before any other call.
    fn begin_document(&mut self);

    /// Called once after the root element is fully written.
    fn end_document(&mut self);

    /// Opens an element with the given name.
    fn start_element(&mut self, name: &str);

    /// Closes the most recently opened element.
    fn end_element(&mut self);

    /// Writes one attribute of the currently open element. Only valid
    /// between `start_element` and the first content call.
    fn write_attribute(&mut self, name: &str, value: &str);

    /// Writes character data into the currently open element.
    fn write_text(&mut self, content: &str);

    /// Flushes any buffered output. Called once at the end.
    fn flush(&mut self);
}

/// Serializes the subtree rooted at `root` into `writer`.
///
/// # Errors
///
/// Returns a value error if `root` is not an element.
///
/// # Examples
///
/// ```
/// use elemtree::serial::{write_document, XmlWriter};
/// use elemtree::Document;
///
/// let mut doc = Document::new();
/// let root = doc.new_element_with("root", &[], vec!["hi".into()]).unwrap();
/// let mut writer = XmlWriter::new();
/// write_document(&doc, root, &mut writer).unwrap();
/// assert!(writer.as_str().contains("<root>hi</root>"));
/// ```
pub fn write_document<W: PushWriter>(
    doc: &Document,
    root: NodeId,
    writer: &mut W,
) -> Result<(), Error> {
    if !doc.is_element(root) {
        return Err(Error::value("document root must be an element"));
    }
    writer.begin_document();
    write_subtree(doc, root, writer);
    writer.end_document();
    writer.flush();
    Ok(())
}

fn write_subtree<W: PushWriter>(doc: &Document, id: NodeId, writer: &mut W) {
    match &doc.node(id).kind {
        NodeKind::Element { name, attributes } => {
            writer.start_element(name);
            for attr in attributes {
                writer.write_attribute(&attr.name, &attr.value);
            }
            for child in doc.children(id) {
                write_subtree(doc, child, writer);
            }
            writer.end_element();
        }
        NodeKind::Text { content } => writer.write_text(content),
    }
}

/// Serializes a document's root element to a string with default options.
///
/// # Errors
///
/// Returns a value error if the document has no designated root.
///
/// # Examples
///
/// ```
/// use elemtree::build::read_document;
/// use elemtree::serial::serialize;
///
/// let doc = read_document("<root><child>Hello</child></root>").unwrap();
/// assert!(serialize(&doc).unwrap().contains("<root>"));
/// ```
pub fn serialize(doc: &Document) -> Result<String, Error> {
    serialize_with_options(doc, &SerializeOptions::default())
}

/// Serializes a document's root element to a string.
///
/// # Errors
///
/// Returns a value error if the document has no designated root.
pub fn serialize_with_options(doc: &Document, options: &SerializeOptions) -> Result<String, Error> {
    let root = doc
        .root()
        .ok_or_else(|| Error::value("document has no root element"))?;
    let mut writer = XmlWriter::with_options(options.clone());
    write_document(doc, root, &mut writer)?;
    Ok(writer.into_string())
}
