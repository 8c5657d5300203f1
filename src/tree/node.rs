//! Node type definitions.
//!
//! `NodeKind` is the closed tagged variant for the two node kinds in a
//! document tree. Each variant carries the kind-specific payload;
//! navigation links (parent, children, siblings) live in `NodeData`.

use super::Attribute;

/// The kind of a node and its associated data.
///
/// The set is closed: every consumer matches exhaustively on the two
/// variants, so "is this text or an element" dispatch is a tag check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element node, e.g. `<item id="42">`.
    Element {
        /// The element's name. Never empty.
        name: String,
        /// Attributes on this element, unique by name. Stored in
        /// insertion order; the order is not contractual.
        attributes: Vec<Attribute>,
    },

    /// A leaf node holding character data.
    Text {
        /// The text content.
        content: String,
    },
}

impl NodeKind {
    /// Returns `true` if this is an element node.
    #[must_use]
    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element { .. })
    }

    /// Returns `true` if this is a text node.
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }
}
