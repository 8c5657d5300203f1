//! Arena-based mutable document tree.
//!
//! This module implements the core tree representation using arena
//! allocation with typed indices. All nodes live in a contiguous
//! `Vec<NodeData>` owned by the `Document`, and are referenced by
//! `NodeId` — a newtype over `NonZeroU32`.
//!
//! This design provides O(1) node access and O(1) splicing anywhere in a
//! child list, cache-friendly layout, no reference counting, and safe
//! bulk deallocation (drop the `Document` and everything is freed).
//!
//! # Architecture
//!
//! All navigation links (parent, first\_child, last\_child, next\_sibling,
//! prev\_sibling) are arena indices, never owning references. The arena is
//! the single owner of every node, so ownership cycles cannot occur, and
//! a node's links can be rewired freely. Every structural mutation funnels
//! through a single internal `link` primitive; the public operations only
//! differ in which neighbors they pass to it.
//!
//! # Iterator invalidation
//!
//! The child iterators do not snapshot the sibling chain. Structurally
//! editing the range an iterator is traversing — unlinking the node its
//! cursor currently references, or splicing around it — leaves it
//! undefined which nodes are still visited. Edits strictly ahead of or
//! behind the cursor (relative to its direction) are safe. Callers that
//! need to edit while iterating should collect the ids first.

mod node;

pub use node::NodeKind;

use crate::error::Error;
use std::num::NonZeroU32;

/// A typed index into the document's node arena.
///
/// `NodeId` is a newtype over `NonZeroU32`, meaning it can never be zero
/// and `Option<NodeId>` has the same size as `NodeId` (niche optimization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Creates a `NodeId` from a raw index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0.
    #[allow(clippy::expect_used, clippy::cast_possible_truncation)]
    fn from_index(index: usize) -> Self {
        Self(NonZeroU32::new(index as u32).expect("NodeId index must be non-zero"))
    }

    /// Returns the raw index as a `usize` for indexing into the arena.
    fn as_index(self) -> usize {
        self.0.get() as usize
    }
}

/// An attribute on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The attribute name. Never empty; unique within its element.
    pub name: String,
    /// The attribute value.
    pub value: String,
}

/// Storage for a single node in the document arena.
///
/// Each node stores its kind (element or text) and links to parent,
/// children, and siblings for tree navigation. Access individual nodes
/// via [`Document::node`].
#[derive(Debug, Clone)]
pub struct NodeData {
    /// What kind of node this is and its payload.
    pub kind: NodeKind,
    /// Parent node, if any. Detached nodes and the tree root have none.
    pub parent: Option<NodeId>,
    /// First child node.
    pub first_child: Option<NodeId>,
    /// Last child node (for O(1) append).
    pub last_child: Option<NodeId>,
    /// Next sibling.
    pub next_sibling: Option<NodeId>,
    /// Previous sibling.
    pub prev_sibling: Option<NodeId>,
    /// Caller-attached annotation. Reads through [`Document::meta`]
    /// inherit the nearest ancestor's value when unset.
    pub meta: Option<String>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
            meta: None,
        }
    }
}

/// Either an existing node or a bare string to be coerced into a new
/// text node.
///
/// The structural insertion operations accept `impl Into<NodeOrText>`,
/// so an existing `NodeId`, a `&str`, or a `String` can be passed
/// directly:
///
/// ```
/// use elemtree::Document;
///
/// let mut doc = Document::new();
/// let root = doc.new_element("root").unwrap();
/// doc.append(root, "hello").unwrap();
/// assert_eq!(doc.text(doc.first_child(root).unwrap()), Some("hello"));
/// ```
#[derive(Debug, Clone)]
pub enum NodeOrText {
    /// An existing node, relocated into the target position.
    Node(NodeId),
    /// String content for a freshly allocated text node.
    Text(String),
}

impl From<NodeId> for NodeOrText {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<&str> for NodeOrText {
    fn from(content: &str) -> Self {
        Self::Text(content.to_string())
    }
}

impl From<String> for NodeOrText {
    fn from(content: String) -> Self {
        Self::Text(content)
    }
}

/// A mutable document tree.
///
/// The `Document` owns all nodes in an arena and provides methods for
/// tree navigation and mutation. All tree operations go through
/// `&Document` (navigation) or `&mut Document` (mutation), which also
/// enforces the single-writer contract at compile time.
///
/// # Examples
///
/// ```
/// use elemtree::Document;
///
/// let mut doc = Document::new();
/// let root = doc.new_element("root").unwrap();
/// let child = doc.new_element("child").unwrap();
/// doc.append(root, child).unwrap();
/// assert_eq!(doc.first_child(root), Some(child));
/// ```
#[derive(Debug)]
pub struct Document {
    /// The node arena. Index 0 is unused (placeholder for `NonZeroU32`).
    nodes: Vec<NodeData>,
    /// The document's root element, if one has been designated.
    root: Option<NodeId>,
}

impl Document {
    /// Creates a new empty document.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(64);
        // Index 0: placeholder (NodeId uses NonZeroU32)
        nodes.push(NodeData::new(NodeKind::Text {
            content: String::new(),
        }));
        Self { nodes, root: None }
    }

    // --- Construction ---

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let index = self.nodes.len();
        self.nodes.push(NodeData::new(kind));
        NodeId::from_index(index)
    }

    /// Allocates a new, detached element node.
    ///
    /// # Errors
    ///
    /// Returns a value error if `name` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use elemtree::Document;
    ///
    /// let mut doc = Document::new();
    /// let elem = doc.new_element("item").unwrap();
    /// assert_eq!(doc.name(elem), Some("item"));
    /// assert!(doc.new_element("").is_err());
    /// ```
    pub fn new_element(&mut self, name: &str) -> Result<NodeId, Error> {
        if name.is_empty() {
            return Err(Error::value("element name must not be empty"));
        }
        Ok(self.alloc(NodeKind::Element {
            name: name.to_string(),
            attributes: Vec::new(),
        }))
    }

    /// Allocates a new element seeded with attributes and children.
    ///
    /// `children` entries may be existing nodes (relocated under the new
    /// element) or strings (coerced into text nodes). Callers with no
    /// children to attach should use [`new_element`](Self::new_element)
    /// instead; an empty `children` list here is rejected.
    ///
    /// # Errors
    ///
    /// Returns a value error if `name` or any attribute name is empty,
    /// or if `children` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use elemtree::Document;
    ///
    /// let mut doc = Document::new();
    /// let root = doc
    ///     .new_element_with("foo", &[("bar", "baz")], vec!["grault".into()])
    ///     .unwrap();
    /// assert_eq!(doc.attribute(root, "bar"), Some("baz"));
    /// ```
    pub fn new_element_with(
        &mut self,
        name: &str,
        attributes: &[(&str, &str)],
        children: Vec<NodeOrText>,
    ) -> Result<NodeId, Error> {
        if name.is_empty() {
            return Err(Error::value("element name must not be empty"));
        }
        if children.is_empty() {
            return Err(Error::value("children, when supplied, must be non-empty"));
        }
        if attributes.iter().any(|(n, _)| n.is_empty()) {
            return Err(Error::value("attribute name must not be empty"));
        }

        let elem = self.alloc(NodeKind::Element {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(n, v)| Attribute {
                    name: (*n).to_string(),
                    value: (*v).to_string(),
                })
                .collect(),
        });
        for child in children {
            self.append(elem, child)?;
        }
        Ok(elem)
    }

    /// Allocates a new, detached text node.
    pub fn new_text(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text {
            content: content.into(),
        })
    }

    // --- Node access ---

    /// Returns a reference to the `NodeData` for the given node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not refer to a valid node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.as_index()]
    }

    /// Returns a mutable reference to the `NodeData` for the given node.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.as_index()]
    }

    /// Returns `true` if `id` refers to an element node.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.node(id).kind.is_element()
    }

    /// Returns `true` if `id` refers to a text node.
    #[must_use]
    pub fn is_text(&self, id: NodeId) -> bool {
        self.node(id).kind.is_text()
    }

    /// Returns the name of an element node, or `None` for text nodes.
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { name, .. } => Some(name),
            NodeKind::Text { .. } => None,
        }
    }

    /// Renames an element node.
    ///
    /// # Errors
    ///
    /// Returns a value error if `name` is empty or `id` is not an element.
    pub fn set_name(&mut self, id: NodeId, name: &str) -> Result<(), Error> {
        if name.is_empty() {
            return Err(Error::value("element name must not be empty"));
        }
        match &mut self.node_mut(id).kind {
            NodeKind::Element { name: n, .. } => {
                *n = name.to_string();
                Ok(())
            }
            NodeKind::Text { .. } => Err(Error::value("text nodes have no name")),
        }
    }

    /// Returns the content of a text node, or `None` for elements.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text { content } => Some(content),
            NodeKind::Element { .. } => None,
        }
    }

    /// Replaces the content of a text node.
    ///
    /// # Errors
    ///
    /// Returns a value error if `id` is not a text node.
    pub fn set_text(&mut self, id: NodeId, content: impl Into<String>) -> Result<(), Error> {
        match &mut self.node_mut(id).kind {
            NodeKind::Text { content: c } => {
                *c = content.into();
                Ok(())
            }
            NodeKind::Element { .. } => Err(Error::value("element nodes have no text content")),
        }
    }

    /// Returns the concatenated text content of a node and all its
    /// descendants, in document order.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut result = String::new();
        self.collect_text(id, &mut result);
        result
    }

    fn collect_text(&self, id: NodeId, buf: &mut String) {
        match &self.node(id).kind {
            NodeKind::Text { content } => buf.push_str(content),
            NodeKind::Element { .. } => {
                for child in self.children(id) {
                    self.collect_text(child, buf);
                }
            }
        }
    }

    // --- Root designation ---

    /// Returns the designated root element, if any.
    ///
    /// Set by the streaming builder, or manually via
    /// [`set_root`](Self::set_root).
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Designates `id` as the document's root element.
    ///
    /// # Errors
    ///
    /// Returns a value error if `id` is not an element, or a structure
    /// error if it has a parent.
    pub fn set_root(&mut self, id: NodeId) -> Result<(), Error> {
        if !self.is_element(id) {
            return Err(Error::value("document root must be an element"));
        }
        if self.node(id).parent.is_some() {
            return Err(Error::structure("document root must not have a parent"));
        }
        self.root = Some(id);
        Ok(())
    }

    // --- Attributes ---

    /// Returns the attributes of an element node.
    ///
    /// Returns an empty slice for text nodes.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match &self.node(id).kind {
            NodeKind::Element { attributes, .. } => attributes,
            NodeKind::Text { .. } => &[],
        }
    }

    /// Returns the value of an attribute by name, or `None` if absent
    /// or `id` is not an element.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Returns `true` if the element carries an attribute with this name.
    #[must_use]
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attributes(id).iter().any(|a| a.name == name)
    }

    /// Sets an attribute, replacing any existing value under the same name.
    ///
    /// # Errors
    ///
    /// Returns a value error if `name` is empty or `id` is not an element.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), Error> {
        if name.is_empty() {
            return Err(Error::value("attribute name must not be empty"));
        }
        match &mut self.node_mut(id).kind {
            NodeKind::Element { attributes, .. } => {
                let value = value.into();
                if let Some(attr) = attributes.iter_mut().find(|a| a.name == name) {
                    attr.value = value;
                } else {
                    attributes.push(Attribute {
                        name: name.to_string(),
                        value,
                    });
                }
                Ok(())
            }
            NodeKind::Text { .. } => Err(Error::value("text nodes have no attributes")),
        }
    }

    /// Removes an attribute by name, returning its value if it was present.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        match &mut self.node_mut(id).kind {
            NodeKind::Element { attributes, .. } => {
                let pos = attributes.iter().position(|a| a.name == name)?;
                Some(attributes.remove(pos).value)
            }
            NodeKind::Text { .. } => None,
        }
    }

    // --- Meta ---

    /// Attaches an annotation to this node.
    pub fn set_meta(&mut self, id: NodeId, meta: impl Into<String>) {
        self.node_mut(id).meta = Some(meta.into());
    }

    /// Removes this node's own annotation, if any.
    pub fn clear_meta(&mut self, id: NodeId) {
        self.node_mut(id).meta = None;
    }

    /// Returns this node's own annotation, without ancestor lookup.
    #[must_use]
    pub fn own_meta(&self, id: NodeId) -> Option<&str> {
        self.node(id).meta.as_deref()
    }

    /// Returns the effective annotation for this node.
    ///
    /// When the node itself has none, the parent chain is walked upward
    /// until a set value or the root is reached. The walk happens on
    /// every call; nothing is cached.
    ///
    /// # Examples
    ///
    /// ```
    /// use elemtree::Document;
    ///
    /// let mut doc = Document::new();
    /// let root = doc.new_element("root").unwrap();
    /// let child = doc.new_element("child").unwrap();
    /// doc.append(root, child).unwrap();
    /// doc.set_meta(root, "inherited");
    /// assert_eq!(doc.meta(child), Some("inherited"));
    /// assert_eq!(doc.own_meta(child), None);
    /// ```
    #[must_use]
    pub fn meta(&self, id: NodeId) -> Option<&str> {
        self.ancestors(id)
            .find_map(|node| self.node(node).meta.as_deref())
    }

    // --- Navigation ---

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    /// Returns the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    /// Returns the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    /// Returns the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    // --- Iteration ---

    /// Returns an iterator over the children of a node, in chain order.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.node(id).first_child,
            rev: false,
        }
    }

    /// Returns an iterator over the children of a node, last to first.
    pub fn children_reversed(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.node(id).last_child,
            rev: true,
        }
    }

    /// Returns an iterator over the element children of a node.
    pub fn elements(&self, id: NodeId) -> Elements<'_> {
        Elements {
            inner: self.children(id),
        }
    }

    /// Returns an iterator over the element children, last to first.
    pub fn elements_reversed(&self, id: NodeId) -> Elements<'_> {
        Elements {
            inner: self.children_reversed(id),
        }
    }

    /// Returns an iterator over the text children of a node.
    pub fn texts(&self, id: NodeId) -> Texts<'_> {
        Texts {
            inner: self.children(id),
        }
    }

    /// Returns an iterator over the text children, last to first.
    pub fn texts_reversed(&self, id: NodeId) -> Texts<'_> {
        Texts {
            inner: self.children_reversed(id),
        }
    }

    /// Returns an iterator over a node and its ancestors (walking up to
    /// the root).
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: Some(id),
        }
    }

    /// Returns an iterator over all descendants of a node (depth-first,
    /// document order, starting at the node itself).
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            root: id,
            next: Some(id),
        }
    }

    // --- Structural editing ---

    /// The single choke point for structural mutation.
    ///
    /// Detaches `node` from any current position, then wires it under
    /// `parent` between `prev` and `next`. Callers must read anchor
    /// neighbors *after* detaching the incoming node, so relocating a
    /// node next to its own former neighbor stays consistent.
    fn link(&mut self, node: NodeId, parent: NodeId, prev: Option<NodeId>, next: Option<NodeId>) {
        self.unlink(node);

        let data = self.node_mut(node);
        data.parent = Some(parent);
        data.prev_sibling = prev;
        data.next_sibling = next;

        match prev {
            Some(p) => self.node_mut(p).next_sibling = Some(node),
            None => self.node_mut(parent).first_child = Some(node),
        }
        match next {
            Some(n) => self.node_mut(n).prev_sibling = Some(node),
            None => self.node_mut(parent).last_child = Some(node),
        }
    }

    /// Detaches a node from its parent and sibling context.
    ///
    /// Neighbor links (or the parent's endpoint pointers, when the node
    /// was first or last) are restored around the gap, and the node's own
    /// parent/sibling links are cleared. Calling this on an already
    /// detached node is a no-op. The node stays allocated in the arena
    /// and can be re-inserted.
    pub fn unlink(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };

        let prev = self.node(id).prev_sibling;
        let next = self.node(id).next_sibling;

        match prev {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }

        let data = self.node_mut(id);
        data.parent = None;
        data.prev_sibling = None;
        data.next_sibling = None;
    }

    /// Checks the incoming node of a splice against `parent`'s ancestor
    /// chain, and coerces strings into fresh text nodes. All failure
    /// paths fire before any allocation or mutation.
    fn resolve(&mut self, parent: NodeId, node: NodeOrText) -> Result<NodeId, Error> {
        match node {
            NodeOrText::Node(id) => {
                if self.ancestors(parent).any(|a| a == id) {
                    return Err(Error::structure(
                        "a node cannot be inserted into its own subtree",
                    ));
                }
                Ok(id)
            }
            NodeOrText::Text(content) => Ok(self.new_text(content)),
        }
    }

    /// Inserts a node (or coerced text) as the last child of `parent`.
    ///
    /// An already-attached node is relocated. Inserting into an empty
    /// element sets both endpoint pointers to the new lone child.
    ///
    /// # Errors
    ///
    /// Returns a value error if `parent` is a text node, or a structure
    /// error if the insertion would make a node its own descendant.
    ///
    /// # Examples
    ///
    /// ```
    /// use elemtree::Document;
    ///
    /// let mut doc = Document::new();
    /// let root = doc.new_element("root").unwrap();
    /// let a = doc.new_element("a").unwrap();
    /// doc.append(root, a).unwrap();
    /// doc.append(root, "tail").unwrap();
    /// assert_eq!(doc.first_child(root), Some(a));
    /// assert_eq!(doc.text(doc.last_child(root).unwrap()), Some("tail"));
    /// ```
    pub fn append(&mut self, parent: NodeId, node: impl Into<NodeOrText>) -> Result<NodeId, Error> {
        if !self.is_element(parent) {
            return Err(Error::value("text nodes cannot have children"));
        }
        let node = self.resolve(parent, node.into())?;

        self.unlink(node);
        let last = self.node(parent).last_child;
        self.link(node, parent, last, None);
        Ok(node)
    }

    /// Inserts a node (or coerced text) as the first child of `parent`.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`append`](Self::append).
    pub fn prepend(
        &mut self,
        parent: NodeId,
        node: impl Into<NodeOrText>,
    ) -> Result<NodeId, Error> {
        if !self.is_element(parent) {
            return Err(Error::value("text nodes cannot have children"));
        }
        let node = self.resolve(parent, node.into())?;

        self.unlink(node);
        let first = self.node(parent).first_child;
        self.link(node, parent, None, first);
        Ok(node)
    }

    /// Inserts a node (or coerced text) immediately before `anchor`.
    ///
    /// Returns the id of the inserted node (freshly allocated when a
    /// string was coerced).
    ///
    /// # Errors
    ///
    /// Returns a structure error if `anchor` has no parent (a sibling of
    /// a root or detached node has no defined position), a value error if
    /// the node is the anchor itself, or a structure error if the
    /// insertion would make a node its own descendant.
    ///
    /// # Examples
    ///
    /// ```
    /// use elemtree::Document;
    ///
    /// let mut doc = Document::new();
    /// let root = doc.new_element("root").unwrap();
    /// let b = doc.new_element("b").unwrap();
    /// doc.append(root, b).unwrap();
    /// let a = doc.prepend_sibling(b, "a").unwrap();
    /// assert_eq!(doc.first_child(root), Some(a));
    ///
    /// let detached = doc.new_element("lone").unwrap();
    /// assert!(doc.prepend_sibling(detached, "x").is_err());
    /// ```
    pub fn prepend_sibling(
        &mut self,
        anchor: NodeId,
        node: impl Into<NodeOrText>,
    ) -> Result<NodeId, Error> {
        let (parent, node) = self.resolve_sibling(anchor, node.into())?;

        self.unlink(node);
        let prev = self.node(anchor).prev_sibling;
        self.link(node, parent, prev, Some(anchor));
        Ok(node)
    }

    /// Inserts a node (or coerced text) immediately after `anchor`.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`prepend_sibling`](Self::prepend_sibling).
    pub fn append_sibling(
        &mut self,
        anchor: NodeId,
        node: impl Into<NodeOrText>,
    ) -> Result<NodeId, Error> {
        let (parent, node) = self.resolve_sibling(anchor, node.into())?;

        self.unlink(node);
        let next = self.node(anchor).next_sibling;
        self.link(node, parent, Some(anchor), next);
        Ok(node)
    }

    fn resolve_sibling(
        &mut self,
        anchor: NodeId,
        node: NodeOrText,
    ) -> Result<(NodeId, NodeId), Error> {
        let Some(parent) = self.node(anchor).parent else {
            return Err(Error::structure(
                "cannot insert a sibling of a node that has no parent",
            ));
        };
        if matches!(node, NodeOrText::Node(id) if id == anchor) {
            return Err(Error::value("cannot insert a node as a sibling of itself"));
        }
        let node = self.resolve(parent, node)?;
        Ok((parent, node))
    }

    /// Replaces `node` with `replacement` in its current position.
    ///
    /// Equivalent to a sibling insertion before `node` followed by
    /// unlinking `node`; ordering is preserved even when the replacement
    /// is `node`'s own neighbor.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`prepend_sibling`](Self::prepend_sibling);
    /// in particular, substituting a detached node is a structure error.
    pub fn substitute(
        &mut self,
        node: NodeId,
        replacement: impl Into<NodeOrText>,
    ) -> Result<NodeId, Error> {
        let new = self.prepend_sibling(node, replacement)?;
        self.unlink(node);
        Ok(new)
    }

    /// Deep-copies a subtree, returning the detached copy's root.
    ///
    /// The copy duplicates names, attributes, text content, each node's
    /// own annotation, and the child structure in order. It shares no
    /// mutable state with the original: edits to one never affect the
    /// other.
    ///
    /// # Examples
    ///
    /// ```
    /// use elemtree::Document;
    ///
    /// let mut doc = Document::new();
    /// let root = doc.new_element_with("root", &[("k", "v")], vec!["text".into()]).unwrap();
    /// let dup = doc.copy(root);
    /// doc.set_attribute(dup, "k", "changed").unwrap();
    /// assert_eq!(doc.attribute(root, "k"), Some("v"));
    /// ```
    pub fn copy(&mut self, id: NodeId) -> NodeId {
        let kind = self.node(id).kind.clone();
        let meta = self.node(id).meta.clone();
        let dup = self.alloc(kind);
        self.node_mut(dup).meta = meta;

        let mut child = self.node(id).first_child;
        while let Some(c) = child {
            child = self.node(c).next_sibling;
            let copied = self.copy(c);
            let last = self.node(dup).last_child;
            self.link(copied, dup, last, None);
        }
        dup
    }

    /// Returns the total number of allocated nodes (including unlinked
    /// ones; the arena does not reclaim slots).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1 // subtract placeholder at index 0
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// --- Iterators ---

/// Iterator over the children of a node, in either direction.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
    rev: bool,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = if self.rev {
            self.doc.node(current).prev_sibling
        } else {
            self.doc.node(current).next_sibling
        };
        Some(current)
    }
}

/// Iterator over the element children of a node.
pub struct Elements<'a> {
    inner: Children<'a>,
}

impl Iterator for Elements<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let doc = self.inner.doc;
        self.inner.find(|&id| doc.is_element(id))
    }
}

/// Iterator over the text children of a node.
pub struct Texts<'a> {
    inner: Children<'a>,
}

impl Iterator for Texts<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let doc = self.inner.doc;
        self.inner.find(|&id| doc.is_text(id))
    }
}

/// Iterator over a node and its ancestors.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).parent;
        Some(current)
    }
}

/// Depth-first iterator over a node and all its descendants.
pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        // Try to go deeper first
        if let Some(child) = self.doc.first_child(current) {
            self.next = Some(child);
            return Some(current);
        }

        if current == self.root {
            self.next = None;
            return Some(current);
        }

        // Try next sibling
        if let Some(sibling) = self.doc.next_sibling(current) {
            self.next = Some(sibling);
            return Some(current);
        }

        // Walk up to find an ancestor with a next sibling
        let mut ancestor = self.doc.parent(current);
        while let Some(anc) = ancestor {
            if anc == self.root {
                break;
            }
            if let Some(sibling) = self.doc.next_sibling(anc) {
                self.next = Some(sibling);
                return Some(current);
            }
            ancestor = self.doc.parent(anc);
        }

        self.next = None;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Checks the full set of chain invariants below `parent`.
    fn assert_chain_consistent(doc: &Document, parent: NodeId) {
        let forward: Vec<NodeId> = doc.children(parent).collect();
        let mut backward: Vec<NodeId> = doc.children_reversed(parent).collect();
        backward.reverse();
        assert_eq!(forward, backward, "forward/backward disagree");

        if let Some(&first) = forward.first() {
            assert_eq!(doc.prev_sibling(first), None);
            assert_eq!(doc.first_child(parent), Some(first));
        } else {
            assert_eq!(doc.first_child(parent), None);
            assert_eq!(doc.last_child(parent), None);
        }
        if let Some(&last) = forward.last() {
            assert_eq!(doc.next_sibling(last), None);
            assert_eq!(doc.last_child(parent), Some(last));
        }
        for pair in forward.windows(2) {
            assert_eq!(doc.next_sibling(pair[0]), Some(pair[1]));
            assert_eq!(doc.prev_sibling(pair[1]), Some(pair[0]));
        }
        for &child in &forward {
            assert_eq!(doc.parent(child), Some(parent));
        }
    }

    fn sample_tree(doc: &mut Document) -> (NodeId, NodeId, NodeId, NodeId) {
        let root = doc.new_element("root").unwrap();
        let a = doc.new_element("a").unwrap();
        let b = doc.new_text("b");
        let c = doc.new_element("c").unwrap();
        doc.append(root, a).unwrap();
        doc.append(root, b).unwrap();
        doc.append(root, c).unwrap();
        (root, a, b, c)
    }

    #[test]
    fn test_new_node_is_detached() {
        let mut doc = Document::new();
        let elem = doc.new_element("div").unwrap();
        assert_eq!(doc.parent(elem), None);
        assert_eq!(doc.prev_sibling(elem), None);
        assert_eq!(doc.next_sibling(elem), None);
        assert_eq!(doc.first_child(elem), None);
        assert_eq!(doc.last_child(elem), None);
    }

    #[test]
    fn test_empty_element_name_rejected() {
        let mut doc = Document::new();
        let err = doc.new_element("").unwrap_err();
        assert!(err.is_value());
        let elem = doc.new_element("ok").unwrap();
        assert!(doc.set_name(elem, "").unwrap_err().is_value());
        assert_eq!(doc.name(elem), Some("ok"));
    }

    #[test]
    fn test_new_element_with_seeds_attributes_and_children() {
        let mut doc = Document::new();
        let corge = doc.new_element("corge").unwrap();
        let garply = doc.new_element("garply").unwrap();
        let root = doc
            .new_element_with(
                "foo",
                &[("bar", "baz")],
                vec![corge.into(), "grault".into(), garply.into()],
            )
            .unwrap();

        assert_eq!(doc.attribute(root, "bar"), Some("baz"));
        let first = doc.first_child(root).unwrap();
        assert_eq!(doc.name(first), Some("corge"));
        assert_eq!(doc.text(doc.next_sibling(first).unwrap()), Some("grault"));
        assert_eq!(doc.name(doc.last_child(root).unwrap()), Some("garply"));
        assert_chain_consistent(&doc, root);
    }

    #[test]
    fn test_new_element_with_empty_children_rejected() {
        let mut doc = Document::new();
        let err = doc.new_element_with("foo", &[], vec![]).unwrap_err();
        assert!(err.is_value());
    }

    #[test]
    fn test_append_to_empty_sets_both_endpoints() {
        let mut doc = Document::new();
        let root = doc.new_element("root").unwrap();
        let only = doc.append(root, "lone").unwrap();
        assert_eq!(doc.first_child(root), Some(only));
        assert_eq!(doc.last_child(root), Some(only));
        assert_chain_consistent(&doc, root);
    }

    #[test]
    fn test_prepend_to_empty_sets_both_endpoints() {
        let mut doc = Document::new();
        let root = doc.new_element("root").unwrap();
        let only = doc.prepend(root, "lone").unwrap();
        assert_eq!(doc.first_child(root), Some(only));
        assert_eq!(doc.last_child(root), Some(only));
    }

    #[test]
    fn test_append_to_text_node_rejected() {
        let mut doc = Document::new();
        let text = doc.new_text("leaf");
        assert!(doc.append(text, "child").unwrap_err().is_value());
        assert!(doc.prepend(text, "child").unwrap_err().is_value());
    }

    #[test]
    fn test_sibling_insertion_on_detached_node_rejected() {
        let mut doc = Document::new();
        let lone = doc.new_element("lone").unwrap();
        let err = doc.prepend_sibling(lone, "x").unwrap_err();
        assert!(err.is_structure());
        let err = doc.append_sibling(lone, "x").unwrap_err();
        assert!(err.is_structure());
    }

    #[test]
    fn test_prepend_sibling_string_coercion() {
        let mut doc = Document::new();
        let (root, a, _, _) = sample_tree(&mut doc);
        let x = doc.prepend_sibling(a, "X").unwrap();
        assert_eq!(doc.text(x), Some("X"));
        assert_eq!(doc.first_child(root), Some(x));
        assert_eq!(doc.next_sibling(x), Some(a));
        assert_chain_consistent(&doc, root);
    }

    #[test]
    fn test_append_sibling_at_end_updates_last_child() {
        let mut doc = Document::new();
        let (root, _, _, c) = sample_tree(&mut doc);
        let tail = doc.append_sibling(c, "tail").unwrap();
        assert_eq!(doc.last_child(root), Some(tail));
        assert_chain_consistent(&doc, root);
    }

    #[test]
    fn test_unlink_middle_restores_neighbors() {
        let mut doc = Document::new();
        let (root, a, b, c) = sample_tree(&mut doc);
        doc.unlink(b);
        assert_eq!(doc.next_sibling(a), Some(c));
        assert_eq!(doc.prev_sibling(c), Some(a));
        assert_eq!(doc.parent(b), None);
        assert_chain_consistent(&doc, root);
    }

    #[test]
    fn test_unlink_is_idempotent() {
        let mut doc = Document::new();
        let (root, a, _, _) = sample_tree(&mut doc);
        doc.unlink(a);
        let snapshot: Vec<NodeId> = doc.children(root).collect();
        doc.unlink(a);
        let after: Vec<NodeId> = doc.children(root).collect();
        assert_eq!(snapshot, after);
        assert_eq!(doc.parent(a), None);
    }

    #[test]
    fn test_unlink_endpoints() {
        let mut doc = Document::new();
        let (root, a, b, c) = sample_tree(&mut doc);
        doc.unlink(a);
        assert_eq!(doc.first_child(root), Some(b));
        doc.unlink(c);
        assert_eq!(doc.last_child(root), Some(b));
        doc.unlink(b);
        assert_eq!(doc.first_child(root), None);
        assert_eq!(doc.last_child(root), None);
        assert_chain_consistent(&doc, root);
    }

    #[test]
    fn test_relocate_attached_node() {
        let mut doc = Document::new();
        let (root, a, b, c) = sample_tree(&mut doc);
        // Move c to the front: it is relocated, not copied.
        doc.prepend(root, c).unwrap();
        let order: Vec<NodeId> = doc.children(root).collect();
        assert_eq!(order, vec![c, a, b]);
        assert_chain_consistent(&doc, root);
    }

    #[test]
    fn test_relocate_next_to_own_neighbor() {
        let mut doc = Document::new();
        let (root, a, b, c) = sample_tree(&mut doc);
        // b is a's next sibling; insert b before a.
        doc.prepend_sibling(a, b).unwrap();
        let order: Vec<NodeId> = doc.children(root).collect();
        assert_eq!(order, vec![b, a, c]);
        assert_chain_consistent(&doc, root);
    }

    #[test]
    fn test_insert_into_own_subtree_rejected() {
        let mut doc = Document::new();
        let root = doc.new_element("root").unwrap();
        let inner = doc.new_element("inner").unwrap();
        doc.append(root, inner).unwrap();
        let err = doc.append(inner, root).unwrap_err();
        assert!(err.is_structure());
        let err = doc.append(root, root).unwrap_err();
        assert!(err.is_structure());
        // Nothing moved.
        assert_eq!(doc.parent(inner), Some(root));
        assert_eq!(doc.parent(root), None);
    }

    #[test]
    fn test_sibling_of_itself_rejected() {
        let mut doc = Document::new();
        let (_, a, _, _) = sample_tree(&mut doc);
        assert!(doc.append_sibling(a, a).unwrap_err().is_value());
        assert!(doc.substitute(a, a).unwrap_err().is_value());
    }

    #[test]
    fn test_substitute_with_fresh_node() {
        let mut doc = Document::new();
        let (root, a, b, c) = sample_tree(&mut doc);
        let repl = doc.new_element("repl").unwrap();
        doc.substitute(b, repl).unwrap();
        let order: Vec<NodeId> = doc.children(root).collect();
        assert_eq!(order, vec![a, repl, c]);
        assert_eq!(doc.parent(b), None);
        assert_chain_consistent(&doc, root);
    }

    #[test]
    fn test_substitute_with_own_neighbor_preserves_order() {
        let mut doc = Document::new();
        let (root, a, b, c) = sample_tree(&mut doc);
        // Replace a with its own next sibling b.
        doc.substitute(a, b).unwrap();
        let order: Vec<NodeId> = doc.children(root).collect();
        assert_eq!(order, vec![b, c]);
        assert_chain_consistent(&doc, root);
    }

    #[test]
    fn test_substitute_detached_rejected() {
        let mut doc = Document::new();
        let lone = doc.new_element("lone").unwrap();
        assert!(doc.substitute(lone, "x").unwrap_err().is_structure());
    }

    #[test]
    fn test_children_iterator_both_directions() {
        let mut doc = Document::new();
        let (root, a, b, c) = sample_tree(&mut doc);
        let forward: Vec<NodeId> = doc.children(root).collect();
        assert_eq!(forward, vec![a, b, c]);
        let backward: Vec<NodeId> = doc.children_reversed(root).collect();
        assert_eq!(backward, vec![c, b, a]);
    }

    #[test]
    fn test_filtered_iterators() {
        let mut doc = Document::new();
        let (root, a, b, c) = sample_tree(&mut doc);
        let elems: Vec<NodeId> = doc.elements(root).collect();
        assert_eq!(elems, vec![a, c]);
        let elems_rev: Vec<NodeId> = doc.elements_reversed(root).collect();
        assert_eq!(elems_rev, vec![c, a]);
        let texts: Vec<NodeId> = doc.texts(root).collect();
        assert_eq!(texts, vec![b]);
        let texts_rev: Vec<NodeId> = doc.texts_reversed(root).collect();
        assert_eq!(texts_rev, vec![b]);
    }

    #[test]
    fn test_iterator_empty_element() {
        let mut doc = Document::new();
        let root = doc.new_element("root").unwrap();
        assert_eq!(doc.children(root).count(), 0);
        assert_eq!(doc.children_reversed(root).count(), 0);
        assert_eq!(doc.elements(root).count(), 0);
        assert_eq!(doc.texts(root).count(), 0);
    }

    #[test]
    fn test_descendants_document_order() {
        let mut doc = Document::new();
        let root = doc.new_element("root").unwrap();
        let a = doc.new_element("a").unwrap();
        let b = doc.new_element("b").unwrap();
        let a1 = doc.new_text("a1");
        doc.append(root, a).unwrap();
        doc.append(a, a1).unwrap();
        doc.append(root, b).unwrap();
        let order: Vec<NodeId> = doc.descendants(root).collect();
        assert_eq!(order, vec![root, a, a1, b]);
    }

    #[test]
    fn test_descendants_does_not_escape_subtree() {
        let mut doc = Document::new();
        let root = doc.new_element("root").unwrap();
        let a = doc.new_element("a").unwrap();
        let b = doc.new_element("b").unwrap();
        doc.append(root, a).unwrap();
        doc.append(root, b).unwrap();
        // Iterating from a must not spill over into b.
        let order: Vec<NodeId> = doc.descendants(a).collect();
        assert_eq!(order, vec![a]);
    }

    #[test]
    fn test_attributes_roundtrip() {
        let mut doc = Document::new();
        let elem = doc.new_element("e").unwrap();
        assert_eq!(doc.attribute(elem, "k"), None);
        assert!(!doc.has_attribute(elem, "k"));

        doc.set_attribute(elem, "k", "v1").unwrap();
        assert_eq!(doc.attribute(elem, "k"), Some("v1"));
        doc.set_attribute(elem, "k", "v2").unwrap();
        assert_eq!(doc.attribute(elem, "k"), Some("v2"));
        assert_eq!(doc.attributes(elem).len(), 1);

        assert_eq!(doc.remove_attribute(elem, "k"), Some("v2".to_string()));
        assert_eq!(doc.remove_attribute(elem, "k"), None);
        assert!(!doc.has_attribute(elem, "k"));
    }

    #[test]
    fn test_attribute_validation() {
        let mut doc = Document::new();
        let elem = doc.new_element("e").unwrap();
        let text = doc.new_text("t");
        assert!(doc.set_attribute(elem, "", "v").unwrap_err().is_value());
        assert!(doc.set_attribute(text, "k", "v").unwrap_err().is_value());
        assert_eq!(doc.attribute(text, "k"), None);
        assert!(doc.attributes(text).is_empty());
    }

    #[test]
    fn test_meta_inherited_lookup() {
        let mut doc = Document::new();
        let root = doc.new_element("root").unwrap();
        let mid = doc.new_element("mid").unwrap();
        let leaf = doc.new_text("leaf");
        doc.append(root, mid).unwrap();
        doc.append(mid, leaf).unwrap();

        assert_eq!(doc.meta(leaf), None);
        doc.set_meta(root, "top");
        assert_eq!(doc.meta(leaf), Some("top"));
        doc.set_meta(mid, "near");
        assert_eq!(doc.meta(leaf), Some("near"));
        assert_eq!(doc.own_meta(leaf), None);

        doc.clear_meta(mid);
        assert_eq!(doc.meta(leaf), Some("top"));
        // A detached node no longer inherits.
        doc.unlink(mid);
        assert_eq!(doc.meta(leaf), None);
    }

    #[test]
    fn test_copy_structure_and_payload() {
        let mut doc = Document::new();
        let corge = doc.new_element("corge").unwrap();
        let garply = doc.new_element("garply").unwrap();
        let root = doc
            .new_element_with(
                "foo",
                &[("bar", "baz")],
                vec![corge.into(), "grault".into(), garply.into()],
            )
            .unwrap();
        doc.set_meta(root, "note");

        let dup = doc.copy(root);
        assert_eq!(doc.parent(dup), None);
        assert_eq!(doc.name(dup), Some("foo"));
        assert_eq!(doc.attribute(dup, "bar"), Some("baz"));
        assert_eq!(doc.own_meta(dup), Some("note"));

        let names: Vec<Option<String>> = doc
            .children(dup)
            .map(|c| doc.name(c).map(String::from))
            .collect();
        assert_eq!(
            names,
            vec![Some("corge".to_string()), None, Some("garply".to_string())]
        );
        assert_chain_consistent(&doc, dup);
    }

    #[test]
    fn test_copy_independence() {
        let mut doc = Document::new();
        let root = doc
            .new_element_with("root", &[("k", "v")], vec!["text".into()])
            .unwrap();
        let dup = doc.copy(root);

        // Mutate the copy; the original must not move.
        doc.set_attribute(dup, "k", "changed").unwrap();
        let dup_text = doc.first_child(dup).unwrap();
        doc.set_text(dup_text, "changed").unwrap();
        doc.append(dup, "extra").unwrap();

        assert_eq!(doc.attribute(root, "k"), Some("v"));
        assert_eq!(doc.text(doc.first_child(root).unwrap()), Some("text"));
        assert_eq!(doc.children(root).count(), 1);

        // And the other way around.
        doc.unlink(doc.first_child(root).unwrap());
        assert_eq!(doc.children(dup).count(), 2);
    }

    #[test]
    fn test_text_content_concatenates_descendants() {
        let mut doc = Document::new();
        let root = doc.new_element("root").unwrap();
        let inner = doc.new_element("inner").unwrap();
        doc.append(root, "a").unwrap();
        doc.append(root, inner).unwrap();
        doc.append(inner, "b").unwrap();
        doc.append(root, "c").unwrap();
        assert_eq!(doc.text_content(root), "abc");
    }

    #[test]
    fn test_set_root_validation() {
        let mut doc = Document::new();
        let text = doc.new_text("t");
        assert!(doc.set_root(text).unwrap_err().is_value());

        let root = doc.new_element("root").unwrap();
        let child = doc.new_element("child").unwrap();
        doc.append(root, child).unwrap();
        assert!(doc.set_root(child).unwrap_err().is_structure());

        doc.set_root(root).unwrap();
        assert_eq!(doc.root(), Some(root));
    }

    #[test]
    fn test_chain_invariants_after_edit_sequence() {
        let mut doc = Document::new();
        let (root, a, b, c) = sample_tree(&mut doc);
        let d = doc.append(root, "d").unwrap();
        doc.unlink(b);
        doc.prepend_sibling(c, b).unwrap();
        doc.substitute(a, "a2").unwrap();
        doc.append_sibling(d, c).unwrap();
        doc.prepend(root, d).unwrap();
        assert_chain_consistent(&doc, root);
    }
}
