//! Name- and predicate-based child lookup.
//!
//! `Selectors` is a two-tier dispatch table: a query string either has a
//! registered handler (the extension point) or falls back to a literal
//! scan of an element's direct children by name equality. Nothing is
//! compiled or cached — every call re-scans.
//!
//! Handlers receive the document, the element being queried, and a
//! `reversed` flag, and produce the matching node sequence. The baseline
//! contract scopes handlers to direct children; a handler that wants
//! subtree scope may walk [`Document::descendants`] explicitly.
//!
//! A process-wide default table backs the [`Document`] conveniences
//! ([`Document::select_first`] and friends) so a query works on any
//! element without explicit wiring; code that wants an isolated table
//! constructs its own `Selectors` and calls its methods directly.
//!
//! # Examples
//!
//! ```
//! use elemtree::select::Selectors;
//! use elemtree::Document;
//!
//! let mut doc = Document::new();
//! let root = doc.new_element("root").unwrap();
//! let item = doc.new_element("item").unwrap();
//! doc.append(root, item).unwrap();
//!
//! let mut selectors = Selectors::new();
//! assert_eq!(selectors.first(&doc, root, "item"), Some(item));
//!
//! selectors.register(":none", |_, _, _| Vec::new());
//! assert_eq!(selectors.first(&doc, root, ":none"), None);
//! ```

use crate::tree::{Document, NodeId};
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A registered selector handler.
///
/// Arguments are the document, the element being queried, and whether the
/// produced sequence should run last-to-first.
pub type SelectorFn = dyn Fn(&Document, NodeId, bool) -> Vec<NodeId> + Send + Sync;

/// A dispatch table mapping query strings to handlers, with literal
/// name matching over direct children as the fallback.
#[derive(Default)]
pub struct Selectors {
    handlers: HashMap<String, Box<SelectorFn>>,
}

impl Selectors {
    /// Creates an empty dispatch table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers a handler for a query string.
    ///
    /// Re-registering the same query replaces the previous handler
    /// (last writer wins). There is no removal primitive.
    pub fn register(
        &mut self,
        query: impl Into<String>,
        handler: impl Fn(&Document, NodeId, bool) -> Vec<NodeId> + Send + Sync + 'static,
    ) {
        self.handlers.insert(query.into(), Box::new(handler));
    }

    /// Returns `true` if a handler is registered for this query.
    #[must_use]
    pub fn is_registered(&self, query: &str) -> bool {
        self.handlers.contains_key(query)
    }

    /// Returns the first match for `query` among `element`'s children.
    ///
    /// With a registered handler, this is the first node of the handler's
    /// forward sequence; otherwise the first direct child whose name
    /// equals `query`. `None` when nothing matches.
    #[must_use]
    pub fn first(&self, doc: &Document, element: NodeId, query: &str) -> Option<NodeId> {
        match self.handlers.get(query) {
            Some(handler) => handler(doc, element, false).into_iter().next(),
            None => doc.children(element).find(|&c| doc.name(c) == Some(query)),
        }
    }

    /// Returns the last match for `query` among `element`'s children.
    ///
    /// With a registered handler, this is the first node of the handler's
    /// reversed sequence; otherwise the scan runs back-to-front.
    #[must_use]
    pub fn last(&self, doc: &Document, element: NodeId, query: &str) -> Option<NodeId> {
        match self.handlers.get(query) {
            Some(handler) => handler(doc, element, true).into_iter().next(),
            None => doc
                .children_reversed(element)
                .find(|&c| doc.name(c) == Some(query)),
        }
    }

    /// Returns every match for `query` among `element`'s children, in
    /// child order.
    #[must_use]
    pub fn all(&self, doc: &Document, element: NodeId, query: &str) -> Vec<NodeId> {
        match self.handlers.get(query) {
            Some(handler) => handler(doc, element, false),
            None => doc
                .children(element)
                .filter(|&c| doc.name(c) == Some(query))
                .collect(),
        }
    }
}

// --- Process-wide default table ---

static DEFAULT: OnceLock<RwLock<Selectors>> = OnceLock::new();

fn default_table() -> &'static RwLock<Selectors> {
    DEFAULT.get_or_init(|| RwLock::new(Selectors::new()))
}

fn read_default() -> RwLockReadGuard<'static, Selectors> {
    match default_table().read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_default() -> RwLockWriteGuard<'static, Selectors> {
    match default_table().write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Registers a handler in the process-wide default table.
///
/// # Examples
///
/// ```
/// use elemtree::Document;
///
/// elemtree::select::register(":first-element", |doc, element, reversed| {
///     let found = if reversed {
///         doc.elements_reversed(element).next()
///     } else {
///         doc.elements(element).next()
///     };
///     found.into_iter().collect()
/// });
///
/// let mut doc = Document::new();
/// let root = doc.new_element("root").unwrap();
/// let child = doc.new_element("child").unwrap();
/// doc.append(root, child).unwrap();
/// assert_eq!(doc.select_first(root, ":first-element"), Some(child));
/// ```
pub fn register(
    query: impl Into<String>,
    handler: impl Fn(&Document, NodeId, bool) -> Vec<NodeId> + Send + Sync + 'static,
) {
    write_default().register(query, handler);
}

impl Document {
    /// Returns the first match for `query` among `element`'s children,
    /// consulting the process-wide default selector table.
    #[must_use]
    pub fn select_first(&self, element: NodeId, query: &str) -> Option<NodeId> {
        read_default().first(self, element, query)
    }

    /// Returns the last match for `query` among `element`'s children,
    /// consulting the process-wide default selector table.
    #[must_use]
    pub fn select_last(&self, element: NodeId, query: &str) -> Option<NodeId> {
        read_default().last(self, element, query)
    }

    /// Returns every match for `query` among `element`'s children,
    /// consulting the process-wide default selector table.
    #[must_use]
    pub fn select_all(&self, element: NodeId, query: &str) -> Vec<NodeId> {
        read_default().all(self, element, query)
    }
}
