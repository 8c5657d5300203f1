//! Text writer implementation.
//!
//! `XmlWriter` renders the [`PushWriter`](super::PushWriter) call
//! sequence into a string: deferred tag closing (so attributes can
//! follow a start-element call), self-closing tags for childless
//! elements, escaping, and optional pretty-printing.

use super::PushWriter;

/// Options controlling text output.
///
/// # Examples
///
/// ```
/// use elemtree::build::read_document;
/// use elemtree::serial::{serialize_with_options, SerializeOptions};
///
/// let doc = read_document("<root><child>Hello</child></root>").unwrap();
/// let out = serialize_with_options(&doc, &SerializeOptions::default().indent(true)).unwrap();
/// assert!(out.contains("  <child>"));
/// ```
#[derive(Debug, Clone)]
pub struct SerializeOptions {
    /// Whether to produce indented (pretty-printed) output.
    /// Defaults to `false`.
    pub indent: bool,
    /// The indentation string used for each level when `indent` is `true`.
    /// Defaults to two spaces.
    pub indent_str: String,
    /// Whether to emit the XML declaration. Defaults to `true`.
    pub declaration: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            indent: false,
            indent_str: "  ".to_string(),
            declaration: true,
        }
    }
}

impl SerializeOptions {
    /// Enables or disables indented (pretty-printed) output.
    ///
    /// When enabled, child elements are placed on their own lines with
    /// indentation. Mixed-content elements (those containing text) are
    /// left unindented, since reformatting would change their content.
    #[must_use]
    pub fn indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    /// Sets the indentation string used for each nesting level.
    #[must_use]
    pub fn indent_str(mut self, s: &str) -> Self {
        self.indent_str = s.to_string();
        self
    }

    /// Enables or disables the leading XML declaration.
    #[must_use]
    pub fn declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }
}

/// Per-element state while writing.
struct Frame {
    name: String,
    has_text: bool,
    has_children: bool,
}

/// A [`PushWriter`](super::PushWriter) that renders to a `String`.
pub struct XmlWriter {
    options: SerializeOptions,
    out: String,
    stack: Vec<Frame>,
    /// Whether a start tag is still open (awaiting `>` or `/>`).
    tag_open: bool,
}

impl XmlWriter {
    /// Creates a writer with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(SerializeOptions::default())
    }

    /// Creates a writer with the given options.
    #[must_use]
    pub fn with_options(options: SerializeOptions) -> Self {
        Self {
            options,
            out: String::new(),
            stack: Vec::new(),
            tag_open: false,
        }
    }

    /// Returns the output produced so far.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.out
    }

    /// Consumes the writer and returns the output.
    #[must_use]
    pub fn into_string(self) -> String {
        self.out
    }

    /// Completes a pending start tag with `>`.
    fn close_open_tag(&mut self) {
        if self.tag_open {
            self.out.push('>');
            self.tag_open = false;
        }
    }

    fn push_indent(&mut self, depth: usize) {
        self.out.push('\n');
        for _ in 0..depth {
            self.out.push_str(&self.options.indent_str);
        }
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PushWriter for XmlWriter {
    fn begin_document(&mut self) {
        if self.options.declaration {
            self.out.push_str("<?xml version=\"1.0\"?>\n");
        }
    }

    fn end_document(&mut self) {
        self.out.push('\n');
    }

    fn start_element(&mut self, name: &str) {
        self.close_open_tag();
        if self.options.indent {
            if let Some(parent) = self.stack.last() {
                if !parent.has_text {
                    self.push_indent(self.stack.len());
                }
            }
        }
        if let Some(parent) = self.stack.last_mut() {
            parent.has_children = true;
        }
        self.stack.push(Frame {
            name: name.to_string(),
            has_text: false,
            has_children: false,
        });
        self.out.push('<');
        self.out.push_str(name);
        self.tag_open = true;
    }

    fn end_element(&mut self) {
        debug_assert!(!self.stack.is_empty(), "end_element without start_element");
        let Some(frame) = self.stack.pop() else {
            return;
        };
        if self.tag_open {
            self.out.push_str("/>");
            self.tag_open = false;
            return;
        }
        if self.options.indent && frame.has_children && !frame.has_text {
            self.push_indent(self.stack.len());
        }
        self.out.push_str("</");
        self.out.push_str(&frame.name);
        self.out.push('>');
    }

    fn write_attribute(&mut self, name: &str, value: &str) {
        debug_assert!(self.tag_open, "write_attribute outside a start tag");
        if !self.tag_open {
            return;
        }
        self.out.push(' ');
        self.out.push_str(name);
        self.out.push_str("=\"");
        write_escaped_attr(&mut self.out, value);
        self.out.push('"');
    }

    fn write_text(&mut self, content: &str) {
        self.close_open_tag();
        if let Some(frame) = self.stack.last_mut() {
            frame.has_text = true;
        }
        write_escaped_text(&mut self.out, content);
    }

    fn flush(&mut self) {}
}

/// Escapes text content: `&`, `<`, `>` as named entities and `\r` as a
/// character reference (so it survives a round-trip); `\t` and `\n` pass
/// through.
fn write_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(ch),
        }
    }
}

/// Escapes an attribute value: additionally quotes `"` and encodes
/// whitespace characters as character references so they survive
/// attribute-value normalization on re-read.
fn write_escaped_attr(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(ch),
        }
    }
}
