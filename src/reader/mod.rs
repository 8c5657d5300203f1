//! Pull-based streaming document reader.
//!
//! [`PullReader`] is the cursor-style contract the tree builder consumes:
//! advance one node at a time with [`read`](PullReader::read), inspect
//! the current node via the accessor methods, and walk the current
//! element's attributes with the attribute-cursor methods.
//!
//! [`TextReader`] is the bundled implementation over a UTF-8 string. It
//! is deliberately small: no namespace resolution, no DTD entity
//! declarations, no error recovery. Built-in entities and character
//! references are resolved; anything else malformed is a hard error.
//!
//! # Examples
//!
//! ```
//! use elemtree::reader::{NodeType, PullReader, TextReader};
//!
//! let mut reader = TextReader::new("<root><child>Hello</child></root>");
//! let mut elements = Vec::new();
//!
//! while reader.read().unwrap() {
//!     if reader.node_type() == NodeType::Element {
//!         elements.push(reader.name().unwrap_or_default().to_string());
//!     }
//! }
//!
//! assert_eq!(elements, vec!["root", "child"]);
//! ```

mod input;

use crate::error::Error;
use input::Input;

/// The type of the current node in a pull reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// No node — the reader has not been advanced yet.
    None,
    /// The XML declaration, e.g. `<?xml version="1.0"?>`.
    XmlDeclaration,
    /// A document type declaration, e.g. `<!DOCTYPE doc>`.
    DocumentType,
    /// A comment, e.g. `<!-- note -->`.
    Comment,
    /// A processing instruction, e.g. `<?target data?>`.
    ProcessingInstruction,
    /// An element start tag. For self-closing elements,
    /// [`PullReader::is_empty_element`] returns `true` and no separate
    /// `EndElement` is produced.
    Element,
    /// An element end tag.
    EndElement,
    /// Character data.
    Text,
    /// A CDATA section (content is not entity-resolved).
    CData,
    /// A whitespace-only text node in element content.
    Whitespace,
    /// An attribute node — the reader is positioned on an attribute
    /// after a successful attribute-cursor move.
    Attribute,
    /// The end of the document has been reached.
    EndDocument,
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::None => "None",
            Self::XmlDeclaration => "XmlDeclaration",
            Self::DocumentType => "DocumentType",
            Self::Comment => "Comment",
            Self::ProcessingInstruction => "ProcessingInstruction",
            Self::Element => "Element",
            Self::EndElement => "EndElement",
            Self::Text => "Text",
            Self::CData => "CData",
            Self::Whitespace => "Whitespace",
            Self::Attribute => "Attribute",
            Self::EndDocument => "EndDocument",
        };
        f.write_str(s)
    }
}

/// A pull-style cursor over a token-oriented document stream.
///
/// This is the contract the streaming builder consumes; any source that
/// can produce element/text events can implement it.
pub trait PullReader {
    /// Advances to the next node. Returns `Ok(true)` on success or
    /// `Ok(false)` once the end of the stream is reached.
    ///
    /// # Errors
    ///
    /// Returns a malformed-input error if the stream cannot be advanced.
    fn read(&mut self) -> Result<bool, Error>;

    /// Returns the type of the current node.
    fn node_type(&self) -> NodeType;

    /// Returns the name of the current node, where applicable (elements,
    /// end tags, attributes, processing-instruction targets).
    fn name(&self) -> Option<&str>;

    /// Returns the value of the current node, where applicable (text,
    /// CDATA, whitespace, comments, attribute values, PI data).
    fn value(&self) -> Option<&str>;

    /// Returns whether the current element is self-closing.
    fn is_empty_element(&self) -> bool;

    /// Moves the cursor to the first attribute of the current element.
    /// Returns `false` when there are none or the current node is not
    /// an element.
    fn move_to_first_attribute(&mut self) -> bool;

    /// Moves the cursor to the next attribute. Returns `false` when the
    /// attributes are exhausted.
    fn move_to_next_attribute(&mut self) -> bool;

    /// Moves the cursor back from an attribute to its owning element.
    /// Returns `false` if the cursor was not on an attribute.
    fn move_to_element(&mut self) -> bool;
}

/// The node the reader is currently positioned on.
#[derive(Debug, Clone)]
struct ReaderNode {
    node_type: NodeType,
    name: String,
    value: Option<String>,
    is_empty_element: bool,
    attributes: Vec<(String, String)>,
}

impl ReaderNode {
    fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            name: String::new(),
            value: None,
            is_empty_element: false,
            attributes: Vec::new(),
        }
    }
}

/// A [`PullReader`] over a UTF-8 string.
pub struct TextReader<'a> {
    /// Low-level cursor (position, peeking, names, references).
    input: Input<'a>,
    /// The current node.
    current: ReaderNode,
    /// Whether the document has ended.
    finished: bool,
    /// Whether the root element start has been consumed.
    root_parsed: bool,
    /// Whether the cursor is inside element content.
    in_element_content: bool,
    /// Stack of open element names, for matching end tags.
    element_stack: Vec<String>,
    /// Current attribute index while navigating attributes.
    attribute_index: Option<usize>,
    /// The element node saved while navigating attributes.
    saved_element: Option<ReaderNode>,
}

impl<'a> TextReader<'a> {
    /// Creates a reader over a string slice.
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self {
            input: Input::new(source),
            current: ReaderNode::new(NodeType::None),
            finished: false,
            root_parsed: false,
            in_element_content: false,
            element_stack: Vec::new(),
            attribute_index: None,
            saved_element: None,
        }
    }

    // === Internal: dispatch ===

    fn read_next_node(&mut self) -> Result<bool, Error> {
        if !self.root_parsed {
            return self.read_prolog_or_root();
        }
        if self.in_element_content {
            return self.read_element_content();
        }
        self.read_trailing_misc()
    }

    fn read_prolog_or_root(&mut self) -> Result<bool, Error> {
        self.input.skip_whitespace();

        if self.input.at_end() {
            self.finished = true;
            self.current = ReaderNode::new(NodeType::EndDocument);
            return Ok(false);
        }

        if self.input.looking_at(b"<?xml ")
            || self.input.looking_at(b"<?xml\t")
            || self.input.looking_at(b"<?xml\r")
            || self.input.looking_at(b"<?xml\n")
            || self.input.looking_at(b"<?xml?>")
        {
            self.current = self.parse_processing_instruction(NodeType::XmlDeclaration)?;
            return Ok(true);
        }

        if self.input.looking_at(b"<!DOCTYPE") || self.input.looking_at(b"<!doctype") {
            self.current = self.parse_doctype()?;
            return Ok(true);
        }

        if self.input.looking_at(b"<!--") {
            self.current = self.parse_comment()?;
            return Ok(true);
        }

        if self.input.looking_at(b"<?") {
            self.current = self.parse_processing_instruction(NodeType::ProcessingInstruction)?;
            return Ok(true);
        }

        if self.input.peek() == Some(b'<')
            && self.input.peek_at(1).is_some_and(|b| b != b'!' && b != b'?')
        {
            self.root_parsed = true;
            self.current = self.parse_element_start()?;
            return Ok(true);
        }

        Err(self.input.fatal("expected element start"))
    }

    fn read_element_content(&mut self) -> Result<bool, Error> {
        if self.input.at_end() {
            return Err(self
                .input
                .fatal("unexpected end of input in element content"));
        }

        if self.input.looking_at(b"</") {
            self.current = self.parse_end_tag()?;
            return Ok(true);
        }

        if self.input.looking_at(b"<![CDATA[") {
            self.current = self.parse_cdata()?;
            return Ok(true);
        }

        if self.input.looking_at(b"<!--") {
            self.current = self.parse_comment()?;
            return Ok(true);
        }

        if self.input.looking_at(b"<?") {
            self.current = self.parse_processing_instruction(NodeType::ProcessingInstruction)?;
            return Ok(true);
        }

        if self.input.peek() == Some(b'<')
            && self.input.peek_at(1).is_some_and(|b| b != b'!' && b != b'?')
        {
            self.current = self.parse_element_start()?;
            return Ok(true);
        }

        if self.input.peek() == Some(b'<') {
            return Err(self.input.fatal("unrecognized markup"));
        }

        self.current = self.parse_char_data()?;
        Ok(true)
    }

    fn read_trailing_misc(&mut self) -> Result<bool, Error> {
        self.input.skip_whitespace();

        if self.input.at_end() {
            self.finished = true;
            self.current = ReaderNode::new(NodeType::EndDocument);
            return Ok(false);
        }

        if self.input.looking_at(b"<!--") {
            self.current = self.parse_comment()?;
            return Ok(true);
        }

        if self.input.looking_at(b"<?") {
            self.current = self.parse_processing_instruction(NodeType::ProcessingInstruction)?;
            return Ok(true);
        }

        Err(self.input.fatal("content after document element"))
    }

    // === Internal: individual constructs ===

    fn parse_element_start(&mut self) -> Result<ReaderNode, Error> {
        self.input.increment_depth()?;
        self.input.expect_byte(b'<')?;
        let name = self.input.parse_name()?;

        let mut attributes: Vec<(String, String)> = Vec::new();
        loop {
            let had_ws = self.input.skip_whitespace();
            if self.input.peek() == Some(b'>') || self.input.looking_at(b"/>") {
                break;
            }
            if !had_ws {
                return Err(self.input.fatal("whitespace required between attributes"));
            }
            let attr_name = self.input.parse_name()?;
            self.input.skip_whitespace();
            self.input.expect_byte(b'=')?;
            self.input.skip_whitespace();
            let attr_value = self.input.parse_attribute_value()?;
            if attributes.iter().any(|(n, _)| *n == attr_name) {
                return Err(self
                    .input
                    .fatal(format!("duplicate attribute '{attr_name}'")));
            }
            attributes.push((attr_name, attr_value));
        }

        let is_empty = self.input.looking_at(b"/>");
        if is_empty {
            self.input.advance(2);
        } else {
            self.input.expect_byte(b'>')?;
        }

        let mut node = ReaderNode::new(NodeType::Element);
        node.name = name.clone();
        node.is_empty_element = is_empty;
        node.attributes = attributes;

        if is_empty {
            // No separate EndElement is emitted for self-closing tags;
            // the is_empty_element flag signals the caller.
            self.input.decrement_depth();
        } else {
            self.element_stack.push(name);
            self.in_element_content = true;
        }

        Ok(node)
    }

    fn parse_end_tag(&mut self) -> Result<ReaderNode, Error> {
        self.input.expect_str(b"</")?;
        let name = self.input.parse_name()?;
        self.input.skip_whitespace();
        self.input.expect_byte(b'>')?;

        match self.element_stack.last() {
            Some(expected) if *expected == name => {}
            Some(expected) => {
                return Err(self.input.fatal(format!(
                    "mismatched end tag: expected </{expected}>, found </{name}>"
                )));
            }
            None => {
                return Err(self.input.fatal(format!("unexpected end tag </{name}>")));
            }
        }

        self.element_stack.pop();
        self.input.decrement_depth();
        self.in_element_content = !self.element_stack.is_empty();

        let mut node = ReaderNode::new(NodeType::EndElement);
        node.name = name;
        Ok(node)
    }

    fn parse_char_data(&mut self) -> Result<ReaderNode, Error> {
        let mut text = String::new();
        loop {
            self.input.take_char_data(&mut text)?;
            match self.input.peek() {
                Some(b'&') => text.push_str(&self.input.parse_reference()?),
                _ => break,
            }
        }
        let is_whitespace = text
            .chars()
            .all(|c| c == ' ' || c == '\t' || c == '\n' || c == '\r');
        let mut node = ReaderNode::new(if is_whitespace {
            NodeType::Whitespace
        } else {
            NodeType::Text
        });
        node.value = Some(text);
        Ok(node)
    }

    fn parse_cdata(&mut self) -> Result<ReaderNode, Error> {
        self.input.expect_str(b"<![CDATA[")?;
        let mut content = String::new();
        while !self.input.looking_at(b"]]>") {
            if self.input.at_end() {
                return Err(self.input.fatal("unterminated CDATA section"));
            }
            content.push(self.input.next_char()?);
        }
        self.input.advance(3);

        let mut node = ReaderNode::new(NodeType::CData);
        node.value = Some(content);
        Ok(node)
    }

    fn parse_comment(&mut self) -> Result<ReaderNode, Error> {
        self.input.expect_str(b"<!--")?;
        let mut content = String::new();
        while !self.input.looking_at(b"-->") {
            if self.input.at_end() {
                return Err(self.input.fatal("unterminated comment"));
            }
            content.push(self.input.next_char()?);
        }
        self.input.advance(3);

        let mut node = ReaderNode::new(NodeType::Comment);
        node.value = Some(content);
        Ok(node)
    }

    fn parse_processing_instruction(&mut self, node_type: NodeType) -> Result<ReaderNode, Error> {
        self.input.expect_str(b"<?")?;
        let target = self.input.parse_name()?;
        self.input.skip_whitespace();
        let mut data = String::new();
        while !self.input.looking_at(b"?>") {
            if self.input.at_end() {
                return Err(self.input.fatal("unterminated processing instruction"));
            }
            data.push(self.input.next_char()?);
        }
        self.input.advance(2);

        let mut node = ReaderNode::new(node_type);
        node.name = target;
        node.value = if data.is_empty() { None } else { Some(data) };
        Ok(node)
    }

    fn parse_doctype(&mut self) -> Result<ReaderNode, Error> {
        self.input.advance(2); // "<!"
        // Accept either case for the keyword.
        for expected in *b"DOCTYPE" {
            let Some(b) = self.input.peek() else {
                return Err(self.input.fatal("unterminated doctype declaration"));
            };
            if !b.eq_ignore_ascii_case(&expected) {
                return Err(self.input.fatal("malformed doctype declaration"));
            }
            self.input.advance(1);
        }
        self.input.skip_whitespace();
        let name = self.input.parse_name()?;
        self.input.skip_whitespace();

        if self.input.looking_at(b"SYSTEM") {
            self.input.expect_str(b"SYSTEM")?;
            self.input.skip_whitespace();
            self.input.parse_quoted_value()?;
            self.input.skip_whitespace();
        } else if self.input.looking_at(b"PUBLIC") {
            self.input.expect_str(b"PUBLIC")?;
            self.input.skip_whitespace();
            self.input.parse_quoted_value()?;
            self.input.skip_whitespace();
            self.input.parse_quoted_value()?;
            self.input.skip_whitespace();
        }

        // Skip an internal subset without interpreting it, tracking
        // nested brackets and quoted strings.
        if self.input.peek() == Some(b'[') {
            self.input.advance(1);
            let mut bracket_depth: u32 = 1;
            while bracket_depth > 0 {
                match self.input.peek() {
                    None => return Err(self.input.fatal("unterminated doctype declaration")),
                    Some(b'[') => {
                        bracket_depth += 1;
                        self.input.advance(1);
                    }
                    Some(b']') => {
                        bracket_depth -= 1;
                        self.input.advance(1);
                    }
                    Some(b'"' | b'\'') => {
                        self.input.parse_quoted_value()?;
                    }
                    Some(_) => self.input.advance(1),
                }
            }
            self.input.skip_whitespace();
        }

        self.input.expect_byte(b'>')?;

        let mut node = ReaderNode::new(NodeType::DocumentType);
        node.name = name;
        Ok(node)
    }
}

impl PullReader for TextReader<'_> {
    fn read(&mut self) -> Result<bool, Error> {
        // Reset attribute navigation when advancing.
        self.attribute_index = None;
        self.saved_element = None;

        if self.finished {
            return Ok(false);
        }
        self.read_next_node()
    }

    fn node_type(&self) -> NodeType {
        self.current.node_type
    }

    fn name(&self) -> Option<&str> {
        match self.current.node_type {
            NodeType::Element
            | NodeType::EndElement
            | NodeType::Attribute
            | NodeType::ProcessingInstruction
            | NodeType::XmlDeclaration
            | NodeType::DocumentType => {
                if self.current.name.is_empty() {
                    None
                } else {
                    Some(&self.current.name)
                }
            }
            _ => None,
        }
    }

    fn value(&self) -> Option<&str> {
        self.current.value.as_deref()
    }

    fn is_empty_element(&self) -> bool {
        self.current.is_empty_element
    }

    fn move_to_first_attribute(&mut self) -> bool {
        if self.current.node_type != NodeType::Element
            && self.current.node_type != NodeType::Attribute
        {
            return false;
        }

        if self.saved_element.is_none() && self.current.node_type == NodeType::Element {
            self.saved_element = Some(self.current.clone());
        }
        let Some(elem) = self.saved_element.as_ref() else {
            return false;
        };
        let Some((name, value)) = elem.attributes.first().cloned() else {
            return false;
        };

        let attributes = elem.attributes.clone();
        self.current = ReaderNode {
            node_type: NodeType::Attribute,
            name,
            value: Some(value),
            is_empty_element: false,
            attributes,
        };
        self.attribute_index = Some(0);
        true
    }

    fn move_to_next_attribute(&mut self) -> bool {
        let Some(idx) = self.attribute_index else {
            return self.move_to_first_attribute();
        };
        let Some(elem) = self.saved_element.as_ref() else {
            return false;
        };

        let next_idx = idx + 1;
        let Some((name, value)) = elem.attributes.get(next_idx).cloned() else {
            return false;
        };

        let attributes = elem.attributes.clone();
        self.current = ReaderNode {
            node_type: NodeType::Attribute,
            name,
            value: Some(value),
            is_empty_element: false,
            attributes,
        };
        self.attribute_index = Some(next_idx);
        true
    }

    fn move_to_element(&mut self) -> bool {
        if let Some(elem) = self.saved_element.take() {
            self.current = elem;
            self.attribute_index = None;
            true
        } else {
            false
        }
    }
}
