//! HTML parser – converts an HTML string into a simple DOM tree.
//!
//! Tolerant of the markup templates usually contain: unclosed elements,
//! optional end tags (`li`, `td`, `tr`, `p`, ...), stray `<` characters in
//! text, uppercase tags. Comments, doctypes and
//! processing instructions are dropped; `<script>`, `<style>`, `<title>` and
//! `<textarea>` bodies are kept as raw text.

use std::collections::HashMap;

use crate::compose::decode;

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

/// Element kinds the native engine distinguishes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Html,
    Head,
    Title,
    Body,
    Style,
    Script,
    P,
    /// `h1`–`h6`.
    Heading(u8),
    Ul,
    Ol,
    Li,
    Table,
    /// `thead`, `tbody`, `tfoot`.
    TableSection,
    Tr,
    Td,
    Th,
    Pre,
    Blockquote,
    Br,
    Hr,
    Img,
    /// `strong`, `b`.
    Strong,
    /// `em`, `i`, `cite`.
    Em,
    U,
    /// `code`, `kbd`, `samp`, `tt`.
    Code,
    /// Generic block container (`div`, `section`, `header`, ...).
    Block(String),
    /// Element with no content model we care about (`meta`, `link`, ...).
    Void(String),
    /// Anything else renders as inline content.
    Inline(String),
}

impl Tag {
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "html" => Tag::Html,
            "head" => Tag::Head,
            "title" => Tag::Title,
            "body" => Tag::Body,
            "style" => Tag::Style,
            "script" | "noscript" | "template" => Tag::Script,
            "p" => Tag::P,
            "h1" => Tag::Heading(1),
            "h2" => Tag::Heading(2),
            "h3" => Tag::Heading(3),
            "h4" => Tag::Heading(4),
            "h5" => Tag::Heading(5),
            "h6" => Tag::Heading(6),
            "ul" => Tag::Ul,
            "ol" => Tag::Ol,
            "li" => Tag::Li,
            "table" => Tag::Table,
            "thead" | "tbody" | "tfoot" => Tag::TableSection,
            "tr" => Tag::Tr,
            "td" => Tag::Td,
            "th" => Tag::Th,
            "pre" => Tag::Pre,
            "blockquote" => Tag::Blockquote,
            "br" => Tag::Br,
            "hr" => Tag::Hr,
            "img" => Tag::Img,
            "strong" | "b" => Tag::Strong,
            "em" | "i" | "cite" => Tag::Em,
            "u" | "ins" => Tag::U,
            "code" | "kbd" | "samp" | "tt" => Tag::Code,
            "div" | "section" | "article" | "header" | "footer" | "main" | "nav" | "aside"
            | "address" | "figure" | "figcaption" | "form" | "fieldset" | "center" | "dl"
            | "dt" | "dd" | "caption" => Tag::Block(lower),
            "meta" | "link" | "input" | "col" | "wbr" | "area" | "base" | "source" | "embed"
            | "param" | "track" => Tag::Void(lower),
            _ => Tag::Inline(lower),
        }
    }

    /// Elements that never have children or a closing tag.
    pub fn is_void(&self) -> bool {
        matches!(self, Tag::Br | Tag::Hr | Tag::Img | Tag::Void(_))
    }

    /// Elements whose content is raw text up to the matching closing tag.
    pub fn is_raw_text(&self) -> bool {
        matches!(self, Tag::Script | Tag::Style | Tag::Title)
            || matches!(self, Tag::Inline(name) if name == "textarea")
    }

    /// Elements that start a new block in the flow.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            Tag::Html
                | Tag::Body
                | Tag::P
                | Tag::Heading(_)
                | Tag::Ul
                | Tag::Ol
                | Tag::Li
                | Tag::Table
                | Tag::TableSection
                | Tag::Tr
                | Tag::Td
                | Tag::Th
                | Tag::Pre
                | Tag::Blockquote
                | Tag::Hr
                | Tag::Block(_)
        )
    }
}

/// A node in our DOM tree.
#[derive(Debug, Clone)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

/// An element node carrying tag, attributes, and children.
#[derive(Debug, Clone)]
pub struct ElementNode {
    pub tag: Tag,
    pub attributes: HashMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn inline_style(&self) -> Option<&str> {
        self.attributes.get("style").map(|s| s.as_str())
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[DomNode], out: &mut String) {
    for node in nodes {
        match node {
            DomNode::Text(t) => out.push_str(t),
            DomNode::Element(e) => collect_text(&e.children, out),
        }
    }
}

// ---------------------------------------------------------------------------
// Parser – tokenizer plus an explicit stack of open elements
// ---------------------------------------------------------------------------

/// Deepest element nesting the parser builds. Elements opened below this
/// depth are attached to the deepest open element instead, the way browsers
/// bound their DOM depth, so later tree walks stay shallow.
pub const MAX_DEPTH: usize = 512;

/// Parse an HTML string into a list of top-level DOM nodes.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    let mut parser = Parser::new(html);
    let mut tree = TreeBuilder::default();
    while let Some(token) = parser.next_token() {
        match token {
            Token::Text(text) => tree.append(DomNode::Text(text)),
            Token::Start { element, closed } => tree.open(element, closed),
            Token::End(tag) => tree.close(&tag),
        }
    }
    tree.finish()
}

enum Token {
    Text(String),
    /// `closed` is set for void, self-closing and raw-text elements, which
    /// arrive complete.
    Start { element: ElementNode, closed: bool },
    End(Tag),
}

#[derive(Default)]
struct TreeBuilder {
    roots: Vec<DomNode>,
    open: Vec<ElementNode>,
}

impl TreeBuilder {
    fn append(&mut self, node: DomNode) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn open(&mut self, element: ElementNode, closed: bool) {
        self.close_implied(&element.tag);
        if closed || self.open.len() >= MAX_DEPTH {
            self.append(DomNode::Element(element));
        } else {
            self.open.push(element);
        }
    }

    /// Close the innermost open element.
    fn pop(&mut self) {
        if let Some(element) = self.open.pop() {
            self.append(DomNode::Element(element));
        }
    }

    /// Close everything up to and including the innermost open element
    /// matching `target`, unless a `boundary` element is open below it.
    fn close_in_scope(&mut self, target: impl Fn(&Tag) -> bool, boundary: impl Fn(&Tag) -> bool) {
        for i in (0..self.open.len()).rev() {
            let tag = &self.open[i].tag;
            if target(tag) {
                while self.open.len() > i {
                    self.pop();
                }
                return;
            }
            if boundary(tag) {
                return;
            }
        }
    }

    /// Optional end tags: a new list item closes the previous one, a new
    /// cell the previous cell, a block closes an open paragraph.
    fn close_implied(&mut self, tag: &Tag) {
        if closes_paragraph(tag) {
            self.close_in_scope(|t| *t == Tag::P, is_scope_boundary);
        }
        match tag {
            Tag::Li => self.close_in_scope(
                |t| *t == Tag::Li,
                |t| matches!(t, Tag::Ul | Tag::Ol) || is_scope_boundary(t),
            ),
            Tag::Td | Tag::Th => self.close_in_scope(
                |t| matches!(t, Tag::Td | Tag::Th),
                |t| matches!(t, Tag::Tr | Tag::TableSection | Tag::Table),
            ),
            Tag::Tr => self.close_in_scope(
                |t| *t == Tag::Tr,
                |t| matches!(t, Tag::TableSection | Tag::Table),
            ),
            Tag::TableSection => self.close_in_scope(
                |t| matches!(t, Tag::Tr | Tag::TableSection),
                |t| *t == Tag::Table,
            ),
            Tag::Heading(_) => {
                if matches!(self.open.last(), Some(e) if matches!(e.tag, Tag::Heading(_))) {
                    self.pop();
                }
            }
            Tag::Block(name) if name == "dt" || name == "dd" => self.close_in_scope(
                |t| matches!(t, Tag::Block(n) if n == "dt" || n == "dd"),
                |t| matches!(t, Tag::Block(n) if n == "dl") || is_scope_boundary(t),
            ),
            _ => {}
        }
    }

    /// An end tag closes the innermost matching open element and everything
    /// opened inside it. End tags with no match are ignored.
    fn close(&mut self, tag: &Tag) {
        let target = |t: &Tag| match (t, tag) {
            (Tag::Heading(_), Tag::Heading(_)) => true,
            _ => t == tag,
        };
        match tag {
            Tag::Li => self.close_in_scope(target, |t| {
                matches!(t, Tag::Ul | Tag::Ol) || is_scope_boundary(t)
            }),
            Tag::Td | Tag::Th | Tag::Tr | Tag::TableSection => {
                self.close_in_scope(target, |t| *t == Tag::Table)
            }
            Tag::P => self.close_in_scope(target, is_scope_boundary),
            _ => self.close_in_scope(target, |_| false),
        }
    }

    fn finish(mut self) -> Vec<DomNode> {
        while !self.open.is_empty() {
            self.pop();
        }
        self.roots
    }
}

fn is_scope_boundary(tag: &Tag) -> bool {
    matches!(tag, Tag::Html | Tag::Body | Tag::Table | Tag::Td | Tag::Th)
}

fn closes_paragraph(tag: &Tag) -> bool {
    matches!(
        tag,
        Tag::P
            | Tag::Heading(_)
            | Tag::Ul
            | Tag::Ol
            | Tag::Li
            | Tag::Table
            | Tag::Pre
            | Tag::Blockquote
            | Tag::Hr
            | Tag::Block(_)
    )
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn next_token(&mut self) -> Option<Token> {
        while !self.eof() {
            if self.starts_with("<!--") {
                self.skip_comment();
            } else if self.starts_with("<!") || self.starts_with("<?") {
                self.skip_past('>');
            } else if self.starts_with("</") {
                self.advance(2);
                let name = self.parse_tag_name();
                self.skip_past('>');
                if !name.is_empty() {
                    return Some(Token::End(Tag::from_name(&name)));
                }
            } else if self.at_tag_open() {
                return Some(self.parse_start_tag());
            } else {
                return Some(self.parse_text());
            }
        }
        None
    }

    /// `<` followed by a letter starts an element; anything else is text.
    fn at_tag_open(&self) -> bool {
        let mut chars = self.input[self.pos..].chars();
        chars.next() == Some('<') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
    }

    fn at_markup(&self) -> bool {
        self.at_tag_open()
            || self.starts_with("</")
            || self.starts_with("<!")
            || self.starts_with("<?")
    }

    fn parse_text(&mut self) -> Token {
        let start = self.pos;
        // Always consume at least one character so a stray `<` makes progress.
        self.advance(1);
        while !self.eof() && !self.at_markup() {
            self.advance(1);
        }
        Token::Text(decode(&self.input[start..self.pos]))
    }

    fn parse_start_tag(&mut self) -> Token {
        // Consume '<'
        self.advance(1);
        let tag_name = self.parse_tag_name();
        let mut element = ElementNode::new(Tag::from_name(&tag_name));

        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let (key, value) = self.parse_attribute();
            if key.is_empty() {
                // Junk such as a stray quote; skip it.
                self.advance(1);
                continue;
            }
            element.attributes.insert(key.to_ascii_lowercase(), value);
        }

        if self.starts_with("/>") {
            self.advance(2);
            return Token::Start { element, closed: true };
        }
        if self.starts_with(">") {
            self.advance(1);
        }

        if element.tag.is_raw_text() {
            let text = self.take_raw_text(&tag_name);
            if !text.is_empty() {
                element.children.push(DomNode::Text(text));
            }
            return Token::Start { element, closed: true };
        }
        let closed = element.tag.is_void();
        Token::Start { element, closed }
    }

    /// Consume everything up to `</name>` (case-insensitive) and the closing
    /// tag itself.
    fn take_raw_text(&mut self, name: &str) -> String {
        let closing = format!("</{}", name.to_ascii_lowercase());
        let rest = &self.input[self.pos..];
        let end = rest.to_ascii_lowercase().find(&closing).unwrap_or(rest.len());
        let text = rest[..end].to_string();
        self.pos += end;
        if !self.eof() {
            self.skip_past('>');
        }
        text
    }

    fn parse_tag_name(&mut self) -> String {
        let start = self.pos;
        while !self.eof() {
            let c = self.current_char();
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ':' {
                self.advance(1);
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_attribute(&mut self) -> (String, String) {
        let key = self.parse_tag_name();
        self.skip_whitespace();
        if !self.starts_with("=") {
            return (key, String::new());
        }
        self.advance(1); // skip '='
        self.skip_whitespace();
        let value = self.parse_attr_value();
        (key, value)
    }

    fn parse_attr_value(&mut self) -> String {
        for quote in ['"', '\''] {
            if self.current_char() == quote {
                self.advance(1);
                let start = self.pos;
                while !self.eof() && self.current_char() != quote {
                    self.advance(1);
                }
                let val = &self.input[start..self.pos];
                if !self.eof() {
                    self.advance(1);
                }
                return decode(val);
            }
        }

        let start = self.pos;
        while !self.eof() {
            let c = self.current_char();
            if c.is_whitespace() || c == '>' {
                break;
            }
            self.advance(1);
        }
        decode(&self.input[start..self.pos])
    }

    fn skip_whitespace(&mut self) {
        while !self.eof() && self.current_char().is_whitespace() {
            self.advance(1);
        }
    }

    fn skip_comment(&mut self) {
        self.advance(4); // skip <!--
        while !self.eof() && !self.starts_with("-->") {
            self.advance(1);
        }
        if !self.eof() {
            self.advance(3);
        }
    }

    fn skip_past(&mut self, c: char) {
        while !self.eof() && self.current_char() != c {
            self.advance(1);
        }
        if !self.eof() {
            self.advance(1);
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Current character, or `'\0'` at end of input.
    fn current_char(&self) -> char {
        self.input[self.pos..].chars().next().unwrap_or('\0')
    }

    fn advance(&mut self, n: usize) {
        // Advance by `n` characters (not bytes).
        for _ in 0..n {
            if let Some(c) = self.input[self.pos..].chars().next() {
                self.pos += c.len_utf8();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience helpers
// ---------------------------------------------------------------------------

fn find_element<'a>(nodes: &'a [DomNode], tag: &Tag) -> Option<&'a ElementNode> {
    for node in nodes {
        if let DomNode::Element(e) = node {
            if e.tag == *tag {
                return Some(e);
            }
            if let Some(found) = find_element(&e.children, tag) {
                return Some(found);
            }
        }
    }
    None
}

/// The first `<body>` element anywhere in the tree.
pub fn find_body(nodes: &[DomNode]) -> Option<&ElementNode> {
    find_element(nodes, &Tag::Body)
}

/// Trimmed text of the first `<title>`, if any.
pub fn document_title(nodes: &[DomNode]) -> Option<String> {
    find_element(nodes, &Tag::Title)
        .map(|t| decode(&t.text_content()).trim().to_string())
        .filter(|t| !t.is_empty())
}
