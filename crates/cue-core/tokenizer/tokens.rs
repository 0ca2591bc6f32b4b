//! Token definitions for markup tokenization
//!
//! Tokens own their text: attribute values and text runs are decoded
//! (character references, newline normalization) while scanning, so the
//! source string does not need to outlive the token stream.
//!
//! # Example
//!
//! ```rust
//! use cue_core::tokenizer::{Attributes, Token, TokenKind};
//!
//! let mut attributes = Attributes::new();
//! attributes.insert("xml:id", "p1");
//! let token = Token::new(TokenKind::StartTag, "p", attributes, 1, 1);
//! assert!(token.is_open_tag());
//! assert_eq!(token.attribute("xml:id"), Some("p1"));
//! ```

use core::fmt;

use super::scanner::is_xml_whitespace;

/// Token kind discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TokenKind {
    /// Self-closing tag like `<br/>`
    Tag,
    /// Opening tag like `<p begin="1s">`
    StartTag,
    /// Closing tag like `</p>`
    EndTag,
    /// Text run between tags
    String,
    /// `<!-- ... -->`
    Comment,
    /// `<![CDATA[ ... ]]>`, content kept verbatim
    CData,
    /// `<? ... ?>`
    ProcessingInstruction,
    /// `<!ENTITY ...>` and other `<!...>` declarations
    ValidationEntity,
}

impl TokenKind {
    /// Check if kind names an element (start, end or self-closing tag)
    #[must_use]
    pub const fn is_tag(self) -> bool {
        matches!(self, Self::Tag | Self::StartTag | Self::EndTag)
    }

    /// Check if kind carries character data
    #[must_use]
    pub const fn is_character_data(self) -> bool {
        matches!(self, Self::String | Self::CData)
    }
}

/// Attribute map preserving source order
///
/// Duplicate names keep the first value, as XML forbids repeats and the
/// first occurrence is what an author most likely meant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    /// Create empty attribute map
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert attribute, ignoring repeated names
    ///
    /// Returns `false` when the name was already present.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.entries.push((name, value.into()));
        true
    }

    /// Get attribute value by qualified name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Check if attribute is present
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == name)
    }

    /// Iterate attributes in source order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Iterate attributes whose name starts with `prefix`
    pub fn with_prefix<'s>(&'s self, prefix: &'s str) -> impl Iterator<Item = (&'s str, &'s str)> {
        self.iter().filter(move |(key, _)| key.starts_with(prefix))
    }

    /// Number of attributes
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no attributes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Self::new();
        for (key, value) in iter {
            attributes.insert(key, value);
        }
        attributes
    }
}

/// Token produced by the markup tokenizer
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Token {
    /// Token kind discriminant
    pub kind: TokenKind,

    /// Element name for tags, text for character data, body for comments,
    /// target for processing instructions
    pub content: String,

    /// Attributes (tags and processing instructions only)
    pub attributes: Attributes,

    /// Line number where token starts (1-based)
    pub line: usize,

    /// Column number where token starts (1-based)
    pub column: usize,
}

impl Token {
    /// Create new token with full location information
    #[must_use]
    pub fn new(
        kind: TokenKind,
        content: impl Into<String>,
        attributes: Attributes,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            kind,
            content: content.into(),
            attributes,
            line,
            column,
        }
    }

    /// Get attribute value
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    /// Element name without namespace prefix (`tt:p` -> `p`)
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.content
            .rsplit_once(':')
            .map_or(self.content.as_str(), |(_, local)| local)
    }

    /// Check if token opens an element (start or self-closing tag)
    #[must_use]
    pub const fn is_open_tag(&self) -> bool {
        matches!(self.kind, TokenKind::StartTag | TokenKind::Tag)
    }

    /// Check if token is whitespace-only character data
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.kind.is_character_data() && self.content.chars().all(is_xml_whitespace)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::StartTag | TokenKind::Tag => {
                write!(f, "<{}", self.content)?;
                for (name, value) in self.attributes.iter() {
                    write!(f, " {name}=\"{value}\"")?;
                }
                if self.kind == TokenKind::Tag {
                    write!(f, "/>")
                } else {
                    write!(f, ">")
                }
            }
            TokenKind::EndTag => write!(f, "</{}>", self.content),
            TokenKind::Comment => write!(f, "<!--{}-->", self.content),
            TokenKind::CData => write!(f, "<![CDATA[{}]]>", self.content),
            TokenKind::ProcessingInstruction => write!(f, "<?{}?>", self.content),
            TokenKind::ValidationEntity => write!(f, "<!{}>", self.content),
            TokenKind::String => write!(f, "{}", self.content),
        }
    }
}
