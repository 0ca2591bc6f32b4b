//! Token scanning methods for the markup tokenizer
//!
//! Provides specialized scanning functions for the constructs of the XML
//! subset used by timed-text documents: tags with attributes, text runs,
//! comments, CDATA sections, processing instructions and declarations.
//!
//! Scanners never fail. A construct cut short by the end of input is
//! returned as far as it was read and an issue is recorded.

use super::{
    entities::decode_references,
    state::{IssueCollector, TagState, TokenIssue},
    tokens::{Attributes, TokenKind},
};

/// Character navigation helper for tokenizer
///
/// Provides character-level navigation with position tracking and
/// lookahead over the source text.
#[derive(Debug, Clone)]
pub struct CharNavigator<'a> {
    /// Source text being scanned
    source: &'a str,
    /// Current byte position in source
    position: usize,
    /// Current line number (1-based)
    line: usize,
    /// Current column number (1-based)
    column: usize,
    /// Last character processed (for \r\n handling)
    last_char: Option<char>,
}

impl<'a> CharNavigator<'a> {
    /// Create new character navigator
    #[must_use]
    pub const fn new(source: &'a str, position: usize, line: usize, column: usize) -> Self {
        Self {
            source,
            position,
            line,
            column,
            last_char: None,
        }
    }

    /// Get current position
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get current line
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Get current column
    #[must_use]
    pub const fn column(&self) -> usize {
        self.column
    }

    /// Remaining unread input
    #[must_use]
    pub fn rest(&self) -> &'a str {
        &self.source[self.position..]
    }

    /// Peek at current character without advancing
    #[must_use]
    pub fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Peek at next character without advancing
    #[must_use]
    pub fn peek_next(&self) -> Option<char> {
        let mut chars = self.rest().chars();
        chars.next();
        chars.next()
    }

    /// Check if the remaining input starts with `prefix`
    #[must_use]
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    /// Advance by one character
    pub fn advance_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.position += ch.len_utf8();

        match ch {
            '\r' => {
                self.line += 1;
                self.column = 1;
            }
            '\n' => {
                // Only increment line if previous char wasn't \r (to handle \r\n properly)
                if self.last_char != Some('\r') {
                    self.line += 1;
                }
                self.column = 1;
            }
            _ => {
                self.column += 1;
            }
        }

        self.last_char = Some(ch);
        Some(ch)
    }

    /// Advance over `text`, which must be the next input
    pub fn advance_str(&mut self, text: &str) {
        for _ in text.chars() {
            self.advance_char();
        }
    }

    /// Skip XML whitespace, newlines included
    pub fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if !is_xml_whitespace(ch) {
                break;
            }
            self.advance_char();
        }
    }

    /// Consume input up to `terminator`
    ///
    /// Returns the consumed text (terminator excluded, but consumed) and
    /// whether the terminator was found before the end of input.
    pub fn consume_until(&mut self, terminator: &str) -> (&'a str, bool) {
        let start = self.position;
        let rest = self.rest();
        match rest.find(terminator) {
            Some(offset) => {
                let text = &rest[..offset];
                self.advance_str(text);
                self.advance_str(terminator);
                (&self.source[start..start + offset], true)
            }
            None => {
                self.advance_str(rest);
                (&self.source[start..], false)
            }
        }
    }

    /// Check if at end of source
    #[must_use]
    pub const fn is_at_end(&self) -> bool {
        self.position >= self.source.len()
    }
}

/// XML whitespace: space, tab, carriage return, line feed
#[must_use]
pub const fn is_xml_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}

const fn is_name_terminator(ch: char) -> bool {
    is_xml_whitespace(ch) || matches!(ch, '>' | '/' | '=' | '<')
}

/// Result of scanning one construct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scanned {
    /// Kind of the scanned token
    pub kind: TokenKind,
    /// Name, text or body of the construct
    pub content: String,
    /// Attributes read from a tag or processing instruction
    pub attributes: Attributes,
}

impl Scanned {
    fn bare(kind: TokenKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            attributes: Attributes::new(),
        }
    }
}

/// Scanner for different token types
#[derive(Debug, Clone)]
pub struct TokenScanner<'a> {
    /// Character navigator for position tracking
    navigator: CharNavigator<'a>,
}

impl<'a> TokenScanner<'a> {
    /// Create new token scanner
    #[must_use]
    pub const fn new(source: &'a str, position: usize, line: usize, column: usize) -> Self {
        Self {
            navigator: CharNavigator::new(source, position, line, column),
        }
    }

    /// Get current navigator state (mutable)
    pub fn navigator_mut(&mut self) -> &mut CharNavigator<'a> {
        &mut self.navigator
    }

    /// Get current navigator state (immutable)
    #[must_use]
    pub const fn navigator(&self) -> &CharNavigator<'a> {
        &self.navigator
    }

    /// Scan a text run up to the next `<`
    ///
    /// The run is returned verbatim apart from character references.
    pub fn scan_text(&mut self) -> Scanned {
        let start = self.navigator.position();
        while let Some(ch) = self.navigator.peek_char() {
            if ch == '<' {
                break;
            }
            self.navigator.advance_char();
        }
        let raw = &self.navigator.source[start..self.navigator.position()];
        Scanned::bare(TokenKind::String, decode_references(raw))
    }

    /// Scan comment like `<!-- note -->`
    pub fn scan_comment(&mut self, issues: &mut IssueCollector) -> Scanned {
        let (line, column) = (self.navigator.line(), self.navigator.column());
        self.navigator.advance_str("<!--");
        let (body, closed) = self.navigator.consume_until("-->");
        if !closed {
            issues.push(TokenIssue::error("unterminated comment", line, column));
        }
        Scanned::bare(TokenKind::Comment, body)
    }

    /// Scan CDATA section like `<![CDATA[ raw ]]>`
    pub fn scan_cdata(&mut self, issues: &mut IssueCollector) -> Scanned {
        let (line, column) = (self.navigator.line(), self.navigator.column());
        self.navigator.advance_str("<![CDATA[");
        let (body, closed) = self.navigator.consume_until("]]>");
        if !closed {
            issues.push(TokenIssue::error("unterminated CDATA section", line, column));
        }
        Scanned::bare(TokenKind::CData, body)
    }

    /// Scan declaration like `<!ENTITY name "value">` or `<!DOCTYPE tt>`
    ///
    /// The content holds everything between `<!` and `>`, trimmed.
    pub fn scan_declaration(&mut self, issues: &mut IssueCollector) -> Scanned {
        let (line, column) = (self.navigator.line(), self.navigator.column());
        self.navigator.advance_str("<!");
        let (body, closed) = self.navigator.consume_until(">");
        if !closed {
            issues.push(TokenIssue::error("unterminated declaration", line, column));
        }
        Scanned::bare(TokenKind::ValidationEntity, body.trim())
    }

    /// Scan processing instruction like `<?xml version="1.0"?>`
    ///
    /// The target becomes the content; pseudo-attributes are parsed with
    /// the regular attribute rules.
    pub fn scan_processing_instruction(&mut self, issues: &mut IssueCollector) -> Scanned {
        let (line, column) = (self.navigator.line(), self.navigator.column());
        self.navigator.advance_str("<?");
        let (body, closed) = self.navigator.consume_until("?>");
        if !closed {
            issues.push(TokenIssue::error(
                "unterminated processing instruction",
                line,
                column,
            ));
        }

        let body = body.trim();
        let (target, rest) = body
            .find(is_xml_whitespace)
            .map_or((body, ""), |split| (&body[..split], &body[split..]));

        let mut inner = TokenScanner::new(rest, 0, line, column);
        let mut attributes = Attributes::new();
        inner.scan_attributes(&mut attributes, issues);

        Scanned {
            kind: TokenKind::ProcessingInstruction,
            content: target.to_string(),
            attributes,
        }
    }

    /// Scan end tag like `</p>`
    pub fn scan_end_tag(&mut self, issues: &mut IssueCollector) -> Scanned {
        let (line, column) = (self.navigator.line(), self.navigator.column());
        self.navigator.advance_str("</");
        let name = self.scan_name();
        let (_, closed) = self.navigator.consume_until(">");
        if !closed {
            issues.push(TokenIssue::error(
                format!("unterminated end tag </{name}"),
                line,
                column,
            ));
        }
        Scanned::bare(TokenKind::EndTag, name)
    }

    /// Scan start or self-closing tag like `<p begin="1s">` / `<br/>`
    pub fn scan_start_tag(&mut self, issues: &mut IssueCollector) -> Scanned {
        let (line, column) = (self.navigator.line(), self.navigator.column());
        self.navigator.advance_char(); // Skip '<'
        let name = self.scan_name();
        let mut attributes = Attributes::new();
        let self_closing = self.scan_attributes(&mut attributes, issues);

        let kind = match self_closing {
            Some(true) => TokenKind::Tag,
            Some(false) => TokenKind::StartTag,
            None => {
                issues.push(TokenIssue::error(
                    format!("unterminated tag <{name}"),
                    line,
                    column,
                ));
                TokenKind::StartTag
            }
        };

        Scanned {
            kind,
            content: name,
            attributes,
        }
    }

    fn scan_name(&mut self) -> String {
        let start = self.navigator.position();
        while let Some(ch) = self.navigator.peek_char() {
            if is_name_terminator(ch) {
                break;
            }
            self.navigator.advance_char();
        }
        self.navigator.source[start..self.navigator.position()].to_string()
    }

    /// Run the attribute state machine until the tag closes
    ///
    /// Returns `Some(true)` for `/>`, `Some(false)` for `>`, and `None` when
    /// the input ended first. Attributes read so far are kept either way.
    fn scan_attributes(
        &mut self,
        attributes: &mut Attributes,
        issues: &mut IssueCollector,
    ) -> Option<bool> {
        let mut state = TagState::BeforeAttributeName;
        let mut name = String::new();
        let mut value = String::new();

        loop {
            let Some(ch) = self.navigator.peek_char() else {
                if !name.is_empty() {
                    Self::commit(attributes, &mut name, &mut value, issues, &self.navigator);
                }
                return None;
            };

            match state {
                TagState::Name | TagState::BeforeAttributeName => match ch {
                    '>' => {
                        self.navigator.advance_char();
                        return Some(false);
                    }
                    '/' => {
                        self.navigator.advance_char();
                        state = TagState::SelfClosing;
                    }
                    c if is_xml_whitespace(c) => {
                        self.navigator.advance_char();
                    }
                    '<' => {
                        // A new tag starts before this one closed
                        issues.push(TokenIssue::error(
                            "tag closed by the start of another tag",
                            self.navigator.line(),
                            self.navigator.column(),
                        ));
                        return Some(false);
                    }
                    _ => state = TagState::AttributeName,
                },
                TagState::AttributeName => {
                    if is_name_terminator(ch) {
                        state = TagState::AfterAttributeName;
                    } else {
                        name.push(ch);
                        self.navigator.advance_char();
                    }
                }
                TagState::AfterAttributeName => match ch {
                    '=' => {
                        self.navigator.advance_char();
                        state = TagState::BeforeAttributeValue;
                    }
                    c if is_xml_whitespace(c) => {
                        self.navigator.advance_char();
                    }
                    _ => {
                        // Attribute without value
                        Self::commit(attributes, &mut name, &mut value, issues, &self.navigator);
                        state = TagState::BeforeAttributeName;
                    }
                },
                TagState::BeforeAttributeValue => match ch {
                    '"' => {
                        self.navigator.advance_char();
                        state = TagState::AttributeValueQuoted;
                    }
                    c if is_xml_whitespace(c) => {
                        self.navigator.advance_char();
                    }
                    '>' => {
                        Self::commit(attributes, &mut name, &mut value, issues, &self.navigator);
                        state = TagState::BeforeAttributeName;
                    }
                    _ => {
                        issues.push(TokenIssue::warning(
                            format!("attribute '{name}' value is not double-quoted"),
                            self.navigator.line(),
                            self.navigator.column(),
                        ));
                        state = TagState::AttributeValueBare;
                    }
                },
                TagState::AttributeValueQuoted => {
                    self.navigator.advance_char();
                    match ch {
                        '"' => {
                            Self::commit(attributes, &mut name, &mut value, issues, &self.navigator);
                            state = TagState::BeforeAttributeName;
                        }
                        '\r' => {
                            value.push(' ');
                            if self.navigator.peek_char() == Some('\n') {
                                self.navigator.advance_char();
                            }
                        }
                        '\n' => value.push(' '),
                        other => value.push(other),
                    }
                }
                TagState::AttributeValueBare => {
                    if is_xml_whitespace(ch) || ch == '>' || self.navigator.starts_with("/>") {
                        Self::commit(attributes, &mut name, &mut value, issues, &self.navigator);
                        state = TagState::BeforeAttributeName;
                    } else {
                        value.push(ch);
                        self.navigator.advance_char();
                    }
                }
                TagState::SelfClosing => {
                    if ch == '>' {
                        self.navigator.advance_char();
                        return Some(true);
                    }
                    // Stray '/' inside a tag
                    state = TagState::BeforeAttributeName;
                }
            }
        }
    }

    fn commit(
        attributes: &mut Attributes,
        name: &mut String,
        value: &mut String,
        issues: &mut IssueCollector,
        navigator: &CharNavigator<'_>,
    ) {
        let key = core::mem::take(name);
        let raw = core::mem::take(value);
        let decoded = decode_references(&raw).into_owned();
        if !attributes.insert(key.clone(), decoded) {
            issues.push(TokenIssue::warning(
                format!("duplicate attribute '{key}' ignored"),
                navigator.line(),
                navigator.column(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start_tag(source: &str) -> (Scanned, IssueCollector) {
        let mut issues = IssueCollector::new();
        let mut scanner = TokenScanner::new(source, 0, 1, 1);
        let scanned = scanner.scan_start_tag(&mut issues);
        (scanned, issues)
    }

    #[test]
    fn navigator_tracks_lines() {
        let mut navigator = CharNavigator::new("a\r\nb\nc", 0, 1, 1);
        while navigator.advance_char().is_some() {}
        assert_eq!(navigator.line(), 3);
        assert_eq!(navigator.column(), 2);
        assert!(navigator.is_at_end());
        assert_eq!(navigator.peek_char(), None);
    }

    #[test]
    fn consume_until_reports_missing_terminator() {
        let mut navigator = CharNavigator::new("abc-->def", 0, 1, 1);
        assert_eq!(navigator.consume_until("-->"), ("abc", true));
        assert_eq!(navigator.rest(), "def");
        assert_eq!(navigator.consume_until("-->"), ("def", false));
        assert!(navigator.is_at_end());
    }

    #[test]
    fn start_tag_with_attributes() {
        let (scanned, issues) = start_tag(r#"<p xml:id="p1" begin = "1s"  end="2s">"#);
        assert_eq!(scanned.kind, TokenKind::StartTag);
        assert_eq!(scanned.content, "p");
        assert_eq!(scanned.attributes.get("xml:id"), Some("p1"));
        assert_eq!(scanned.attributes.get("begin"), Some("1s"));
        assert_eq!(scanned.attributes.get("end"), Some("2s"));
        assert!(issues.issues().is_empty());
    }

    #[test]
    fn self_closing_tag() {
        let (scanned, _) = start_tag(r#"<region xml:id="r1"/>"#);
        assert_eq!(scanned.kind, TokenKind::Tag);
        let (bare, _) = start_tag("<br/>");
        assert_eq!(bare.kind, TokenKind::Tag);
        assert_eq!(bare.content, "br");
    }

    #[test]
    fn newlines_in_values_become_spaces() {
        let (scanned, _) = start_tag("<style tts:fontFamily=\"a\nb\r\nc\"/>");
        assert_eq!(scanned.attributes.get("tts:fontFamily"), Some("a b c"));
    }

    #[test]
    fn single_quote_is_literal_inside_double_quotes() {
        let (scanned, _) = start_tag(r#"<span title="it's"/>"#);
        assert_eq!(scanned.attributes.get("title"), Some("it's"));
    }

    #[test]
    fn single_quoted_value_is_kept_bare() {
        let (scanned, issues) = start_tag("<span a='x' b=\"y\">");
        assert_eq!(scanned.attributes.get("a"), Some("'x'"));
        assert_eq!(scanned.attributes.get("b"), Some("y"));
        assert_eq!(issues.issues().len(), 1);
    }

    #[test]
    fn truncated_attribute_terminates() {
        let (scanned, issues) = start_tag(r#"<p begin="1"#);
        assert_eq!(scanned.kind, TokenKind::StartTag);
        assert_eq!(scanned.attributes.get("begin"), Some("1"));
        assert!(issues.has_errors());
    }

    #[test]
    fn valueless_attribute() {
        let (scanned, _) = start_tag("<p hidden begin=\"1s\">");
        assert_eq!(scanned.attributes.get("hidden"), Some(""));
        assert_eq!(scanned.attributes.get("begin"), Some("1s"));
    }

    #[test]
    fn processing_instruction_attributes() {
        let mut issues = IssueCollector::new();
        let mut scanner = TokenScanner::new(r#"<?xml version="1.0" encoding="UTF-8"?>"#, 0, 1, 1);
        let scanned = scanner.scan_processing_instruction(&mut issues);
        assert_eq!(scanned.content, "xml");
        assert_eq!(scanned.attributes.get("encoding"), Some("UTF-8"));
    }

    #[test]
    fn text_decodes_references() {
        let mut scanner = TokenScanner::new("Tom &amp; Jerry<br/>", 0, 1, 1);
        let scanned = scanner.scan_text();
        assert_eq!(scanned.content, "Tom & Jerry");
        assert!(scanner.navigator().starts_with("<br/>"));
    }
}
