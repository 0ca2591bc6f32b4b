//! Markup tokenizer module
//!
//! Pull-based lexical analysis of the XML subset used by timed-text
//! documents. The caller drives iteration with [`MarkupTokenizer::next_token`];
//! once a token is emitted the tokenizer never backtracks.
//!
//! The tokenizer does not validate element names or nesting. That is the
//! grammar layer's job; this layer only guarantees that every call makes
//! progress and that malformed input still yields best-effort tokens.
//!
//! # Example
//!
//! ```rust
//! use cue_core::tokenizer::{MarkupTokenizer, TokenKind};
//!
//! let mut tokenizer = MarkupTokenizer::new(r#"<p begin="1s">Hello</p>"#);
//! let kinds: Vec<_> = std::iter::from_fn(|| tokenizer.next_token())
//!     .map(|token| token.kind)
//!     .collect();
//! assert_eq!(kinds, [TokenKind::StartTag, TokenKind::String, TokenKind::EndTag]);
//! ```

pub mod entities;
pub mod scanner;
pub mod state;
pub mod tokens;

pub use scanner::{CharNavigator, Scanned, TokenScanner};
pub use state::{IssueCollector, IssueLevel, ScanState, TagState, TokenIssue};
pub use tokens::{Attributes, Token, TokenKind};

/// Incremental tokenizer for timed-text markup
#[derive(Debug, Clone)]
pub struct MarkupTokenizer<'a> {
    /// Source text being tokenized
    source: &'a str,
    /// Token scanner for character processing
    scanner: TokenScanner<'a>,
    /// Construct the cursor is in
    state: ScanState,
    /// Issue collector for error reporting
    issues: IssueCollector,
}

impl<'a> MarkupTokenizer<'a> {
    /// Create new tokenizer for source text
    ///
    /// A leading byte order mark is skipped.
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            scanner: TokenScanner::new(source, Self::initial_position(source), 1, 1),
            state: ScanState::Data,
            issues: IssueCollector::new(),
        }
    }

    fn initial_position(source: &str) -> usize {
        if source.starts_with('\u{FEFF}') {
            '\u{FEFF}'.len_utf8()
        } else {
            0
        }
    }

    /// Get next token from input stream
    ///
    /// Returns `None` once the input is exhausted. Whitespace-only text
    /// between tags is skipped.
    pub fn next_token(&mut self) -> Option<Token> {
        loop {
            if self.scanner.navigator().is_at_end() {
                self.state = ScanState::Finished;
                return None;
            }

            let start_pos = self.scanner.navigator().position();
            let line = self.scanner.navigator().line();
            let column = self.scanner.navigator().column();

            let scanned = self.scan_construct();

            // Every scan consumes at least one character
            debug_assert!(self.scanner.navigator().position() > start_pos);
            self.state = ScanState::Data;

            if scanned.kind == TokenKind::String && scanned.content.chars().all(scanner::is_xml_whitespace) {
                continue;
            }

            return Some(Token::new(
                scanned.kind,
                scanned.content,
                scanned.attributes,
                line,
                column,
            ));
        }
    }

    fn scan_construct(&mut self) -> Scanned {
        let navigator = self.scanner.navigator();
        if navigator.peek_char() != Some('<') {
            self.state = ScanState::Data;
            return self.scanner.scan_text();
        }

        if navigator.starts_with("<!--") {
            self.state = ScanState::Comment;
            self.scanner.scan_comment(&mut self.issues)
        } else if navigator.starts_with("<![CDATA[") {
            self.state = ScanState::CData;
            self.scanner.scan_cdata(&mut self.issues)
        } else if navigator.starts_with("<!") {
            self.state = ScanState::ValidationEntity;
            self.scanner.scan_declaration(&mut self.issues)
        } else if navigator.starts_with("<?") {
            self.state = ScanState::ProcessingInstruction;
            self.scanner.scan_processing_instruction(&mut self.issues)
        } else if navigator.starts_with("</") {
            self.state = ScanState::EndTag;
            self.scanner.scan_end_tag(&mut self.issues)
        } else {
            self.state = ScanState::StartTag;
            self.scanner.scan_start_tag(&mut self.issues)
        }
    }

    /// Get all remaining tokens as vector for batch processing
    pub fn tokenize_all(&mut self) -> Vec<Token> {
        core::iter::from_fn(|| self.next_token()).collect()
    }

    /// Get accumulated tokenization issues
    #[must_use]
    pub fn issues(&self) -> &[TokenIssue] {
        self.issues.issues()
    }

    /// Take accumulated issues, leaving the collector empty
    pub fn take_issues(&mut self) -> Vec<TokenIssue> {
        self.issues.drain()
    }

    /// Current scanner state
    #[must_use]
    pub const fn state(&self) -> ScanState {
        self.state
    }

    /// Get current position in source
    #[must_use]
    pub const fn position(&self) -> usize {
        self.scanner.navigator().position()
    }

    /// Get current line number (1-based)
    #[must_use]
    pub const fn line(&self) -> usize {
        self.scanner.navigator().line()
    }

    /// Source text between two byte offsets, clamped to the input
    ///
    /// Used to attach the failing chunk to error reports.
    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        let end = end.min(self.source.len());
        let start = start.min(end);
        self.source.get(start..end).unwrap_or_default()
    }

    /// Reset tokenizer to beginning of source
    pub fn reset(&mut self) {
        self.scanner = TokenScanner::new(self.source, Self::initial_position(self.source), 1, 1);
        self.state = ScanState::Data;
        self.issues = IssueCollector::new();
    }
}

impl Iterator for MarkupTokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        MarkupTokenizer::new(source).map(|token| token.kind).collect()
    }

    #[test]
    fn tokenize_document_skeleton() {
        let source = r#"<?xml version="1.0"?>
<!-- header -->
<tt xmlns="http://www.w3.org/ns/ttml">
  <body><p>Hi</p></body>
</tt>"#;
        assert_eq!(
            kinds(source),
            [
                TokenKind::ProcessingInstruction,
                TokenKind::Comment,
                TokenKind::StartTag,
                TokenKind::StartTag,
                TokenKind::StartTag,
                TokenKind::String,
                TokenKind::EndTag,
                TokenKind::EndTag,
                TokenKind::EndTag,
            ]
        );
    }

    #[test]
    fn text_is_not_trimmed_internally() {
        let tokens = MarkupTokenizer::new("<p>  two  words </p>").tokenize_all();
        assert_eq!(tokens[1].content, "  two  words ");
    }

    #[test]
    fn non_breaking_space_is_text() {
        let tokens = MarkupTokenizer::new("<p>\u{a0}</p><p> \t\r\n</p>").tokenize_all();
        let kinds: Vec<_> = tokens.iter().map(|token| token.kind).collect();
        assert_eq!(
            kinds,
            [
                TokenKind::StartTag,
                TokenKind::String,
                TokenKind::EndTag,
                TokenKind::StartTag,
                TokenKind::EndTag,
            ]
        );
        assert_eq!(tokens[1].content, "\u{a0}");
        assert!(!tokens[1].is_blank());
    }

    #[test]
    fn cdata_is_verbatim() {
        let tokens = MarkupTokenizer::new("<p><![CDATA[a <b> &amp;]]></p>").tokenize_all();
        assert_eq!(tokens[1].kind, TokenKind::CData);
        assert_eq!(tokens[1].content, "a <b> &amp;");
    }

    #[test]
    fn validation_entity() {
        let tokens = MarkupTokenizer::new(r#"<!ENTITY who "world">"#).tokenize_all();
        assert_eq!(tokens[0].kind, TokenKind::ValidationEntity);
        assert_eq!(tokens[0].content, r#"ENTITY who "world""#);
    }

    #[test]
    fn bom_is_skipped() {
        let tokens = MarkupTokenizer::new("\u{FEFF}<tt/>").tokenize_all();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].content, "tt");
    }

    #[test]
    fn truncated_input_terminates() {
        let mut tokenizer = MarkupTokenizer::new(r#"<tt><p begin="1s" end"#);
        let tokens = tokenizer.tokenize_all();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].attribute("begin"), Some("1s"));
        assert_eq!(tokens[1].attribute("end"), Some(""));
        assert!(!tokenizer.issues().is_empty());
        assert_eq!(tokenizer.state(), ScanState::Finished);
    }

    #[test]
    fn unterminated_comment_terminates() {
        let mut tokenizer = MarkupTokenizer::new("<p>a</p><!-- never closed");
        let tokens = tokenizer.tokenize_all();
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Comment));
        assert_eq!(tokenizer.take_issues().len(), 1);
    }

    #[test]
    fn token_positions() {
        let tokens = MarkupTokenizer::new("<tt>\n  <body/>\n</tt>").tokenize_all();
        assert_eq!((tokens[1].line, tokens[1].column), (2, 3));
        assert_eq!((tokens[2].line, tokens[2].column), (3, 1));
    }

    #[test]
    fn reset_tokenizer() {
        let mut tokenizer = MarkupTokenizer::new("<a/><b/>");
        let _ = tokenizer.next_token();
        assert!(tokenizer.position() > 0);
        tokenizer.reset();
        assert_eq!(tokenizer.position(), 0);
        assert_eq!(tokenizer.next_token().map(|t| t.content), Some("a".to_string()));
    }

    #[test]
    fn empty_and_whitespace_input() {
        assert!(kinds("").is_empty());
        assert!(kinds("  \n\t ").is_empty());
    }

    #[test]
    fn slice_is_clamped() {
        let tokenizer = MarkupTokenizer::new("<tt/>");
        assert_eq!(tokenizer.slice(0, 100), "<tt/>");
        assert_eq!(tokenizer.slice(10, 2), "");
    }
}
