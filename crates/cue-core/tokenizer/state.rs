//! Tokenizer state management and issue reporting
//!
//! The tokenizer is a cursor driven state machine. `ScanState` is the
//! outer state (which construct the cursor sits in), `TagState` the inner
//! state used while reading a tag's name and attributes. Lexical problems
//! never abort tokenization; they are recorded as `TokenIssue`s.

/// Outer tokenizer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    /// Between constructs, or inside a text run
    #[default]
    Data,
    /// Inside `<name ...>`
    StartTag,
    /// Inside `</name>`
    EndTag,
    /// Inside `<!-- -->`
    Comment,
    /// Inside `<![CDATA[ ]]>`
    CData,
    /// Inside `<? ?>`
    ProcessingInstruction,
    /// Inside `<!ENTITY ...>` or another declaration
    ValidationEntity,
    /// Input exhausted
    Finished,
}

impl ScanState {
    /// Check if state sits inside markup delimiters
    #[must_use]
    pub const fn is_inside_markup(self) -> bool {
        !matches!(self, Self::Data | Self::Finished)
    }
}

/// Inner state while scanning a start or self-closing tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagState {
    /// Reading the element name
    Name,
    /// Whitespace before an attribute name
    BeforeAttributeName,
    /// Reading an attribute name
    AttributeName,
    /// After a name, waiting for `=` or the next attribute
    AfterAttributeName,
    /// After `=`, waiting for the value
    BeforeAttributeValue,
    /// Inside a `"` quoted value
    AttributeValueQuoted,
    /// Inside an unquoted value
    AttributeValueBare,
    /// Saw `/`, expecting `>`
    SelfClosing,
}

/// Token issue severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueLevel {
    /// Input was repaired silently (e.g. unquoted attribute value)
    Warning,
    /// Construct was cut short (e.g. unterminated comment)
    Error,
}

impl IssueLevel {
    /// Get string representation for display
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Tokenization issue for error reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIssue {
    /// Issue severity level
    pub level: IssueLevel,

    /// Human-readable error message
    pub message: String,

    /// Line number where issue occurred (1-based)
    pub line: usize,

    /// Column number where issue occurred (1-based)
    pub column: usize,
}

impl TokenIssue {
    /// Create warning issue
    #[must_use]
    pub fn warning(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            level: IssueLevel::Warning,
            message: message.into(),
            line,
            column,
        }
    }

    /// Create error issue
    #[must_use]
    pub fn error(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            level: IssueLevel::Error,
            message: message.into(),
            line,
            column,
        }
    }
}

impl core::fmt::Display for TokenIssue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} at {}:{}: {}",
            self.level.as_str(),
            self.line,
            self.column,
            self.message
        )
    }
}

/// Issue collector for accumulating tokenization problems
#[derive(Debug, Clone, Default)]
pub struct IssueCollector {
    issues: Vec<TokenIssue>,
}

impl IssueCollector {
    /// Create new empty collector
    #[must_use]
    pub const fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Record an issue
    pub fn push(&mut self, issue: TokenIssue) {
        self.issues.push(issue);
    }

    /// Get all collected issues
    #[must_use]
    pub fn issues(&self) -> &[TokenIssue] {
        &self.issues
    }

    /// Remove and return collected issues
    pub fn drain(&mut self) -> Vec<TokenIssue> {
        core::mem::take(&mut self.issues)
    }

    /// Check if any error-level issue was recorded
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|issue| issue.level == IssueLevel::Error)
    }
}
