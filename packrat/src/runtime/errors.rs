use super::cursor::Position;
use std::fmt;
use thiserror::Error;

/// Error raised while running a grammar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The grammar does not contain any rule
    #[error("grammar has no rule")]
    NoRule,

    /// A rule reference names a rule absent from the grammar
    #[error("undefined rule: {0}")]
    UndefinedRule(String),

    /// A rule reference has an empty name
    #[error("invalid rule: missing name")]
    MissingRuleName,

    /// The input is not valid UTF-8 at this position
    #[error("invalid encoding")]
    InvalidEncoding,

    /// No path of the grammar matched the input
    #[error("no match found, expected: {}", list_join(.expected, ", ", "or"))]
    NoMatch { expected: Vec<String> },

    /// A semantic action or a predicate reported an error
    #[error("{0}")]
    Semantic(String),

    /// The expressions ceiling was reached
    #[error("max number of expressions parsed")]
    MaxExpressions,

    /// User code panicked while the parser was recovering from faults
    #[error("{0}")]
    Panic(String),
}

impl ParseError {
    /// Get the error's category
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoRule | Self::UndefinedRule(_) | Self::MissingRuleName => ErrorKind::Structural,
            Self::InvalidEncoding => ErrorKind::Encoding,
            Self::NoMatch { .. } => ErrorKind::Syntactic,
            Self::Semantic(_) => ErrorKind::Semantic,
            Self::MaxExpressions => ErrorKind::ResourceExhausted,
            Self::Panic(_) => ErrorKind::Fault,
        }
    }
}

/// Category of a [`ParseError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The grammar itself is unusable
    Structural,

    /// Malformed code point in the input
    Encoding,

    /// The input was rejected by the grammar
    Syntactic,

    /// Complaint raised by user code, which doesn't prevent matching
    Semantic,

    /// The expressions ceiling aborted the parse
    ResourceExhausted,

    /// User code panicked
    Fault,
}

/// A located [`ParseError`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{prefix}: {error}")]
pub struct Diagnostic {
    /// Location the error applies to
    pub pos: Position,

    /// Rendered prefix (file name, location and active rule)
    pub prefix: String,

    /// The error itself
    #[source]
    pub error: ParseError,
}

impl Diagnostic {
    /// Get the error's category
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    /// Get the bare message, without prefix
    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

/// Ordered list of diagnostics collected during a parse
///
/// Entries rendering to the same message are only kept once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic, unless an identical one was already recorded
    pub fn push(&mut self, diagnostic: Diagnostic) {
        let rendered = diagnostic.to_string();

        if !self.0.iter().any(|existing| existing.to_string() == rendered) {
            self.0.push(diagnostic);
        }
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of diagnostics
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the diagnostics
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    /// Check if any diagnostic is of the provided category
    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.0.iter().any(|diagnostic| diagnostic.kind() == kind)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, diagnostic) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }

            write!(f, "{}", diagnostic)?;
        }

        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Join a list of items, using a dedicated separator before the last one
///
/// Produces `a`, `a or b` and `a, b, or c`.
pub fn list_join(list: &[String], sep: &str, last_sep: &str) -> String {
    match list {
        [] => String::new(),
        [single] => single.clone(),
        [first, second] => format!("{} {} {}", first, last_sep, second),
        [head @ .., last] => format!("{}{} {} {}", head.join(sep), sep.trim_end(), last_sep, last),
    }
}
