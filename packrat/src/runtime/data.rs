use std::borrow::Cow;

/// Value produced by a match
///
/// Matchers produce the text they consumed, composite expressions produce lists of their members' values, and
/// semantic actions may replace any of these with a [`Value::Node`] carrying the user's own type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'i, T> {
    /// No value (lookaheads, predicates, unmatched optional expressions)
    Nil,

    /// Raw text consumed by a matcher
    Text(Cow<'i, [u8]>),

    /// Values of a sequence or a repetition
    List(Vec<Value<'i, T>>),

    /// User-defined value, produced by a semantic action
    Node(T),
}

impl<'i, T> Value<'i, T> {
    /// Create a text value borrowing from the input
    pub fn text(bytes: &'i [u8]) -> Self {
        Self::Text(Cow::Borrowed(bytes))
    }

    /// Check if the value is [`Value::Nil`]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Get the raw text, if this is a text value
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Text(bytes) => Some(bytes.as_ref()),
            _ => None,
        }
    }

    /// Get the text as a string slice, if this is a valid UTF-8 text value
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// Get the members of a list value
    pub fn as_list(&self) -> Option<&[Value<'i, T>]> {
        match self {
            Self::List(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    /// Take the members of a list value
    pub fn into_list(self) -> Option<Vec<Value<'i, T>>> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }

    /// Get the user value
    pub fn as_node(&self) -> Option<&T> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Take the user value
    pub fn into_node(self) -> Option<T> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Detach the value from the input it borrows from
    pub fn into_owned(self) -> Value<'static, T> {
        match self {
            Self::Nil => Value::Nil,
            Self::Text(bytes) => Value::Text(Cow::Owned(bytes.into_owned())),
            Self::List(values) => Value::List(values.into_iter().map(Value::into_owned).collect()),
            Self::Node(node) => Value::Node(node),
        }
    }
}

impl<'i, T> Default for Value<'i, T> {
    fn default() -> Self {
        Self::Nil
    }
}
