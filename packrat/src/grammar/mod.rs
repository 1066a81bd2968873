//! # Grammar model
//!
//! A [`Grammar`] is an ordered list of [`Rule`]s, each holding a tree of [`Expr`]essions.
//! The first rule is the grammar's entrypoint.
//!
//! Grammars are built once, as plain data, and can then be [run](crate::runtime::parse) against any number of inputs,
//! including from multiple threads at once.

mod classes;
mod display;
mod validator;

pub use classes::*;
pub use validator::*;

use crate::runtime::{Current, Value};
use std::fmt;
use std::sync::Arc;

/// Error type returned by actions and predicates
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a semantic action
pub type ActionResult<'i, T> = Result<Value<'i, T>, BoxError>;

type ActionFn<T> = dyn for<'c, 'i> Fn(&mut Current<'c, 'i, T>) -> ActionResult<'i, T> + Send + Sync;
type PredicateFn<T> = dyn for<'c, 'i> Fn(&mut Current<'c, 'i, T>) -> Result<bool, BoxError> + Send + Sync;

/// Semantic action, run on the value of a successfully matched expression
pub struct Action<T>(Arc<ActionFn<T>>);

impl<T> Action<T> {
    /// Wrap a function as an action
    pub fn new<F>(run: F) -> Self
    where
        F: for<'c, 'i> Fn(&mut Current<'c, 'i, T>) -> ActionResult<'i, T> + Send + Sync + 'static,
    {
        Self(Arc::new(run))
    }

    pub(crate) fn run<'c, 'i>(&self, current: &mut Current<'c, 'i, T>) -> ActionResult<'i, T> {
        (self.0)(current)
    }
}

impl<T> Clone for Action<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Action<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Action(..)")
    }
}

/// Zero-width semantic predicate
pub struct Predicate<T>(Arc<PredicateFn<T>>);

impl<T> Predicate<T> {
    /// Wrap a function as a predicate
    pub fn new<F>(run: F) -> Self
    where
        F: for<'c, 'i> Fn(&mut Current<'c, 'i, T>) -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        Self(Arc::new(run))
    }

    pub(crate) fn run(&self, current: &mut Current<'_, '_, T>) -> Result<bool, BoxError> {
        (self.0)(current)
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Predicate(..)")
    }
}

/// Grammar expression
#[derive(Debug, Clone)]
pub enum Expr<T> {
    /// Exact code point sequence.
    /// Case-insensitive literals are stored lower-cased.
    Literal { text: String, ignore_case: bool },

    /// A single code point from a set
    CharClass(CharClass),

    /// Any single code point
    Any,

    /// All expressions, in order
    Sequence(Vec<Expr<T>>),

    /// The first matching alternative
    Choice(Vec<Expr<T>>),

    /// Repetition, possibly empty
    ZeroOrMore(Box<Expr<T>>),

    /// Repetition, at least once
    OneOrMore(Box<Expr<T>>),

    /// Optional expression
    ZeroOrOne(Box<Expr<T>>),

    /// Positive lookahead (`&e`)
    And(Box<Expr<T>>),

    /// Negative lookahead (`!e`)
    Not(Box<Expr<T>>),

    /// Expression whose value is bound to a label for the enclosing actions
    Labeled { label: String, expr: Box<Expr<T>> },

    /// Reference to a rule of the grammar
    RuleRef(String),

    /// Expression whose value is transformed by an action
    Action { expr: Box<Expr<T>>, run: Action<T> },

    /// Predicate which must hold (`&{ ... }`)
    AndCode(Predicate<T>),

    /// Predicate which must not hold (`!{ ... }`)
    NotCode(Predicate<T>),
}

impl<T> Expr<T> {
    pub fn lit(text: impl Into<String>) -> Self {
        Self::Literal {
            text: text.into(),
            ignore_case: false,
        }
    }

    /// Case-insensitive literal
    pub fn lit_i(text: impl AsRef<str>) -> Self {
        Self::Literal {
            text: text.as_ref().chars().map(simple_lowercase).collect(),
            ignore_case: true,
        }
    }

    pub fn class(class: CharClass) -> Self {
        Self::CharClass(class)
    }

    pub fn any() -> Self {
        Self::Any
    }

    pub fn seq(exprs: impl IntoIterator<Item = Expr<T>>) -> Self {
        Self::Sequence(exprs.into_iter().collect())
    }

    pub fn choice(alternatives: impl IntoIterator<Item = Expr<T>>) -> Self {
        Self::Choice(alternatives.into_iter().collect())
    }

    pub fn zero_or_more(expr: Expr<T>) -> Self {
        Self::ZeroOrMore(Box::new(expr))
    }

    pub fn one_or_more(expr: Expr<T>) -> Self {
        Self::OneOrMore(Box::new(expr))
    }

    pub fn opt(expr: Expr<T>) -> Self {
        Self::ZeroOrOne(Box::new(expr))
    }

    pub fn and(expr: Expr<T>) -> Self {
        Self::And(Box::new(expr))
    }

    pub fn not(expr: Expr<T>) -> Self {
        Self::Not(Box::new(expr))
    }

    /// Matches only at the end of the input (`!.`)
    pub fn eof() -> Self {
        Self::not(Self::Any)
    }

    pub fn label(label: impl Into<String>, expr: Expr<T>) -> Self {
        Self::Labeled {
            label: label.into(),
            expr: Box::new(expr),
        }
    }

    pub fn rule(name: impl Into<String>) -> Self {
        Self::RuleRef(name.into())
    }

    /// Run an action on the expression's value
    ///
    /// The action receives the matched text, its start position and the labels bound so far in the enclosing scope.
    pub fn action<F>(expr: Expr<T>, run: F) -> Self
    where
        F: for<'c, 'i> Fn(&mut Current<'c, 'i, T>) -> ActionResult<'i, T> + Send + Sync + 'static,
    {
        Self::Action {
            expr: Box::new(expr),
            run: Action::new(run),
        }
    }

    pub fn and_code<F>(run: F) -> Self
    where
        F: for<'c, 'i> Fn(&mut Current<'c, 'i, T>) -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        Self::AndCode(Predicate::new(run))
    }

    pub fn not_code<F>(run: F) -> Self
    where
        F: for<'c, 'i> Fn(&mut Current<'c, 'i, T>) -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        Self::NotCode(Predicate::new(run))
    }

    /// Get the name of the expression's kind, as used in traces
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Literal { .. } => "LitMatcher",
            Self::CharClass(_) => "CharClassMatcher",
            Self::Any => "AnyMatcher",
            Self::Sequence(_) => "SeqExpr",
            Self::Choice(_) => "ChoiceExpr",
            Self::ZeroOrMore(_) => "ZeroOrMoreExpr",
            Self::OneOrMore(_) => "OneOrMoreExpr",
            Self::ZeroOrOne(_) => "ZeroOrOneExpr",
            Self::And(_) => "AndExpr",
            Self::Not(_) => "NotExpr",
            Self::Labeled { .. } => "LabeledExpr",
            Self::RuleRef(_) => "RuleRefExpr",
            Self::Action { .. } => "ActionExpr",
            Self::AndCode(_) => "AndCodeExpr",
            Self::NotCode(_) => "NotCodeExpr",
        }
    }
}

/// Set of code points matched by [`Expr::CharClass`]
///
/// Membership is tested against single characters, then inclusive ranges, then Unicode classes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CharClass {
    chars: Vec<char>,
    ranges: Vec<(char, char)>,
    classes: Vec<UnicodeClass>,
    ignore_case: bool,
    inverted: bool,
    display: String,
    custom_display: bool,
}

impl CharClass {
    /// Create an empty class
    pub fn new() -> Self {
        let mut class = Self::default();
        class.refresh_display();
        class
    }

    /// Add single characters
    pub fn chars(mut self, chars: impl AsRef<str>) -> Self {
        let ignore_case = self.ignore_case;

        self.chars.extend(chars.as_ref().chars().map(|c| {
            if ignore_case {
                simple_lowercase(c)
            } else {
                c
            }
        }));

        self.refresh_display();
        self
    }

    /// Add an inclusive range
    pub fn range(mut self, from: char, to: char) -> Self {
        self.ranges.push(if self.ignore_case {
            (simple_lowercase(from), simple_lowercase(to))
        } else {
            (from, to)
        });

        self.refresh_display();
        self
    }

    /// Add a Unicode class
    pub fn class(mut self, class: UnicodeClass) -> Self {
        self.classes.push(class);
        self.refresh_display();
        self
    }

    /// Negate the membership test
    pub fn inverted(mut self) -> Self {
        self.inverted = true;
        self.refresh_display();
        self
    }

    /// Compare characters case-insensitively
    ///
    /// Characters and ranges which are already part of the class are lower-cased.
    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self.chars = self.chars.iter().copied().map(simple_lowercase).collect();
        self.ranges = self
            .ranges
            .iter()
            .map(|(from, to)| (simple_lowercase(*from), simple_lowercase(*to)))
            .collect();
        self.refresh_display();
        self
    }

    /// Use a custom description in diagnostics instead of the generated one
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = display.into();
        self.custom_display = true;
        self
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn is_ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Description of the class used in diagnostics, e.g. `[^a-z{} ]`
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Check if a code point is a member of the class, ignoring inversion
    pub fn contains(&self, c: char) -> bool {
        let c = if self.ignore_case {
            simple_lowercase(c)
        } else {
            c
        };

        self.chars.contains(&c)
            || self.ranges.iter().any(|(from, to)| c >= *from && c <= *to)
            || self.classes.iter().any(|class| class.contains(c))
    }

    fn refresh_display(&mut self) {
        if self.custom_display {
            return;
        }

        let mut display = String::from("[");

        if self.inverted {
            display.push('^');
        }

        for c in &self.chars {
            push_escaped(&mut display, *c);
        }

        for (from, to) in &self.ranges {
            push_escaped(&mut display, *from);
            display.push('-');
            push_escaped(&mut display, *to);
        }

        for class in &self.classes {
            display.push_str(&class.to_string());
        }

        display.push(']');

        if self.ignore_case {
            display.push('i');
        }

        self.display = display;
    }
}

/// Escape the characters which are special inside a class's brackets
fn push_escaped(out: &mut String, c: char) {
    match c {
        '\t' => out.push_str("\\t"),
        '\r' => out.push_str("\\r"),
        '\n' => out.push_str("\\n"),
        '\\' | ']' | '-' | '^' => {
            out.push('\\');
            out.push(c);
        }
        _ => out.push(c),
    }
}

/// Lower-case a code point, keeping it as is when its lower-case form spans multiple code points
pub fn simple_lowercase(c: char) -> char {
    let mut lower = c.to_lowercase();

    match (lower.next(), lower.next()) {
        (Some(single), None) => single,
        _ => c,
    }
}

/// A named grammar rule
#[derive(Debug, Clone)]
pub struct Rule<T> {
    name: String,
    display_name: String,
    expr: Expr<T>,
}

impl<T> Rule<T> {
    /// Create a new rule
    pub fn new(name: impl Into<String>, expr: Expr<T>) -> Self {
        Self {
            name: name.into(),
            display_name: String::new(),
            expr,
        }
    }

    /// Set the name used in diagnostics
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Get the rule's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the rule's display name (empty if none was provided)
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Get the name to use in diagnostics: the display name if any, the rule's name otherwise
    pub fn diagnostic_name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }

    /// Get the rule's expression
    pub fn expr(&self) -> &Expr<T> {
        &self.expr
    }
}

/// An ordered list of rules, the first one being the entrypoint
#[derive(Debug, Clone)]
pub struct Grammar<T> {
    rules: Vec<Rule<T>>,
}

impl<T> Grammar<T> {
    /// Create a grammar from its rules
    ///
    /// The grammar is not checked here, see [`validate_grammar`].
    pub fn new(rules: Vec<Rule<T>>) -> Self {
        Self { rules }
    }

    /// Get the grammar's rules, in declaration order
    pub fn rules(&self) -> &[Rule<T>] {
        &self.rules
    }

    /// Get the entrypoint rule
    pub fn start_rule(&self) -> Option<&Rule<T>> {
        self.rules.first()
    }

    /// Find a rule by name
    pub fn rule(&self, name: &str) -> Option<&Rule<T>> {
        self.rules.iter().find(|rule| rule.name == name)
    }
}

impl<T> FromIterator<Rule<T>> for Grammar<T> {
    fn from_iter<I: IntoIterator<Item = Rule<T>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
