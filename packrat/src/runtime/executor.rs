use super::cursor::{Cursor, Position};
use super::data::Value;
use super::errors::{Diagnostic, Diagnostics, ParseError};
use super::memo::{MemoEntry, MemoTable, NodeKey};
use super::options::{GlobalStore, Options, Setting};
use super::tracker::{ErrorTracker, ANY_DESCRIPTOR};
use super::vstack::{Frame, VariableStack};
use crate::grammar::{simple_lowercase, validate_grammar, Action, CharClass, Expr, Grammar, Predicate, Rule};
use log::{debug, trace, warn};
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};

/// Run a grammar against an input
///
/// The `filename` is only used to prefix diagnostics. Settings are applied in order on top of the default
/// [`Options`].
///
/// ```
/// use packrat::grammar::{Expr, Grammar, Rule};
/// use packrat::runtime::{parse, Value};
///
/// let grammar: Grammar<()> = Grammar::new(vec![Rule::new("hello", Expr::lit("hello"))]);
///
/// let parsed = parse(&grammar, "greeting", b"hello", vec![]);
/// assert_eq!(parsed.value, Some(Value::text(b"hello")));
/// assert!(parsed.diagnostics.is_empty());
/// ```
pub fn parse<'i, T: Clone>(
    grammar: &Grammar<T>,
    filename: &str,
    input: &'i [u8],
    settings: impl IntoIterator<Item = Setting>,
) -> Parsed<'i, T> {
    let mut options = Options::new();
    options.apply_all(settings);

    Parser::new(grammar, filename, input, options).parse()
}

/// Outcome of a parse
///
/// A clean parse has a value and no diagnostics. Semantic diagnostics may be present alongside a value, as complaints
/// from actions and predicates don't prevent matching.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<'i, T> {
    /// Value produced by the start rule (`None` if it failed or produced no value)
    pub value: Option<Value<'i, T>>,

    /// Collected diagnostics
    pub diagnostics: Diagnostics,

    /// Number of expressions evaluated (memoized results excluded)
    pub expressions: u64,
}

impl<'i, T> Parsed<'i, T> {
    /// Did the parse produce a value without any diagnostic?
    pub fn is_clean(&self) -> bool {
        self.value.is_some() && self.diagnostics.is_empty()
    }

    /// Convert to a [`Result`], failing if any diagnostic was recorded
    pub fn into_result(self) -> Result<Value<'i, T>, Diagnostics> {
        if self.diagnostics.is_empty() {
            Ok(self.value.unwrap_or(Value::Nil))
        } else {
            Err(self.diagnostics)
        }
    }

    /// Detach the produced value from the input
    pub fn into_owned(self) -> Parsed<'static, T> {
        Parsed {
            value: self.value.map(Value::into_owned),
            diagnostics: self.diagnostics,
            expressions: self.expressions,
        }
    }
}

/// Context provided to actions and predicates
pub struct Current<'c, 'i, T> {
    /// Start position of the match
    pub pos: Position,

    /// Raw text of the match (empty for predicates)
    pub text: &'i [u8],

    /// Value produced by the matched expression (`Nil` for predicates)
    pub value: Value<'i, T>,

    /// Labels bound in the enclosing scope
    labels: &'c Frame<'c, 'i, T>,

    /// Values shared by all actions and predicates of the parse
    pub store: &'c mut GlobalStore,
}

impl<'c, 'i, T> Current<'c, 'i, T> {
    /// Get the value bound to a label
    pub fn label(&self, name: &str) -> Option<&Value<'i, T>> {
        self.labels.get(name)
    }

    /// Get the names of the bound labels
    pub fn label_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.labels.keys().copied()
    }

    /// Get the matched text as a string, if it is valid UTF-8
    pub fn text_str(&self) -> Option<&'i str> {
        std::str::from_utf8(self.text).ok()
    }
}

/// Fatal condition, which aborts the parse
#[derive(Debug)]
struct Abort(ParseError);

/// Result of an evaluation: `Some` value on match, `None` otherwise
type Eval<'i, T> = Result<Option<Value<'i, T>>, Abort>;

/// Parser running a grammar against a single input
///
/// Each parser owns its cursor, label scopes, memoization table and error tracker: nothing is shared between parses
/// but the (read-only) grammar.
pub struct Parser<'g, 'i, T> {
    grammar: &'g Grammar<T>,
    filename: String,
    input: &'i [u8],
    options: Options,

    /// Current position
    cursor: Cursor,

    /// Rules by name
    rules: HashMap<&'g str, &'g Rule<T>>,

    /// Label scopes
    vstack: VariableStack<'g, 'i, T>,

    /// Rules being evaluated, for diagnostics
    rstack: Vec<&'g Rule<T>>,

    memo: MemoTable<'i, T>,

    /// Expressions reading or binding labels of their enclosing scope, which are never memoized
    scoped: HashSet<NodeKey>,

    tracker: ErrorTracker,
    diagnostics: Diagnostics,

    /// Offset of the last invalid code point reported
    encoding_reported: Option<usize>,

    /// Number of evaluated expressions
    expr_count: u64,

    /// Trace indentation
    depth: usize,
}

impl<'g, 'i, T: Clone> Parser<'g, 'i, T> {
    /// Create a parser
    pub fn new(grammar: &'g Grammar<T>, filename: impl Into<String>, input: &'i [u8], options: Options) -> Self {
        Self {
            grammar,
            filename: filename.into(),
            input,
            options,
            cursor: Cursor::start(),
            rules: HashMap::new(),
            vstack: VariableStack::new(),
            rstack: vec![],
            memo: MemoTable::new(),
            scoped: HashSet::new(),
            tracker: ErrorTracker::new(),
            diagnostics: Diagnostics::new(),
            encoding_reported: None,
            expr_count: 0,
            depth: 0,
        }
    }

    /// Run the grammar's start rule against the input
    pub fn parse(mut self) -> Parsed<'i, T> {
        let grammar = self.grammar;

        let start = match grammar.start_rule() {
            Some(rule) => rule,
            None => {
                debug!("{}: grammar has no rule", self.filename);
                self.add_err(ParseError::NoRule);
                return self.finish(None);
            }
        };

        self.build_rules_table();

        // Unresolved references make the grammar unusable, reject it before reading anything
        if let Err(err) = validate_grammar(grammar) {
            debug!("{}: grammar rejected: {}", self.filename, err);
            self.add_err(err);
            return self.finish(None);
        }

        if self.options.memoize {
            for rule in grammar.rules() {
                collect_scoped(rule.expr(), &mut self.scoped);
            }
        }

        let value = if self.options.recover {
            match panic::catch_unwind(AssertUnwindSafe(|| self.run(start))) {
                Ok(value) => value,
                Err(payload) => {
                    let message = panic_message(payload);
                    warn!("{}: recovered from panic: {}", self.filename, message);
                    self.add_err(ParseError::Panic(message));
                    None
                }
            }
        } else {
            self.run(start)
        };

        self.finish(value)
    }

    /// Evaluate the start rule and synthesize the farthest failure if nothing else was reported
    fn run(&mut self, start: &'g Rule<T>) -> Option<Value<'i, T>> {
        // Advance to the first code point
        self.read();

        match self.parse_rule(start) {
            Ok(Some(value)) => Some(value),
            Ok(None) => {
                if self.diagnostics.is_empty() {
                    let expected = self.tracker.expected();
                    let farthest = self.tracker.farthest();
                    self.add_err_at(ParseError::NoMatch { expected }, farthest);
                }

                None
            }
            Err(Abort(err)) => {
                debug!(
                    "{}: parse aborted after {} expressions: {}",
                    self.filename, self.expr_count, err
                );
                self.add_err(err);
                None
            }
        }
    }

    fn finish(self, value: Option<Value<'i, T>>) -> Parsed<'i, T> {
        Parsed {
            value: value.filter(|value| !value.is_nil()),
            diagnostics: self.diagnostics,
            expressions: self.expr_count,
        }
    }

    fn build_rules_table(&mut self) {
        let grammar = self.grammar;

        self.rules = grammar.rules().iter().map(|rule| (rule.name(), rule)).collect();
    }

    /// Record an error at the current position
    fn add_err(&mut self, error: ParseError) {
        self.add_err_at(error, self.cursor.pos);
    }

    /// Record an error, prefixed with the file name, the position and the innermost rule being evaluated
    fn add_err_at(&mut self, error: ParseError, pos: Position) {
        let mut prefix = String::new();

        if !self.filename.is_empty() {
            prefix.push_str(&self.filename);
            prefix.push(':');
        }

        prefix.push_str(&pos.to_prefix());

        if let Some(rule) = self.rstack.last() {
            prefix.push_str(": rule ");
            prefix.push_str(rule.diagnostic_name());
        }

        self.diagnostics.push(Diagnostic { pos, prefix, error });
    }

    /// Move to the next code point
    fn read(&mut self) {
        if self.cursor.advance(self.input) {
            return;
        }

        // Backtracking reads the same code points again, each one is only reported once
        let offset = self.cursor.pos.offset;

        if self.encoding_reported.map_or(true, |last| offset > last) {
            self.encoding_reported = Some(offset);
            self.add_err(ParseError::InvalidEncoding);
        }
    }

    fn restore(&mut self, cursor: Cursor) {
        if self.options.debug && cursor.pos.offset != self.cursor.pos.offset {
            trace!("{} restore {}", " ".repeat(self.depth + 1), cursor.pos);
        }

        self.cursor = cursor;
    }

    /// Get the input consumed since a cursor
    fn slice_from(&self, start: Cursor) -> &'i [u8] {
        let input: &'i [u8] = self.input;
        &input[start.pos.offset..self.cursor.pos.offset]
    }

    fn trace_enter(&mut self, what: &str) {
        if self.options.debug {
            self.depth += 1;
            trace!(
                "{}> {}: {} [{:?}]",
                " ".repeat(self.depth),
                self.cursor.pos,
                what,
                self.cursor.current
            );
        }
    }

    fn trace_exit(&mut self, what: &str) {
        if self.options.debug {
            trace!(
                "{}< {}: {} [{:?}]",
                " ".repeat(self.depth),
                self.cursor.pos,
                what,
                self.cursor.current
            );
            self.depth = self.depth.saturating_sub(1);
        }
    }

    fn trace_match(&self, start: Cursor) {
        if self.options.debug {
            trace!(
                "{} MATCH {:?}",
                " ".repeat(self.depth),
                String::from_utf8_lossy(self.slice_from(start))
            );
        }
    }

    fn parse_rule(&mut self, rule: &'g Rule<T>) -> Eval<'i, T> {
        let key = NodeKey::rule(rule);
        let start = self.cursor;
        let inverted = self.tracker.is_inverted();

        if self.options.memoize {
            if let Some(entry) = self.memo.lookup(start.pos.offset, key, inverted) {
                let entry = entry.clone();
                self.restore(entry.end);
                return Ok(entry.value);
            }
        }

        self.trace_enter(&format!("parseRule {}", rule.name()));

        self.rstack.push(rule);
        self.vstack.push();
        let result = self.parse_expr(rule.expr());
        self.vstack.pop();
        self.rstack.pop();

        self.trace_exit(&format!("parseRule {}", rule.name()));

        let value = result?;

        if value.is_some() {
            self.trace_match(start);
        }

        if self.options.memoize {
            self.memo.store(
                start.pos.offset,
                key,
                inverted,
                MemoEntry {
                    value: value.clone(),
                    end: self.cursor,
                },
            );
        }

        Ok(value)
    }

    fn parse_expr(&mut self, expr: &'g Expr<T>) -> Eval<'i, T> {
        // Expressions depending on the enclosing scope are always evaluated (their scope-free content is memoized)
        let key = NodeKey::expr(expr);
        let memoize = self.options.memoize && !self.scoped.contains(&key);
        let start = self.cursor;
        let inverted = self.tracker.is_inverted();

        if memoize {
            if let Some(entry) = self.memo.lookup(start.pos.offset, key, inverted) {
                let entry = entry.clone();
                self.restore(entry.end);
                return Ok(entry.value);
            }
        }

        self.expr_count += 1;

        if let Some(max) = self.options.max_expressions {
            if self.expr_count > max {
                return Err(Abort(ParseError::MaxExpressions));
            }
        }

        self.trace_enter(expr.kind_name());

        let result = match expr {
            Expr::Literal { text, ignore_case } => self.parse_literal(text, *ignore_case),
            Expr::CharClass(class) => self.parse_char_class(class),
            Expr::Any => self.parse_any(),
            Expr::Sequence(exprs) => self.parse_sequence(exprs),
            Expr::Choice(alternatives) => self.parse_choice(alternatives),
            Expr::ZeroOrMore(expr) => self.parse_repetition(expr, 0),
            Expr::OneOrMore(expr) => self.parse_repetition(expr, 1),
            Expr::ZeroOrOne(expr) => self.parse_zero_or_one(expr),
            Expr::And(expr) => self.parse_and(expr),
            Expr::Not(expr) => self.parse_not(expr),
            Expr::Labeled { label, expr } => self.parse_labeled(label, expr),
            Expr::RuleRef(name) => self.parse_rule_ref(name),
            Expr::Action { expr, run } => self.parse_action(expr, run),
            Expr::AndCode(predicate) => self.parse_predicate(predicate, true),
            Expr::NotCode(predicate) => self.parse_predicate(predicate, false),
        };

        self.trace_exit(expr.kind_name());

        let value = result?;

        if memoize {
            self.memo.store(
                start.pos.offset,
                key,
                inverted,
                MemoEntry {
                    value: value.clone(),
                    end: self.cursor,
                },
            );
        }

        Ok(value)
    }

    fn parse_literal(&mut self, text: &'g str, ignore_case: bool) -> Eval<'i, T> {
        let want = format!("{:?}{}", text, if ignore_case { "i" } else { "" });
        let start = self.cursor;

        for expected in text.chars() {
            let current = match self.cursor.current {
                Some(c) if ignore_case => Some(simple_lowercase(c)),
                current => current,
            };

            if current != Some(expected) {
                self.tracker.record(true, start.pos, &want);
                self.restore(start);
                return Ok(None);
            }

            self.read();
        }

        self.tracker.record(false, start.pos, &want);
        Ok(Some(Value::text(self.slice_from(start))))
    }

    fn parse_char_class(&mut self, class: &'g CharClass) -> Eval<'i, T> {
        let start = self.cursor;

        // The end of the input never matches, even an inverted class
        let current = match start.current {
            Some(c) => c,
            None => {
                self.tracker.record(true, start.pos, class.display());
                return Ok(None);
            }
        };

        if class.contains(current) == class.is_inverted() {
            self.tracker.record(true, start.pos, class.display());
            return Ok(None);
        }

        self.read();
        self.tracker.record(false, start.pos, class.display());
        Ok(Some(Value::text(self.slice_from(start))))
    }

    fn parse_any(&mut self) -> Eval<'i, T> {
        let start = self.cursor;

        if start.at_end() {
            self.tracker.record(true, start.pos, ANY_DESCRIPTOR);
            return Ok(None);
        }

        self.read();
        self.tracker.record(false, start.pos, ANY_DESCRIPTOR);
        Ok(Some(Value::text(self.slice_from(start))))
    }

    fn parse_sequence(&mut self, exprs: &'g [Expr<T>]) -> Eval<'i, T> {
        let start = self.cursor;
        let mut values = Vec::with_capacity(exprs.len());

        for expr in exprs {
            match self.parse_expr(expr)? {
                Some(value) => values.push(value),
                None => {
                    self.restore(start);
                    return Ok(None);
                }
            }
        }

        Ok(Some(Value::List(values)))
    }

    fn parse_choice(&mut self, alternatives: &'g [Expr<T>]) -> Eval<'i, T> {
        for alternative in alternatives {
            self.vstack.push();
            let result = self.parse_expr(alternative);
            self.vstack.pop();

            // First match wins, later alternatives are never tried
            if let Some(value) = result? {
                return Ok(Some(value));
            }
        }

        Ok(None)
    }

    fn parse_repetition(&mut self, expr: &'g Expr<T>, min: usize) -> Eval<'i, T> {
        let mut values = vec![];

        loop {
            let offset = self.cursor.pos.offset;

            self.vstack.push();
            let result = self.parse_expr(expr);
            self.vstack.pop();

            match result? {
                Some(value) => values.push(value),
                None => break,
            }

            // An iteration consuming nothing would repeat forever
            if self.cursor.pos.offset == offset {
                break;
            }
        }

        if values.len() < min {
            Ok(None)
        } else {
            Ok(Some(Value::List(values)))
        }
    }

    fn parse_zero_or_one(&mut self, expr: &'g Expr<T>) -> Eval<'i, T> {
        self.vstack.push();
        let result = self.parse_expr(expr);
        self.vstack.pop();

        // Matched or not, this is a success
        Ok(Some(result?.unwrap_or(Value::Nil)))
    }

    fn parse_and(&mut self, expr: &'g Expr<T>) -> Eval<'i, T> {
        let start = self.cursor;

        self.vstack.push();
        let result = self.parse_expr(expr);
        self.vstack.pop();
        self.restore(start);

        Ok(result?.map(|_| Value::Nil))
    }

    fn parse_not(&mut self, expr: &'g Expr<T>) -> Eval<'i, T> {
        let start = self.cursor;

        self.vstack.push();
        self.tracker.toggle_invert();
        let result = self.parse_expr(expr);
        self.tracker.toggle_invert();
        self.vstack.pop();
        self.restore(start);

        Ok(match result? {
            Some(_) => None,
            None => Some(Value::Nil),
        })
    }

    fn parse_labeled(&mut self, label: &'g str, expr: &'g Expr<T>) -> Eval<'i, T> {
        self.vstack.push();
        let result = self.parse_expr(expr);
        self.vstack.pop();

        let value = result?;

        if let Some(value) = &value {
            if !label.is_empty() {
                self.vstack.bind(label, value.clone());
            }
        }

        Ok(value)
    }

    fn parse_rule_ref(&mut self, name: &'g str) -> Eval<'i, T> {
        if name.is_empty() {
            return Err(Abort(ParseError::MissingRuleName));
        }

        let rule = match self.rules.get(name) {
            Some(rule) => *rule,
            None => return Err(Abort(ParseError::UndefinedRule(name.to_string()))),
        };

        self.parse_rule(rule)
    }

    fn parse_action(&mut self, expr: &'g Expr<T>, action: &'g Action<T>) -> Eval<'i, T> {
        let start = self.cursor;

        let value = match self.parse_expr(expr)? {
            Some(value) => value,
            None => return Ok(None),
        };

        let text = self.slice_from(start);

        let mut current = Current {
            pos: start.pos,
            text,
            value,
            labels: self.vstack.top(),
            store: &mut self.options.global_store,
        };

        let result = action.run(&mut current);

        self.trace_match(start);

        // A complaint from the action doesn't undo the match
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                self.add_err_at(ParseError::Semantic(err.to_string()), start.pos);
                Ok(Some(Value::Nil))
            }
        }
    }

    fn parse_predicate(&mut self, predicate: &'g Predicate<T>, expected: bool) -> Eval<'i, T> {
        let text = self.slice_from(self.cursor);

        let mut current = Current {
            pos: self.cursor.pos,
            text,
            value: Value::Nil,
            labels: self.vstack.top(),
            store: &mut self.options.global_store,
        };

        let result = predicate.run(&mut current);

        // A complaint from the predicate doesn't block the match
        let holds = match result {
            Ok(holds) => holds,
            Err(err) => {
                self.add_err(ParseError::Semantic(err.to_string()));
                expected
            }
        };

        Ok(if holds == expected {
            Some(Value::Nil)
        } else {
            None
        })
    }
}

/// Collect the expressions which read or bind labels of the scope they are evaluated in
///
/// Their result depends on what was matched before them, so it can't be replayed at another point of the parse.
/// Rules and expressions evaluating their members in a fresh scope (choices, repetitions, lookaheads) shield their
/// members. Returns whether the provided expression is scoped.
fn collect_scoped<T>(expr: &Expr<T>, scoped: &mut HashSet<NodeKey>) -> bool {
    let is_scoped = match expr {
        Expr::Literal { .. } | Expr::CharClass(_) | Expr::Any | Expr::RuleRef(_) => false,

        // Actions and predicates read the labels, labels bind them
        Expr::AndCode(_) | Expr::NotCode(_) => true,
        Expr::Action { expr, .. } | Expr::Labeled { expr, .. } => {
            collect_scoped(expr, scoped);
            true
        }

        // Members of a sequence share its scope
        Expr::Sequence(exprs) => exprs
            .iter()
            .fold(false, |is_scoped, expr| collect_scoped(expr, scoped) || is_scoped),

        Expr::Choice(exprs) => {
            for expr in exprs {
                collect_scoped(expr, scoped);
            }

            false
        }

        Expr::ZeroOrMore(expr) | Expr::OneOrMore(expr) | Expr::ZeroOrOne(expr) | Expr::And(expr) | Expr::Not(expr) => {
            collect_scoped(expr, scoped);
            false
        }
    };

    if is_scoped {
        scoped.insert(NodeKey::expr(expr));
    }

    is_scoped
}

/// Get the message of a panic's payload
fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic in grammar code".to_string()
    }
}
