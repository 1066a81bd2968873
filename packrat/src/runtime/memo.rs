use super::cursor::Cursor;
use super::data::Value;
use crate::grammar::{Expr, Rule};
use std::collections::HashMap;

/// Identity of a grammar node, used as memoization key
///
/// Nodes are identified by their address in the grammar, which is borrowed (and so left untouched) for the whole
/// duration of a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Rule(usize),
    Expr(usize),
}

impl NodeKey {
    pub fn rule<T>(rule: &Rule<T>) -> Self {
        Self::Rule(rule as *const Rule<T> as usize)
    }

    pub fn expr<T>(expr: &Expr<T>) -> Self {
        Self::Expr(expr as *const Expr<T> as usize)
    }
}

/// Memoized result of a node at a given offset
#[derive(Debug, Clone)]
pub struct MemoEntry<'i, T> {
    /// Produced value
    pub value: Option<Value<'i, T>>,

    /// Cursor after the match (or the start cursor if it failed)
    pub end: Cursor,
}

impl<'i, T> MemoEntry<'i, T> {
    /// Did the node match?
    pub fn matched(&self) -> bool {
        self.value.is_some()
    }
}

/// Packrat memoization table
///
/// Entries are also keyed by the error tracker's inversion flag: a node evaluated inside a negative lookahead reports
/// its failures differently, so its result can't stand for an evaluation outside of it.
#[derive(Debug)]
pub struct MemoTable<'i, T> {
    entries: HashMap<usize, HashMap<(NodeKey, bool), MemoEntry<'i, T>>>,
}

impl<'i, T> MemoTable<'i, T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Get the result of a node at an offset, if it was already computed
    pub fn lookup(&self, offset: usize, key: NodeKey, inverted: bool) -> Option<&MemoEntry<'i, T>> {
        self.entries.get(&offset).and_then(|nodes| nodes.get(&(key, inverted)))
    }

    /// Record the result of a node at an offset
    pub fn store(&mut self, offset: usize, key: NodeKey, inverted: bool, entry: MemoEntry<'i, T>) {
        self.entries.entry(offset).or_default().insert((key, inverted), entry);
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'i, T> Default for MemoTable<'i, T> {
    fn default() -> Self {
        Self::new()
    }
}
