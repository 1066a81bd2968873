use super::data::Value;
use std::collections::HashMap;

/// Labels bound in a single scope
pub type Frame<'g, 'i, T> = HashMap<&'g str, Value<'i, T>>;

/// Stack of label scopes
///
/// A frame is pushed when entering a rule, a choice alternative, a repetition iteration, a lookahead or a labeled
/// expression, and popped when leaving it. Frames are never shared between sibling scopes.
#[derive(Debug)]
pub struct VariableStack<'g, 'i, T> {
    frames: Vec<Frame<'g, 'i, T>>,

    /// Emptied frames kept around to reuse their allocation
    spare: Vec<Frame<'g, 'i, T>>,
}

impl<'g, 'i, T> VariableStack<'g, 'i, T> {
    /// Create a stack with a single, root frame
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::new()],
            spare: vec![],
        }
    }

    /// Enter a new scope
    pub fn push(&mut self) {
        let frame = self.spare.pop().unwrap_or_default();
        self.frames.push(frame);
    }

    /// Leave the current scope, discarding its labels
    pub fn pop(&mut self) {
        // The root frame is never popped
        if self.frames.len() > 1 {
            if let Some(mut frame) = self.frames.pop() {
                frame.clear();
                self.spare.push(frame);
            }
        }
    }

    /// Bind a label in the current scope
    pub fn bind(&mut self, label: &'g str, value: Value<'i, T>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(label, value);
        }
    }

    /// Get the labels of the current scope
    pub fn top(&self) -> &Frame<'g, 'i, T> {
        // The stack always holds at least the root frame
        &self.frames[self.frames.len() - 1]
    }

    /// Number of frames, including the root one
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

impl<'g, 'i, T> Default for VariableStack<'g, 'i, T> {
    fn default() -> Self {
        Self::new()
    }
}
