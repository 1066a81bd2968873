use super::cursor::Position;
use std::collections::BTreeSet;

/// Descriptor of the "any code point" matcher
pub const ANY_DESCRIPTOR: &str = ".";

/// Descriptor recorded when the end of the input was expected
const EOF_DESCRIPTOR: &str = "!.";

/// Farthest-failure tracker
///
/// Every attempt of an atomic matcher (literal, class, any) is recorded here. Only the attempts at the farthest
/// offset are kept, which gives the most informative explanation of why the input was rejected.
#[derive(Debug, Clone)]
pub struct ErrorTracker {
    farthest: Position,
    expected: Vec<String>,
    invert: bool,
}

impl ErrorTracker {
    pub fn new() -> Self {
        Self {
            farthest: Position {
                line: 1,
                col: 1,
                offset: 0,
            },
            expected: Vec::with_capacity(20),
            invert: false,
        }
    }

    /// Record a matcher attempt
    ///
    /// Outside of negative lookaheads failures are recorded and successes ignored, inside of them it's the other way
    /// around and the descriptor is negated.
    pub fn record(&mut self, failed: bool, pos: Position, want: &str) {
        if failed != !self.invert {
            return;
        }

        if pos.offset < self.farthest.offset {
            return;
        }

        if pos.offset > self.farthest.offset {
            self.farthest = pos;
            self.expected.clear();
        }

        if self.invert {
            self.expected.push(format!("!{}", want));
        } else {
            self.expected.push(want.to_string());
        }
    }

    /// Flip the inversion flag (when entering or leaving a negative lookahead)
    pub fn toggle_invert(&mut self) {
        self.invert = !self.invert;
    }

    /// Is the tracker currently inverted?
    pub fn is_inverted(&self) -> bool {
        self.invert
    }

    /// Position of the farthest recorded failure
    pub fn farthest(&self) -> Position {
        self.farthest
    }

    /// Deduplicated and sorted expectations at the farthest position
    ///
    /// An expected end of input is moved to the end of the list, as `EOF`.
    pub fn expected(&self) -> Vec<String> {
        let mut set: BTreeSet<&str> = self.expected.iter().map(String::as_str).collect();

        let eof = set.remove(EOF_DESCRIPTOR);

        let mut expected: Vec<String> = set.into_iter().map(str::to_string).collect();

        if eof {
            expected.push("EOF".to_string());
        }

        expected
    }
}

impl Default for ErrorTracker {
    fn default() -> Self {
        Self::new()
    }
}
