use std::fmt;

/// Location in the parsed input
///
/// Lines start at 1. Columns start at 1 for the first code point of a line, except for line breaks which sit at
/// column 0 of the line they open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// Line number
    pub line: usize,

    /// Column number, counted in code points
    pub col: usize,

    /// Byte offset in the input
    pub offset: usize,
}

impl Position {
    /// Position before the first code point has been read
    pub(crate) fn start() -> Self {
        Self {
            line: 1,
            col: 0,
            offset: 0,
        }
    }

    /// Render the position as used in diagnostics prefixes (`line:col (offset)`)
    pub fn to_prefix(&self) -> String {
        format!("{}:{} ({})", self.line, self.col, self.offset)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{} [{}]", self.line, self.col, self.offset)
    }
}

/// Parsing cursor, the unit of backtracking
///
/// Restoring a cursor is the only way consumed input is given back: the input buffer itself is never touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Position of the current code point
    pub pos: Position,

    /// Current code point (`None` at the end of the input)
    pub current: Option<char>,

    /// Width in bytes of the current code point
    pub width: usize,
}

impl Cursor {
    /// Cursor before the first read
    pub(crate) fn start() -> Self {
        Self {
            pos: Position::start(),
            current: None,
            width: 0,
        }
    }

    /// Is the cursor at the end of the input?
    pub fn at_end(&self) -> bool {
        self.current.is_none()
    }

    /// Move past the current code point and decode the next one
    ///
    /// Returns `false` if the newly decoded code point is not valid UTF-8, in which case the current code point is
    /// set to U+FFFD and spans a single byte.
    pub(crate) fn advance(&mut self, input: &[u8]) -> bool {
        self.pos.offset += self.width;

        let (current, width, valid) = decode_rune(&input[self.pos.offset.min(input.len())..]);

        self.current = current;
        self.width = width;
        self.pos.col += 1;

        if current == Some('\n') {
            self.pos.line += 1;
            self.pos.col = 0;
        }

        valid
    }
}

/// Decode the first code point of a byte slice
///
/// Returns the code point (`None` if the slice is empty), its width in bytes, and whether it was valid UTF-8.
/// Invalid sequences decode as U+FFFD with a width of one byte.
pub fn decode_rune(bytes: &[u8]) -> (Option<char>, usize, bool) {
    if bytes.is_empty() {
        return (None, 0, true);
    }

    // A code point spans at most four bytes
    let window = &bytes[..bytes.len().min(4)];

    let valid = match std::str::from_utf8(window) {
        Ok(valid) => valid,
        Err(err) if err.valid_up_to() > 0 => {
            // The window may cut a later code point, the first one is complete anyway
            match std::str::from_utf8(&window[..err.valid_up_to()]) {
                Ok(valid) => valid,
                Err(_) => return (Some(char::REPLACEMENT_CHARACTER), 1, false),
            }
        }
        Err(_) => return (Some(char::REPLACEMENT_CHARACTER), 1, false),
    };

    match valid.chars().next() {
        Some(c) => (Some(c), c.len_utf8(), true),
        None => (Some(char::REPLACEMENT_CHARACTER), 1, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_multibyte_code_points() {
        assert_eq!(decode_rune("é!".as_bytes()), (Some('é'), 2, true));
        assert_eq!(decode_rune("😀".as_bytes()), (Some('😀'), 4, true));
        assert_eq!(decode_rune(b""), (None, 0, true));
    }

    #[test]
    fn invalid_bytes_decode_as_replacement() {
        assert_eq!(
            decode_rune(&[0xff, b'a']),
            (Some(char::REPLACEMENT_CHARACTER), 1, false)
        );

        // Truncated two-byte sequence
        assert_eq!(
            decode_rune(&[0xc3]),
            (Some(char::REPLACEMENT_CHARACTER), 1, false)
        );
    }

    #[test]
    fn tracks_lines_and_columns() {
        let input = b"a\nb";
        let mut cursor = Cursor::start();

        cursor.advance(input);
        assert_eq!(cursor.pos, Position { line: 1, col: 1, offset: 0 });
        assert_eq!(cursor.current, Some('a'));

        cursor.advance(input);
        assert_eq!(cursor.pos, Position { line: 2, col: 0, offset: 1 });
        assert_eq!(cursor.current, Some('\n'));

        cursor.advance(input);
        assert_eq!(cursor.pos, Position { line: 2, col: 1, offset: 2 });

        cursor.advance(input);
        assert!(cursor.at_end());
        assert_eq!(cursor.pos.offset, 3);
    }
}
