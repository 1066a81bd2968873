//! Convenience wrappers reading a whole input before running a grammar

use super::executor::{parse, Parsed};
use super::options::Setting;
use crate::grammar::Grammar;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read everything from a reader, then run a grammar against it
pub fn parse_reader<T: Clone, R: Read>(
    grammar: &Grammar<T>,
    filename: &str,
    mut reader: R,
    settings: impl IntoIterator<Item = Setting>,
) -> io::Result<Parsed<'static, T>> {
    let mut input = Vec::new();
    reader.read_to_end(&mut input)?;

    Ok(parse(grammar, filename, &input, settings).into_owned())
}

/// Read a file, then run a grammar against it
///
/// The file's path is used to prefix diagnostics.
pub fn parse_file<T: Clone>(
    grammar: &Grammar<T>,
    path: impl AsRef<Path>,
    settings: impl IntoIterator<Item = Setting>,
) -> io::Result<Parsed<'static, T>> {
    let path = path.as_ref();
    let file = File::open(path)?;

    parse_reader(grammar, &path.to_string_lossy(), file, settings)
}
