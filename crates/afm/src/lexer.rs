//! Lexer for AFM files.
//!
//! AFM files are line oriented.
//! Each line is a sequence of whitespace separated words,
//!     optionally grouped into fields by semicolons.

/// A whitespace delimited word in a line.
///
/// The span is relative to the start of the string the word was lexed from.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Word<'a> {
    pub value: &'a str,
    pub span: std::ops::Range<usize>,
}

/// Lexer that splits a string into whitespace delimited words.
pub struct Words<'a> {
    source: &'a str,
    /// Offset added to the span of every word.
    offset: usize,
    /// The current position within the source string.
    current: usize,
}

impl<'a> Words<'a> {
    /// Create a new word lexer.
    pub fn new(source: &'a str) -> Words<'a> {
        Words::with_offset(source, 0)
    }

    /// Create a new word lexer whose spans are shifted by `offset`.
    ///
    /// This is used when the source is a slice of a larger line.
    pub fn with_offset(source: &'a str, offset: usize) -> Words<'a> {
        Words {
            source,
            offset,
            current: 0,
        }
    }

    /// Returns the rest of the source after the current position, with surrounding whitespace trimmed,
    ///     along with its offset.
    pub fn rest(&self) -> (&'a str, usize) {
        let rest = &self.source[self.current..];
        let trimmed = rest.trim_start();
        let start = self.current + rest.len() - trimmed.len();
        (trimmed.trim_end(), start + self.offset)
    }
}

impl<'a> Iterator for Words<'a> {
    type Item = Word<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.source[self.current..];
        let start = self.current + rest.len() - rest.trim_start().len();
        if start == self.source.len() {
            self.current = start;
            return None;
        }
        let len = self.source[start..]
            .find(char::is_whitespace)
            .unwrap_or(self.source.len() - start);
        self.current = start + len;
        Some(Word {
            value: &self.source[start..start + len],
            span: start + self.offset..start + len + self.offset,
        })
    }
}

/// Split a line into semicolon delimited fields.
///
/// Each field is returned with its offset within the line.
/// Fields are not trimmed and may be empty.
pub fn fields(line: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    line.split(';').map(move |field| {
        let start = offset;
        offset += field.len() + 1;
        (start, field)
    })
}

/// Find the end of the first complete line in `source` at or after `start`.
///
/// Lines end with LF, CR or CRLF.
/// The result is the index of the line terminator and the length of the terminator.
/// If the source ends with a CR, no line end is reported for it
///     because the next chunk of input may begin with the LF that completes a CRLF.
pub fn find_line_end(source: &str, start: usize) -> Option<(usize, usize)> {
    let bytes = source.as_bytes();
    let i = start + bytes[start..].iter().position(|b| *b == b'\n' || *b == b'\r')?;
    if bytes[i] == b'\n' {
        return Some((i, 1));
    }
    match bytes.get(i + 1) {
        None => None,
        Some(b'\n') => Some((i, 2)),
        Some(_) => Some((i, 1)),
    }
}
