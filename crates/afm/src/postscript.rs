//! PostScript literals.
//!
//! Some AFM fields, like `BlendDesignPositions` or `WeightVector`,
//!     hold PostScript values rather than plain text.
//! This module tokenizes the literal subset of PostScript that appears in these fields:
//!     numbers, booleans, names, strings and arbitrarily nested arrays.
//! There is no support for executing PostScript.

use crate::error::{ParseWarning, ParseWarningKind};

/// A PostScript literal value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Number(f64),
    Boolean(bool),
    /// A string, like `(Light)`. The outermost parentheses are not included.
    String(String),
    /// A name, like `/Weight`. The slash is not included.
    Name(String),
    Array(Vec<Value>),
}

impl Value {
    /// Returns the number, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text of a string or name.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Name(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements, if this is an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

/// Parse a sequence of PostScript literals.
///
/// Brackets and parentheses that are not closed by the end of the input are closed automatically,
///     innermost first.
/// Tokens that are not booleans, names, strings or arrays are parsed as numbers;
///     if this fails the token becomes 0 and a warning is returned.
/// Warning spans are relative to the start of `source`.
pub fn parse_postscript(source: &str) -> (Vec<Value>, Vec<ParseWarning>) {
    let mut tokenizer = Tokenizer::default();
    for (i, c) in source.char_indices() {
        tokenizer.push(i, c);
    }
    tokenizer.finish(source.len())
}

/// Parse a character code or codepoint.
///
/// Values in angle brackets, like `<20AC>`, are hexadecimal.
/// Everything else is decimal.
pub fn parse_numeral(token: &str) -> Option<i64> {
    match token.strip_prefix('<') {
        Some(hex) => {
            let hex = hex.strip_suffix('>').unwrap_or(hex);
            if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return None;
            }
            i64::from_str_radix(hex, 16).ok()
        }
        None => token.parse().ok(),
    }
}

/// Parse a number.
///
/// Only decimal notation with an optional exponent is accepted.
/// In particular `inf` and `NaN` are not numbers.
pub fn parse_number(token: &str) -> Option<f64> {
    let valid = token.chars().any(|c| c.is_ascii_digit())
        && token
            .chars()
            .all(|c| matches!(c, '0'..='9' | '+' | '-' | '.' | 'e' | 'E'));
    if !valid {
        return None;
    }
    token.parse().ok()
}

#[derive(Default)]
struct Tokenizer {
    /// Arrays that have been opened but not closed, along with their starting offsets.
    /// The root sequence is not on the stack.
    stack: Vec<(usize, Vec<Value>)>,
    root: Vec<Value>,
    token: String,
    token_start: usize,
    /// Depth of parenthesis nesting. Non-zero while inside a string.
    string_depth: usize,
    warnings: Vec<ParseWarning>,
}

impl Tokenizer {
    fn push(&mut self, i: usize, c: char) {
        if self.string_depth > 0 {
            match c {
                '(' => {
                    self.string_depth += 1;
                    self.token.push(c);
                }
                ')' => {
                    self.string_depth -= 1;
                    if self.string_depth == 0 {
                        let s = std::mem::take(&mut self.token);
                        self.append(Value::String(s));
                    } else {
                        self.token.push(c);
                    }
                }
                _ => self.token.push(c),
            }
            return;
        }
        match c {
            '[' => {
                self.flush(i);
                self.stack.push((i, vec![]));
            }
            ']' if !self.stack.is_empty() => {
                self.flush(i);
                if let Some((_, array)) = self.stack.pop() {
                    self.append(Value::Array(array));
                }
            }
            '(' => {
                self.flush(i);
                self.string_depth = 1;
                self.token_start = i;
            }
            c if c.is_whitespace() => self.flush(i),
            _ => {
                if self.token.is_empty() {
                    self.token_start = i;
                }
                self.token.push(c);
            }
        }
    }

    fn append(&mut self, value: Value) {
        match self.stack.last_mut() {
            None => self.root.push(value),
            Some((_, array)) => array.push(value),
        }
    }

    /// End the current bare token, which finishes at offset `end`.
    fn flush(&mut self, end: usize) {
        if self.token.is_empty() {
            return;
        }
        let token = std::mem::take(&mut self.token);
        let value = match token.as_str() {
            "true" => Value::Boolean(true),
            "false" => Value::Boolean(false),
            _ => match token.strip_prefix('/') {
                Some(name) => Value::Name(name.into()),
                None => Value::Number(match parse_number(&token) {
                    Some(n) => n,
                    None => {
                        self.warnings.push(ParseWarning::new(
                            self.token_start..end,
                            ParseWarningKind::InvalidNumber { token },
                        ));
                        0.0
                    }
                }),
            },
        };
        self.append(value);
    }

    fn finish(mut self, end: usize) -> (Vec<Value>, Vec<ParseWarning>) {
        if self.string_depth > 0 {
            self.warnings.push(ParseWarning::new(
                self.token_start..end,
                ParseWarningKind::UnterminatedString,
            ));
            self.string_depth = 0;
            let s = std::mem::take(&mut self.token);
            self.append(Value::String(s));
        }
        self.flush(end);
        while let Some((start, array)) = self.stack.pop() {
            self.warnings.push(ParseWarning::new(
                start..end,
                ParseWarningKind::UnterminatedArray,
            ));
            self.append(Value::Array(array));
        }
        (self.root, self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::Value::*;
    use super::*;

    fn s(s: &str) -> Value {
        String(s.into())
    }

    fn n(n: &str) -> Value {
        Name(n.into())
    }

    fn a(v: Vec<Value>) -> Value {
        Array(v)
    }

    macro_rules! postscript_tests {
        ($( ($name: ident, $input: expr, $want: expr, ), )+ ) => {
            $(
                #[test]
                fn $name() {
                    let want: Vec<Value> = $want;
                    let (got, _) = parse_postscript($input);
                    assert_eq!(got, want);
                }
            )+
        };
    }

    postscript_tests!(
        (empty_input, "", vec![],),
        (string, "(Foo)", vec![s("Foo")],),
        (string_with_spaces, "(This is a string)", vec![s("This is a string")],),
        (empty_string, "()", vec![s("")],),
        (adjacent_empty_strings, "()()", vec![s(""), s("")],),
        (separated_empty_strings, "() ()", vec![s(""), s("")],),
        (multiple_strings, "(LT) (CN)", vec![s("LT"), s("CN")],),
        (
            adjacent_strings,
            "(LT)(_)(CN)",
            vec![s("LT"), s("_"), s("CN")],
        ),
        (
            string_with_newline,
            "(Strings may contain newlines\nand such.)",
            vec![s("Strings may contain newlines\nand such.")],
        ),
        (
            string_with_special_characters,
            "(Strings may [contain] special characters *!&}^% and balanced parentheses (a a) (and so on).)",
            vec![s("Strings may [contain] special characters *!&}^% and balanced parentheses (a a) (and so on).")],
        ),
        (string_with_parentheses, "(a(Foo Bar))", vec![s("a(Foo Bar)")],),
        (
            string_with_nested_parentheses,
            "((This is a 0) (((((zero) value.)))))",
            vec![s("(This is a 0) (((((zero) value.))))")],
        ),
        (
            unterminated_string,
            "(This one is unfinished",
            vec![s("This one is unfinished")],
        ),
        (empty_array, "[]", vec![a(vec![])],),
        (multiple_arrays, "[] []", vec![a(vec![]), a(vec![])],),
        (adjacent_arrays, "[][]", vec![a(vec![]), a(vec![])],),
        (
            array_of_numbers,
            "[1 2 3]",
            vec![a(vec![Number(1.0), Number(2.0), Number(3.0)])],
        ),
        (
            array_of_strings,
            "[(Foo) (Bar)]",
            vec![a(vec![s("Foo"), s("Bar")])],
        ),
        (
            array_of_booleans,
            "[true false]",
            vec![a(vec![Boolean(true), Boolean(false)])],
        ),
        (
            array_of_names,
            "[/Foo /Bar /Baz]",
            vec![a(vec![n("Foo"), n("Bar"), n("Baz")])],
        ),
        (nested_empty_array, "[[]]", vec![a(vec![a(vec![])])],),
        (
            nested_arrays,
            "[1 2 [3]]",
            vec![a(vec![Number(1.0), Number(2.0), a(vec![Number(3.0)])])],
        ),
        (
            sibling_nested_arrays,
            "[[1 2 3] [4 5 6]]",
            vec![a(vec![
                a(vec![Number(1.0), Number(2.0), Number(3.0)]),
                a(vec![Number(4.0), Number(5.0), Number(6.0)]),
            ])],
        ),
        (unterminated_array, "[1", vec![a(vec![Number(1.0)])],),
        (
            unterminated_nested_array,
            "[1 2 [3",
            vec![a(vec![Number(1.0), Number(2.0), a(vec![Number(3.0)])])],
        ),
        (
            unterminated_nested_arrays,
            "[1 [2 [",
            vec![a(vec![Number(1.0), a(vec![Number(2.0), a(vec![])])])],
        ),
        (
            unterminated_nested_names,
            "[/A [/B [/C /D",
            vec![a(vec![n("A"), a(vec![n("B"), a(vec![n("C"), n("D")])])])],
        ),
        (unterminated_name_array, "[/Foo", vec![a(vec![n("Foo")])],),
        (
            numbers_without_array,
            "120 -340.5",
            vec![Number(120.0), Number(-340.5)],
        ),
        (collapsed_whitespace, "  1 \t  2  ", vec![Number(1.0), Number(2.0)],),
        (
            array_next_to_token,
            "1[2]3",
            vec![Number(1.0), a(vec![Number(2.0)]), Number(3.0)],
        ),
        (
            string_inside_array,
            "[(a) [(b c)]]",
            vec![a(vec![s("a"), a(vec![s("b c")])])],
        ),
        (boolean_is_case_sensitive, "True", vec![Number(0.0)],),
        (invalid_number, "abc", vec![Number(0.0)],),
        (stray_closing_bracket, "1 ]", vec![Number(1.0), Number(0.0)],),
        (stray_closing_parenthesis, "1)", vec![Number(0.0)],),
    );

    #[test]
    fn invalid_number_warning() {
        let (_, warnings) = parse_postscript("[1 abc 2]");
        assert_eq!(
            warnings,
            vec![ParseWarning::new(
                3..6,
                ParseWarningKind::InvalidNumber {
                    token: "abc".into()
                }
            )]
        );
    }

    #[test]
    fn unterminated_warnings() {
        let (_, warnings) = parse_postscript("[1 [2 (x");
        assert_eq!(
            warnings,
            vec![
                ParseWarning::new(6..8, ParseWarningKind::UnterminatedString),
                ParseWarning::new(3..8, ParseWarningKind::UnterminatedArray),
                ParseWarning::new(0..8, ParseWarningKind::UnterminatedArray),
            ]
        );
    }

    #[test]
    fn well_formed_input_has_no_warnings() {
        let (_, warnings) = parse_postscript("[/Weight /Width] [(Light) (Bold)] [[0 1] [2 3]]");
        assert_eq!(warnings, vec![]);
    }

    macro_rules! numeral_tests {
        ($( ($name: ident, $input: expr, $want: expr, ), )+ ) => {
            $(
                #[test]
                fn $name() {
                    assert_eq!(parse_numeral($input), $want);
                }
            )+
        };
    }

    numeral_tests!(
        (numeral_decimal, "150", Some(150),),
        (numeral_negative, "-1", Some(-1),),
        (numeral_hex, "<DEAD>", Some(0xDEAD),),
        (numeral_hex_lowercase, "<beef>", Some(0xBEEF),),
        (numeral_hex_unterminated, "<3B0", Some(0x3B0),),
        (numeral_hex_invalid_digit, "<XYZ>", None,),
        (numeral_hex_empty, "<>", None,),
        (numeral_hex_signed, "<-1>", None,),
        (numeral_decimal_invalid, "12a", None,),
        (numeral_decimal_fraction, "1.5", None,),
    );

    macro_rules! number_tests {
        ($( ($name: ident, $input: expr, $want: expr, ), )+ ) => {
            $(
                #[test]
                fn $name() {
                    assert_eq!(parse_number($input), $want);
                }
            )+
        };
    }

    number_tests!(
        (number_integer, "27", Some(27.0),),
        (number_negative_decimal, "-45.2", Some(-45.2),),
        (number_leading_dot, ".5", Some(0.5),),
        (number_exponent, "1e3", Some(1000.0),),
        (number_infinity, "inf", None,),
        (number_nan, "NaN", None,),
        (number_sign_only, "-", None,),
        (number_word, "Bold", None,),
    );
}
