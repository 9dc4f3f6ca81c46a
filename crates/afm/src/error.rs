//! Warnings relating to AFM file parsing
//!
//! Parsing never fails.
//! Malformed input is coerced to something sensible and a [`ParseWarning`]
//!     describing what happened is recorded alongside the parsed metrics.

/// Warning generated while parsing an AFM, ACFM or AMFM file.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct ParseWarning {
    /// Location of the part of the input that generates this warning.
    ///
    /// The span is in bytes and is relative to the start of the whole input,
    ///     no matter how the input was split into chunks.
    pub span: std::ops::Range<usize>,
    /// Kind of the warning.
    pub kind: ParseWarningKind,
}

/// Kind of parse warning.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum ParseWarningKind {
    /// A token where a number was expected is not a number; e.g. `WX abc`.
    ///
    /// The value is replaced by 0.
    InvalidNumber { token: String },
    /// A character code is neither a decimal integer nor a hexadecimal integer in angle brackets.
    InvalidNumeral { token: String },
    /// A boolean field has a value other than `true` or `false`.
    ///
    /// The value is replaced by `false`.
    InvalidBoolean { value: String },
    /// The argument to `StartDirection` is not 0, 1 or 2.
    InvalidDirection { value: String },
    /// A PostScript string is missing its closing parenthesis.
    UnterminatedString,
    /// A PostScript array is missing its closing bracket.
    UnterminatedArray,
    /// A line inside a kerning pair section does not start with `KP`, `KPH`, `KPX` or `KPY`.
    UnknownKerningCommand { command: String },
    /// A key starting with an uppercase letter is not recognized.
    ///
    /// Keys starting with a lowercase letter are never reported;
    ///     they are stored as user-defined fields.
    UnknownField { key: String },
    /// An `AxisType` or `AxisLabel` field appears outside of a `StartAxis` block.
    AxisFieldOutsideAxis { key: String },
    /// The input ended before the keyword closing the file was seen.
    MissingEndKeyword { keyword: &'static str },
}

impl ParseWarning {
    pub(crate) fn new(span: std::ops::Range<usize>, kind: ParseWarningKind) -> ParseWarning {
        ParseWarning { span, kind }
    }

    /// Returns a human readable description of the warning.
    pub fn message(&self) -> String {
        use ParseWarningKind::*;
        match &self.kind {
            InvalidNumber { token } => format!["`{token}` is not a number"],
            InvalidNumeral { token } => {
                format!["`{token}` is not a decimal or <hexadecimal> integer"]
            }
            InvalidBoolean { value } => format!["`{value}` is not a boolean"],
            InvalidDirection { value } => format!["`{value}` is not a writing direction"],
            UnterminatedString => "string is missing a closing parenthesis".into(),
            UnterminatedArray => "array is missing a closing bracket".into(),
            UnknownKerningCommand { command } => {
                format!["`{command}` is not a kerning pair command"]
            }
            UnknownField { key } => format!["unknown field `{key}`"],
            AxisFieldOutsideAxis { key } => format!["`{key}` appears outside of an axis block"],
            MissingEndKeyword { keyword } => format!["the input ended without `{keyword}`"],
        }
    }

    /// Returns a note explaining how the parser recovered, if there is one.
    pub fn action(&self) -> &'static str {
        use ParseWarningKind::*;
        match &self.kind {
            InvalidNumber { .. } => "the value 0 will be used instead",
            InvalidNumeral { .. } => "the value -1 will be used instead",
            InvalidBoolean { .. } => "the value false will be used instead",
            InvalidDirection { .. } => "direction 0 will be used instead",
            UnterminatedString => "the string runs to the end of the line",
            UnterminatedArray => "the array runs to the end of the line",
            UnknownKerningCommand { .. } | UnknownField { .. } | AxisFieldOutsideAxis { .. } => {
                "this line will be ignored"
            }
            MissingEndKeyword { .. } => "the metrics parsed so far are kept",
        }
    }

    /// Returns a copy of this warning with the span moved forward by `offset` bytes.
    pub(crate) fn rebase(mut self, offset: usize) -> ParseWarning {
        self.span = self.span.start + offset..self.span.end + offset;
        self
    }

    #[cfg(feature = "ariadne")]
    pub fn ariadne_report<'a>(
        &self,
        file_name: &'a str,
    ) -> ariadne::Report<'static, (&'a str, std::ops::Range<usize>)> {
        use ariadne::*;
        let light_blue = Color::Fixed(81);
        let message = self.message();
        Report::build(ReportKind::Warning, (file_name, self.span.clone()))
            .with_config(Config::default().with_index_type(IndexType::Byte))
            .with_message(&message)
            .with_label(
                Label::new((file_name, self.span.clone()))
                    .with_message(&message)
                    .with_color(light_blue),
            )
            .with_note(self.action())
            .finish()
    }
}
