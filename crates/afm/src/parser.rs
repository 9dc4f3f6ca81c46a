//! Incremental parser for metrics files
//!
//! The parser is a state machine driven by complete lines of input.
//! Input is provided in chunks of any size using [`Parser::read_chunk`];
//!     a line that is split across chunks is buffered until it is complete.

use crate::fields::Field;
use crate::lexer::{self, Word, Words};
use crate::records;
use crate::{
    Axis, Descendent, DirectionInfo, FontInfo, FontMetrics, Format, Master, ParseWarning,
    ParseWarningKind,
};
use log::{debug, trace};

/// How character metrics with the same code are stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum CharMetricsLayout {
    /// Every metric is kept, in the order it appears in the input.
    #[default]
    Sequence,
    /// Metrics are keyed by code.
    /// A metric whose code was already seen replaces the earlier metric in place.
    /// Metrics with code -1 are always kept.
    ByCode,
}

/// Options for the parser.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct Options {
    /// Drop records and field assignments that generate warnings.
    ///
    /// By default invalid values are replaced by defaults and the record is kept.
    /// Warnings are reported in both modes.
    pub strict: bool,
    /// How character metrics are stored; see [`CharMetricsLayout`].
    pub char_metrics: CharMetricsLayout,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Section {
    None,
    CharMetrics,
    Composites,
    KernPairs,
    TrackKern,
    PrimaryFonts,
    Other(String),
}

impl Section {
    /// Parse a section name, returning the writing direction given by a trailing `0` or `1`.
    fn from_name(name: &str) -> (Section, Option<WritingDirection>) {
        let (name, direction) = match name.strip_suffix(['0', '1']) {
            Some(stripped) if name.ends_with('1') => (stripped, Some(WritingDirection::Vertical)),
            Some(stripped) => (stripped, Some(WritingDirection::Horizontal)),
            None => (name, None),
        };
        let section = match name {
            "CharMetrics" => Section::CharMetrics,
            "Composites" => Section::Composites,
            "KernPairs" => Section::KernPairs,
            "TrackKern" => Section::TrackKern,
            "PrimaryFonts" => Section::PrimaryFonts,
            _ => Section::Other(name.into()),
        };
        (section, direction)
    }
}

/// Target of direction specific fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WritingDirection {
    Horizontal,
    Vertical,
    Both,
}

impl WritingDirection {
    /// Indices into [`FontMetrics::directions`].
    fn indices(self) -> &'static [usize] {
        match self {
            WritingDirection::Horizontal => &[0],
            WritingDirection::Vertical => &[1],
            WritingDirection::Both => &[0, 1],
        }
    }
}

/// A nested block, identified by its index in the owning collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scope {
    Descendent(usize),
    Master(usize),
    Axis(usize),
}

/// Returns the font information that field assignments currently target.
fn current_info<'a>(metrics: &'a mut FontMetrics, scopes: &[Scope]) -> &'a mut FontInfo {
    for scope in scopes.iter().rev() {
        match *scope {
            Scope::Descendent(i) => return &mut metrics.descendents[i].info,
            Scope::Master(i) => return &mut metrics.masters[i].info,
            Scope::Axis(_) => {}
        }
    }
    &mut metrics.global_info
}

/// Split words like `<20><7E>` into one word per numeral.
fn split_numerals(words: Words) -> Vec<Word> {
    let mut result = vec![];
    for word in words {
        let mut start = 0;
        for (i, c) in word.value.char_indices() {
            if c == '>' && i + 1 < word.value.len() {
                result.push(Word {
                    value: &word.value[start..i + 1],
                    span: word.span.start + start..word.span.start + i + 1,
                });
                start = i + 1;
            }
        }
        result.push(Word {
            value: &word.value[start..],
            span: word.span.start + start..word.span.end,
        });
    }
    result
}

/// Incremental parser for AFM, ACFM and AMFM files.
///
/// ```
/// let mut parser = afm::Parser::new();
/// for chunk in ["StartFontMetrics 2.0\nStartCharMetrics 1\nC 32 ; W", "X 250 ; N space ;\r", "\n"] {
///     parser.read_chunk(chunk);
/// }
/// assert_eq!(parser.metrics().char_by_name("space").map(|c| c.widths[0]), Some(250.0));
/// ```
#[derive(Debug)]
pub struct Parser {
    options: Options,
    metrics: FontMetrics,
    warnings: Vec<ParseWarning>,
    section: Section,
    direction: WritingDirection,
    /// Direction set by the enclosing `StartDirection` block.
    block_direction: WritingDirection,
    scopes: Vec<Scope>,
    end_keyword: Option<&'static str>,
    done: bool,
    /// Incomplete line left over from the previous chunk.
    tail: String,
    /// Number of leading bytes of the tail known to contain no line terminator.
    scanned: usize,
    /// Offset of the start of the tail in the whole input.
    offset: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new()
    }
}

impl Parser {
    pub fn new() -> Parser {
        Parser::with_options(Default::default())
    }

    pub fn with_options(options: Options) -> Parser {
        Parser {
            options,
            metrics: Default::default(),
            warnings: vec![],
            section: Section::None,
            direction: WritingDirection::Horizontal,
            block_direction: WritingDirection::Horizontal,
            scopes: vec![],
            end_keyword: None,
            done: false,
            tail: String::new(),
            scanned: 0,
            offset: 0,
        }
    }

    /// Create a parser and read the first chunk of input.
    pub fn with_initial_chunk(chunk: &str) -> Parser {
        let mut parser = Parser::new();
        parser.read_chunk(chunk);
        parser
    }

    /// Returns the metrics parsed so far.
    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    /// Returns the warnings generated so far.
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// Whether the keyword that closes the file has been read.
    ///
    /// After this all further input is ignored.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Read the next chunk of input.
    ///
    /// Lines end with LF, CR or CRLF.
    /// The last line of the chunk is buffered if it is incomplete.
    pub fn read_chunk(&mut self, chunk: &str) {
        if self.done {
            return;
        }
        let mut buffer = std::mem::take(&mut self.tail);
        buffer.push_str(chunk);
        let mut start = 0;
        let mut search = self.scanned;
        while let Some((end, terminator_len)) = lexer::find_line_end(&buffer, search) {
            self.handle_line(&buffer[start..end], self.offset + start);
            start = end + terminator_len;
            search = start;
            if self.done {
                return;
            }
        }
        self.offset += start;
        buffer.drain(..start);
        // A trailing CR is checked again once the next byte is known.
        self.scanned = buffer.len() - usize::from(buffer.ends_with('\r'));
        self.tail = buffer;
    }

    /// Read a single complete line of input.
    ///
    /// The line must not contain a line terminator.
    /// Warning spans are computed as if the line were followed by an LF.
    pub fn read_line(&mut self, line: &str) {
        if self.done {
            return;
        }
        self.handle_line(line, self.offset);
        self.offset += line.len() + 1;
    }

    /// Finish parsing and return the metrics along with all warnings.
    ///
    /// Any buffered incomplete line is read as the last line of the input.
    pub fn finish(mut self) -> (FontMetrics, Vec<ParseWarning>) {
        if !self.done {
            let tail = std::mem::take(&mut self.tail);
            self.handle_line(&tail, self.offset);
            self.offset += tail.len();
        }
        if let (false, Some(keyword)) = (self.done, self.end_keyword) {
            self.warnings.push(ParseWarning::new(
                self.offset..self.offset,
                ParseWarningKind::MissingEndKeyword { keyword },
            ));
        }
        (self.metrics, self.warnings)
    }

    fn handle_line(&mut self, line: &str, offset: usize) {
        let (line, offset) = match (offset, line.strip_prefix('\u{FEFF}')) {
            (0, Some(stripped)) => (stripped, '\u{FEFF}'.len_utf8()),
            _ => (line, offset),
        };
        let trimmed = line.trim_start();
        let offset = offset + line.len() - trimmed.len();
        let line = trimmed.trim_end();

        let mut words = Words::with_offset(line, offset);
        let Some(key) = words.next() else {
            return;
        };
        if key.value == "Comment" {
            return;
        }
        if Some(key.value) == self.end_keyword {
            debug!("reached {}", key.value);
            self.done = true;
            return;
        }
        if let Some(format) = Format::from_start_keyword(key.value) {
            if self.metrics.format == Format::Unknown {
                let version = words.rest().0;
                debug!("recognized {format:?} header, version {version}");
                self.metrics.format = format;
                self.metrics.version = version.into();
                self.end_keyword = format.end_keyword();
            }
            return;
        }
        match key.value {
            "StartDirection" => {
                self.direction = match words.next() {
                    Some(word) => match word.value {
                        "0" => WritingDirection::Horizontal,
                        "1" => WritingDirection::Vertical,
                        "2" => WritingDirection::Both,
                        _ => {
                            self.warnings.push(ParseWarning::new(
                                word.span,
                                ParseWarningKind::InvalidDirection {
                                    value: word.value.into(),
                                },
                            ));
                            WritingDirection::Horizontal
                        }
                    },
                    None => {
                        self.warnings.push(ParseWarning::new(
                            key.span,
                            ParseWarningKind::InvalidDirection { value: "".into() },
                        ));
                        WritingDirection::Horizontal
                    }
                };
                self.block_direction = self.direction;
                trace!("writing direction is now {:?}", self.direction);
                return;
            }
            "EndDirection" => {
                self.direction = WritingDirection::Horizontal;
                self.block_direction = WritingDirection::Horizontal;
                return;
            }
            "StartDescendent" => {
                let mut numerals = split_numerals(words).into_iter();
                let low = records::numeral(numerals.next(), &mut self.warnings);
                let high = records::numeral(numerals.next(), &mut self.warnings);
                self.metrics.descendents.push(Descendent {
                    char_range: [low, high],
                    info: Default::default(),
                });
                self.push_scope(Scope::Descendent(self.metrics.descendents.len() - 1));
                return;
            }
            "StartMaster" => {
                self.metrics.masters.push(Master::default());
                self.push_scope(Scope::Master(self.metrics.masters.len() - 1));
                return;
            }
            "StartAxis" => {
                self.metrics.axes.push(Axis::default());
                self.push_scope(Scope::Axis(self.metrics.axes.len() - 1));
                return;
            }
            "EndDescendent" => {
                self.pop_scope(|s| matches!(s, Scope::Descendent(_)));
                return;
            }
            "EndMaster" => {
                self.pop_scope(|s| matches!(s, Scope::Master(_)));
                return;
            }
            "EndAxis" => {
                self.pop_scope(|s| matches!(s, Scope::Axis(_)));
                return;
            }
            _ => {}
        }
        if let Some(name) = key.value.strip_prefix("Start").filter(|n| !n.is_empty()) {
            let (section, direction) = Section::from_name(name);
            self.section = section;
            match direction {
                Some(direction) => self.direction = direction,
                None if self.section == Section::KernPairs => self.direction = self.block_direction,
                None => {}
            }
            trace!(
                "entering section {:?} with writing direction {:?}",
                self.section,
                self.direction
            );
            return;
        }
        if key.value.len() > "End".len() && key.value.starts_with("End") {
            trace!("leaving section {:?}", self.section);
            self.section = Section::None;
            return;
        }

        match self.section {
            Section::CharMetrics => {
                if let Some(metric) = self.record(offset, |w| records::parse_char_metric(line, w)) {
                    match self.options.char_metrics {
                        CharMetricsLayout::Sequence => self.metrics.char_metrics.push(metric),
                        CharMetricsLayout::ByCode => self.metrics.char_metrics.insert(metric),
                    }
                }
            }
            Section::Composites => {
                if let Some(composite) = self.record(offset, |w| records::parse_composite(line, w))
                {
                    self.metrics.composites.push(composite);
                }
            }
            Section::KernPairs => {
                if let Some(pairs) = self.record(offset, |w| records::parse_kerning_pairs(line, w))
                {
                    for &i in self.direction.indices() {
                        self.metrics.directions[i]
                            .kerning_pairs
                            .extend(pairs.iter().cloned());
                    }
                }
            }
            Section::TrackKern => {
                if let Some(track_kern) = self.record(offset, |w| records::parse_track_kern(line, w))
                {
                    self.metrics.track_kerns.push(track_kern);
                }
            }
            Section::PrimaryFonts => {
                let mut end_of_section = false;
                let fonts = self.record(offset, |w| {
                    let result = records::parse_primary_fonts(line, w);
                    end_of_section = result.end_of_section;
                    result.fonts
                });
                if let Some(fonts) = fonts {
                    self.metrics.primary_fonts.extend(fonts);
                }
                if end_of_section {
                    trace!("leaving section {:?}", self.section);
                    self.section = Section::None;
                }
            }
            Section::None | Section::Other(_) => {
                self.assign_field(key, words);
            }
        }
    }

    /// Parse a record, rebasing the warnings it generates onto the whole input.
    ///
    /// In strict mode the record is dropped if there are any warnings.
    fn record<T>(
        &mut self,
        offset: usize,
        parse: impl FnOnce(&mut Vec<ParseWarning>) -> T,
    ) -> Option<T> {
        let mut warnings = vec![];
        let record = parse(&mut warnings);
        let keep = !self.options.strict || warnings.is_empty();
        self.warnings
            .extend(warnings.into_iter().map(|w| w.rebase(offset)));
        keep.then_some(record)
    }

    fn assign_field(&mut self, key: Word, words: Words) {
        let (value, value_offset) = words.rest();
        let strict = self.options.strict;
        match Field::from_key(key.value) {
            Field::Info(field) => {
                let info = current_info(&mut self.metrics, &self.scopes);
                field.apply(&mut [info], value, value_offset, strict, &mut self.warnings);
            }
            Field::Direction(field) => {
                let [horizontal, vertical] = &mut self.metrics.directions;
                let mut targets: Vec<&mut DirectionInfo> = match self.direction {
                    WritingDirection::Horizontal => vec![horizontal],
                    WritingDirection::Vertical => vec![vertical],
                    WritingDirection::Both => vec![horizontal, vertical],
                };
                field.apply(&mut targets, value, value_offset, strict, &mut self.warnings);
            }
            Field::Axis(field) => {
                let axis = self.scopes.iter().rev().find_map(|scope| match scope {
                    Scope::Axis(i) => Some(*i),
                    _ => None,
                });
                match axis {
                    Some(i) => {
                        let axis = &mut self.metrics.axes[i];
                        field.apply(&mut [axis], value, value_offset, strict, &mut self.warnings);
                    }
                    None => self.warnings.push(ParseWarning::new(
                        key.span,
                        ParseWarningKind::AxisFieldOutsideAxis {
                            key: key.value.into(),
                        },
                    )),
                }
            }
            Field::User => {
                self.metrics
                    .user_fields
                    .insert(key.value.into(), value.into());
            }
            Field::Unknown => {
                self.warnings.push(ParseWarning::new(
                    key.span,
                    ParseWarningKind::UnknownField {
                        key: key.value.into(),
                    },
                ));
            }
        }
    }

    fn push_scope(&mut self, scope: Scope) {
        debug!("entering {scope:?}");
        self.scopes.push(scope);
    }

    /// Pop the innermost scope matching the predicate, along with any scopes nested inside it.
    fn pop_scope(&mut self, predicate: impl Fn(&Scope) -> bool) {
        if let Some(i) = self.scopes.iter().rposition(predicate) {
            debug!("leaving {:?}", self.scopes[i]);
            self.scopes.truncate(i);
        }
    }
}
