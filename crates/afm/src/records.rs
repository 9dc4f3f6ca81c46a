//! Parsers for the records inside data sections
//!
//! Each function here parses a single line from one of the record-bearing sections
//!     of a metrics file: `CharMetrics`, `Composites`, `KernPairs`, `TrackKern`
//!     and `PrimaryFonts`.
//! Most records are lists of `;` separated fields, each of which starts with a key.
//!
//! Parsing is permissive.
//! Missing values take their default, and values that cannot be parsed
//!     are replaced by their default and reported as warnings.
//! Warning spans are relative to the start of the line.

use crate::lexer::{self, Word, Words};
use crate::postscript;
use crate::{
    CharRef, CharacterComposite, CharacterMetric, CompositePart, KerningPair, ParseWarning,
    ParseWarningKind, PrimaryFont, TrackKern,
};

fn number(word: Option<Word>, warnings: &mut Vec<ParseWarning>) -> f64 {
    let Some(word) = word else {
        return 0.0;
    };
    match postscript::parse_number(word.value) {
        Some(n) => n,
        None => {
            warnings.push(ParseWarning::new(
                word.span,
                ParseWarningKind::InvalidNumber {
                    token: word.value.into(),
                },
            ));
            0.0
        }
    }
}

pub(crate) fn numeral(word: Option<Word>, warnings: &mut Vec<ParseWarning>) -> i64 {
    let Some(word) = word else {
        return -1;
    };
    match postscript::parse_numeral(word.value) {
        Some(n) => n,
        None => {
            warnings.push(ParseWarning::new(
                word.span,
                ParseWarningKind::InvalidNumeral {
                    token: word.value.into(),
                },
            ));
            -1
        }
    }
}

fn join(words: Words) -> String {
    words.map(|w| w.value).collect::<Vec<&str>>().join(" ")
}

/// Parse a line of the `CharMetrics` section.
///
/// ```
/// let mut warnings = vec![];
/// let metric = afm::records::parse_char_metric("C 102 ; WX 333 ; N f ; L i fi", &mut warnings);
/// assert_eq!(metric.code, 102);
/// assert_eq!(metric.widths, [333.0, 0.0]);
/// assert_eq!(metric.ligatures.get("i").map(String::as_str), Some("fi"));
/// ```
pub fn parse_char_metric(line: &str, warnings: &mut Vec<ParseWarning>) -> CharacterMetric {
    let mut metric: CharacterMetric = Default::default();
    for (offset, field) in lexer::fields(line) {
        let mut words = Words::with_offset(field, offset);
        let Some(key) = words.next() else {
            continue;
        };
        match key.value {
            "C" | "CH" => {
                metric.code = numeral(words.next(), warnings);
            }
            "N" => {
                metric.name = join(words);
            }
            "WX" | "W0X" => {
                metric.widths[0] = number(words.next(), warnings);
            }
            "W1X" => {
                metric.widths[1] = number(words.next(), warnings);
            }
            "WY" | "W0Y" => {
                metric.heights[0] = number(words.next(), warnings);
            }
            "W1Y" => {
                metric.heights[1] = number(words.next(), warnings);
            }
            "W" | "W0" => {
                metric.widths[0] = number(words.next(), warnings);
                metric.heights[0] = number(words.next(), warnings);
            }
            "W1" => {
                metric.widths[1] = number(words.next(), warnings);
                metric.heights[1] = number(words.next(), warnings);
            }
            "VV" => {
                let x = number(words.next(), warnings);
                let y = number(words.next(), warnings);
                metric.widths = [x, x];
                metric.heights = [y, y];
            }
            "B" => {
                for (i, word) in words.by_ref().take(4).enumerate() {
                    metric.bounding_box[i] = number(Some(word), warnings);
                }
            }
            "L" => {
                if let Some(successor) = words.next() {
                    metric
                        .ligatures
                        .insert(successor.value.into(), join(words));
                }
            }
            _ => {}
        }
    }
    metric
}

/// Parse a line of the `Composites` section.
///
/// The `CC` field names the composite character and each `PCC` field adds a part.
pub fn parse_composite(line: &str, warnings: &mut Vec<ParseWarning>) -> CharacterComposite {
    let mut composite: CharacterComposite = Default::default();
    for (offset, field) in lexer::fields(line) {
        let mut words = Words::with_offset(field, offset);
        let Some(key) = words.next() else {
            continue;
        };
        match key.value {
            "CC" => {
                if let Some(name) = words.next() {
                    composite.name = name.value.into();
                }
            }
            "PCC" => {
                let char = words.next().map(|w| w.value).unwrap_or("").into();
                let dx = number(words.next(), warnings);
                let dy = number(words.next(), warnings);
                composite.parts.push(CompositePart {
                    char,
                    offset: [dx, dy],
                });
            }
            _ => {}
        }
    }
    composite
}

/// Parse a line of a `KernPairs` section.
///
/// A line usually holds one pair, but several `;` separated pairs are accepted.
/// The command determines how the remaining values are read:
///
/// - `KP a b x y` and `KPH <a> <b> x y` give the offset `[x, y]`.
///     `KPH` identifies the characters by code rather than by name.
/// - `KPX a b x` gives the offset `[x, 0]`.
/// - `KPY a b y` gives the offset `[0, y]`.
///
/// Fields with any other command are skipped with a warning.
pub fn parse_kerning_pairs(line: &str, warnings: &mut Vec<ParseWarning>) -> Vec<KerningPair> {
    let mut pairs = vec![];
    for (offset, field) in lexer::fields(line) {
        let mut words = Words::with_offset(field, offset);
        let Some(command) = words.next() else {
            continue;
        };
        let chars: [CharRef; 2] = match command.value {
            "KP" | "KPX" | "KPY" => {
                let mut name = || CharRef::Name(words.next().map(|w| w.value).unwrap_or("").into());
                [name(), name()]
            }
            "KPH" => [
                CharRef::Code(numeral(words.next(), warnings)),
                CharRef::Code(numeral(words.next(), warnings)),
            ],
            _ => {
                warnings.push(ParseWarning::new(
                    command.span,
                    ParseWarningKind::UnknownKerningCommand {
                        command: command.value.into(),
                    },
                ));
                continue;
            }
        };
        let first = number(words.next(), warnings);
        let offset = match command.value {
            "KPX" => [first, 0.0],
            "KPY" => [0.0, first],
            _ => [first, number(words.next(), warnings)],
        };
        pairs.push(KerningPair { chars, offset });
    }
    pairs
}

/// Parse a line of the `TrackKern` section.
///
/// The line is `TrackKern degree min-point-size min-kern max-point-size max-kern`.
pub fn parse_track_kern(line: &str, warnings: &mut Vec<ParseWarning>) -> TrackKern {
    let mut words = Words::new(line);
    words.next();
    TrackKern {
        degree: number(words.next(), warnings),
        min_point_size: number(words.next(), warnings),
        min_kern: number(words.next(), warnings),
        max_point_size: number(words.next(), warnings),
        max_kern: number(words.next(), warnings),
    }
}

/// Result of parsing a line of the `PrimaryFonts` section.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrimaryFontsLine {
    pub fonts: Vec<PrimaryFont>,
    /// Whether the line contains the `EndPrimaryFonts` keyword.
    ///
    /// Chunks after the keyword are ignored.
    pub end_of_section: bool,
}

/// Split a line into `;` separated chunks, ignoring semicolons inside PostScript strings.
fn chunks(line: &str) -> Vec<(usize, &str)> {
    let mut chunks = vec![];
    let mut depth = 0_usize;
    let mut start = 0;
    for (i, c) in line.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                chunks.push((start, &line[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    chunks.push((start, &line[start..]));
    chunks
}

/// Parse a line of the `PrimaryFonts` section of an AMFM file.
///
/// A line is a sequence of `PC`, `PL` and `PN` chunks:
///
/// - `PC` appends design coordinates, truncated to integers.
/// - `PL` appends labels, which are PostScript literals.
/// - `PN` sets the name to the first string or name literal.
///     If there are no literals the raw value is the name.
///
/// The line describes at least one primary font.
/// A `PC` chunk that follows a `PL` or `PN` chunk starts another one.
pub fn parse_primary_fonts(line: &str, warnings: &mut Vec<ParseWarning>) -> PrimaryFontsLine {
    let mut result: PrimaryFontsLine = Default::default();
    let mut current: PrimaryFont = Default::default();
    let mut after_coordinates = true;
    for (offset, chunk) in chunks(line) {
        let mut words = Words::with_offset(chunk, offset);
        let Some(key) = words.next() else {
            continue;
        };
        match key.value {
            "PC" => {
                if !after_coordinates {
                    result.fonts.push(std::mem::take(&mut current));
                }
                after_coordinates = true;
                for word in words {
                    current.coordinates.push(number(Some(word), warnings).trunc() as i64);
                }
            }
            "PL" => {
                after_coordinates = false;
                let (value, value_offset) = words.rest();
                let (labels, literal_warnings) = postscript::parse_postscript(value);
                warnings.extend(literal_warnings.into_iter().map(|w| w.rebase(value_offset)));
                current.labels.extend(labels);
            }
            "PN" => {
                after_coordinates = false;
                let (value, value_offset) = words.rest();
                current.name = if value.starts_with('(') || value.starts_with('/') {
                    let (literals, literal_warnings) = postscript::parse_postscript(value);
                    warnings.extend(literal_warnings.into_iter().map(|w| w.rebase(value_offset)));
                    literals
                        .iter()
                        .find_map(|v| v.as_text())
                        .unwrap_or(value)
                        .into()
                } else {
                    value.into()
                };
            }
            "EndPrimaryFonts" => {
                result.end_of_section = true;
                break;
            }
            _ => {}
        }
    }
    if current != PrimaryFont::default() || result.fonts.is_empty() {
        result.fonts.push(current);
    }
    result
}
