//! Parsers for the Adobe font metrics file formats
//!
//! This crate reads the three plain text metrics formats published by Adobe:
//!
//! - AFM (`.afm`) files, which describe a single font,
//! - ACFM (`.acfm`) files, which describe composite fonts made of descendent fonts,
//! - AMFM (`.amfm`) files, which describe multiple master fonts.
//!
//! Input can be provided incrementally, in chunks of any size,
//!     using a [`Parser`].
//! Lines split across chunks are buffered until they are complete.
//!
//! ```
//! let mut parser = afm::Parser::new();
//! parser.read_chunk("StartFontMetrics 4.1\nFontName Cour");
//! parser.read_chunk("ier\nEndFontMetrics\n");
//! let (metrics, warnings) = parser.finish();
//! assert_eq!(metrics.format, afm::Format::Afm);
//! assert_eq!(metrics.global_info.font_name, "Courier");
//! assert!(warnings.is_empty());
//! ```
//!
//! Parsing never fails.
//! Malformed input is handled on a best-effort basis and reported
//!     using [`ParseWarning`]s.

use std::collections::HashMap;

mod error;
pub mod fields;
pub mod lexer;
mod parser;
pub mod postscript;
pub mod records;

pub use error::*;
pub use parser::{CharMetricsLayout, Options, Parser};
pub use postscript::Value;

/// Format of a metrics file, determined by its first keyword.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Format {
    /// No opening keyword has been seen yet.
    #[default]
    Unknown,
    /// `StartFontMetrics`.
    Afm,
    /// `StartCompFontMetrics`.
    Acfm,
    /// `StartMasterFontMetrics`.
    Amfm,
}

impl Format {
    /// Returns the keyword that opens files of this format.
    pub fn start_keyword(&self) -> Option<&'static str> {
        match self {
            Format::Unknown => None,
            Format::Afm => Some("StartFontMetrics"),
            Format::Acfm => Some("StartCompFontMetrics"),
            Format::Amfm => Some("StartMasterFontMetrics"),
        }
    }

    /// Returns the keyword that closes files of this format.
    pub fn end_keyword(&self) -> Option<&'static str> {
        match self {
            Format::Unknown => None,
            Format::Afm => Some("EndFontMetrics"),
            Format::Acfm => Some("EndCompFontMetrics"),
            Format::Amfm => Some("EndMasterFontMetrics"),
        }
    }

    /// Returns the format opened by the keyword, if the keyword opens a metrics file.
    pub fn from_start_keyword(keyword: &str) -> Option<Format> {
        [Format::Afm, Format::Acfm, Format::Amfm]
            .into_iter()
            .find(|format| format.start_keyword() == Some(keyword))
    }
}

/// Global information about a font.
///
/// The root of a metrics file has one of these.
/// So do each of the descendent fonts in an ACFM file and each of the masters in an AMFM file.
///
/// Every field has a default value, which is used if the field does not appear in the file.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FontInfo {
    pub font_name: String,
    pub full_name: String,
    pub family_name: String,
    pub weight: String,
    /// The font version, from the `Version` field.
    ///
    /// This is different from the version of the metrics format, which is [`FontMetrics::version`].
    pub version: String,
    pub notice: String,
    pub encoding_scheme: String,
    pub character_set: String,
    /// Font bounding box, from the `FontBBox` field: llx, lly, urx, ury.
    pub bounding_box: [f64; 4],
    pub cap_height: f64,
    pub x_height: f64,
    pub ascender: f64,
    pub descender: f64,
    pub std_hw: f64,
    pub std_vw: f64,
    pub metrics_sets: i64,
    pub mapping_scheme: i64,
    pub esc_char: i64,
    pub characters: i64,
    /// Number of descendent fonts in an ACFM file.
    pub descendents: i64,
    /// Number of masters in an AMFM file.
    pub masters: i64,
    /// Number of design axes in an AMFM file.
    pub axes: i64,
    pub is_base_font: bool,
    pub is_cid_font: bool,
    pub is_fixed_v: bool,
    pub v_vector: Vec<Value>,
    pub blend_axis_types: Option<Value>,
    pub blend_design_positions: Option<Value>,
    pub blend_design_map: Option<Value>,
    pub weight_vector: Option<Value>,
}

/// Metrics that depend on the writing direction.
///
/// Direction 0 is horizontal writing and direction 1 is vertical writing.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectionInfo {
    pub underline_position: f64,
    pub underline_thickness: f64,
    pub italic_angle: f64,
    /// Width vector shared by all characters, from the `CharWidth` field.
    pub char_width: [f64; 2],
    pub is_fixed_pitch: bool,
    pub kerning_pairs: Vec<KerningPair>,
}

/// Metrics of a single character, from the `CharMetrics` section.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharacterMetric {
    /// Character code, or -1 if the character is not encoded.
    pub code: i64,
    pub name: String,
    /// Width in writing direction 0 and 1.
    pub widths: [f64; 2],
    /// Height in writing direction 0 and 1.
    pub heights: [f64; 2],
    /// Character bounding box: llx, lly, urx, ury.
    pub bounding_box: [f64; 4],
    /// Map from successor character to ligature character.
    pub ligatures: HashMap<String, String>,
}

impl Default for CharacterMetric {
    fn default() -> Self {
        CharacterMetric {
            code: -1,
            name: "".into(),
            widths: [0.0; 2],
            heights: [0.0; 2],
            bounding_box: [0.0; 4],
            ligatures: Default::default(),
        }
    }
}

/// A composite character, from the `Composites` section.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharacterComposite {
    pub name: String,
    pub parts: Vec<CompositePart>,
}

/// A character that forms part of a composite character.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompositePart {
    pub char: String,
    /// Displacement of the part from the origin of the composite character.
    pub offset: [f64; 2],
}

/// Reference to a character in a kerning pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CharRef {
    /// The character with this name. Used by `KP`, `KPX` and `KPY`.
    Name(String),
    /// The character with this code. Used by `KPH`.
    Code(i64),
}

impl From<&str> for CharRef {
    fn from(value: &str) -> Self {
        CharRef::Name(value.into())
    }
}

impl From<i64> for CharRef {
    fn from(value: i64) -> Self {
        CharRef::Code(value)
    }
}

/// A kerning pair, from a `KernPairs` section.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KerningPair {
    pub chars: [CharRef; 2],
    /// Kerning adjustment in the x and y directions.
    pub offset: [f64; 2],
}

/// A track kerning entry, from the `TrackKern` section.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackKern {
    pub degree: f64,
    pub min_point_size: f64,
    pub min_kern: f64,
    pub max_point_size: f64,
    pub max_kern: f64,
}

/// A primary font of a multiple master font, from the `PrimaryFonts` section of an AMFM file.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrimaryFont {
    /// Design coordinates, from `PC` fields.
    pub coordinates: Vec<i64>,
    /// Labels, from `PL` fields.
    pub labels: Vec<Value>,
    /// Name, from the `PN` field.
    pub name: String,
}

/// A design axis of a multiple master font.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Axis {
    pub axis_type: String,
    pub label: String,
}

/// A master design of a multiple master font.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Master {
    pub info: FontInfo,
}

/// A descendent font of a composite font.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Descendent {
    /// First and last character codes covered by the descendent font.
    pub char_range: [i64; 2],
    pub info: FontInfo,
}

/// Character metrics in the order they appear in the input.
///
/// An index from character codes to positions is maintained alongside the metrics.
/// If several metrics have the same code, lookups return the first of them.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "Vec<CharacterMetric>", into = "Vec<CharacterMetric>")
)]
pub struct CharMetrics {
    metrics: Vec<CharacterMetric>,
    by_code: HashMap<i64, usize>,
}

impl CharMetrics {
    /// Append a metric.
    pub fn push(&mut self, metric: CharacterMetric) {
        if metric.code != -1 {
            self.by_code.entry(metric.code).or_insert(self.metrics.len());
        }
        self.metrics.push(metric);
    }

    /// Replace the metric with the same code, or append the metric if there is none.
    ///
    /// Metrics without a code are always appended.
    pub fn insert(&mut self, metric: CharacterMetric) {
        match self.by_code.get(&metric.code) {
            Some(&i) if metric.code != -1 => self.metrics[i] = metric,
            _ => self.push(metric),
        }
    }

    /// Returns the first metric with the provided code.
    pub fn by_code(&self, code: i64) -> Option<&CharacterMetric> {
        self.by_code.get(&code).map(|i| &self.metrics[*i])
    }

    /// Returns the first metric with the provided name.
    pub fn by_name(&self, name: &str) -> Option<&CharacterMetric> {
        self.metrics.iter().find(|m| m.name == name)
    }
}

impl std::ops::Deref for CharMetrics {
    type Target = [CharacterMetric];

    fn deref(&self) -> &Self::Target {
        &self.metrics
    }
}

impl From<Vec<CharacterMetric>> for CharMetrics {
    fn from(value: Vec<CharacterMetric>) -> Self {
        let mut metrics: CharMetrics = Default::default();
        for metric in value {
            metrics.push(metric);
        }
        metrics
    }
}

impl From<CharMetrics> for Vec<CharacterMetric> {
    fn from(value: CharMetrics) -> Self {
        value.metrics
    }
}

/// Complete contents of an AFM, ACFM or AMFM file.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FontMetrics {
    pub format: Format,
    /// Version of the metrics format, from the opening keyword; e.g. `4.1`.
    pub version: String,
    pub global_info: FontInfo,
    /// Direction specific metrics for writing directions 0 and 1.
    pub directions: [DirectionInfo; 2],
    pub char_metrics: CharMetrics,
    pub composites: Vec<CharacterComposite>,
    pub track_kerns: Vec<TrackKern>,
    pub primary_fonts: Vec<PrimaryFont>,
    pub axes: Vec<Axis>,
    pub masters: Vec<Master>,
    pub descendents: Vec<Descendent>,
    /// Fields whose keys start with a lowercase letter.
    ///
    /// The values are stored verbatim.
    pub user_fields: indexmap::IndexMap<String, String>,
}

impl FontMetrics {
    /// Build metrics from the complete source code of a file.
    pub fn from_afm_source_code(source: &str) -> (FontMetrics, Vec<ParseWarning>) {
        let mut parser = Parser::new();
        parser.read_chunk(source);
        parser.finish()
    }

    /// Returns the metrics of the first character with the provided code.
    pub fn char_by_code(&self, code: i64) -> Option<&CharacterMetric> {
        self.char_metrics.by_code(code)
    }

    /// Returns the metrics of the first character with the provided name.
    pub fn char_by_name(&self, name: &str) -> Option<&CharacterMetric> {
        self.char_metrics.by_name(name)
    }
}
