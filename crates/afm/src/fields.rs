//! Field assignments of the form `Key value`
//!
//! Outside of the record-bearing sections, each line of a metrics file assigns a value
//!     to a field of the font.
//! The recognized fields are listed in static tables generated by the `fields!` macro.
//! Each table entry maps the key to a field of a model type;
//!     the type of that field determines how the value is parsed.

use crate::postscript::{self, Value};
use crate::{Axis, DirectionInfo, FontInfo, ParseWarning, ParseWarningKind};

/// A type that can be parsed from the value of a field.
///
/// The value is the rest of the line after the key, with surrounding whitespace trimmed.
/// The offset is the position of the value in the line; it is used for warning spans.
pub trait FieldValue: Sized {
    fn parse(value: &str, offset: usize, warnings: &mut Vec<ParseWarning>) -> Self;
}

impl FieldValue for String {
    fn parse(value: &str, _: usize, _: &mut Vec<ParseWarning>) -> Self {
        value.into()
    }
}

fn first_word(value: &str, offset: usize) -> Option<(&str, std::ops::Range<usize>)> {
    crate::lexer::Words::with_offset(value, offset)
        .next()
        .map(|w| (w.value, w.span))
}

impl FieldValue for f64 {
    fn parse(value: &str, offset: usize, warnings: &mut Vec<ParseWarning>) -> Self {
        let Some((word, span)) = first_word(value, offset) else {
            return 0.0;
        };
        postscript::parse_number(word).unwrap_or_else(|| {
            warnings.push(ParseWarning::new(
                span,
                ParseWarningKind::InvalidNumber { token: word.into() },
            ));
            0.0
        })
    }
}

impl FieldValue for i64 {
    fn parse(value: &str, offset: usize, warnings: &mut Vec<ParseWarning>) -> Self {
        let Some((word, span)) = first_word(value, offset) else {
            return 0;
        };
        if let Some(n) = postscript::parse_numeral(word) {
            return n;
        }
        match postscript::parse_number(word) {
            Some(n) => n.trunc() as i64,
            None => {
                warnings.push(ParseWarning::new(
                    span,
                    ParseWarningKind::InvalidNumber { token: word.into() },
                ));
                0
            }
        }
    }
}

impl FieldValue for bool {
    fn parse(value: &str, offset: usize, warnings: &mut Vec<ParseWarning>) -> Self {
        if value.eq_ignore_ascii_case("true") {
            true
        } else {
            if !value.eq_ignore_ascii_case("false") {
                warnings.push(ParseWarning::new(
                    offset..offset + value.len(),
                    ParseWarningKind::InvalidBoolean {
                        value: value.into(),
                    },
                ));
            }
            false
        }
    }
}

impl FieldValue for Vec<Value> {
    fn parse(value: &str, offset: usize, warnings: &mut Vec<ParseWarning>) -> Self {
        let (values, literal_warnings) = postscript::parse_postscript(value);
        warnings.extend(literal_warnings.into_iter().map(|w| w.rebase(offset)));
        values
    }
}

/// Only the first literal is kept.
impl FieldValue for Option<Value> {
    fn parse(value: &str, offset: usize, warnings: &mut Vec<ParseWarning>) -> Self {
        Vec::<Value>::parse(value, offset, warnings).into_iter().next()
    }
}

/// The first `N` numbers are kept.
/// Missing numbers are 0.
impl<const N: usize> FieldValue for [f64; N] {
    fn parse(value: &str, offset: usize, warnings: &mut Vec<ParseWarning>) -> Self {
        let mut array = [0.0; N];
        let numbers = Vec::<Value>::parse(value, offset, warnings)
            .into_iter()
            .filter_map(|v| v.as_number());
        for (slot, n) in array.iter_mut().zip(numbers) {
            *slot = n;
        }
        array
    }
}

fn set<T: Clone>(slot: &mut T, value: &T) {
    *slot = value.clone();
}

macro_rules! fields {
    ( $(#[$meta: meta])* $type: ident, $target: ty, $( ($variant: ident, $key: literal, $field: ident), )+ ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum $type {
            $(
                $variant,
            )+
        }

        impl $type {
            pub const ALL_KEYS: &'static [&'static str] = &[$( $key, )+];

            /// Returns the field with the provided key, if there is one.
            pub fn from_key(key: &str) -> Option<$type> {
                match key {
                    $(
                        $key => Some($type::$variant),
                    )+
                    _ => None,
                }
            }

            /// Returns the key of this field.
            pub fn key(&self) -> &'static str {
                match self {
                    $(
                        $type::$variant => $key,
                    )+
                }
            }

            /// Parse a value and assign it to this field in every target.
            ///
            /// In strict mode nothing is assigned if parsing the value generates a warning.
            pub fn apply(
                &self,
                targets: &mut [&mut $target],
                value: &str,
                offset: usize,
                strict: bool,
                warnings: &mut Vec<ParseWarning>,
            ) {
                let before = warnings.len();
                match self {
                    $(
                        $type::$variant => {
                            let v = FieldValue::parse(value, offset, warnings);
                            if strict && warnings.len() > before {
                                return;
                            }
                            for target in targets.iter_mut() {
                                set(&mut target.$field, &v);
                            }
                        }
                    )+
                }
            }
        }
    };
}

fields!(
    /// A field of the global font information.
    ///
    /// These fields can appear at the top level of a file,
    ///     and inside the `StartMaster` and `StartDescendent` blocks.
    InfoField,
    FontInfo,
    (FontName, "FontName", font_name),
    (FullName, "FullName", full_name),
    (FamilyName, "FamilyName", family_name),
    (Weight, "Weight", weight),
    (Version, "Version", version),
    (Notice, "Notice", notice),
    (EncodingScheme, "EncodingScheme", encoding_scheme),
    (CharacterSet, "CharacterSet", character_set),
    (FontBBox, "FontBBox", bounding_box),
    (CapHeight, "CapHeight", cap_height),
    (XHeight, "XHeight", x_height),
    (Ascender, "Ascender", ascender),
    (Descender, "Descender", descender),
    (StdHW, "StdHW", std_hw),
    (StdVW, "StdVW", std_vw),
    (MetricsSets, "MetricsSets", metrics_sets),
    (MappingScheme, "MappingScheme", mapping_scheme),
    (EscChar, "EscChar", esc_char),
    (Characters, "Characters", characters),
    (Descendents, "Descendents", descendents),
    (Masters, "Masters", masters),
    (Axes, "Axes", axes),
    (IsBaseFont, "IsBaseFont", is_base_font),
    (IsCIDFont, "IsCIDFont", is_cid_font),
    (IsFixedV, "IsFixedV", is_fixed_v),
    (VVector, "VVector", v_vector),
    (BlendAxisTypes, "BlendAxisTypes", blend_axis_types),
    (BlendDesignPositions, "BlendDesignPositions", blend_design_positions),
    (BlendDesignMap, "BlendDesignMap", blend_design_map),
    (WeightVector, "WeightVector", weight_vector),
);

fields!(
    /// A field that depends on the writing direction.
    DirectionField,
    DirectionInfo,
    (UnderlinePosition, "UnderlinePosition", underline_position),
    (UnderlineThickness, "UnderlineThickness", underline_thickness),
    (ItalicAngle, "ItalicAngle", italic_angle),
    (CharWidth, "CharWidth", char_width),
    (IsFixedPitch, "IsFixedPitch", is_fixed_pitch),
);

fields!(
    /// A field of a design axis, valid only inside `StartAxis` blocks.
    AxisField,
    Axis,
    (AxisType, "AxisType", axis_type),
    (AxisLabel, "AxisLabel", label),
);

/// Classification of the key of a field assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Info(InfoField),
    Direction(DirectionField),
    Axis(AxisField),
    /// The key starts with a lowercase letter and is stored verbatim.
    User,
    Unknown,
}

impl Field {
    pub fn from_key(key: &str) -> Field {
        if let Some(field) = InfoField::from_key(key) {
            return Field::Info(field);
        }
        if let Some(field) = DirectionField::from_key(key) {
            return Field::Direction(field);
        }
        if let Some(field) = AxisField::from_key(key) {
            return Field::Axis(field);
        }
        match key.chars().next() {
            Some(c) if c.is_lowercase() => Field::User,
            _ => Field::Unknown,
        }
    }
}
