//! Compiled template parts.

use crate::segment;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use vexcat_loader::PackageCoordinate;

/// Bytes kept as-is by query escaping; everything else becomes `%XX`.
const QUERY: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Field {
    Vulnerability,
    Ecosystem,
    Namespace,
    Name,
    Version,
}

impl Field {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "VULN" => Some(Self::Vulnerability),
            "ENVIRON" => Some(Self::Ecosystem),
            "MODULE" => Some(Self::Namespace),
            "NAME" => Some(Self::Name),
            "VERSION" => Some(Self::Version),
            _ => None,
        }
    }

    fn extract<'a>(self, coordinate: &'a PackageCoordinate, vulnerability: &'a str) -> &'a str {
        match self {
            Self::Vulnerability => vulnerability,
            Self::Ecosystem => coordinate.ecosystem(),
            Self::Namespace => coordinate.namespace(),
            Self::Name => coordinate.name(),
            Self::Version => coordinate.version(),
        }
    }
}

/// Which part of a field value to keep. Counts are 1-based and non-zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Slice {
    Whole,
    CharPrefix(usize),
    CharSuffix(usize),
    CharRange(usize, usize),
    SegmentPrefix(usize),
    SegmentSuffix(usize),
    SegmentRange(usize, usize),
}

impl Slice {
    fn apply(self, value: &str) -> String {
        match self {
            Self::Whole => value.to_string(),
            Self::CharPrefix(count) => value.chars().take(count).collect(),
            Self::CharSuffix(count) => {
                let skip = value.chars().count().saturating_sub(count);
                value.chars().skip(skip).collect()
            },
            Self::CharRange(start, end) => value.chars().skip(start - 1).take(end - start + 1).collect(),
            Self::SegmentPrefix(count) => segment::prefix(value, count),
            Self::SegmentSuffix(count) => segment::suffix(value, count),
            Self::SegmentRange(start, end) => segment::range(value, start, end),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Expression {
    pub(crate) field: Field,
    pub(crate) slice: Slice,
    pub(crate) encode: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Part {
    Literal(String),
    Expression(Expression),
}

impl Part {
    pub(crate) fn write(&self, coordinate: &PackageCoordinate, vulnerability: &str, output: &mut String) {
        match self {
            Self::Literal(text) => output.push_str(text),
            Self::Expression(expression) => {
                let value = expression.slice.apply(expression.field.extract(coordinate, vulnerability));
                if expression.encode {
                    output.push_str(&query_escape(&value));
                } else {
                    output.push_str(&value);
                }
            },
        }
    }
}

/// Query-string escaping: unreserved bytes kept, space as `+`.
fn query_escape(value: &str) -> String {
    utf8_percent_encode(value, QUERY).to_string().replace("%20", "+")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "")]
    #[case("abc-XYZ_0.9~", "abc-XYZ_0.9~")]
    #[case("@mui", "%40mui")]
    #[case("a b", "a+b")]
    #[case("a+b", "a%2Bb")]
    #[case("github.com/x/y", "github.com%2Fx%2Fy")]
    #[case("100%", "100%25")]
    fn test_query_escape(#[case] value: &str, #[case] expected: &str) {
        assert_eq!(query_escape(value), expected);
    }

    #[rstest]
    #[case(Slice::Whole, "CVE-1")]
    #[case(Slice::CharPrefix(3), "CVE")]
    #[case(Slice::CharSuffix(1), "1")]
    #[case(Slice::CharRange(2, 3), "VE")]
    #[case(Slice::CharRange(5, 9), "1")]
    #[case(Slice::CharRange(6, 9), "")]
    #[case(Slice::CharRange(usize::MAX, usize::MAX), "")]
    fn test_char_slices(#[case] slice: Slice, #[case] expected: &str) {
        assert_eq!(slice.apply("CVE-1"), expected);
    }
}
