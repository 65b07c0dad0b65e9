//! Single pass template scanner.
//!
//! Walks the template one character at a time. Any character that cannot
//! continue the current expression drops the scanner back to plain text
//! without consuming anything, so the brace and everything after it up to
//! the next `{` end up in one literal.

use crate::expression::{Expression, Field, Part, Slice};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Unit {
    Char,
    Segment,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Plain,
    Brace,
    Field,
    /// Directly after `:` or `@`.
    CountStart(Unit),
    /// `:N` or `@N`, possibly followed by `:E`.
    Prefix(Unit),
    /// `:-N` or `@-N`.
    Suffix(Unit),
    /// The `E` of `:S:E` or `@S:E`.
    End(Unit),
}

/// Parse a run of ASCII digits, saturating on overflow. Empty is `None`.
fn count(digits: &[char]) -> Option<usize> {
    if digits.is_empty() {
        return None;
    }
    Some(digits.iter().fold(0usize, |total, digit| {
        total.saturating_mul(10).saturating_add(digit.to_digit(10).unwrap_or(0) as usize)
    }))
}

fn positive(digits: &[char]) -> Option<usize> {
    count(digits).filter(|&value| value > 0)
}

struct Scanner {
    chars: Vec<char>,
    parts: Vec<Part>,
    mode: Mode,
    /// Start of the pending literal.
    span: usize,
    encode: bool,
    field: (usize, usize),
    first: usize,
    second: usize,
}

impl Scanner {
    fn new(template: &str) -> Self {
        Self {
            chars: template.chars().collect(),
            parts: Vec::new(),
            mode: Mode::Plain,
            span: 0,
            encode: false,
            field: (0, 0),
            first: 0,
            second: 0,
        }
    }

    fn literal(&mut self, end: usize) {
        if end > self.span {
            self.parts.push(Part::Literal(self.chars[self.span..end].iter().collect()));
        }
    }

    fn step(&mut self, i: usize, c: char) {
        self.mode = match (self.mode, c) {
            (Mode::Plain, '{') => {
                self.literal(i);
                self.span = i;
                Mode::Brace
            },
            (Mode::Plain, _) => Mode::Plain,
            (Mode::Brace, '{') => {
                self.span = i;
                Mode::Plain
            },
            (Mode::Brace, '%') => {
                self.encode = true;
                self.field = (i + 1, i + 1);
                Mode::Field
            },
            (Mode::Brace, 'A'..='Z') => {
                self.encode = false;
                self.field = (i, i);
                Mode::Field
            },
            (Mode::Field, '}') => {
                self.field.1 = i;
                self.finish(i, Some(Slice::Whole));
                Mode::Plain
            },
            (Mode::Field, ':') => {
                self.field.1 = i;
                Mode::CountStart(Unit::Char)
            },
            (Mode::Field, '@') => {
                self.field.1 = i;
                Mode::CountStart(Unit::Segment)
            },
            (Mode::Field, 'A'..='Z') => Mode::Field,
            (Mode::CountStart(unit), '-') => {
                self.first = i + 1;
                Mode::Suffix(unit)
            },
            (Mode::CountStart(unit), '0'..='9') => {
                self.first = i;
                Mode::Prefix(unit)
            },
            (Mode::Prefix(unit), '}') => {
                let slice = positive(&self.chars[self.first..i]).map(|n| match unit {
                    Unit::Char => Slice::CharPrefix(n),
                    Unit::Segment => Slice::SegmentPrefix(n),
                });
                self.finish(i, slice);
                Mode::Plain
            },
            (Mode::Prefix(unit), ':') => {
                self.second = i + 1;
                Mode::End(unit)
            },
            (Mode::Suffix(unit), '}') => {
                let slice = positive(&self.chars[self.first..i]).map(|n| match unit {
                    Unit::Char => Slice::CharSuffix(n),
                    Unit::Segment => Slice::SegmentSuffix(n),
                });
                self.finish(i, slice);
                Mode::Plain
            },
            (Mode::End(unit), '}') => {
                let start = positive(&self.chars[self.first..self.second - 1]);
                let end = positive(&self.chars[self.second..i]);
                let slice = start.zip(end).filter(|(s, e)| s <= e).map(|(s, e)| match unit {
                    Unit::Char => Slice::CharRange(s, e),
                    Unit::Segment => Slice::SegmentRange(s, e),
                });
                self.finish(i, slice);
                Mode::Plain
            },
            (mode @ (Mode::Prefix(_) | Mode::Suffix(_) | Mode::End(_)), '0'..='9') => mode,
            _ => Mode::Plain,
        };
    }

    /// Close the expression ending at the `}` at `close`. Anything invalid
    /// is kept verbatim.
    fn finish(&mut self, close: usize, slice: Option<Slice>) {
        let name: String = self.chars[self.field.0..self.field.1].iter().collect();
        match (Field::from_name(&name), slice) {
            (Some(field), Some(slice)) => {
                self.parts.push(Part::Expression(Expression { field, slice, encode: self.encode }));
            },
            _ => self.literal(close + 1),
        }
        self.span = close + 1;
    }

    fn into_parts(mut self) -> Vec<Part> {
        self.literal(self.chars.len());
        self.parts
    }
}

pub(crate) fn scan(template: &str) -> Vec<Part> {
    let mut scanner = Scanner::new(template);
    for i in 0..scanner.chars.len() {
        let c = scanner.chars[i];
        scanner.step(i, c);
    }
    scanner.into_parts()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(text: &str) -> Part {
        Part::Literal(text.to_string())
    }

    fn expression(field: Field, slice: Slice, encode: bool) -> Part {
        Part::Expression(Expression { field, slice, encode })
    }

    #[test]
    fn test_mixed_template() {
        assert_eq!(
            scan("https://x/{ENVIRON}/{%MODULE@-2}/{NAME:2:4}.json"),
            vec![
                literal("https://x/"),
                expression(Field::Ecosystem, Slice::Whole, false),
                literal("/"),
                expression(Field::Namespace, Slice::SegmentSuffix(2), true),
                literal("/"),
                expression(Field::Name, Slice::CharRange(2, 4), false),
                literal(".json"),
            ],
        );
    }

    #[test]
    fn test_escape_splits_literal() {
        assert_eq!(scan("a{{b"), vec![literal("a"), literal("{b")]);
    }

    #[test]
    fn test_abandoned_expression_joins_following_text() {
        assert_eq!(scan("{VULN:x}/y{VERSION}"), vec![
            literal("{VULN:x}/y"),
            expression(Field::Version, Slice::Whole, false),
        ]);
    }

    #[test]
    fn test_invalid_closed_expression_is_its_own_literal() {
        assert_eq!(scan("{VULN:0}z"), vec![literal("{VULN:0}"), literal("z")]);
    }

    #[test]
    fn test_count_saturates() {
        assert_eq!(count(&['0', '0', '7']), Some(7));
        assert_eq!(count(&['9'; 40]), Some(usize::MAX));
        assert_eq!(count(&[]), None);
        assert_eq!(positive(&['0']), None);
    }
}
