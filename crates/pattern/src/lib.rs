//! URL templates evaluated against a package coordinate.
//!
//! A [`Pattern`] is compiled once from a template string and evaluated for
//! every request. Literal text passes through untouched; `{{` is an escaped
//! `{`. Expressions take the form
//! `{ [%] FIELD [ :N | :-N | :S:E | @N | @-N | @S:E ] }`:
//!
//! | Field     | Value                      |
//! |-----------|----------------------------|
//! | `VULN`    | the vulnerability id       |
//! | `ENVIRON` | package type (ecosystem)   |
//! | `MODULE`  | package namespace          |
//! | `NAME`    | package name               |
//! | `VERSION` | package version            |
//!
//! - **`:N` / `:-N` / `:S:E`** keep the first N, last N, or 1-based
//!   inclusive range of unicode characters.
//! - **`@N` / `@-N` / `@S:E`** do the same counting segments, where a
//!   segment is a run of characters between separators (`. - _ , : / @`).
//! - **`%`** query-escapes the value after slicing.
//!
//! Counts saturate at the value's length. Anything malformed (unknown field,
//! zero or missing count, start after end, unterminated brace) is emitted as
//! literal text; compiling never fails.
//!
//! # Example
//!
//! ```
//! use vexcat_loader::PackageCoordinate;
//! use vexcat_pattern::Pattern;
//!
//! let pattern = Pattern::compile("https://example.com/{ENVIRON}/{%MODULE}/{NAME}/{VULN@1}.json");
//! let coordinate: PackageCoordinate = "pkg:npm/%40mui/x-license@1.9.1".parse().unwrap();
//! assert_eq!(
//!     pattern.evaluate(&coordinate, "CVE-2023-98765"),
//!     "https://example.com/npm/%40mui/x-license/CVE.json",
//! );
//! ```

mod expression;
mod scanner;
mod segment;

use crate::expression::Part;
use std::convert::Infallible;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use vexcat_loader::PackageCoordinate;

/// A compiled URL template. Immutable and cheap to share.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    template: String,
    parts: Vec<Part>,
}

impl Pattern {
    pub fn compile(template: impl Into<String>) -> Self {
        let template = template.into();
        let parts = scanner::scan(&template);
        Self { template, parts }
    }

    /// Expand the template for one package and vulnerability id.
    pub fn evaluate(&self, coordinate: &PackageCoordinate, vulnerability: &str) -> String {
        let mut output = String::with_capacity(self.template.len());
        for part in &self.parts {
            part.write(coordinate, vulnerability, &mut output);
        }
        output
    }

    /// The source text this pattern was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Whether evaluation depends on the request at all.
    pub fn is_literal(&self) -> bool {
        self.parts.iter().all(|part| matches!(part, Part::Literal(_)))
    }
}

impl FromStr for Pattern {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::compile(s))
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.template)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Pattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.template)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Pattern {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::compile)
    }
}
