//! Compression as declared by catalogs, indexes and archive names.
//!
//! Declarations are short names (`"gzip"`, `"bz2"`, `"zstd"`); an empty
//! declaration means the payload is stored as-is. Parse one into a
//! [`Compression`] and use [`Compression::wrap_reader`] to read through it.
//!
//! Gzip and bzip2 are always built. XZ and zstd are behind the `xz` and
//! `zstd` features, both on by default; naming a format whose feature is off
//! is reported as [`ErrorKind::Disabled`](error::ErrorKind::Disabled).

mod codec;
pub mod error;

use crate::error::{Error, ErrorKind};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Stored as-is.
    #[default]
    None,
    Bzip2,
    Gzip,
    #[cfg(feature = "xz")]
    Xz,
    #[cfg(feature = "zstd")]
    Zstd,
}

impl Compression {
    /// Canonical declaration name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bzip2 => "bzip2",
            Self::Gzip => "gzip",
            #[cfg(feature = "xz")]
            Self::Xz => "xz",
            #[cfg(feature = "zstd")]
            Self::Zstd => "zstd",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compression {
    type Err = Error;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(declared: &str) -> Result<Self, Self::Err> {
        let name = declared.trim().to_ascii_lowercase();
        match name.as_str() {
            "" | "none" => Ok(Self::None),
            "bz2" | "bzip2" => Ok(Self::Bzip2),
            "gz" | "gzip" => Ok(Self::Gzip),
            #[cfg(feature = "xz")]
            "xz" | "lzma" => Ok(Self::Xz),
            #[cfg(feature = "zstd")]
            "zst" | "zstd" => Ok(Self::Zstd),
            #[cfg(not(feature = "xz"))]
            "xz" | "lzma" => Err(exn::Exn::from(ErrorKind::Disabled(declared.to_string()))),
            #[cfg(not(feature = "zstd"))]
            "zst" | "zstd" => Err(exn::Exn::from(ErrorKind::Disabled(declared.to_string()))),
            _ => Err(exn::Exn::from(ErrorKind::UnsupportedFormat(declared.to_string()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", Compression::None)]
    #[case("none", Compression::None)]
    #[case("  NONE ", Compression::None)]
    #[case("bz2", Compression::Bzip2)]
    #[case("Bzip2", Compression::Bzip2)]
    #[case("gz", Compression::Gzip)]
    #[case("gzip", Compression::Gzip)]
    #[cfg_attr(feature = "xz", case("lzma", Compression::Xz))]
    #[cfg_attr(feature = "zstd", case("zst", Compression::Zstd))]
    fn test_declared_names(#[case] declared: &str, #[case] expected: Compression) {
        assert_eq!(declared.parse::<Compression>().unwrap(), expected);
    }

    #[rstest]
    #[case("lz4")]
    #[case("br")]
    #[case("gzip2")]
    fn test_unknown_names(#[case] declared: &str) {
        let err = declared.parse::<Compression>().unwrap_err();
        assert_eq!(*err, ErrorKind::UnsupportedFormat(declared.to_string()));
    }

    #[test]
    fn test_canonical_name_parses_back() {
        for compression in [Compression::None, Compression::Bzip2, Compression::Gzip] {
            assert_eq!(compression.as_str().parse::<Compression>().unwrap(), compression);
        }
    }
}
