//! The document interpreter boundary.
//!
//! Turning bytes into a typed VEX document is not this crate's job. Loaders
//! hand the body plus its declared [`DocumentFormat`] to an [`Interpreter`]
//! supplied by the caller, after resolving the declared compression to a
//! decode stream.

use crate::error::{ErrorKind, Result};
use bytes::Bytes;
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read};
use std::sync::Arc;
use vexcat_compress::Compression;

/// Standard assumed for repository index entries that declare no format.
pub const DEFAULT_STANDARD: &str = "openvex";
/// Version paired with [`DEFAULT_STANDARD`].
pub const DEFAULT_STANDARD_VERSION: &str = "0.2.0";

/// Declared format of a document body.
///
/// `standard` and `version` are opaque to this crate. `compression` is
/// resolved through [`Compression`]; empty means none.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentFormat {
    #[serde(default)]
    pub standard: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub compression: String,
}

impl DocumentFormat {
    pub fn new(standard: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            standard: standard.into(),
            version: version.into(),
            compression: String::new(),
        }
    }

    pub fn compressed(mut self, compression: impl Into<String>) -> Self {
        self.compression = compression.into();
        self
    }

    /// The format assumed when a repository index entry declares none.
    pub fn repository_default() -> Self {
        Self::new(DEFAULT_STANDARD, DEFAULT_STANDARD_VERSION)
    }

    pub fn is_empty(&self) -> bool {
        self.standard.is_empty() && self.version.is_empty() && self.compression.is_empty()
    }
}

/// Turns a decoded body into one typed document.
pub trait Interpreter<D>: Send + Sync {
    fn interpret(&self, body: &mut dyn Read, format: &DocumentFormat) -> Result<D>;
}

/// Shared handle to an interpreter.
pub type InterpreterHandle<D> = Arc<dyn Interpreter<D>>;

/// Resolve `format.compression`, then let `interpreter` read the decoded body.
pub fn decode_document<D>(interpreter: &dyn Interpreter<D>, body: Bytes, format: &DocumentFormat) -> Result<D> {
    let compression: Compression = format.compression.parse().map_err(ErrorKind::compression)?;
    let mut reader = compression
        .wrap_reader(Cursor::new(body))
        .map_err(ErrorKind::compression)?;
    interpreter.interpret(&mut reader, format)
}

/// A document kept as untyped JSON, tagged with its declared format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonDocument {
    pub standard: String,
    pub version: String,
    pub body: serde_json::Value,
}

/// Interpreter for callers that do not need schema-specific types.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonInterpreter;

impl Interpreter<JsonDocument> for JsonInterpreter {
    fn interpret(&self, body: &mut dyn Read, format: &DocumentFormat) -> Result<JsonDocument> {
        let body = serde_json::from_reader(body).or_raise(|| ErrorKind::Interpret(format.standard.clone()))?;
        Ok(JsonDocument {
            standard: format.standard.clone(),
            version: format.version.clone(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const OPENVEX: &[u8] = br#"{"@context":"https://openvex.dev/ns/v0.2.0","statements":[]}"#;

    #[rstest]
    #[case("")]
    #[case("none")]
    #[case("gzip")]
    #[case("bzip2")]
    #[case("xz")]
    #[case("zstd")]
    fn test_decode_resolves_compression(#[case] compression: &str) {
        let codec: Compression = compression.parse().unwrap();
        let body = Bytes::from(codec.compress(OPENVEX).unwrap());
        let format = DocumentFormat::new("openvex", "0.2.0").compressed(compression);
        let document = decode_document(&JsonInterpreter, body, &format).unwrap();
        assert_eq!(document.standard, "openvex");
        assert_eq!(document.body["@context"], "https://openvex.dev/ns/v0.2.0");
    }

    #[test]
    fn test_unknown_compression_is_an_error() {
        let format = DocumentFormat::new("openvex", "0.2.0").compressed("rar");
        let err = decode_document(&JsonInterpreter, Bytes::from_static(OPENVEX), &format).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Compression(_)));
    }

    #[test]
    fn test_interpreter_rejects_garbage() {
        let format = DocumentFormat::new("csaf", "2.0");
        let err = decode_document(&JsonInterpreter, Bytes::from_static(b"<html>"), &format).unwrap_err();
        assert_eq!(*err, ErrorKind::Interpret("csaf".to_string()));
    }

    #[test]
    fn test_repository_default() {
        let format = DocumentFormat::repository_default();
        assert_eq!(format.standard, "openvex");
        assert_eq!(format.version, "0.2.0");
        assert!(format.compression.is_empty());
        assert!(DocumentFormat::default().is_empty());
    }
}
