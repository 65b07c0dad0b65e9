//! The catalog document.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::Read;
use time::OffsetDateTime;
use vexcat_loader::{DocumentFormat, PackageCoordinate, Request};
use vexcat_pattern::Pattern;

/// A published list of catalogs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(rename = "$comment", default, skip_serializing_if = "String::is_empty", alias = "comment")]
    pub comment: String,
    #[serde(rename = "$schema", default, alias = "schema")]
    pub schema: String,
    #[serde(default)]
    pub metadata: CatalogMetadata,
    #[serde(default)]
    pub catalogs: Vec<Catalog>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogMetadata {
    #[serde(rename = "$comment", default, skip_serializing_if = "String::is_empty", alias = "comment")]
    pub comment: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none",
        alias = "lastUpdated"
    )]
    pub last_updated: Option<OffsetDateTime>,
}

/// How a catalog entry locates documents.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CatalogKind {
    /// One fixed URL serves every matching request.
    Single,
    /// The URL is a [`Pattern`] evaluated per request.
    Template,
    /// The URL is a repository manifest.
    RepoBacked,
    /// Anything else; kept so documents round-trip.
    Unsupported(String),
}

impl CatalogKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Single => "single",
            Self::Template => "template",
            Self::RepoBacked => "vex-repo",
            Self::Unsupported(kind) => kind,
        }
    }
}

impl From<String> for CatalogKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "single" => Self::Single,
            "template" => Self::Template,
            "vex-repo" => Self::RepoBacked,
            _ => Self::Unsupported(kind),
        }
    }
}

impl From<CatalogKind> for String {
    fn from(kind: CatalogKind) -> Self {
        kind.as_str().to_string()
    }
}

impl Display for CatalogKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// One entry of a catalog document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(rename = "$comment", default, skip_serializing_if = "String::is_empty", alias = "comment")]
    pub comment: String,
    pub kind: CatalogKind,
    /// Packages this catalog has documents for; empty means all.
    #[serde(default, with = "purls", skip_serializing_if = "Vec::is_empty")]
    pub purls: Vec<PackageCoordinate>,
    #[serde(default, alias = "fileFormat")]
    pub file_format: DocumentFormat,
    /// Vulnerability id prefix (e.g. `CVE`) this catalog answers; empty
    /// means all.
    #[serde(default, skip_serializing_if = "String::is_empty", alias = "vulnerabilityType")]
    pub vulnerability_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "urlTemplate")]
    pub url_template: Option<Pattern>,
}

impl Catalog {
    pub fn new(kind: CatalogKind, file_format: DocumentFormat) -> Self {
        Self {
            comment: String::new(),
            kind,
            purls: Vec::new(),
            file_format,
            vulnerability_type: String::new(),
            url: String::new(),
            url_template: None,
        }
    }

    pub fn matches_coordinate(&self, coordinate: &PackageCoordinate) -> bool {
        self.purls.is_empty() || self.purls.iter().any(|purl| purl.same_package(coordinate))
    }

    pub fn matches_vulnerability(&self, vulnerability: &str) -> bool {
        self.vulnerability_type.is_empty()
            || vulnerability.is_empty()
            || vulnerability
                .to_lowercase()
                .starts_with(&self.vulnerability_type.to_lowercase())
    }

    pub fn matches(&self, request: &Request) -> bool {
        self.matches_coordinate(&request.coordinate) && self.matches_vulnerability(request.vulnerability.as_str())
    }
}

impl CatalogDocument {
    pub fn from_json_slice(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).or_raise(|| ErrorKind::Decode("catalog document".to_string()))
    }

    pub fn from_json_reader(reader: impl Read) -> Result<Self> {
        serde_json::from_reader(reader).or_raise(|| ErrorKind::Decode("catalog document".to_string()))
    }

    pub fn to_json_vec(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).or_raise(|| ErrorKind::Decode("catalog document".to_string()))
    }
}

/// Package filters are purl strings on the wire.
mod purls {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use vexcat_loader::PackageCoordinate;

    pub(super) fn serialize<S: Serializer>(purls: &[PackageCoordinate], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(purls.iter().map(PackageCoordinate::to_string))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<PackageCoordinate>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|purl| purl.parse().map_err(|err| D::Error::custom(format!("{err}"))))
            .collect()
    }
}
