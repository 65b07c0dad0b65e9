//! Repository manifest and index documents.

use crate::error::{ErrorKind, Result};
use crate::interval::{DEFAULT_UPDATE_INTERVAL, parse_interval};
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::io::Read;
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use vexcat_loader::{DocumentFormat, PackageCoordinate};

/// The manifest a repository publishes at its well-known URL.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub versions: Vec<RepositoryVersion>,
}

/// One implementation of the repository layout, at a given spec version.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryVersion {
    #[serde(alias = "specVersion")]
    pub spec_version: String,
    #[serde(default)]
    pub locations: Vec<RepositoryLocation>,
    #[serde(default, skip_serializing_if = "String::is_empty", alias = "updateInterval")]
    pub update_interval: String,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "repositorySpecific")]
    pub repository_specific: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryLocation {
    pub url: String,
}

impl RepositoryLocation {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Compare two dot-separated spec versions.
///
/// Segments that are both numeric compare as integers and segments that
/// are both non-numeric compare as text. A numeric segment ranks above a
/// non-numeric one. When one version is a prefix of the other, the shorter
/// one is lower.
pub fn compare_spec_versions(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let (left, right): (Vec<&str>, Vec<&str>) = (a.split('.').collect(), b.split('.').collect());
    for (x, y) in left.iter().zip(&right) {
        let ordering = match (x.parse::<u64>(), y.parse::<u64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            (Err(_), Err(_)) => x.cmp(y),
            (Err(_), Ok(_)) => Ordering::Less,
            (Ok(_), Err(_)) => Ordering::Greater,
        };
        if ordering.is_ne() {
            return ordering;
        }
    }
    left.len().cmp(&right.len())
}

impl Repository {
    pub fn from_json_slice(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).or_raise(|| ErrorKind::Decode("repository manifest".to_string()))
    }

    pub fn to_json_vec(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).or_raise(|| ErrorKind::Decode("repository manifest".to_string()))
    }

    /// The highest declared version not above `target`.
    pub fn closest_version(&self, target: &str) -> Option<&RepositoryVersion> {
        self.versions
            .iter()
            .filter(|version| compare_spec_versions(&version.spec_version, target).is_le())
            .max_by(|a, b| compare_spec_versions(&a.spec_version, &b.spec_version))
    }

    pub fn latest_version(&self) -> Option<&RepositoryVersion> {
        self.versions
            .iter()
            .max_by(|a, b| compare_spec_versions(&a.spec_version, &b.spec_version))
    }
}

impl RepositoryVersion {
    /// The declared refresh interval. Missing means 24 hours; an invalid
    /// value is logged and also treated as 24 hours.
    pub fn update_interval(&self) -> Duration {
        if self.update_interval.is_empty() {
            return DEFAULT_UPDATE_INTERVAL;
        }
        parse_interval(&self.update_interval).unwrap_or_else(|err| {
            tracing::warn!(interval = %self.update_interval, "ignoring repository update interval: {err}");
            DEFAULT_UPDATE_INTERVAL
        })
    }
}

/// The package index at the root of a repository location.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryIndex {
    #[serde(default, skip_serializing_if = "String::is_empty", alias = "updatedAt")]
    pub updated_at: String,
    #[serde(default)]
    pub packages: Vec<IndexPackage>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPackage {
    /// Versionless purl of the package.
    pub id: String,
    /// Path of the package's document, relative to the repository root.
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl RepositoryIndex {
    pub fn from_json_slice(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).or_raise(|| ErrorKind::Decode("repository index".to_string()))
    }

    pub fn from_json_reader(reader: impl Read) -> Result<Self> {
        serde_json::from_reader(reader).or_raise(|| ErrorKind::Decode("repository index".to_string()))
    }

    pub fn to_json_vec(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).or_raise(|| ErrorKind::Decode("repository index".to_string()))
    }

    /// `updated_at` as a timestamp, if it is valid RFC 3339.
    pub fn updated_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(&self.updated_at, &Rfc3339).ok()
    }

    /// Entries for the same package as `coordinate`, ignoring version.
    /// Entries whose id is not a valid purl never match.
    pub fn packages_for<'a>(&'a self, coordinate: &'a PackageCoordinate) -> impl Iterator<Item = &'a IndexPackage> {
        self.packages.iter().filter(move |package| match package.id.parse::<PackageCoordinate>() {
            Ok(id) => id.same_package(coordinate),
            Err(err) => {
                tracing::warn!(id = %package.id, "skipping index entry: {err}");
                false
            },
        })
    }
}

impl IndexPackage {
    /// The declared format; entries without one are OpenVEX 0.2.0.
    pub fn document_format(&self) -> DocumentFormat {
        match self.format.as_deref() {
            None | Some("") => DocumentFormat::repository_default(),
            Some(standard) => DocumentFormat::new(standard, ""),
        }
    }
}
