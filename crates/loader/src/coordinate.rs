//! Package coordinates and vulnerability identifiers.

use crate::error::{Error, ErrorKind};
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

const PURL_SCHEME: &str = "pkg:";

/// Characters escaped inside a single purl path component.
const COMPONENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Normalized identity of a software package.
///
/// Parsed from and printed as a package URL. The printed form is canonical:
/// it is what cache keys and index lookups are built from.
///
/// ```
/// use vexcat_loader::PackageCoordinate;
///
/// let coordinate: PackageCoordinate = "pkg:npm/%40mui/x-license@1.9.1".parse().unwrap();
/// assert_eq!(coordinate.namespace(), "@mui");
/// assert_eq!(coordinate.to_string(), "pkg:npm/%40mui/x-license@1.9.1");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PackageCoordinate {
    ecosystem: String,
    namespace: String,
    name: String,
    version: String,
}

impl PackageCoordinate {
    pub fn new(
        ecosystem: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            ecosystem: ecosystem.into().to_lowercase(),
            namespace: namespace.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    /// Package type, e.g. `npm` or `golang`.
    pub fn ecosystem(&self) -> &str {
        &self.ecosystem
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether both coordinates name the same package, ignoring version.
    pub fn same_package(&self, other: &PackageCoordinate) -> bool {
        self.ecosystem == other.ecosystem && self.namespace == other.namespace && self.name == other.name
    }

    /// Canonical purl without the version.
    pub fn versionless(&self) -> String {
        let mut purl = format!("{PURL_SCHEME}{}/", self.ecosystem);
        for segment in self.namespace.split('/').filter(|segment| !segment.is_empty()) {
            purl.extend(utf8_percent_encode(segment, COMPONENT));
            purl.push('/');
        }
        purl.extend(utf8_percent_encode(&self.name, COMPONENT));
        purl
    }
}

impl Display for PackageCoordinate {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.versionless())?;
        if !self.version.is_empty() {
            write!(f, "@{}", utf8_percent_encode(&self.version, COMPONENT))?;
        }
        Ok(())
    }
}

fn decode(component: &str, purl: &str) -> Result<String, Error> {
    percent_decode_str(component)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| exn::Exn::from(ErrorKind::InvalidCoordinate(purl.to_string())))
}

impl FromStr for PackageCoordinate {
    type Err = Error;

    /// Parse `pkg:type/namespace/name@version?qualifiers#subpath`.
    ///
    /// Qualifiers and subpath are accepted and dropped.
    fn from_str(purl: &str) -> Result<Self, Self::Err> {
        let invalid = || exn::Exn::from(ErrorKind::InvalidCoordinate(purl.to_string()));
        let rest = purl
            .get(..PURL_SCHEME.len())
            .filter(|scheme| scheme.eq_ignore_ascii_case(PURL_SCHEME))
            .map(|_| &purl[PURL_SCHEME.len()..])
            .ok_or_else(invalid)?;
        let rest = rest.split_once('#').map_or(rest, |(head, _)| head);
        let rest = rest.split_once('?').map_or(rest, |(head, _)| head);
        let rest = rest.trim_matches('/');

        let (ecosystem, path) = rest.split_once('/').ok_or_else(invalid)?;
        let (namespace, last) = path.rsplit_once('/').unwrap_or(("", path));
        let (name, version) = last.rsplit_once('@').unwrap_or((last, ""));
        if ecosystem.is_empty() || name.is_empty() {
            return Err(invalid());
        }

        let namespace = namespace
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| decode(segment, purl))
            .collect::<Result<Vec<_>, _>>()?
            .join("/");
        Ok(Self::new(
            ecosystem,
            namespace,
            decode(name, purl)?,
            decode(version, purl)?,
        ))
    }
}

/// Vulnerability identifier such as `CVE-2023-12345`; empty means no filter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct VulnerabilityId(String);

impl VulnerabilityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for VulnerabilityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl From<&str> for VulnerabilityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for VulnerabilityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
