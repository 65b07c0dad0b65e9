use std::fmt::{Display, Formatter, Result as FmtResult};
use vexcat_compress::Compression;

/// Container formats an [`ArchiveStore`](crate::ArchiveStore) can open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    Zip,
    Tar,
    TarGz,
    TarBz2,
    TarXz,
}

const SUFFIXES: &[(&str, ArchiveKind)] = &[
    (".zip", ArchiveKind::Zip),
    (".tar", ArchiveKind::Tar),
    (".tar.gz", ArchiveKind::TarGz),
    (".tgz", ArchiveKind::TarGz),
    (".tar.bz2", ArchiveKind::TarBz2),
    (".tbz2", ArchiveKind::TarBz2),
    (".tar.xz", ArchiveKind::TarXz),
    (".txz", ArchiveKind::TarXz),
];

impl ArchiveKind {
    /// Guess the kind from a path or URL suffix, case-insensitively.
    ///
    /// A trailing `/` names a directory, never an archive. Single-file
    /// compression (`.gz`, `.bz2`, `.xz` without `.tar`) is not an archive
    /// either.
    pub fn detect(location: &str) -> Option<Self> {
        let lower = location.to_ascii_lowercase();
        if lower.ends_with('/') {
            return None;
        }
        SUFFIXES
            .iter()
            .find(|(suffix, _)| lower.ends_with(suffix))
            .map(|&(_, kind)| kind)
    }

    /// The compression wrapped around the tar stream, if any.
    pub fn outer_compression(&self) -> Compression {
        match self {
            Self::Zip | Self::Tar => Compression::None,
            Self::TarGz => Compression::Gzip,
            Self::TarBz2 => Compression::Bzip2,
            Self::TarXz => Compression::Xz,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::TarBz2 => "tar.bz2",
            Self::TarXz => "tar.xz",
        }
    }
}

impl Display for ArchiveKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("repo.zip", Some(ArchiveKind::Zip))]
    #[case("https://example.com/vex/REPO.ZIP", Some(ArchiveKind::Zip))]
    #[case("repo.tar", Some(ArchiveKind::Tar))]
    #[case("repo.tar.gz", Some(ArchiveKind::TarGz))]
    #[case("repo.tgz", Some(ArchiveKind::TarGz))]
    #[case("repo.tar.bz2", Some(ArchiveKind::TarBz2))]
    #[case("repo.tbz2", Some(ArchiveKind::TarBz2))]
    #[case("repo.tar.xz", Some(ArchiveKind::TarXz))]
    #[case("repo.txz", Some(ArchiveKind::TarXz))]
    #[case("repo.zip/", None)]
    #[case("https://example.com/vex/", None)]
    #[case("document.json.gz", None)]
    #[case("document.bz2", None)]
    #[case("document.xz", None)]
    #[case("repo.rar", None)]
    #[case("", None)]
    fn test_detect(#[case] location: &str, #[case] expected: Option<ArchiveKind>) {
        assert_eq!(ArchiveKind::detect(location), expected);
    }

    #[test]
    fn test_outer_compression() {
        assert_eq!(ArchiveKind::Tar.outer_compression(), Compression::None);
        assert_eq!(ArchiveKind::TarGz.outer_compression(), Compression::Gzip);
        assert_eq!(ArchiveKind::TarXz.to_string(), "tar.xz");
    }
}
