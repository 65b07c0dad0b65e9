use vexcat_archive::ArchiveKind;

/// Where a repository version's data lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Location {
    /// A directory served over HTTP, with `index.json` at its root.
    Remote { root: String },
    /// An archive to download, optionally with the repository in a
    /// subdirectory of it.
    Archive {
        url: String,
        subdir: String,
        kind: ArchiveKind,
    },
}

/// Classify a location URL.
///
/// The URL is split on `//`. Two parts is a plain URL; three parts is an
/// archive URL followed by the subdirectory inside it. Anything else
/// (including a URL without a scheme) is not supported.
pub fn parse_location(url: &str) -> Option<Location> {
    let parts: Vec<&str> = url.split("//").collect();
    let (archive, subdir) = match parts.as_slice() {
        [_, _] => (url.to_string(), String::new()),
        [scheme, path, subdir] => (format!("{scheme}//{path}"), subdir.trim_matches('/').to_string()),
        _ => return None,
    };
    Some(match ArchiveKind::detect(&archive) {
        Some(kind) => Location::Archive {
            url: archive,
            subdir,
            kind,
        },
        None => Location::Remote {
            root: url.trim_end_matches('/').to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn remote(root: &str) -> Option<Location> {
        Some(Location::Remote { root: root.to_string() })
    }

    fn archive(url: &str, subdir: &str, kind: ArchiveKind) -> Option<Location> {
        Some(Location::Archive {
            url: url.to_string(),
            subdir: subdir.to_string(),
            kind,
        })
    }

    #[rstest]
    #[case("https://example.com/vex/", remote("https://example.com/vex"))]
    #[case("https://example.com/vex", remote("https://example.com/vex"))]
    #[case("https://example.com/repo.zip", archive("https://example.com/repo.zip", "", ArchiveKind::Zip))]
    #[case(
        "https://example.com/main.tar.gz//vexhub-main/",
        archive("https://example.com/main.tar.gz", "vexhub-main", ArchiveKind::TarGz)
    )]
    #[case("https://h/r.zip//sub/dir", archive("https://h/r.zip", "sub/dir", ArchiveKind::Zip))]
    #[case("https://example.com/tree//sub", remote("https://example.com/tree//sub"))]
    #[case("/srv/vex/repo.zip", None)]
    #[case("https://a//b//c", None)]
    #[case("", None)]
    fn test_parse_location(#[case] url: &str, #[case] expected: Option<Location>) {
        assert_eq!(parse_location(url), expected);
    }
}
