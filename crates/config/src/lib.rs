//! Settings for a `vexcat` client.
//!
//! Sources are merged in order, later ones winning:
//!
//! 1. built-in defaults;
//! 2. an optional file, read as TOML, YAML or JSON depending on its
//!    extension;
//! 3. environment variables prefixed with `VEXCAT_`, where `__` separates
//!    nested keys (`VEXCAT_HTTP__TIMEOUT=10s`).
//!
//! Durations are written like `24h`, `1h30m` or `250ms`.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;

const ENV_PREFIX: &str = "VEXCAT_";
const FILE_NAME: &str = "config.toml";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// URLs of catalog documents.
    pub catalogs: Vec<String>,
    /// URLs of repository manifests.
    pub repositories: Vec<String>,
    /// How long a document fetched through a `single` or `template` catalog
    /// stays fresh.
    pub update_interval: String,
    pub http: HttpSettings,
    pub cache: CacheSettings,
    pub collect: CollectSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalogs: Vec::new(),
            repositories: Vec::new(),
            update_interval: "24h".to_string(),
            http: HttpSettings::default(),
            cache: CacheSettings::default(),
            collect: CollectSettings::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Whole-request timeout; empty disables it.
    pub timeout: String,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: "30s".to_string(),
            user_agent: concat!("vexcat/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// `false` fetches every document on every request.
    pub enabled: bool,
    /// Cap on downloads in flight at once; `0` means no cap.
    pub max_concurrent_fetches: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_concurrent_fetches: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectSettings {
    /// Per-loader deadline; empty waits indefinitely.
    pub loader_timeout: String,
}

impl Default for CollectSettings {
    fn default() -> Self {
        Self {
            loader_timeout: "5m".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the defaults, `path` (if any) and the environment.
    #[instrument(level = "debug")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings: Self = Self::figment(path)?
            .extract()
            .or_raise(|| ErrorKind::Load(describe(path)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// The merged sources, before extraction.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            let extension = path
                .extension()
                .and_then(|extension| extension.to_str())
                .map(str::to_ascii_lowercase)
                .unwrap_or_default();
            figment = match extension.as_str() {
                "toml" => figment.merge(Toml::file_exact(path)),
                "yaml" | "yml" => figment.merge(Yaml::file_exact(path)),
                "json" => figment.merge(Json::file_exact(path)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(path.display().to_string())),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Per-user configuration file, e.g. `~/.config/vexcat/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "vexcat").map(|dirs| dirs.config_dir().join(FILE_NAME))
    }

    /// Check every duration parses.
    pub fn validate(&self) -> Result<()> {
        self.update_interval()?;
        self.http_timeout()?;
        self.loader_timeout()?;
        Ok(())
    }

    pub fn update_interval(&self) -> Result<Duration> {
        duration("update_interval", &self.update_interval)
    }

    pub fn http_timeout(&self) -> Result<Option<Duration>> {
        optional_duration("http.timeout", &self.http.timeout)
    }

    pub fn loader_timeout(&self) -> Result<Option<Duration>> {
        optional_duration("collect.loader_timeout", &self.collect.loader_timeout)
    }
}

fn describe(path: Option<&Path>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "environment".to_string(),
    }
}

fn duration(key: &str, value: &str) -> Result<Duration> {
    vexcat_repo::parse_interval(value).or_raise(|| ErrorKind::Invalid(format!("{key}: {value:?}")))
}

fn optional_duration(key: &str, value: &str) -> Result<Option<Duration>> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    duration(key, value).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let settings = Settings::load(None).map_err(|err| err.to_string())?;
            assert_eq!(settings, Settings::default());
            assert_eq!(settings.update_interval().unwrap(), Duration::from_secs(86_400));
            assert_eq!(settings.http_timeout().unwrap(), Some(Duration::from_secs(30)));
            assert_eq!(settings.loader_timeout().unwrap(), Some(Duration::from_secs(300)));
            assert!(settings.cache.enabled);
            Ok(())
        });
    }

    #[rstest]
    #[case(
        "vexcat.toml",
        r#"
            catalogs = ["https://example.com/catalog.json"]
            update_interval = "1h30m"
            [cache]
            max_concurrent_fetches = 4
        "#
    )]
    #[case(
        "vexcat.yaml",
        r#"
catalogs:
  - https://example.com/catalog.json
update_interval: 1h30m
cache:
  max_concurrent_fetches: 4
"#
    )]
    #[case(
        "vexcat.json",
        r#"{"catalogs": ["https://example.com/catalog.json"], "update_interval": "1h30m", "cache": {"max_concurrent_fetches": 4}}"#
    )]
    fn test_file_formats(#[case] name: &str, #[case] contents: &str) {
        Jail::expect_with(|jail| {
            jail.create_file(name, contents)?;
            let settings = Settings::load(Some(Path::new(name))).map_err(|err| err.to_string())?;
            assert_eq!(settings.catalogs, ["https://example.com/catalog.json"]);
            assert_eq!(settings.update_interval().unwrap(), Duration::from_secs(5_400));
            assert_eq!(settings.cache.max_concurrent_fetches, 4);
            assert!(settings.cache.enabled);
            assert_eq!(settings.http, HttpSettings::default());
            Ok(())
        });
    }

    #[test]
    fn test_environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("vexcat.toml", "[http]\ntimeout = \"10s\"\n[cache]\nenabled = true\n")?;
            jail.set_env("VEXCAT_HTTP__TIMEOUT", "5s");
            jail.set_env("VEXCAT_CACHE__ENABLED", "false");
            jail.set_env("VEXCAT_UPDATE_INTERVAL", "2h");
            let settings = Settings::load(Some(Path::new("vexcat.toml"))).map_err(|err| err.to_string())?;
            assert_eq!(settings.http_timeout().unwrap(), Some(Duration::from_secs(5)));
            assert!(!settings.cache.enabled);
            assert_eq!(settings.update_interval().unwrap(), Duration::from_secs(7_200));
            Ok(())
        });
    }

    #[test]
    fn test_empty_timeouts_disable() {
        Jail::expect_with(|jail| {
            jail.create_file("vexcat.toml", "[http]\ntimeout = \"\"\n[collect]\nloader_timeout = \"\"\n")?;
            let settings = Settings::load(Some(Path::new("vexcat.toml"))).map_err(|err| err.to_string())?;
            assert_eq!(settings.http_timeout().unwrap(), None);
            assert_eq!(settings.loader_timeout().unwrap(), None);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_duration() {
        Jail::expect_with(|jail| {
            jail.create_file("vexcat.toml", "update_interval = \"tomorrow\"\n")?;
            let err = Settings::load(Some(Path::new("vexcat.toml"))).unwrap_err();
            assert_eq!(*err, ErrorKind::Invalid("update_interval: \"tomorrow\"".to_string()));
            Ok(())
        });
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Load(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vexcat.ini");
        std::fs::write(&path, "catalogs = []").unwrap();
        let err = Settings::load(Some(&path)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
    }

    #[test]
    fn test_wrong_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vexcat.json");
        std::fs::write(&path, r#"{"cache": {"enabled": "sometimes"}}"#).unwrap();
        let err = Settings::load(Some(&path)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Load(_)));
    }
}
