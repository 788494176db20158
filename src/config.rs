use crate::models::SYSTEM_METRICS;
use crate::scraper::{Filter, compile_raw_pattern};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub scrapers: Vec<ScraperConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Shared HMAC secret. When unset, `/metrics` is unauthenticated.
    #[serde(default)]
    pub secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            secret: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    9100
}

#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Key the system snapshot is nested under, unless `flatten` is set.
    #[serde(default = "default_system_name")]
    pub name: String,
    #[serde(default)]
    pub flatten: bool,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: f64,
    /// Filesystem reported by the disk usage metrics.
    #[serde(default = "default_disk_mount")]
    pub disk_mount: String,
    #[serde(default)]
    pub metrics: Vec<String>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: default_system_name(),
            flatten: false,
            cache_ttl_secs: default_cache_ttl_secs(),
            disk_mount: default_disk_mount(),
            metrics: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_system_name() -> String {
    "system".into()
}

fn default_cache_ttl_secs() -> f64 {
    15.0
}

fn default_disk_mount() -> String {
    "/".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    pub name: String,
    #[serde(default)]
    pub flatten: bool,
    pub source: SourceConfig,
    #[serde(default)]
    pub metrics: Vec<MappingConfig>,
    #[serde(default)]
    pub filter: Option<FilterConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Url,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Json,
    Prometheus,
    Raw,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub path: Option<PathBuf>,
    pub format: SourceFormat,
    /// Raw format only: regex with exactly two capture groups (key, value).
    #[serde(default)]
    pub pattern: Option<String>,
    /// HTTP request timeout for `url` sources.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
}

fn default_timeout_secs() -> f64 {
    5.0
}

/// One output metric. `path` (dot-separated) takes precedence over `match` (top-level key).
#[derive(Debug, Clone, Deserialize)]
pub struct MappingConfig {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, rename = "match")]
    pub key: Option<String>,
    pub name: String,
    #[serde(default)]
    pub calculate: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl AppConfig {
    /// Load from `path`, else `CONFIG_FILE`, else `config.toml`.
    pub fn load(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let path = path
            .or_else(|| std::env::var_os("CONFIG_FILE").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("config.toml"));
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("cannot read config file {}: {}", path.display(), e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        if let Some(secret) = &self.server.secret {
            anyhow::ensure!(!secret.is_empty(), "server.secret must be non-empty when set");
        }

        let ttl = self.system.cache_ttl_secs;
        anyhow::ensure!(
            ttl.is_finite() && ttl > 0.0,
            "system.cache_ttl_secs must be > 0, got {}",
            ttl
        );
        anyhow::ensure!(!self.system.name.is_empty(), "system.name must be non-empty");
        anyhow::ensure!(
            !self.system.disk_mount.is_empty(),
            "system.disk_mount must be non-empty"
        );
        for name in &self.system.metrics {
            anyhow::ensure!(
                SYSTEM_METRICS.iter().any(|(known, _)| known == name),
                "system.metrics: unknown metric '{}'",
                name
            );
        }

        let mut names = HashSet::new();
        for (i, scraper) in self.scrapers.iter().enumerate() {
            anyhow::ensure!(
                !scraper.name.is_empty(),
                "scrapers[{}].name must be non-empty",
                i
            );
            anyhow::ensure!(
                names.insert(scraper.name.as_str()),
                "scrapers[{}].name '{}' is not unique",
                i,
                scraper.name
            );
            scraper.validate()?;
        }
        Ok(())
    }
}

impl ScraperConfig {
    fn validate(&self) -> anyhow::Result<()> {
        let name = &self.name;
        let source = &self.source;
        match source.kind {
            SourceKind::Url => anyhow::ensure!(
                source.url.as_deref().is_some_and(|u| !u.is_empty()),
                "scrapers.{}.source.url is required for type = \"url\"",
                name
            ),
            SourceKind::File => anyhow::ensure!(
                source.path.as_ref().is_some_and(|p| !p.as_os_str().is_empty()),
                "scrapers.{}.source.path is required for type = \"file\"",
                name
            ),
        }
        anyhow::ensure!(
            source.timeout_secs.is_finite() && source.timeout_secs > 0.0,
            "scrapers.{}.source.timeout_secs must be > 0, got {}",
            name,
            source.timeout_secs
        );
        if source.format == SourceFormat::Raw {
            compile_raw_pattern(source.pattern.as_deref())
                .map_err(|e| anyhow::anyhow!("scrapers.{}.source.pattern: {}", name, e))?;
        }
        if let Some(filter) = &self.filter {
            Filter::compile(&filter.include, &filter.exclude)
                .map_err(|e| anyhow::anyhow!("scrapers.{}.filter: {}", name, e))?;
        }
        for (i, mapping) in self.metrics.iter().enumerate() {
            anyhow::ensure!(
                !mapping.name.is_empty(),
                "scrapers.{}.metrics[{}].name must be non-empty",
                name,
                i
            );
            anyhow::ensure!(
                mapping.path.as_deref().is_some_and(|p| !p.is_empty())
                    || mapping.key.as_deref().is_some_and(|k| !k.is_empty()),
                "scrapers.{}.metrics[{}] needs a path or a match",
                name,
                i
            );
        }
        Ok(())
    }
}
