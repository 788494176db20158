// Config loading and validation tests

use probestyx::config::{AppConfig, SourceFormat, SourceKind};

const VALID_CONFIG: &str = r#"
[server]
port = 9200
host = "127.0.0.1"
secret = "topsecret"

[system]
name = "host"
cache_ttl_secs = 5.0
metrics = ["cpu_usage_percent", "ram_usage_percent", "disk_read_bytes_per_sec"]

[[scrapers]]
name = "app"
[scrapers.source]
type = "url"
url = "http://127.0.0.1:8080/stats"
format = "json"
timeout_secs = 2
[[scrapers.metrics]]
path = "stats.requests"
name = "requests"
calculate = "value / 60"

[[scrapers]]
name = "exporter"
flatten = true
[scrapers.source]
type = "file"
path = "/var/lib/exporter/metrics.prom"
format = "prometheus"
[[scrapers.metrics]]
match = "http_requests_total"
name = "http_requests"
[scrapers.filter]
include = ["^http_"]
exclude = ["_bucket$"]

[[scrapers]]
name = "legacy"
[scrapers.source]
type = "file"
path = "/tmp/legacy.txt"
format = "raw"
pattern = '(\w+):\s*(\d+)'
[[scrapers.metrics]]
match = "active"
name = "active"
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.server.port, 9200);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.secret.as_deref(), Some("topsecret"));
    assert!(config.system.enabled);
    assert_eq!(config.system.name, "host");
    assert_eq!(config.system.cache_ttl_secs, 5.0);
    assert_eq!(config.system.metrics.len(), 3);
    assert_eq!(config.scrapers.len(), 3);

    let app = &config.scrapers[0];
    assert_eq!(app.source.kind, SourceKind::Url);
    assert_eq!(app.source.format, SourceFormat::Json);
    assert_eq!(app.source.timeout_secs, 2.0);
    assert_eq!(app.metrics[0].path.as_deref(), Some("stats.requests"));
    assert_eq!(app.metrics[0].calculate.as_deref(), Some("value / 60"));

    let exporter = &config.scrapers[1];
    assert!(exporter.flatten);
    assert_eq!(exporter.source.kind, SourceKind::File);
    assert_eq!(exporter.metrics[0].key.as_deref(), Some("http_requests_total"));
    let filter = exporter.filter.as_ref().expect("filter");
    assert_eq!(filter.include, vec!["^http_".to_string()]);
    assert_eq!(filter.exclude, vec!["_bucket$".to_string()]);

    assert_eq!(config.scrapers[2].source.format, SourceFormat::Raw);
}

#[test]
fn test_config_defaults_when_omitted() {
    let config = AppConfig::load_from_str("").expect("empty config is valid");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9100);
    assert!(config.server.secret.is_none());
    assert!(config.system.enabled);
    assert_eq!(config.system.name, "system");
    assert!(!config.system.flatten);
    assert_eq!(config.system.cache_ttl_secs, 15.0);
    assert_eq!(config.system.disk_mount, "/");
    assert!(config.system.metrics.is_empty());
    assert!(config.scrapers.is_empty());
}

#[test]
fn test_scraper_timeout_defaults_to_five_seconds() {
    let config = AppConfig::load_from_str(VALID_CONFIG).unwrap();
    assert_eq!(config.scrapers[1].source.timeout_secs, 5.0);
    assert!(!config.scrapers[0].flatten);
    assert!(config.scrapers[0].filter.is_none());
}

#[test]
fn test_config_validation_rejects_invalid_port() {
    let bad = VALID_CONFIG.replace("port = 9200", "port = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("server.port"));
}

#[test]
fn test_config_validation_rejects_empty_secret() {
    let bad = VALID_CONFIG.replace("secret = \"topsecret\"", "secret = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("server.secret"));
}

#[test]
fn test_config_validation_rejects_zero_ttl() {
    let bad = VALID_CONFIG.replace("cache_ttl_secs = 5.0", "cache_ttl_secs = 0.0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("system.cache_ttl_secs"));
}

#[test]
fn test_config_validation_rejects_infinite_ttl() {
    let bad = VALID_CONFIG.replace("cache_ttl_secs = 5.0", "cache_ttl_secs = inf");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("system.cache_ttl_secs"));
}

#[test]
fn test_config_validation_rejects_unknown_metric() {
    let bad = VALID_CONFIG.replace("\"ram_usage_percent\"", "\"ram_usage_pct\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("ram_usage_pct"));
}

#[test]
fn test_config_validation_rejects_empty_scraper_name() {
    let bad = VALID_CONFIG.replace("name = \"legacy\"", "name = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("scrapers[2].name"));
}

#[test]
fn test_config_validation_rejects_duplicate_scraper_name() {
    let bad = VALID_CONFIG.replace("name = \"legacy\"", "name = \"app\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("not unique"));
}

#[test]
fn test_config_validation_rejects_url_source_without_url() {
    let bad = VALID_CONFIG.replace("url = \"http://127.0.0.1:8080/stats\"\n", "");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("scrapers.app.source.url"));
}

#[test]
fn test_config_validation_rejects_file_source_without_path() {
    let bad = VALID_CONFIG.replace("path = \"/tmp/legacy.txt\"\n", "");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("scrapers.legacy.source.path"));
}

#[test]
fn test_config_validation_rejects_zero_timeout() {
    let bad = VALID_CONFIG.replace("timeout_secs = 2", "timeout_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("timeout_secs"));
}

#[test]
fn test_config_validation_rejects_invalid_raw_pattern() {
    let bad = VALID_CONFIG.replace(r"pattern = '(\w+):\s*(\d+)'", r"pattern = '(\w+:\s*(\d+)'");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("scrapers.legacy.source.pattern"));
}

#[test]
fn test_config_validation_rejects_raw_pattern_with_one_group() {
    let bad = VALID_CONFIG.replace(r"pattern = '(\w+):\s*(\d+)'", r"pattern = '(\w+):\s*\d+'");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("capture groups"));
}

#[test]
fn test_config_validation_rejects_invalid_filter_pattern() {
    let bad = VALID_CONFIG.replace("exclude = [\"_bucket$\"]", "exclude = [\"(_bucket\"]");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("scrapers.exporter.filter"));
}

#[test]
fn test_config_validation_rejects_mapping_without_path_or_match() {
    let bad = VALID_CONFIG.replace("match = \"active\"\n", "");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("scrapers.legacy.metrics[0]"));
}

#[test]
fn test_config_validation_rejects_empty_mapping_name() {
    let bad = VALID_CONFIG.replace("name = \"requests\"", "name = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("scrapers.app.metrics[0].name"));
}

#[test]
fn test_config_validation_rejects_unknown_format() {
    let bad = VALID_CONFIG.replace("format = \"json\"", "format = \"xml\"");
    assert!(AppConfig::load_from_str(&bad).is_err());
}

#[test]
fn test_config_validation_rejects_invalid_toml() {
    let err = AppConfig::load_from_str("[server\nport = 1").unwrap_err();
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_config_load_from_explicit_path() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("probestyx.toml");
    std::fs::write(&path, VALID_CONFIG).unwrap();
    let config = AppConfig::load(Some(path)).expect("load from path");
    assert_eq!(config.server.port, 9200);
}

#[test]
fn test_config_load_missing_file_names_path() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    let err = AppConfig::load(Some(path)).unwrap_err();
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_config_load_from_file_via_env() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, VALID_CONFIG).unwrap();
    unsafe { std::env::set_var("CONFIG_FILE", path.to_str().unwrap()) };
    let result = AppConfig::load(None);
    unsafe { std::env::remove_var("CONFIG_FILE") };
    let config = result.expect("load from CONFIG_FILE");
    assert_eq!(config.server.port, 9200);
    assert_eq!(config.system.name, "host");
}
