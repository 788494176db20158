// Source decoders (JSON, Prometheus exposition, regex "raw" text) and the key filter.

use crate::error::{Result, ScrapeError};
use regex::Regex;
use serde_json::{Map, Number, Value};

/// A decoded source. JSON keeps its nesting; Prometheus and raw sources are flat.
pub type Document = Map<String, Value>;

/// `key=value` pairs separated by whitespace.
pub const DEFAULT_RAW_PATTERN: &str = r"(\w+)=(\S+)";

pub fn parse_json(data: &str) -> Result<Document> {
    Ok(serde_json::from_str(data)?)
}

/// Lines that do not yield a name and a finite number are skipped, never an error.
/// Labels are dropped, so later samples of the same metric name overwrite earlier ones.
pub fn parse_prometheus(data: &str) -> Document {
    let mut doc = Document::new();
    for line in data.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(series), Some(raw_value)) = (fields.next(), fields.next()) else {
            continue;
        };
        let name = series.split_once('{').map_or(series, |(name, _)| name);
        if name.is_empty() {
            continue;
        }
        let Some(value) = raw_value.parse::<f64>().ok().and_then(Number::from_f64) else {
            continue;
        };
        doc.insert(name.to_string(), Value::Number(value));
    }
    doc
}

/// Compile a raw-format pattern, falling back to [`DEFAULT_RAW_PATTERN`].
/// The pattern must have exactly two capture groups: key, then value.
pub fn compile_raw_pattern(pattern: Option<&str>) -> Result<Regex> {
    let pattern = pattern.unwrap_or(DEFAULT_RAW_PATTERN);
    let re = Regex::new(pattern).map_err(|e| ScrapeError::Pattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;
    let groups = re.captures_len() - 1;
    if groups != 2 {
        return Err(ScrapeError::Pattern {
            pattern: pattern.to_string(),
            reason: format!("expected exactly 2 capture groups (key, value), found {groups}"),
        });
    }
    Ok(re)
}

/// Every match becomes one entry; values that parse as finite numbers are stored as numbers.
pub fn parse_raw(data: &str, pattern: &Regex) -> Document {
    let mut doc = Document::new();
    for caps in pattern.captures_iter(data) {
        let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let value = value.as_str();
        let parsed = value
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        doc.insert(key.as_str().to_string(), parsed);
    }
    doc
}

/// Resolve a dot-separated path through nested objects.
pub fn lookup_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Include/exclude key filter. Patterns are unanchored regular expressions.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl Filter {
    pub fn compile(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            include: compile_all(include)?,
            exclude: compile_all(exclude)?,
        })
    }

    /// Kept when no include pattern is set or one matches, and no exclude pattern matches.
    pub fn retains(&self, key: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|re| re.is_match(key));
        included && !self.exclude.iter().any(|re| re.is_match(key))
    }

    /// Filters top-level keys only.
    pub fn apply(&self, doc: Document) -> Document {
        doc.into_iter().filter(|(k, _)| self.retains(k)).collect()
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| ScrapeError::Pattern {
                pattern: p.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn prometheus_strips_labels_and_comments() {
        let doc = parse_prometheus("foo{a=\"1\"} 3.5\n# comment\nbar 7");
        assert_eq!(Value::Object(doc), json!({"foo": 3.5, "bar": 7.0}));
    }

    #[test]
    fn prometheus_skips_malformed_lines() {
        let data = "\n# HELP x help\nlonely\nbad_value abc\ninf_value +Inf\n  spaced   2  1700000000\n{only=\"labels\"} 4\n";
        let doc = parse_prometheus(data);
        assert_eq!(Value::Object(doc), json!({"spaced": 2.0}));
    }

    #[test]
    fn raw_default_pattern_parses_numbers() {
        let re = compile_raw_pattern(None).unwrap();
        let doc = parse_raw("cpu=10 mem=20.5", &re);
        assert_eq!(Value::Object(doc), json!({"cpu": 10.0, "mem": 20.5}));
    }

    #[test]
    fn raw_values_fall_back_to_strings() {
        let re = compile_raw_pattern(None).unwrap();
        let doc = parse_raw("state=running load=0.3\nversion=1.2.3", &re);
        assert_eq!(doc["state"], json!("running"));
        assert_eq!(doc["load"], json!(0.3));
        assert_eq!(doc["version"], json!("1.2.3"));
    }

    #[test]
    fn raw_custom_pattern() {
        let re = compile_raw_pattern(Some(r"(\w+):\s*(\d+)")).unwrap();
        let doc = parse_raw("active: 12\nwaiting: 3\n", &re);
        assert_eq!(Value::Object(doc), json!({"active": 12.0, "waiting": 3.0}));
    }

    #[test]
    fn raw_pattern_must_compile_with_two_groups() {
        let err = compile_raw_pattern(Some("(unclosed")).unwrap_err();
        assert!(err.is_parse());
        let err = compile_raw_pattern(Some(r"(\w+)=\S+")).unwrap_err();
        assert!(err.to_string().contains("found 1"));
        assert!(compile_raw_pattern(Some(r"(a)(b)(c)")).is_err());
    }

    #[test]
    fn json_requires_an_object() {
        let doc = parse_json(r#"{"a": {"b": 1}}"#).unwrap();
        assert_eq!(doc["a"], json!({"b": 1}));
        assert!(parse_json("[1, 2]").unwrap_err().is_parse());
        assert!(parse_json("{not json").is_err());
    }

    #[test]
    fn lookup_path_walks_nested_objects() {
        let doc = parse_json(r#"{"a": {"b": {"c": 5}}, "list": [1], "top": 2}"#).unwrap();
        assert_eq!(lookup_path(&doc, "a.b.c"), Some(&json!(5)));
        assert_eq!(lookup_path(&doc, "top"), Some(&json!(2)));
        assert_eq!(lookup_path(&doc, "a.missing"), None);
        assert_eq!(lookup_path(&doc, "top.deeper"), None);
        assert_eq!(lookup_path(&doc, "list.0"), None);
    }

    #[test]
    fn filter_exclude_wins_over_include() {
        let filter = Filter::compile(&strings(&["^http_"]), &strings(&["_bucket$"])).unwrap();
        assert!(filter.retains("http_requests_total"));
        assert!(!filter.retains("http_latency_bucket"));
        assert!(!filter.retains("process_cpu"));
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let filter = Filter::default();
        assert!(filter.retains("anything"));
    }

    #[test]
    fn filter_is_idempotent() {
        let doc = parse_prometheus(
            "http_requests_total 10\nhttp_latency_bucket 3\ngo_goroutines 8\nhttp_errors 1\n",
        );
        let filter = Filter::compile(&strings(&["^http_", "goroutines"]), &strings(&["bucket"]))
            .unwrap();
        let once = filter.apply(doc);
        let twice = filter.apply(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn invalid_filter_pattern_is_rejected() {
        let err = Filter::compile(&strings(&["(oops"]), &[]).unwrap_err();
        assert!(err.to_string().contains("(oops"));
    }
}
