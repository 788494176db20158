// External source scrapers: fetch, decode, filter, then map to named metrics

mod expr;
mod parsers;

pub use expr::evaluate;
pub use parsers::{
    DEFAULT_RAW_PATTERN, Document, Filter, compile_raw_pattern, lookup_path, parse_json,
    parse_prometheus, parse_raw,
};

use crate::config::{MappingConfig, ScraperConfig, SourceFormat, SourceKind};
use crate::error::{Result, ScrapeError};
use crate::models::{MetricMap, MetricValue};
use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
enum Source {
    Url { url: String, timeout: Duration },
    File(PathBuf),
}

#[derive(Debug, Clone)]
enum Decoder {
    Json,
    Prometheus,
    Raw(Regex),
}

impl Decoder {
    fn decode(&self, body: &str) -> Result<Document> {
        match self {
            Decoder::Json => parse_json(body),
            Decoder::Prometheus => Ok(parse_prometheus(body)),
            Decoder::Raw(pattern) => Ok(parse_raw(body, pattern)),
        }
    }
}

/// One configured scraper with its patterns compiled. Holds no mutable state, so
/// scrapers run in parallel without coordination.
#[derive(Debug, Clone)]
pub struct Scraper {
    name: String,
    flatten: bool,
    source: Source,
    decoder: Decoder,
    filter: Option<Filter>,
    mappings: Vec<MappingConfig>,
    client: reqwest::Client,
}

impl Scraper {
    pub fn new(config: &ScraperConfig, client: reqwest::Client) -> anyhow::Result<Self> {
        let src = &config.source;
        let source = match src.kind {
            SourceKind::Url => Source::Url {
                url: src
                    .url
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("scraper '{}' has no url", config.name))?,
                timeout: Duration::try_from_secs_f64(src.timeout_secs)?,
            },
            SourceKind::File => Source::File(
                src.path
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("scraper '{}' has no path", config.name))?,
            ),
        };
        let decoder = match src.format {
            SourceFormat::Json => Decoder::Json,
            SourceFormat::Prometheus => Decoder::Prometheus,
            SourceFormat::Raw => Decoder::Raw(compile_raw_pattern(src.pattern.as_deref())?),
        };
        let filter = config
            .filter
            .as_ref()
            .map(|f| Filter::compile(&f.include, &f.exclude))
            .transpose()?;
        Ok(Self {
            name: config.name.clone(),
            flatten: config.flatten,
            source,
            decoder,
            filter,
            mappings: config.metrics.clone(),
            client,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flatten(&self) -> bool {
        self.flatten
    }

    #[instrument(skip(self), fields(scraper = %self.name))]
    pub async fn run(&self) -> Result<MetricMap> {
        let body = self.fetch().await?;
        let mut doc = self.decoder.decode(&body)?;
        if let Some(filter) = &self.filter {
            doc = filter.apply(doc);
        }
        let metrics = map_metrics(&doc, &self.mappings);
        debug!(
            operation = "scrape",
            parsed = doc.len(),
            mapped = metrics.len(),
            "scraper finished"
        );
        Ok(metrics)
    }

    async fn fetch(&self) -> Result<String> {
        match &self.source {
            Source::Url { url, timeout } => {
                let resp = self.client.get(url).timeout(*timeout).send().await?;
                // Decoded whatever the status.
                let status = resp.status();
                if !status.is_success() {
                    debug!(operation = "fetch", status = status.as_u16(), "non-success status");
                }
                Ok(resp.text().await?)
            }
            Source::File(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| ScrapeError::File {
                        path: path.clone(),
                        source,
                    })
            }
        }
    }
}

/// Resolve each mapping against `doc`. Misses and values with no metric form are skipped.
pub fn map_metrics(doc: &Document, mappings: &[MappingConfig]) -> MetricMap {
    let mut out = MetricMap::new();
    for mapping in mappings {
        let resolved = match (mapping.path.as_deref(), mapping.key.as_deref()) {
            (Some(path), _) if !path.is_empty() => lookup_path(doc, path),
            (_, Some(key)) if !key.is_empty() => doc.get(key),
            _ => None,
        };
        let Some(mut value) = resolved.and_then(MetricValue::from_json) else {
            continue;
        };
        if let Some(expr) = mapping.calculate.as_deref()
            && let Some(n) = value.as_f64()
        {
            value = MetricValue::Number(evaluate(n, expr));
        }
        out.insert(mapping.name.clone(), value);
    }
    out
}
