// Per-request metrics collection: cached system snapshot plus every scraper, merged

use crate::aggregator::Aggregate;
use crate::collector::{SampleCache, SystemCollector};
use crate::config::AppConfig;
use crate::models::RequestSet;
use crate::scraper::Scraper;
use crate::sysinfo_repo::SysinfoRepo;
use crate::version;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

struct SystemSection {
    cache: SampleCache<SystemCollector>,
    name: String,
    flatten: bool,
}

/// Owns the collector, its cache and the scrapers. Shared by handlers as `Arc`.
pub struct MetricsService {
    system: Option<SystemSection>,
    scrapers: Vec<Scraper>,
}

impl MetricsService {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let system = if config.system.enabled {
            let requests = RequestSet::new(config.system.metrics.iter().cloned());
            let collector = SystemCollector::new(
                Arc::new(SysinfoRepo::new()),
                requests,
                &config.system.disk_mount,
            );
            let ttl = Duration::try_from_secs_f64(config.system.cache_ttl_secs)?;
            Some(SystemSection {
                cache: SampleCache::new(collector, ttl),
                name: config.system.name.clone(),
                flatten: config.system.flatten,
            })
        } else {
            None
        };

        let client = reqwest::Client::builder()
            .user_agent(version::user_agent())
            .build()?;
        let scrapers = config
            .scrapers
            .iter()
            .map(|c| Scraper::new(c, client.clone()))
            .collect::<anyhow::Result<Vec<_>>>()?;

        info!(
            system_enabled = system.is_some(),
            system_metrics = config.system.metrics.len(),
            scrapers = scrapers.len(),
            "metrics service ready"
        );
        Ok(Self { system, scrapers })
    }

    pub fn scrapers(&self) -> &[Scraper] {
        &self.scrapers
    }

    /// Collect everything for one request. The system snapshot and all scrapers run
    /// concurrently; results are merged system first, then scrapers in config order.
    pub async fn collect(&self) -> Aggregate {
        let system = async {
            match &self.system {
                Some(section) => Some(section.cache.get().await),
                None => None,
            }
        };
        let scrapes = join_all(self.scrapers.iter().map(|s| s.run()));
        let (snapshot, results) = tokio::join!(system, scrapes);

        let mut aggregate = Aggregate::new();
        if let (Some(section), Some(snapshot)) = (&self.system, snapshot) {
            aggregate.insert(&section.name, (*snapshot).clone(), section.flatten);
        }
        for (scraper, result) in self.scrapers.iter().zip(results) {
            match result {
                Ok(metrics) => aggregate.insert(scraper.name(), metrics, scraper.flatten()),
                Err(e) => {
                    warn!(
                        scraper = scraper.name(),
                        fetch = e.is_fetch(),
                        error = %e,
                        "scraper failed, skipping"
                    );
                    aggregate.record_failure(scraper.name());
                }
            }
        }
        aggregate
    }
}
