use crate::core::loader::parse_dataset;
use crate::core::{CityStore, DataSource, LoadSummary};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

pub const LOAD_BATCH_SIZE: usize = 1000;

/// Reads the dataset, parses it and fills a [`CityStore`].
pub struct LoadEngine<D: DataSource> {
    source: D,
    store: Arc<dyn CityStore>,
    monitor: SystemMonitor,
}

impl<D: DataSource> LoadEngine<D> {
    pub fn new(source: D, store: Arc<dyn CityStore>) -> Self {
        Self {
            source,
            store,
            monitor: SystemMonitor::new(false),
        }
    }

    pub fn new_with_monitoring(source: D, store: Arc<dyn CityStore>, monitor_enabled: bool) -> Self {
        Self {
            source,
            store,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<LoadSummary> {
        let started = Instant::now();
        let source = self.source.describe();
        tracing::info!("Loading cities from {}...", source);
        self.monitor.log_stats("Start");

        let raw = self.source.read_dataset().await?;
        tracing::debug!("Read {} bytes", raw.len());
        self.monitor.log_stats("Read");

        let parsed = parse_dataset(&raw)?;
        drop(raw);
        tracing::info!(
            "Parsed {} cities ({}), skipped {}",
            parsed.cities.len(),
            parsed.format,
            parsed.skipped.len()
        );
        self.monitor.log_stats("Parse");

        let total = parsed.cities.len();
        let mut processed = 0;
        let mut cities = parsed.cities.into_iter().peekable();
        while cities.peek().is_some() {
            let batch: Vec<_> = cities.by_ref().take(LOAD_BATCH_SIZE).collect();
            let batch_len = batch.len();
            self.store.put_batch(batch).await?;
            processed += batch_len;

            if batch_len == LOAD_BATCH_SIZE {
                tracing::info!("Processed {}/{} cities...", processed, total);
            }
        }
        self.monitor.log_stats("Index");

        let summary = LoadSummary {
            source,
            format: parsed.format,
            loaded: total,
            skipped: parsed.skipped.len(),
            distinct_cities: self.store.city_count().await?,
            distinct_names: self.store.name_count().await?,
            total_keys: self.store.key_count().await?,
            elapsed: started.elapsed(),
            loaded_at: Utc::now(),
        };

        tracing::info!("✅ Loaded {} cities into the index", summary.loaded);
        tracing::info!("Total keys: {}", summary.total_keys);
        self.monitor.log_final_stats(summary.loaded);

        Ok(summary)
    }
}
