use crate::apis::RawFileSource;
use crate::constants::UNKNOWN;
use crate::error::{EventsError, Result};
use crate::normalize::normalize;
use crate::storage::EventStore;
use crate::types::{EventSource, RawEvent, RawRecord};
use metrics::{counter, histogram};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Result of downloading raw records to disk
#[derive(Debug, Serialize)]
pub struct FetchResult {
    pub source_name: String,
    pub total_records: usize,
    pub output_file: String,
}

/// Result of a load run into the event store
#[derive(Debug, Default, Serialize, PartialEq)]
pub struct LoadResult {
    pub total_records: usize,
    pub upserted: usize,
    /// Records whose id was already written earlier in the same run
    pub replaced_in_run: usize,
    /// Records without an id, all stored under `"Unknown"`
    pub missing_id: usize,
    pub with_location: usize,
}

pub struct Pipeline;

impl Pipeline {
    /// Pull every record from `source` and save them as the raw events file
    #[instrument(skip(source), fields(source = %source.source_name()))]
    pub async fn fetch(source: &dyn EventSource, output_file: &Path) -> Result<FetchResult> {
        let source_name = source.source_name().to_string();
        info!("📡 Fetching records from {}...", source_name);
        let t_fetch = Instant::now();
        let records = source.fetch_records().await?;
        histogram!("paris_events_fetch_duration_seconds", "source" => source_name.clone())
            .record(t_fetch.elapsed().as_secs_f64());
        counter!("paris_events_fetched_total", "source" => source_name.clone())
            .increment(records.len() as u64);
        info!("✅ Fetched {} raw records", records.len());

        RawFileSource::write(output_file, &records).await?;

        Ok(FetchResult {
            source_name,
            total_records: records.len(),
            output_file: output_file.to_string_lossy().to_string(),
        })
    }

    /// Read records from `source`, normalize them and upsert them in order
    #[instrument(skip(source, store), fields(source = %source.source_name()))]
    pub async fn load(source: &dyn EventSource, store: &dyn EventStore) -> Result<LoadResult> {
        let records = source.fetch_records().await?;
        Self::load_records(&records, store)
    }

    /// Decode, normalize and upsert each record in turn.
    ///
    /// A record that cannot be decoded stops the run. Rows written before it
    /// stay in the store.
    pub fn load_records(records: &[RawRecord], store: &dyn EventStore) -> Result<LoadResult> {
        let t_load = Instant::now();
        let mut result = LoadResult {
            total_records: records.len(),
            ..Default::default()
        };
        let mut seen_ids = HashSet::new();

        for (index, record) in records.iter().enumerate() {
            let raw = RawEvent::from_record(record).map_err(|reason| {
                counter!("paris_events_decode_errors_total").increment(1);
                EventsError::InputDecoding { index, reason }
            })?;

            if raw.id.is_none() {
                result.missing_id += 1;
            }

            let event = normalize(&raw);
            store.upsert(&event)?;

            if !seen_ids.insert(event.id.clone()) {
                result.replaced_in_run += 1;
                debug!("Record {} replaced earlier row {}", index, event.id);
            }
            if event.location.is_some() {
                result.with_location += 1;
            }
            result.upserted += 1;
        }

        if result.missing_id > 1 {
            warn!(
                "{} records had no id and were all stored under '{}'",
                result.missing_id, UNKNOWN
            );
        }

        counter!("paris_events_upserted_total").increment(result.upserted as u64);
        histogram!("paris_events_load_duration_seconds").record(t_load.elapsed().as_secs_f64());
        info!(
            "✅ Loaded {} events ({} replaced in run, {} with coordinates)",
            result.upserted, result.replaced_in_run, result.with_location
        );
        Ok(result)
    }

    /// Fetch from the API into the raw file, then load that file.
    ///
    /// The store is only opened once the fetch has succeeded, so a failed
    /// fetch never leaves an empty database behind.
    pub async fn run<S, F>(
        api: &dyn EventSource,
        raw_events_path: &Path,
        open_store: F,
    ) -> Result<(FetchResult, LoadResult, S)>
    where
        S: EventStore,
        F: FnOnce() -> Result<S>,
    {
        let fetched = Self::fetch(api, raw_events_path).await?;
        let store = open_store()?;
        let loaded = Self::load(&RawFileSource::new(raw_events_path), &store).await?;
        Ok((fetched, loaded, store))
    }
}
