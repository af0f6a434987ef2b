use crate::config::ApiConfig;
use crate::error::{EventsError, Result};
use crate::types::{EventSource, RawRecord};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Paginated client for the Paris open-data records search endpoint
pub struct ParisOpenDataApi {
    client: reqwest::Client,
    config: ApiConfig,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    records: Vec<SearchRecord>,
}

#[derive(Debug, Deserialize)]
struct SearchRecord {
    fields: RawRecord,
}

impl ParisOpenDataApi {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    /// Query string for the page starting at `offset`
    pub fn page_query(&self, offset: usize) -> Vec<(String, String)> {
        let mut query = vec![
            ("dataset".to_string(), self.config.dataset.clone()),
            ("rows".to_string(), self.config.rows.to_string()),
            ("sort".to_string(), self.config.sort.clone()),
        ];
        query.extend(self.config.facets.iter().map(|f| ("facet".to_string(), f.clone())));
        query.push(("start".to_string(), offset.to_string()));
        query
    }

    #[instrument(skip(self))]
    async fn fetch_page(&self, offset: usize) -> Result<Vec<RawRecord>> {
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&self.page_query(offset))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EventsError::Api {
                message: format!("open-data search returned status {}", status.as_u16()),
            });
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.records.into_iter().map(|r| r.fields).collect())
    }
}

#[async_trait::async_trait]
impl EventSource for ParisOpenDataApi {
    fn source_name(&self) -> &'static str {
        "paris_opendata"
    }

    #[instrument(skip(self), fields(dataset = %self.config.dataset))]
    async fn fetch_records(&self) -> Result<Vec<RawRecord>> {
        let max_records = self.config.max_records;
        let mut all_records = Vec::new();
        let mut offset = 0usize;

        while all_records.len() < max_records {
            let page = self.fetch_page(offset).await?;
            if page.is_empty() {
                break;
            }

            if let Some(sample) = page.first() {
                let keys: Vec<&str> = sample
                    .as_object()
                    .map(|o| o.keys().map(String::as_str).collect())
                    .unwrap_or_default();
                debug!(
                    "Sample record fields: {:?}, tags: {}, price_type: {}, access_type: {}",
                    keys,
                    sample.get("tags").unwrap_or(&RawRecord::Null),
                    sample.get("price_type").unwrap_or(&RawRecord::Null),
                    sample.get("access_type").unwrap_or(&RawRecord::Null)
                );
            }

            let fetched = page.len();
            all_records.extend(page);
            offset += self.config.rows as usize;
            info!("Fetched {} records (total: {})", fetched, all_records.len());
        }

        all_records.truncate(max_records);
        Ok(all_records)
    }
}
