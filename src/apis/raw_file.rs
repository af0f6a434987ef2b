use crate::error::{EventsError, Result};
use crate::types::{EventSource, RawRecord};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Pre-fetched records stored as one JSON array on disk
pub struct RawFileSource {
    path: PathBuf,
}

impl RawFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write records as a pretty-printed JSON array, creating parent directories
    pub async fn write(path: &Path, records: &[RawRecord]) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json_content = serde_json::to_string_pretty(records)?;
        tokio::fs::write(path, json_content).await?;
        info!("Saved {} records to {}", records.len(), path.display());
        Ok(())
    }
}

#[async_trait::async_trait]
impl EventSource for RawFileSource {
    fn source_name(&self) -> &'static str {
        "raw_file"
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn fetch_records(&self) -> Result<Vec<RawRecord>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Err(EventsError::MissingInput(format!(
                "{} not found. Run fetch first.",
                self.path.display()
            )));
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        match serde_json::from_str::<RawRecord>(&content)? {
            RawRecord::Array(records) => Ok(records),
            _ => Err(EventsError::MalformedInput(format!(
                "{} does not contain a JSON array of records",
                self.path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_then_read_keeps_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("raw_events.json");
        let records = vec![json!({"id": "b"}), json!({"id": "a"})];

        RawFileSource::write(&path, &records).await.unwrap();
        let read = RawFileSource::new(&path).fetch_records().await.unwrap();

        assert_eq!(read, records);
    }

    #[tokio::test]
    async fn test_missing_file_is_reported() {
        let dir = tempdir().unwrap();
        let source = RawFileSource::new(dir.path().join("raw_events.json"));
        let err = source.fetch_records().await.unwrap_err();
        assert!(matches!(err, EventsError::MissingInput(_)));
    }

    #[tokio::test]
    async fn test_non_array_file_is_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw_events.json");
        std::fs::write(&path, r#"{"records": []}"#).unwrap();

        let err = RawFileSource::new(&path).fetch_records().await.unwrap_err();
        assert!(matches!(err, EventsError::MalformedInput(_)));
    }

    #[tokio::test]
    async fn test_invalid_json_is_a_json_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw_events.json");
        std::fs::write(&path, "[{\"id\": ").unwrap();

        let err = RawFileSource::new(&path).fetch_records().await.unwrap_err();
        assert!(matches!(err, EventsError::Json(_)));
    }
}
