use anyhow::Result;
use paris_events::apis::RawFileSource;
use paris_events::error::EventsError;
use paris_events::pipeline::Pipeline;
use paris_events::storage::{EventStore, SqliteEventStore};
use paris_events::types::{EventSource, RawRecord};
use serde_json::json;
use tempfile::tempdir;

#[tokio::test]
async fn test_load_raw_file_into_sqlite() -> Result<()> {
    let temp_dir = tempdir()?;
    let raw_path = temp_dir.path().join("data").join("raw_events.json");
    let db_path = temp_dir.path().join("events.db");

    let records = vec![
        json!({
            "id": "a",
            "title": "Atelier poterie",
            "address_zipcode": "75011",
            "lat_lon": [48.86, 2.38],
            "tags": ["Atelier"],
            "price_type": "payant"
        }),
        json!({"id": "b", "title": "Balade", "price_type": "gratuit"}),
        json!({"id": "a", "title": "Atelier poterie (complet)", "price_type": "gratuit"}),
    ];
    RawFileSource::write(&raw_path, &records).await?;

    let store = SqliteEventStore::open(&db_path)?;
    let result = Pipeline::load(&RawFileSource::new(&raw_path), &store).await?;

    assert_eq!(result.total_records, 3);
    assert_eq!(result.upserted, 3);
    assert_eq!(result.replaced_in_run, 1);
    assert_eq!(store.count()?, 2);

    // the later record replaces the whole row, coordinates included
    let a = store.get("a")?.expect("row a");
    assert_eq!(a.title, "Atelier poterie (complet)");
    assert_eq!(a.tags, "Unknown");
    assert_eq!(a.category, "gratuit");
    assert!(a.location.is_none());

    let b = store.get("b")?.expect("row b");
    assert_eq!(b.category, "gratuit");
    Ok(())
}

#[tokio::test]
async fn test_reload_is_idempotent() -> Result<()> {
    let temp_dir = tempdir()?;
    let raw_path = temp_dir.path().join("raw_events.json");
    let db_path = temp_dir.path().join("events.db");
    let records = [json!({"id": "x", "lat_lon": {"lat": 48.85, "lon": 2.35}})];
    RawFileSource::write(&raw_path, &records).await?;

    let store = SqliteEventStore::open(&db_path)?;
    let source = RawFileSource::new(&raw_path);
    Pipeline::load(&source, &store).await?;
    let first = store.all()?;
    Pipeline::load(&source, &store).await?;

    assert_eq!(store.all()?, first);
    assert_eq!(first[0].latitude(), Some(48.85));
    Ok(())
}

#[tokio::test]
async fn test_decode_error_keeps_rows_written_before_it() -> Result<()> {
    let temp_dir = tempdir()?;
    let raw_path = temp_dir.path().join("raw_events.json");
    RawFileSource::write(&raw_path, &[json!({"id": "1"}), json!(42), json!({"id": "3"})]).await?;

    let store = SqliteEventStore::open_in_memory()?;
    let err = Pipeline::load(&RawFileSource::new(&raw_path), &store)
        .await
        .unwrap_err();

    assert!(matches!(err, EventsError::InputDecoding { index: 1, .. }));
    assert_eq!(store.count()?, 1);
    Ok(())
}

#[tokio::test]
async fn test_missing_raw_file_is_reported() -> Result<()> {
    let temp_dir = tempdir()?;
    let store = SqliteEventStore::open_in_memory()?;

    let err = Pipeline::load(&RawFileSource::new(temp_dir.path().join("nope.json")), &store)
        .await
        .unwrap_err();

    assert!(matches!(err, EventsError::MissingInput(_)));
    assert_eq!(store.count()?, 0);
    Ok(())
}

struct UnavailableApi;

#[async_trait::async_trait]
impl EventSource for UnavailableApi {
    fn source_name(&self) -> &'static str {
        "unavailable"
    }

    async fn fetch_records(&self) -> paris_events::error::Result<Vec<RawRecord>> {
        Err(EventsError::Api {
            message: "open-data search returned status 503".to_string(),
        })
    }
}

#[tokio::test]
async fn test_failed_fetch_leaves_no_database() -> Result<()> {
    let temp_dir = tempdir()?;
    let raw_path = temp_dir.path().join("data").join("raw_events.json");
    let db_path = temp_dir.path().join("events.db");

    let err = Pipeline::run(&UnavailableApi, &raw_path, || SqliteEventStore::open(&db_path))
        .await
        .err()
        .expect("fetch should fail");

    assert!(matches!(err, EventsError::Api { .. }));
    assert!(!db_path.exists());
    assert!(!raw_path.exists());
    Ok(())
}

#[tokio::test]
async fn test_run_fetches_then_loads() -> Result<()> {
    struct FixedApi;

    #[async_trait::async_trait]
    impl EventSource for FixedApi {
        fn source_name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch_records(&self) -> paris_events::error::Result<Vec<RawRecord>> {
            Ok(vec![json!({"id": "1", "title": "Yoga au parc"}), json!({"id": "2"})])
        }
    }

    let temp_dir = tempdir()?;
    let raw_path = temp_dir.path().join("data").join("raw_events.json");
    let db_path = temp_dir.path().join("events.db");

    let (fetched, loaded, store) =
        Pipeline::run(&FixedApi, &raw_path, || SqliteEventStore::open(&db_path)).await?;

    assert_eq!(fetched.total_records, 2);
    assert_eq!(loaded.upserted, 2);
    assert_eq!(store.count()?, 2);
    assert!(raw_path.exists());
    assert!(db_path.exists());
    Ok(())
}
