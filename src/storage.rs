use crate::constants::EVENTS_TABLE;
use crate::domain::{Event, GeoPoint};
use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Keyed event table with insert-or-replace writes
pub trait EventStore {
    /// Insert the event, replacing any row with the same id entirely
    fn upsert(&self, event: &Event) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<Event>>;
    /// Every stored event, ordered by id
    fn all(&self) -> Result<Vec<Event>>;
    fn count(&self) -> Result<usize>;
}

/// One row of `PRAGMA table_info`
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub cid: i64,
    pub name: String,
    pub decl_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
}

const CREATE_EVENTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS events (
        id TEXT PRIMARY KEY,
        title TEXT,
        description TEXT,
        date_start TEXT,
        date_end TEXT,
        address_name TEXT,
        address_street TEXT,
        address_zipcode TEXT,
        address_city TEXT,
        latitude REAL,
        longitude REAL,
        tags TEXT,
        category TEXT,
        price_type TEXT,
        access_type TEXT,
        price_detail TEXT
    );
"#;

const SELECT_EVENTS: &str = "SELECT id, title, description, date_start, date_end, \
     address_name, address_street, address_zipcode, address_city, latitude, longitude, \
     tags, category, price_type, access_type, price_detail FROM events";

/// SQLite-backed `events` table
pub struct SqliteEventStore {
    conn: Connection,
}

impl SqliteEventStore {
    /// Open (or create) the database file and make sure the table exists
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        info!("Opening event store at {}", db_path.display());
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    /// Open an existing database without creating the table, for inspection
    pub fn open_existing<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open_with_flags(
            db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        Ok(Self { conn })
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(CREATE_EVENTS_TABLE)?;
        Ok(Self { conn })
    }

    /// Column layout of the `events` table
    pub fn table_info(&self) -> Result<Vec<ColumnInfo>> {
        let mut stmt = self.conn.prepare(&format!("PRAGMA table_info({EVENTS_TABLE})"))?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    cid: row.get(0)?,
                    name: row.get(1)?,
                    decl_type: row.get(2)?,
                    not_null: row.get::<_, i64>(3)? != 0,
                    default_value: row.get(4)?,
                    primary_key: row.get::<_, i64>(5)? != 0,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
        let latitude: Option<f64> = row.get(9)?;
        let longitude: Option<f64> = row.get(10)?;
        let location = match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
            _ => None,
        };
        Ok(Event {
            id: row.get(0)?,
            title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            date_start: row.get(3)?,
            date_end: row.get(4)?,
            address_name: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            address_street: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
            address_zipcode: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
            address_city: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
            location,
            tags: row.get::<_, Option<String>>(11)?.unwrap_or_default(),
            category: row.get::<_, Option<String>>(12)?.unwrap_or_default(),
            price_type: row.get::<_, Option<String>>(13)?.unwrap_or_default(),
            access_type: row.get::<_, Option<String>>(14)?.unwrap_or_default(),
            price_detail: row.get::<_, Option<String>>(15)?.unwrap_or_default(),
        })
    }
}

impl EventStore for SqliteEventStore {
    fn upsert(&self, event: &Event) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO events VALUES \
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                event.id,
                event.title,
                event.description,
                event.date_start,
                event.date_end,
                event.address_name,
                event.address_street,
                event.address_zipcode,
                event.address_city,
                event.latitude(),
                event.longitude(),
                event.tags,
                event.category,
                event.price_type,
                event.access_type,
                event.price_detail,
            ],
        )?;
        debug!("Upserted event {}", event.id);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Event>> {
        let mut stmt = self.conn.prepare(&format!("{SELECT_EVENTS} WHERE id = ?1"))?;
        let event = stmt.query_row(params![id], Self::event_from_row).optional()?;
        Ok(event)
    }

    fn all(&self) -> Result<Vec<Event>> {
        let mut stmt = self.conn.prepare(&format!("{SELECT_EVENTS} ORDER BY id"))?;
        let events = stmt
            .query_map([], Self::event_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(events)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// In-memory storage implementation for development/testing
#[derive(Default)]
pub struct InMemoryEventStore {
    events: Mutex<BTreeMap<String, Event>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn events(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Event>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventStore for InMemoryEventStore {
    fn upsert(&self, event: &Event) -> Result<()> {
        self.events().insert(event.id.clone(), event.clone());
        debug!("Upserted event {}", event.id);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Event>> {
        Ok(self.events().get(id).cloned())
    }

    fn all(&self) -> Result<Vec<Event>> {
        Ok(self.events().values().cloned().collect())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.events().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_event(id: &str, title: &str) -> Event {
        Event {
            id: id.to_string(),
            title: title.to_string(),
            description: "Concert en plein air".to_string(),
            date_start: Some("2025-06-21T18:00:00+00:00".to_string()),
            date_end: None,
            address_name: "Parc".to_string(),
            address_street: "1 rue de Paris".to_string(),
            address_zipcode: "75011".to_string(),
            address_city: "Paris".to_string(),
            location: Some(GeoPoint { latitude: 48.86, longitude: 2.37 }),
            tags: "Concert".to_string(),
            category: "Concert".to_string(),
            price_type: "gratuit".to_string(),
            access_type: "libre".to_string(),
            price_detail: String::new(),
        }
    }

    #[test]
    fn test_sqlite_upsert_replaces_row() {
        let store = SqliteEventStore::open_in_memory().unwrap();
        store.upsert(&sample_event("a", "First")).unwrap();

        let mut second = sample_event("a", "Second");
        second.location = None;
        second.tags = "Unknown".to_string();
        store.upsert(&second).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get("a").unwrap(), Some(second));
    }

    #[test]
    fn test_sqlite_round_trips_location_and_nulls() {
        let store = SqliteEventStore::open_in_memory().unwrap();
        let event = sample_event("b", "Expo");
        store.upsert(&event).unwrap();

        let stored = store.get("b").unwrap().unwrap();
        assert_eq!(stored.latitude(), Some(48.86));
        assert_eq!(stored.longitude(), Some(2.37));
        assert_eq!(stored.date_end, None);
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn test_sqlite_all_is_ordered_by_id() {
        let store = SqliteEventStore::open_in_memory().unwrap();
        store.upsert(&sample_event("c", "C")).unwrap();
        store.upsert(&sample_event("a", "A")).unwrap();
        store.upsert(&sample_event("b", "B")).unwrap();

        let ids: Vec<String> = store.all().unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sqlite_file_persists_and_reports_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("events.db");
        {
            let store = SqliteEventStore::open(&path).unwrap();
            store.upsert(&sample_event("a", "A")).unwrap();
        }

        let store = SqliteEventStore::open_existing(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);

        let columns = store.table_info().unwrap();
        assert_eq!(columns.len(), 16);
        assert_eq!(columns[0].name, "id");
        assert!(columns[0].primary_key);
        assert_eq!(columns[9].name, "latitude");
        assert_eq!(columns[9].decl_type, "REAL");
    }

    #[test]
    fn test_in_memory_upsert_replaces_row() {
        let store = InMemoryEventStore::new();
        store.upsert(&sample_event("a", "First")).unwrap();
        store.upsert(&sample_event("a", "Second")).unwrap();
        store.upsert(&sample_event("b", "Other")).unwrap();

        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.get("a").unwrap().unwrap().title, "Second");
        assert_eq!(store.all().unwrap().len(), 2);
    }
}
