/// Upstream API and local layout constants shared across the pipeline

// Paris open-data "Que faire à Paris" dataset
pub const OPENDATA_BASE_URL: &str = "https://opendata.paris.fr/api/records/1.0/search/";
pub const OPENDATA_DATASET: &str = "que-faire-a-paris-";
pub const OPENDATA_SORT: &str = "-date_start";
pub const OPENDATA_FACETS: [&str; 5] =
    ["category", "tags", "address_zipcode", "price_type", "access_type"];
pub const DEFAULT_PAGE_ROWS: u32 = 1000;
pub const DEFAULT_MAX_RECORDS: usize = 2000;

// Local files
pub const DEFAULT_DB_PATH: &str = "events.db";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const RAW_EVENTS_FILE: &str = "raw_events.json";
pub const ANALYZED_EVENTS_FILE: &str = "analyzed_events.json";
pub const MONTHLY_FILE: &str = "monthly.json";
pub const EVENTS_TABLE: &str = "events";

// Paris bounding box (inclusive)
pub const MIN_LATITUDE: f64 = 48.8;
pub const MAX_LATITUDE: f64 = 48.9;
pub const MIN_LONGITUDE: f64 = 2.2;
pub const MAX_LONGITUDE: f64 = 2.4;

// Arrondissement numbers kept by geo-filtered views
pub const MIN_ARRONDISSEMENT: u8 = 1;
pub const MAX_ARRONDISSEMENT: u8 = 20;

// Sentinels
pub const UNKNOWN: &str = "Unknown";
pub const OTHER_CATEGORY: &str = "Other";
pub const UNCLASSIFIED_CATEGORY: &str = "Autre";

// Price types the dashboard singles out
pub const PRICE_FREE: &str = "gratuit";
pub const PRICE_PAID: &str = "payant";
pub const PRICE_CONDITIONAL_FREE: &str = "gratuit sous condition";

// Description excerpts
pub const DESCRIPTION_EXCERPT_CHARS: usize = 300;
pub const EXCERPT_ELLIPSIS: &str = "...";

// Listing fallback when nothing is upcoming
pub const RECENT_EVENTS_LIMIT: usize = 10;
