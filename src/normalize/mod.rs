//! Turns raw upstream records into canonical [`Event`] rows.
//!
//! Everything here is total: any [`RawEvent`] produces an [`Event`]. Missing
//! values resolve through [`FieldDefaults`], coordinates through
//! [`geo::validate_coordinates`] and the stored category through
//! [`category::load_time_category`].

pub mod category;
pub mod geo;
pub mod text;

pub use category::{
    keyword_category, load_time_category, KeywordBucket, KeywordClassifier, KeywordMatch,
};
pub use geo::{derive_arrondissement, is_paris_arrondissement, validate_coordinates};
pub use text::clean_description;

use crate::constants::UNKNOWN;
use crate::domain::Event;
use crate::types::RawEvent;

/// Per-field fallback used when the source record omits a value. A present
/// but empty string is kept as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefaults {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub address_name: &'static str,
    pub address_street: &'static str,
    pub address_zipcode: &'static str,
    pub address_city: &'static str,
    pub tags: &'static str,
    pub price_type: &'static str,
    pub access_type: &'static str,
    pub price_detail: &'static str,
}

/// The defaults the `events` table has always been filled with. Ids and titles
/// fall back to `"Unknown"` while address parts fall back to `""`.
pub const FIELD_DEFAULTS: FieldDefaults = FieldDefaults {
    id: UNKNOWN,
    title: UNKNOWN,
    description: "",
    address_name: "",
    address_street: "",
    address_zipcode: "",
    address_city: "",
    tags: UNKNOWN,
    price_type: UNKNOWN,
    access_type: UNKNOWN,
    price_detail: "",
};

/// Build the stored event for one raw record.
///
/// Records without an id all land on `"Unknown"` and overwrite each other in
/// the store.
pub fn normalize(raw: &RawEvent) -> Event {
    let defaults = &FIELD_DEFAULTS;
    let tags = derive_tags(raw);
    let location = raw
        .lat_lon
        .as_ref()
        .and_then(|ll| validate_coordinates(ll.lat.as_deref(), ll.lon.as_deref()));

    Event {
        id: or_default(&raw.id, defaults.id),
        title: or_default(&raw.title, defaults.title),
        description: or_default(&raw.description, defaults.description),
        date_start: raw.date_start.clone(),
        date_end: raw.date_end.clone(),
        address_name: or_default(&raw.address_name, defaults.address_name),
        address_street: or_default(&raw.address_street, defaults.address_street),
        address_zipcode: or_default(&raw.address_zipcode, defaults.address_zipcode),
        address_city: or_default(&raw.address_city, defaults.address_city),
        location,
        category: load_time_category(&tags, raw.price_type.as_deref()),
        tags: tags_string(&tags),
        price_type: or_default(&raw.price_type, defaults.price_type),
        access_type: or_default(&raw.access_type, defaults.access_type),
        price_detail: or_default(&raw.price_detail, defaults.price_detail),
    }
}

/// Tag entries from the first populated list among `tags`, `program` and
/// `event_type`. Entries are trimmed; null and blank entries are dropped.
pub fn derive_tags(raw: &RawEvent) -> Vec<String> {
    let source = [&raw.tags, &raw.program, &raw.event_type]
        .into_iter()
        .flatten()
        .find(|list| !list.is_empty());

    source
        .map(|list| {
            list.iter()
                .flatten()
                .map(|tag| tag.trim())
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Comma-joined tag column value, `"Unknown"` when there are no entries.
pub fn tags_string(tags: &[String]) -> String {
    if tags.is_empty() {
        FIELD_DEFAULTS.tags.to_string()
    } else {
        tags.join(",")
    }
}

fn or_default(value: &Option<String>, default: &str) -> String {
    value.clone().unwrap_or_else(|| default.to_string())
}
