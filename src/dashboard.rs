//! Display-time view over the stored events.
//!
//! Nothing here is persisted. Arrondissements, parsed dates and keyword
//! categories are recomputed from the stored rows every time a view is built.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::constants::{PRICE_CONDITIONAL_FREE, PRICE_FREE, PRICE_PAID, RECENT_EVENTS_LIMIT};
use crate::domain::Event;
use crate::normalize::{
    clean_description, derive_arrondissement, is_paris_arrondissement, KeywordClassifier,
    KeywordMatch,
};

/// One stored event plus its derived, display-only fields
#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    pub starts_at: Option<DateTime<Utc>>,
    pub arrondissement: Option<u8>,
    pub inferred_category: String,
    pub keywords_found: Vec<String>,
}

impl EventView {
    pub fn from_event(event: Event, classifier: &KeywordClassifier) -> Self {
        let starts_at = event.date_start.as_deref().and_then(parse_timestamp);
        let arrondissement = derive_arrondissement(Some(&event.address_zipcode));
        let KeywordMatch { category, keywords } = classifier.classify(Some(&event.description));
        Self {
            event,
            starts_at,
            arrondissement,
            inferred_category: category,
            keywords_found: keywords,
        }
    }

    /// Month bucket (`YYYY-MM`) of the start date
    pub fn month(&self) -> Option<String> {
        self.starts_at.map(|d| d.format("%Y-%m").to_string())
    }

    /// Cleaned description excerpt for listings
    pub fn excerpt(&self) -> String {
        clean_description(&self.event.description)
    }
}

/// Parse a source timestamp. Anything unrecognized counts as missing.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Build views for every stored event
pub fn build_views(events: Vec<Event>, classifier: &KeywordClassifier) -> Vec<EventView> {
    events
        .into_iter()
        .map(|e| EventView::from_event(e, classifier))
        .collect()
}

/// Events that can be placed on the map and the timeline: a parsed start
/// date, coordinates, and a Paris arrondissement (1 to 20).
pub fn viz_events(views: &[EventView]) -> Vec<&EventView> {
    views
        .iter()
        .filter(|v| v.starts_at.is_some())
        .filter(|v| v.event.location.is_some())
        .filter(|v| v.arrondissement.is_some_and(is_paris_arrondissement))
        .collect()
}

/// Price/access filter offered by the dashboard sidebar
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PriceFilter {
    #[default]
    All,
    /// Only `"gratuit sous condition"` events
    ConditionalFreeOnly,
    /// Events whose price type or access type is one of the values
    AnyOf(Vec<String>),
}

impl PriceFilter {
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            PriceFilter::All => true,
            PriceFilter::ConditionalFreeOnly => event.price_type == PRICE_CONDITIONAL_FREE,
            PriceFilter::AnyOf(values) if values.is_empty() => true,
            PriceFilter::AnyOf(values) => values
                .iter()
                .any(|v| *v == event.price_type || *v == event.access_type),
        }
    }

    pub fn apply<'a>(&self, views: &[&'a EventView]) -> Vec<&'a EventView> {
        views.iter().copied().filter(|v| self.matches(&v.event)).collect()
    }
}

/// Distinct price and access types, the options of the price/access filter
pub fn filter_options(views: &[&EventView]) -> BTreeSet<String> {
    views
        .iter()
        .flat_map(|v| [v.event.price_type.clone(), v.event.access_type.clone()])
        .collect()
}

/// Number of events per start month, oldest first
pub fn monthly_counts(views: &[&EventView]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for month in views.iter().filter_map(|v| v.month()) {
        *counts.entry(month).or_insert(0) += 1;
    }
    counts
}

/// Stored category × arrondissement event counts
pub fn category_by_arrondissement(views: &[&EventView]) -> BTreeMap<String, BTreeMap<u8, usize>> {
    count_by_arrondissement(views, |event| &event.category)
}

/// Price type × arrondissement event counts, the per-district bar chart
pub fn price_type_by_arrondissement(
    views: &[&EventView],
) -> BTreeMap<String, BTreeMap<u8, usize>> {
    count_by_arrondissement(views, |event| &event.price_type)
}

fn count_by_arrondissement<F>(views: &[&EventView], key: F) -> BTreeMap<String, BTreeMap<u8, usize>>
where
    F: Fn(&Event) -> &String,
{
    let mut pivot: BTreeMap<String, BTreeMap<u8, usize>> = BTreeMap::new();
    for view in views {
        if let Some(arrondissement) = view.arrondissement {
            *pivot
                .entry(key(&view.event).clone())
                .or_default()
                .entry(arrondissement)
                .or_insert(0) += 1;
        }
    }
    pivot
}

/// Headline figures for the selected events
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub events: usize,
    pub earliest_start: Option<DateTime<Utc>>,
    pub arrondissements: usize,
    pub access_types: usize,
}

pub fn overview(views: &[&EventView]) -> Overview {
    let arrondissements: BTreeSet<u8> = views.iter().filter_map(|v| v.arrondissement).collect();
    let access_types: BTreeSet<&str> =
        views.iter().map(|v| v.event.access_type.as_str()).collect();
    Overview {
        events: views.len(),
        earliest_start: views.iter().filter_map(|v| v.starts_at).min(),
        arrondissements: arrondissements.len(),
        access_types: access_types.len(),
    }
}

/// Number of events per access type, most frequent first
pub fn access_type_counts(views: &[&EventView]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for view in views {
        *counts.entry(view.event.access_type.as_str()).or_insert(0) += 1;
    }
    let mut counts: Vec<(String, usize)> =
        counts.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Figures shown for one inferred category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub total: usize,
    pub free: usize,
    pub paid: usize,
    pub arrondissements: usize,
}

/// Views whose keyword-inferred category is `category`
pub fn events_in_category<'a>(views: &[&'a EventView], category: &str) -> Vec<&'a EventView> {
    views.iter().copied().filter(|v| v.inferred_category == category).collect()
}

pub fn category_summary(views: &[&EventView], category: &str) -> CategorySummary {
    let in_category = events_in_category(views, category);
    let arrondissements: BTreeSet<u8> =
        in_category.iter().filter_map(|v| v.arrondissement).collect();
    CategorySummary {
        category: category.to_string(),
        total: in_category.len(),
        free: in_category.iter().filter(|v| v.event.price_type == PRICE_FREE).count(),
        paid: in_category.iter().filter(|v| v.event.price_type == PRICE_PAID).count(),
        arrondissements: arrondissements.len(),
    }
}

/// Inferred categories present in the views, sorted
pub fn inferred_categories(views: &[&EventView]) -> Vec<String> {
    let categories: BTreeSet<&str> = views.iter().map(|v| v.inferred_category.as_str()).collect();
    categories.into_iter().map(str::to_string).collect()
}

/// Upcoming events (start at or after `now`) in date order. When nothing is
/// upcoming, the most recent past events instead, newest first.
pub fn upcoming_or_recent<'a>(
    views: &[&'a EventView],
    now: DateTime<Utc>,
) -> (bool, Vec<&'a EventView>) {
    let mut upcoming: Vec<&EventView> = views
        .iter()
        .copied()
        .filter(|v| v.starts_at.is_some_and(|d| d >= now))
        .collect();
    if !upcoming.is_empty() {
        upcoming.sort_by_key(|v| v.starts_at);
        return (true, upcoming);
    }

    let mut recent: Vec<&EventView> =
        views.iter().copied().filter(|v| v.starts_at.is_some()).collect();
    recent.sort_by(|a, b| b.starts_at.cmp(&a.starts_at));
    recent.truncate(RECENT_EVENTS_LIMIT);
    (false, recent)
}
