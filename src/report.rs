use crate::constants::{ANALYZED_EVENTS_FILE, MONTHLY_FILE, UNKNOWN};
use crate::dashboard::{self, EventView, PriceFilter};
use crate::domain::Event;
use crate::error::Result;
use crate::normalize::KeywordClassifier;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Column fill rates and aggregates over the stored table.
///
/// `category_by_arrondissement` and `monthly` cover every row with a parsed
/// start date. The dashboard figures cover the mappable rows, and
/// `overview` only the rows kept by the price/access filter.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub total_rows: usize,
    pub rows_with_zipcode: usize,
    pub rows_with_tags: usize,
    pub rows_with_price_type: usize,
    pub rows_with_access_type: usize,
    pub rows_with_start_date: usize,
    pub viz_rows: usize,
    pub filtered_rows: usize,
    pub category_by_arrondissement: BTreeMap<String, BTreeMap<u8, usize>>,
    pub monthly: BTreeMap<String, usize>,
    pub overview: dashboard::Overview,
    pub price_type_by_arrondissement: BTreeMap<String, BTreeMap<u8, usize>>,
    pub viz_monthly: BTreeMap<String, usize>,
    pub access_types: Vec<(String, usize)>,
    pub categories: Vec<dashboard::CategorySummary>,
}

#[derive(Debug, Serialize)]
struct MonthlyRow<'a> {
    month: &'a str,
    count: usize,
}

/// Views plus the report derived from them
pub struct Analysis {
    pub views: Vec<EventView>,
    pub report: AnalysisReport,
}

impl Analysis {
    pub fn build(events: Vec<Event>, classifier: &KeywordClassifier, filter: &PriceFilter) -> Self {
        let total_rows = events.len();
        let rows_with_zipcode = events.iter().filter(|e| !e.address_zipcode.is_empty()).count();
        let rows_with_tags = events.iter().filter(|e| e.tags != UNKNOWN).count();
        let rows_with_price_type = events.iter().filter(|e| !e.price_type.is_empty()).count();
        let rows_with_access_type = events.iter().filter(|e| !e.access_type.is_empty()).count();

        let views = dashboard::build_views(events, classifier);
        if views.iter().all(|v| v.starts_at.is_none()) && total_rows > 0 {
            warn!("No rows have a parseable date_start");
        }

        let dated: Vec<&EventView> = views.iter().filter(|v| v.starts_at.is_some()).collect();
        let viz = dashboard::viz_events(&views);
        let filtered = filter.apply(&viz);
        if filtered.is_empty() {
            warn!("No event matches the selected filters");
        }

        let categories = dashboard::inferred_categories(&viz)
            .iter()
            .map(|c| dashboard::category_summary(&viz, c))
            .collect();

        let report = AnalysisReport {
            total_rows,
            rows_with_zipcode,
            rows_with_tags,
            rows_with_price_type,
            rows_with_access_type,
            rows_with_start_date: dated.len(),
            viz_rows: viz.len(),
            filtered_rows: filtered.len(),
            category_by_arrondissement: dashboard::category_by_arrondissement(&dated),
            monthly: dashboard::monthly_counts(&dated),
            overview: dashboard::overview(&filtered),
            price_type_by_arrondissement: dashboard::price_type_by_arrondissement(&viz),
            viz_monthly: dashboard::monthly_counts(&viz),
            access_types: dashboard::access_type_counts(&viz),
            categories,
        };

        Self { views, report }
    }

    /// Write the dated events and the monthly counts as JSON under `data_dir`
    pub fn export(&self, data_dir: &Path) -> Result<(PathBuf, PathBuf)> {
        fs::create_dir_all(data_dir)?;

        let dated: Vec<&EventView> = self.views.iter().filter(|v| v.starts_at.is_some()).collect();
        let events_path = data_dir.join(ANALYZED_EVENTS_FILE);
        fs::write(&events_path, serde_json::to_string_pretty(&dated)?)?;

        let monthly: Vec<MonthlyRow<'_>> = self
            .report
            .monthly
            .iter()
            .map(|(month, count)| MonthlyRow { month, count: *count })
            .collect();
        let monthly_path = data_dir.join(MONTHLY_FILE);
        fs::write(&monthly_path, serde_json::to_string(&monthly)?)?;

        info!(
            "Analysis exported to {} and {}",
            events_path.display(),
            monthly_path.display()
        );
        Ok((events_path, monthly_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GeoPoint;
    use tempfile::tempdir;

    fn event(id: &str, date: Option<&str>, tags: &str) -> Event {
        Event {
            id: id.to_string(),
            title: id.to_string(),
            description: "Atelier famille".to_string(),
            date_start: date.map(String::from),
            date_end: None,
            address_name: String::new(),
            address_street: String::new(),
            address_zipcode: "75005".to_string(),
            address_city: String::new(),
            location: Some(GeoPoint { latitude: 48.85, longitude: 2.35 }),
            tags: tags.to_string(),
            category: "Atelier".to_string(),
            price_type: "gratuit".to_string(),
            access_type: String::new(),
            price_detail: String::new(),
        }
    }

    #[test]
    fn test_report_counts() {
        let events = vec![
            event("1", Some("2025-03-01"), "Atelier"),
            event("2", Some("2025-03-09"), "Unknown"),
            event("3", Some("not a date"), "Atelier"),
        ];
        let analysis = Analysis::build(events, &KeywordClassifier::default(), &PriceFilter::All);
        let report = &analysis.report;

        assert_eq!(report.total_rows, 3);
        assert_eq!(report.rows_with_zipcode, 3);
        assert_eq!(report.rows_with_tags, 2);
        assert_eq!(report.rows_with_access_type, 0);
        assert_eq!(report.rows_with_start_date, 2);
        assert_eq!(report.viz_rows, 2);
        assert_eq!(report.monthly.get("2025-03"), Some(&2));
        assert_eq!(report.categories.len(), 1);
        assert_eq!(report.categories[0].category, "Famille");
    }

    #[test]
    fn test_empty_store_builds_empty_report() {
        let analysis =
            Analysis::build(Vec::new(), &KeywordClassifier::default(), &PriceFilter::All);
        assert_eq!(analysis.report.total_rows, 0);
        assert!(analysis.report.monthly.is_empty());
        assert!(analysis.report.categories.is_empty());
    }

    #[test]
    fn test_filter_only_narrows_the_overview() {
        let mut unmapped = event("3", Some("2025-04-02"), "Atelier");
        unmapped.location = None;
        let mut conditional = event("2", Some("2025-03-09"), "Atelier");
        conditional.price_type = "gratuit sous condition".to_string();
        let events = vec![event("1", Some("2025-03-01"), "Atelier"), conditional, unmapped];

        let analysis = Analysis::build(
            events,
            &KeywordClassifier::default(),
            &PriceFilter::ConditionalFreeOnly,
        );
        let report = &analysis.report;

        assert_eq!(report.filtered_rows, 1);
        assert_eq!(report.overview.events, 1);
        assert_eq!(report.overview.arrondissements, 1);
        assert_eq!(report.categories[0].total, 2);
        assert_eq!(report.price_type_by_arrondissement["gratuit"][&5], 1);
        assert_eq!(report.price_type_by_arrondissement["gratuit sous condition"][&5], 1);
        assert_eq!(report.viz_monthly.get("2025-04"), None);
        assert_eq!(report.monthly.get("2025-04"), Some(&1));
        assert_eq!(report.category_by_arrondissement["Atelier"][&5], 3);
    }

    #[test]
    fn test_export_writes_both_files() {
        let dir = tempdir().unwrap();
        let analysis = Analysis::build(
            vec![event("1", Some("2025-03-01"), "Atelier"), event("2", None, "Atelier")],
            &KeywordClassifier::default(),
            &PriceFilter::All,
        );

        let (events_path, monthly_path) = analysis.export(dir.path()).unwrap();

        let exported: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(events_path).unwrap()).unwrap();
        assert_eq!(exported.as_array().unwrap().len(), 1);
        assert_eq!(exported[0]["arrondissement"], 5);
        assert_eq!(exported[0]["inferred_category"], "Famille");

        let monthly: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(monthly_path).unwrap()).unwrap();
        assert_eq!(monthly, serde_json::json!([{"month": "2025-03", "count": 1}]));
    }
}
