//! Dashboard pages
//!
//! Each page is rendered from the loaded table into a title and a list of
//! captioned charts. Rendering never fails: a chart that cannot be built is
//! replaced with a placeholder so the other pages stay usable.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::aggregate::{self, AggFn, AggregateRow, AggregateTable, GroupedSums};
use crate::charts::{self, Chart, DataTable};
use crate::error::{AggregateError, ParseError};
use crate::models::{Column, SessionTable};

pub const HANDSET_ROOT: &str = "Handset Manufacturers";
pub const MANUFACTURER_THRESHOLD: f64 = 200.0;
pub const HANDSET_TYPE_THRESHOLD: f64 = 1000.0;
pub const PIE_SIZE: (u32, u32) = (800, 500);
pub const TOP_GAMING_HANDSETS: usize = 5;

const APPLICATION_SUFFIX: &str = " Data Volume (Bytes)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Page {
    Handsets,
    Applications,
}

impl Page {
    pub const ALL: [Page; 2] = [Page::Handsets, Page::Applications];

    pub fn name(self) -> &'static str {
        match self {
            Page::Handsets => "Handsets",
            Page::Applications => "Applications",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Page {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Page::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::UnknownPage(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub chart: Chart,
}

impl Section {
    fn new(caption: Option<&str>, chart: Chart) -> Self {
        Self {
            caption: caption.map(String::from),
            chart,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub page: Page,
    pub title: String,
    pub sections: Vec<Section>,
}

pub fn render(page: Page, table: &SessionTable) -> PageView {
    debug!("Rendering page {} over {} sessions", page, table.len());
    match page {
        Page::Handsets => render_handsets(table),
        Page::Applications => render_applications(table),
    }
}

/// Treemap of manufacturers and handset types plus two frequency pies
pub fn render_handsets(table: &SessionTable) -> PageView {
    let treemap = charts::count_treemap(table, HANDSET_ROOT, |r| {
        Some((r.handset_manufacturer.as_deref()?, r.handset_type.as_deref()?))
    });

    PageView {
        page: Page::Handsets,
        title: "Handsets of Users".to_string(),
        sections: vec![
            Section::new(None, treemap),
            Section::new(
                Some(threshold_caption("Handset manufacturers", MANUFACTURER_THRESHOLD).as_str()),
                frequency_pie(table, Column::HandsetManufacturer, MANUFACTURER_THRESHOLD),
            ),
            Section::new(
                Some(threshold_caption("Handset types", HANDSET_TYPE_THRESHOLD).as_str()),
                frequency_pie(table, Column::HandsetType, HANDSET_TYPE_THRESHOLD),
            ),
        ],
    }
}

fn threshold_caption(subject: &str, threshold: f64) -> String {
    format!("{} with more than {} devices.", subject, threshold)
}

/// Row counts per category, with every category under `threshold` merged
/// into one "Other ..." slice
pub fn category_counts(table: &SessionTable, column: Column, threshold: f64) -> Result<AggregateTable, AggregateError> {
    let counts = aggregate::aggregate(table, column, column, AggFn::Size, "count", false)?;
    let other = format!("Other {}s", column.label());
    Ok(aggregate::bucket_small_groups(&counts, threshold, &other))
}

fn frequency_pie(table: &SessionTable, column: Column, threshold: f64) -> Chart {
    match category_counts(table, column, threshold) {
        Ok(counts) => charts::pie(&counts, Some(PIE_SIZE)),
        Err(e) => {
            warn!("Cannot count {}: {}", column, e);
            Chart::placeholder(e.to_string())
        }
    }
}

/// Display name of an application volume column ("Social Media", ...)
pub fn application_name(column: Column) -> &'static str {
    column.label().trim_end_matches(APPLICATION_SUFFIX)
}

/// Total bytes per application over all sessions, in display order
pub fn application_totals(table: &SessionTable) -> AggregateTable {
    AggregateTable {
        group_column: "Applications".to_string(),
        result_column: "Data volume".to_string(),
        rows: Column::APPLICATIONS
            .iter()
            .map(|c| AggregateRow {
                key: application_name(*c).to_string(),
                value: Some(table.column_total(*c)),
            })
            .collect(),
    }
}

/// Handset types with the least gaming traffic, with all seven application
/// totals
pub fn handset_app_usage(table: &SessionTable, limit: usize) -> Result<GroupedSums, AggregateError> {
    let mut sums = aggregate::sum_by(table, Column::HandsetType, &Column::APPLICATIONS)?;
    sums.sort_by_column(Column::GamingVolume, true);
    Ok(sums.head(limit))
}

pub fn render_applications(table: &SessionTable) -> PageView {
    let volume_pie = if table.is_empty() {
        Chart::placeholder("No sessions loaded")
    } else {
        charts::pie(&application_totals(table), None)
    };

    let usage = match handset_app_usage(table, TOP_GAMING_HANDSETS) {
        Ok(sums) if !sums.rows.is_empty() => Chart::Table(DataTable {
            columns: std::iter::once(sums.group_column.name().to_string())
                .chain(sums.columns.iter().map(|c| c.name().to_string()))
                .collect(),
            rows: sums.to_records(),
        }),
        Ok(_) => Chart::placeholder("No handset types to rank"),
        Err(e) => {
            warn!("Cannot rank handsets by gaming volume: {}", e);
            Chart::placeholder(e.to_string())
        }
    };

    PageView {
        page: Page::Applications,
        title: "Usage of applications".to_string(),
        sections: vec![
            Section::new(Some("Total data used per application"), volume_pie),
            Section::new(Some("Handset types with the lowest gaming volume"), usage),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionRecord;

    fn handsets(counts: &[(&str, &str, usize)]) -> SessionTable {
        let mut records = Vec::new();
        for (manufacturer, kind, n) in counts {
            for _ in 0..*n {
                records.push(SessionRecord {
                    handset_manufacturer: Some(manufacturer.to_string()),
                    handset_type: Some(kind.to_string()),
                    ..Default::default()
                });
            }
        }
        SessionTable::new(records)
    }

    #[test]
    fn test_page_names() {
        assert_eq!("Handsets".parse::<Page>().unwrap(), Page::Handsets);
        assert_eq!("applications".parse::<Page>().unwrap(), Page::Applications);
        assert!("Overview".parse::<Page>().is_err());
        assert_eq!(serde_json::to_value(Page::ALL).unwrap(), serde_json::json!(["Handsets", "Applications"]));
    }

    #[test]
    fn test_manufacturer_bucketing() {
        let table = handsets(&[("X", "x1", 250), ("Y", "y1", 150), ("Z", "z1", 50)]);
        let counts = category_counts(&table, Column::HandsetManufacturer, MANUFACTURER_THRESHOLD).unwrap();
        assert_eq!(
            counts.rows,
            vec![
                AggregateRow { key: "X".into(), value: Some(250.0) },
                AggregateRow { key: "Other Handset Manufacturers".into(), value: Some(200.0) },
            ]
        );
    }

    #[test]
    fn test_handsets_page_layout() {
        let table = handsets(&[("Apple", "iPhone 7", 1200), ("Apple", "iPhone 6", 30), ("Huawei", "B528S", 10)]);
        let view = render(Page::Handsets, &table);

        assert_eq!(view.title, "Handsets of Users");
        assert_eq!(view.sections.len(), 3);
        assert!(matches!(view.sections[0].chart, Chart::Treemap(_)));
        assert_eq!(
            view.sections[1].caption.as_deref(),
            Some("Handset manufacturers with more than 200 devices.")
        );
        assert_eq!(view.sections[2].caption.as_deref(), Some("Handset types with more than 1000 devices."));

        let Chart::Pie(types) = &view.sections[2].chart else {
            panic!("expected a pie");
        };
        assert_eq!(types.labels, vec!["iPhone 7", "Other Handset Types"]);
        assert_eq!(types.values, vec![1200.0, 40.0]);
        assert_eq!((types.width, types.height), (Some(800), Some(500)));
    }

    #[test]
    fn test_application_pie() {
        let table = SessionTable::new(vec![SessionRecord {
            social_media_volume: Some(10.0),
            google_volume: Some(20.0),
            email_volume: Some(5.0),
            youtube_volume: Some(0.0),
            netflix_volume: Some(0.0),
            gaming_volume: Some(0.0),
            other_volume: Some(0.0),
            handset_type: Some("Apple iPhone 7".into()),
            ..Default::default()
        }]);
        let view = render(Page::Applications, &table);

        let Chart::Pie(pie) = &view.sections[0].chart else {
            panic!("expected a pie");
        };
        assert_eq!(pie.total(), 35.0);
        assert!(pie.values.iter().all(|v| *v >= 0.0));
        assert_eq!(
            pie.labels,
            vec!["Social Media", "Google", "Email", "Youtube", "Netflix", "Gaming", "Other"]
        );
    }

    #[test]
    fn test_handset_app_usage_ranks_by_gaming() {
        let mut records = Vec::new();
        for (i, gaming) in [50.0, 10.0, 70.0, 20.0, 40.0, 30.0, 60.0].iter().enumerate() {
            records.push(SessionRecord {
                handset_type: Some(format!("H{}", i)),
                gaming_volume: Some(*gaming),
                ..Default::default()
            });
        }
        let usage = handset_app_usage(&SessionTable::new(records), TOP_GAMING_HANDSETS).unwrap();
        let keys: Vec<&str> = usage.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["H1", "H3", "H5", "H4", "H0"]);
    }

    #[test]
    fn test_empty_table_renders_placeholders() {
        let table = SessionTable::default();
        for page in Page::ALL {
            let view = render(page, &table);
            assert!(view.sections.iter().all(|s| s.chart.is_placeholder()));
        }
    }
}
