//! Shared dashboard logic
//!
//! The service owns the session table loaded at startup and is shared by the
//! REST handlers and the CLI.

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

use crate::aggregate::{self, AggFn, AggregateTable};
use crate::error::QueryError;
use crate::loader;
use crate::models::{Column, SessionTable};
use crate::views::{self, Page, PageView};

// ============================================================================
// Data Structures
// ============================================================================

/// Ad hoc aggregation request; names are parsed into columns and functions
#[derive(Debug, Clone, Deserialize)]
pub struct AggregateQuery {
    pub group: String,
    pub metric: String,
    #[serde(default = "default_agg")]
    pub agg: String,
    pub name: Option<String>,
    #[serde(default)]
    pub ascending: bool,
    pub limit: Option<usize>,
}

fn default_agg() -> String {
    AggFn::Count.name().to_string()
}

#[derive(Debug, Clone)]
pub struct TableSummary {
    pub rows: usize,
    pub columns: Vec<&'static str>,
    pub manufacturers: usize,
    pub handset_types: usize,
    pub total_data_volume: f64,
}

// ============================================================================
// Dashboard Service
// ============================================================================

pub struct DashboardService {
    table: SessionTable,
}

impl DashboardService {
    pub fn new(table: SessionTable) -> Self {
        Self { table }
    }

    /// Load the table once; any load error is fatal to the caller
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(loader::load(path)?))
    }

    pub fn table(&self) -> &SessionTable {
        &self.table
    }

    pub fn pages(&self) -> Vec<Page> {
        Page::ALL.to_vec()
    }

    pub fn render_page(&self, page: Page) -> PageView {
        views::render(page, &self.table)
    }

    pub fn summary(&self) -> TableSummary {
        let distinct = |column| {
            aggregate::aggregate(&self.table, column, column, AggFn::Size, "n", false)
                .map(|t| t.len())
                .unwrap_or(0)
        };

        TableSummary {
            rows: self.table.len(),
            columns: self.table.headers(),
            manufacturers: distinct(Column::HandsetManufacturer),
            handset_types: distinct(Column::HandsetType),
            total_data_volume: self.table.column_total(Column::TotalDataVolume),
        }
    }

    pub fn aggregate(&self, query: &AggregateQuery) -> Result<AggregateTable, QueryError> {
        let group: Column = query.group.parse()?;
        let metric: Column = query.metric.parse()?;
        let function: AggFn = query.agg.parse()?;
        let name = query.name.as_deref().unwrap_or(function.name());

        let mut result = aggregate::aggregate(&self.table, group, metric, function, name, query.ascending)?;
        if let Some(limit) = query.limit {
            result.rows.truncate(limit);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AggregateError, ParseError};
    use crate::models::SessionRecord;

    fn service() -> DashboardService {
        let record = |m: &str, t: &str, volume: f64| SessionRecord {
            handset_manufacturer: Some(m.into()),
            handset_type: Some(t.into()),
            total_data_volume: Some(volume),
            ..Default::default()
        };
        DashboardService::new(SessionTable::new(vec![
            record("Apple", "A", 10.0),
            record("Apple", "A", 20.0),
            record("Samsung", "B", 5.0),
        ]))
    }

    fn query(group: &str, metric: &str, agg: &str) -> AggregateQuery {
        AggregateQuery {
            group: group.into(),
            metric: metric.into(),
            agg: agg.into(),
            name: None,
            ascending: false,
            limit: None,
        }
    }

    #[test]
    fn test_summary() {
        let summary = service().summary();
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.columns.len(), 18);
        assert_eq!(summary.manufacturers, 2);
        assert_eq!(summary.handset_types, 2);
        assert_eq!(summary.total_data_volume, 35.0);
    }

    #[test]
    fn test_aggregate_query() {
        let mut q = query("Handset Manufacturer", "TotalDataVolume", "sum");
        q.name = Some("bytes".into());
        q.limit = Some(1);
        let result = service().aggregate(&q).unwrap();
        assert_eq!(result.headers(), ["HandsetManufacturer", "bytes"]);
        assert_eq!(result.len(), 1);
        assert_eq!(result.rows[0].value, Some(30.0));
    }

    #[test]
    fn test_aggregate_query_errors() {
        let svc = service();
        assert_eq!(
            svc.aggregate(&query("Handset", "HandsetType", "count")).unwrap_err(),
            QueryError::Parse(ParseError::UnknownColumn("Handset".into()))
        );
        assert_eq!(
            svc.aggregate(&query("HandsetType", "HandsetType", "median")).unwrap_err(),
            QueryError::Parse(ParseError::UnknownAggregation("median".into()))
        );
        assert!(matches!(
            svc.aggregate(&query("HandsetType", "IMEI", "mean")).unwrap_err(),
            QueryError::Aggregate(AggregateError::NonNumericMetric { .. })
        ));
    }
}
