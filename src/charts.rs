//! Chart specifications
//!
//! Charts are plain serializable values; the dashboard front-end turns them
//! into Plotly traces.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::aggregate::AggregateTable;
use crate::models::{SessionRecord, SessionTable};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Chart {
    Pie(PieChart),
    Treemap(Treemap),
    Table(DataTable),
    /// Shown instead of a chart that has nothing to plot
    Placeholder { message: String },
}

impl Chart {
    pub fn placeholder(message: impl Into<String>) -> Self {
        Chart::Placeholder { message: message.into() }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Chart::Placeholder { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub names_label: String,
    pub values_label: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl PieChart {
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Margin {
    pub t: u32,
    pub l: u32,
    pub r: u32,
    pub b: u32,
}

/// Flattened hierarchy in Plotly's ids/parents form; inner nodes carry the
/// sum of their children
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Treemap {
    pub ids: Vec<String>,
    pub labels: Vec<String>,
    pub parents: Vec<String>,
    pub values: Vec<f64>,
    pub branchvalues: &'static str,
    pub root_color: String,
    pub margin: Margin,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Value>,
}

/// Pie chart of an aggregate table: one slice per row
pub fn pie(table: &AggregateTable, size: Option<(u32, u32)>) -> Chart {
    if table.is_empty() {
        return Chart::placeholder(format!("No data for {}", table.group_column));
    }

    let (labels, values) = table
        .rows
        .iter()
        .map(|row| (row.key.clone(), row.value.unwrap_or(0.0).max(0.0)))
        .unzip();

    Chart::Pie(PieChart {
        names_label: table.group_column.clone(),
        values_label: table.result_column.clone(),
        labels,
        values,
        width: size.map(|(w, _)| w),
        height: size.map(|(_, h)| h),
    })
}

/// Treemap of `root -> outer -> inner`, leaves sized by row count.
/// Rows missing either level are skipped.
pub fn count_treemap<'a, F>(table: &'a SessionTable, root: &str, levels: F) -> Chart
where
    F: Fn(&'a SessionRecord) -> Option<(&'a str, &'a str)>,
{
    let mut counts: BTreeMap<&str, BTreeMap<&str, u64>> = BTreeMap::new();
    for record in table.records() {
        if let Some((outer, inner)) = levels(record) {
            *counts.entry(outer).or_default().entry(inner).or_insert(0) += 1;
        }
    }

    if counts.is_empty() {
        return Chart::placeholder(format!("No data for {}", root));
    }

    let mut map = Treemap {
        ids: vec![root.to_string()],
        labels: vec![root.to_string()],
        parents: vec![String::new()],
        values: vec![0.0],
        branchvalues: "total",
        root_color: "lightgrey".to_string(),
        margin: Margin { t: 50, l: 25, r: 25, b: 25 },
    };

    let mut grand_total = 0.0;
    for (outer, children) in &counts {
        let outer_id = format!("{}/{}", root, outer);
        let outer_total: u64 = children.values().sum();
        grand_total += outer_total as f64;

        map.ids.push(outer_id.clone());
        map.labels.push(outer.to_string());
        map.parents.push(root.to_string());
        map.values.push(outer_total as f64);

        for (inner, count) in children {
            map.ids.push(format!("{}/{}", outer_id, inner));
            map.labels.push(inner.to_string());
            map.parents.push(outer_id.clone());
            map.values.push(*count as f64);
        }
    }
    map.values[0] = grand_total;

    Chart::Treemap(map)
}
