//! Group-by helpers over the session table
//!
//! `aggregate` is the generic one-column reduction used by the views and the
//! `/api/v1/aggregate` endpoint. `sum_by` totals several columns per group.

use serde::Serialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::{AggregateError, ParseError};
use crate::models::{Cell, Column, SessionTable};

/// Reduction applied to the metric column of each group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFn {
    /// Non-missing metric cells
    Count,
    /// Rows in the group
    Size,
    Sum,
    Mean,
    Min,
    Max,
}

impl AggFn {
    pub fn name(self) -> &'static str {
        match self {
            AggFn::Count => "count",
            AggFn::Size => "size",
            AggFn::Sum => "sum",
            AggFn::Mean => "mean",
            AggFn::Min => "min",
            AggFn::Max => "max",
        }
    }

    fn needs_numbers(self) -> bool {
        !matches!(self, AggFn::Count | AggFn::Size)
    }
}

impl fmt::Display for AggFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AggFn {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "count" => Ok(AggFn::Count),
            "size" => Ok(AggFn::Size),
            "sum" => Ok(AggFn::Sum),
            "mean" | "avg" => Ok(AggFn::Mean),
            "min" => Ok(AggFn::Min),
            "max" => Ok(AggFn::Max),
            _ => Err(ParseError::UnknownAggregation(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub key: String,
    pub value: Option<f64>,
}

/// Two-column result: group key and reduced value
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateTable {
    pub group_column: String,
    pub result_column: String,
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    pub fn empty(group_column: impl Into<String>, result_column: impl Into<String>) -> Self {
        Self {
            group_column: group_column.into(),
            result_column: result_column.into(),
            rows: Vec::new(),
        }
    }

    pub fn headers(&self) -> [&str; 2] {
        [&self.group_column, &self.result_column]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.rows.iter().filter_map(|r| r.value).sum()
    }

    /// Rows as JSON objects keyed by the two headers
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut object = Map::new();
                object.insert(self.group_column.clone(), Value::String(row.key.clone()));
                object.insert(self.result_column.clone(), json_number(row.value));
                Value::Object(object)
            })
            .collect()
    }

    fn sort(&mut self, ascending: bool) {
        // stable: equal values keep group key order
        self.rows.sort_by(|a, b| compare(a.value, b.value, ascending));
    }
}

/// Missing values sort last in either direction
fn compare(a: Option<f64>, b: Option<f64>, ascending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => {
            let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            if ascending { ord } else { ord.reverse() }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Whole numbers serialize as JSON integers so counts read naturally
fn json_number(value: Option<f64>) -> Value {
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < 9.0e15 => Value::from(v as i64),
        Some(v) => serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number),
        None => Value::Null,
    }
}

#[derive(Default)]
struct Accumulator {
    size: usize,
    count: usize,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl Accumulator {
    fn push(&mut self, cell: Cell<'_>) {
        self.size += 1;
        match cell {
            Cell::Number(n) => {
                self.count += 1;
                self.sum += n;
                self.min = Some(self.min.map_or(n, |m| m.min(n)));
                self.max = Some(self.max.map_or(n, |m| m.max(n)));
            }
            Cell::Text(_) => self.count += 1,
            Cell::Missing => {}
        }
    }

    fn finish(&self, function: AggFn) -> Option<f64> {
        match function {
            AggFn::Count => Some(self.count as f64),
            AggFn::Size => Some(self.size as f64),
            AggFn::Sum => Some(self.sum),
            AggFn::Mean => (self.count > 0).then(|| self.sum / self.count as f64),
            AggFn::Min => self.min,
            AggFn::Max => self.max,
        }
    }
}

/// Group value; numbers order numerically and text by bytes
#[derive(Debug, Clone, PartialEq)]
enum GroupKey {
    Number(f64),
    Text(String),
}

impl GroupKey {
    fn from_cell(cell: Cell<'_>) -> Option<Self> {
        match cell {
            Cell::Text(s) => Some(GroupKey::Text(s.to_string())),
            Cell::Number(n) => Some(GroupKey::Number(n)),
            Cell::Missing => None,
        }
    }

    fn into_label(self) -> String {
        match self {
            GroupKey::Number(n) => n.to_string(),
            GroupKey::Text(s) => s,
        }
    }
}

impl Eq for GroupKey {}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (GroupKey::Number(a), GroupKey::Number(b)) => a.total_cmp(b),
            (GroupKey::Text(a), GroupKey::Text(b)) => a.cmp(b),
            (GroupKey::Number(_), GroupKey::Text(_)) => Ordering::Less,
            (GroupKey::Text(_), GroupKey::Number(_)) => Ordering::Greater,
        }
    }
}

/// Group `table` by `group`, reduce `metric` with `function` and sort by the
/// result. Groups start in key order, so ties keep that order. Rows with a
/// missing group value are left out.
pub fn aggregate(
    table: &SessionTable,
    group: Column,
    metric: Column,
    function: AggFn,
    result_name: &str,
    ascending: bool,
) -> Result<AggregateTable, AggregateError> {
    if function.needs_numbers() && metric.is_text() {
        return Err(AggregateError::NonNumericMetric {
            column: metric.name(),
            function: function.name(),
        });
    }

    let mut groups: BTreeMap<GroupKey, Accumulator> = BTreeMap::new();
    for record in table.records() {
        let Some(key) = GroupKey::from_cell(record.get(group)) else {
            continue;
        };
        groups.entry(key).or_default().push(record.get(metric));
    }

    let mut result = AggregateTable {
        group_column: group.name().to_string(),
        result_column: result_name.to_string(),
        rows: groups
            .into_iter()
            .map(|(key, acc)| AggregateRow {
                key: key.into_label(),
                value: acc.finish(function),
            })
            .collect(),
    };
    result.sort(ascending);

    Ok(result)
}

/// Relabel every row whose value is below `threshold` to `other_label`, then
/// merge rows sharing a label by summing. Labels keep first-encounter order.
pub fn bucket_small_groups(counts: &AggregateTable, threshold: f64, other_label: &str) -> AggregateTable {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<AggregateRow> = Vec::new();

    for row in &counts.rows {
        let label = match row.value {
            Some(v) if v < threshold => other_label,
            _ => row.key.as_str(),
        };
        match index.get(label) {
            Some(&slot) => {
                let merged = &mut rows[slot];
                merged.value = match (merged.value, row.value) {
                    (Some(a), Some(b)) => Some(a + b),
                    (a, b) => a.or(b),
                };
            }
            None => {
                index.insert(label.to_string(), rows.len());
                rows.push(AggregateRow {
                    key: label.to_string(),
                    value: row.value,
                });
            }
        }
    }

    AggregateTable {
        group_column: counts.group_column.clone(),
        result_column: counts.result_column.clone(),
        rows,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedRow {
    pub key: String,
    pub totals: Vec<f64>,
}

/// Per-group totals of several numeric columns
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedSums {
    pub group_column: Column,
    pub columns: Vec<Column>,
    pub rows: Vec<GroupedRow>,
}

impl GroupedSums {
    /// Stable sort on one of the summed columns
    pub fn sort_by_column(&mut self, column: Column, ascending: bool) {
        let Some(pos) = self.columns.iter().position(|c| *c == column) else {
            return;
        };
        self.rows
            .sort_by(|a, b| compare(Some(a.totals[pos]), Some(b.totals[pos]), ascending));
    }

    pub fn head(mut self, n: usize) -> Self {
        self.rows.truncate(n);
        self
    }

    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut object = Map::new();
                object.insert(self.group_column.name().to_string(), Value::String(row.key.clone()));
                for (column, total) in self.columns.iter().zip(&row.totals) {
                    object.insert(column.name().to_string(), json_number(Some(*total)));
                }
                Value::Object(object)
            })
            .collect()
    }
}

/// Sum each of `columns` within every group of `group`, groups ordered by key
pub fn sum_by(table: &SessionTable, group: Column, columns: &[Column]) -> Result<GroupedSums, AggregateError> {
    if let Some(text) = columns.iter().find(|c| c.is_text()) {
        return Err(AggregateError::NonNumericMetric {
            column: text.name(),
            function: AggFn::Sum.name(),
        });
    }

    let mut groups: BTreeMap<GroupKey, Vec<f64>> = BTreeMap::new();
    for record in table.records() {
        let Some(key) = GroupKey::from_cell(record.get(group)) else {
            continue;
        };
        let totals = groups.entry(key).or_insert_with(|| vec![0.0; columns.len()]);
        for (total, column) in totals.iter_mut().zip(columns) {
            if let Cell::Number(n) = record.get(*column) {
                *total += n;
            }
        }
    }

    Ok(GroupedSums {
        group_column: group,
        columns: columns.to_vec(),
        rows: groups
            .into_iter()
            .map(|(key, totals)| GroupedRow { key: key.into_label(), totals })
            .collect(),
    })
}
