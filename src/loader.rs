//! Session table loader
//!
//! Reads the cleaned xDR export, derives the uplink + downlink totals and
//! projects the result down to the 18 dashboard columns.

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::error::LoadError;
use crate::models::{Column, SessionRecord, SessionTable};

pub const DEFAULT_DATA_PATH: &str = "data/clean_data.csv";

/// Source columns copied as-is, keyed by their output column
const PASSTHROUGH: [(Column, &str); 7] = [
    (Column::BearerId, "Bearer Id"),
    (Column::DurationMs, "Dur. (ms)"),
    (Column::Imsi, "IMSI"),
    (Column::Msisdn, "MSISDN/Number"),
    (Column::Imei, "IMEI"),
    (Column::HandsetManufacturer, "Handset Manufacturer"),
    (Column::HandsetType, "Handset Type"),
];

/// Output columns computed as the sum of two source columns
const DERIVED: [(Column, &str, &str); 11] = [
    (Column::TotalAvgRttMs, "Avg RTT DL (ms)", "Avg RTT UL (ms)"),
    (Column::TotalAvgBearerTpKbps, "Avg Bearer TP DL (kbps)", "Avg Bearer TP UL (kbps)"),
    (Column::TotalTcpRetransVolBytes, "TCP DL Retrans. Vol (Bytes)", "TCP UL Retrans. Vol (Bytes)"),
    (Column::TotalDataVolume, "Total UL (Bytes)", "Total DL (Bytes)"),
    (Column::SocialMediaVolume, "Social Media UL (Bytes)", "Social Media DL (Bytes)"),
    (Column::GoogleVolume, "Google UL (Bytes)", "Google DL (Bytes)"),
    (Column::EmailVolume, "Email UL (Bytes)", "Email DL (Bytes)"),
    (Column::YoutubeVolume, "Youtube UL (Bytes)", "Youtube DL (Bytes)"),
    (Column::NetflixVolume, "Netflix UL (Bytes)", "Netflix DL (Bytes)"),
    (Column::GamingVolume, "Gaming UL (Bytes)", "Gaming DL (Bytes)"),
    (Column::OtherVolume, "Other UL (Bytes)", "Other DL (Bytes)"),
];

/// Cell contents read as missing, on top of the empty string
const MISSING_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || MISSING_TOKENS.contains(&trimmed)
}

/// Every column name the source header must contain, in source-file order
pub fn required_source_columns() -> Vec<&'static str> {
    let mut columns: Vec<&'static str> = PASSTHROUGH.iter().map(|(_, name)| *name).collect();
    for (_, first, second) in DERIVED {
        columns.push(first);
        columns.push(second);
    }
    columns
}

/// Load the session table from a CSV file
pub fn load(path: impl AsRef<Path>) -> Result<SessionTable, LoadError> {
    let path = path.as_ref();
    info!("Reading xDR data from {:?}", path);

    let file = File::open(path).map_err(|source| LoadError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;

    let table = load_from_reader(BufReader::new(file))?;
    info!("Loaded {} sessions", table.len());
    Ok(table)
}

/// Load the session table from any CSV byte stream
pub fn load_from_reader<R: Read>(reader: R) -> Result<SessionTable, LoadError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = reader.headers()?.clone();
    let index = SourceIndex::resolve(&headers)?;
    debug!("Resolved {} source columns out of {}", index.width(), headers.len());

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row?;
        records.push(index.derive(&row, i + 1)?);
    }

    Ok(SessionTable::new(records))
}

/// Write the table as CSV with the canonical 18 headers
pub fn export<W: Write>(table: &SessionTable, writer: W) -> Result<(), csv::Error> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer.write_record(table.headers())?;

    let mut line = Vec::with_capacity(Column::ALL.len());
    for record in table.records() {
        line.clear();
        line.extend(Column::ALL.iter().map(|c| record.get(*c).to_string()));
        writer.write_record(&line)?;
    }

    writer.flush()?;
    Ok(())
}

/// Header positions of every source column the loader needs
struct SourceIndex {
    passthrough: Vec<(Column, Source)>,
    derived: Vec<(Column, Source, Source)>,
}

#[derive(Clone, Copy)]
struct Source {
    name: &'static str,
    idx: usize,
}

impl Source {
    fn number(self, row: &StringRecord, line: usize) -> Result<Option<f64>, LoadError> {
        parse_number(row.get(self.idx).unwrap_or(""), line, self.name)
    }
}

impl SourceIndex {
    fn resolve(headers: &StringRecord) -> Result<Self, LoadError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .map(|idx| Source { name, idx })
                .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
        };

        let passthrough = PASSTHROUGH
            .iter()
            .map(|&(column, name)| Ok((column, find(name)?)))
            .collect::<Result<Vec<_>, LoadError>>()?;
        let derived = DERIVED
            .iter()
            .map(|&(column, first, second)| Ok((column, find(first)?, find(second)?)))
            .collect::<Result<Vec<_>, LoadError>>()?;

        Ok(Self { passthrough, derived })
    }

    fn width(&self) -> usize {
        self.passthrough.len() + self.derived.len() * 2
    }

    fn derive(&self, row: &StringRecord, line: usize) -> Result<SessionRecord, LoadError> {
        let mut record = SessionRecord::default();

        for &(column, source) in &self.passthrough {
            if column.is_text() {
                let raw = row.get(source.idx).unwrap_or("");
                let value = (!is_missing(raw)).then(|| raw.to_string());
                set_text(&mut record, column, value);
            } else {
                set_number(&mut record, column, source.number(row, line)?);
            }
        }

        for &(column, first, second) in &self.derived {
            let total = match (first.number(row, line)?, second.number(row, line)?) {
                (Some(a), Some(b)) => Some(a + b),
                _ => None,
            };
            set_number(&mut record, column, total);
        }

        Ok(record)
    }
}

fn parse_number(raw: &str, row: usize, column: &'static str) -> Result<Option<f64>, LoadError> {
    if is_missing(raw) {
        return Ok(None);
    }
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(LoadError::InvalidNumber {
            row,
            column,
            value: raw.to_string(),
        }),
    }
}

fn set_text(record: &mut SessionRecord, column: Column, value: Option<String>) {
    match column {
        Column::BearerId => record.bearer_id = value,
        Column::Imsi => record.imsi = value,
        Column::Msisdn => record.msisdn = value,
        Column::Imei => record.imei = value,
        Column::HandsetManufacturer => record.handset_manufacturer = value,
        Column::HandsetType => record.handset_type = value,
        _ => {}
    }
}

fn set_number(record: &mut SessionRecord, column: Column, value: Option<f64>) {
    match column {
        Column::DurationMs => record.duration_ms = value,
        Column::TotalAvgRttMs => record.total_avg_rtt_ms = value,
        Column::TotalAvgBearerTpKbps => record.total_avg_bearer_tp_kbps = value,
        Column::TotalTcpRetransVolBytes => record.total_tcp_retrans_vol_bytes = value,
        Column::SocialMediaVolume => record.social_media_volume = value,
        Column::GoogleVolume => record.google_volume = value,
        Column::EmailVolume => record.email_volume = value,
        Column::YoutubeVolume => record.youtube_volume = value,
        Column::NetflixVolume => record.netflix_volume = value,
        Column::GamingVolume => record.gaming_volume = value,
        Column::OtherVolume => record.other_volume = value,
        Column::TotalDataVolume => record.total_data_volume = value,
        _ => {}
    }
}
