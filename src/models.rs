use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// The 18 columns of the loaded session table, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    BearerId,
    DurationMs,
    Imsi,
    Msisdn,
    Imei,
    TotalAvgRttMs,
    TotalAvgBearerTpKbps,
    TotalTcpRetransVolBytes,
    HandsetManufacturer,
    HandsetType,
    SocialMediaVolume,
    GoogleVolume,
    EmailVolume,
    YoutubeVolume,
    NetflixVolume,
    GamingVolume,
    OtherVolume,
    TotalDataVolume,
}

impl Column {
    pub const ALL: [Column; 18] = [
        Column::BearerId,
        Column::DurationMs,
        Column::Imsi,
        Column::Msisdn,
        Column::Imei,
        Column::TotalAvgRttMs,
        Column::TotalAvgBearerTpKbps,
        Column::TotalTcpRetransVolBytes,
        Column::HandsetManufacturer,
        Column::HandsetType,
        Column::SocialMediaVolume,
        Column::GoogleVolume,
        Column::EmailVolume,
        Column::YoutubeVolume,
        Column::NetflixVolume,
        Column::GamingVolume,
        Column::OtherVolume,
        Column::TotalDataVolume,
    ];

    /// Per-application volume columns, in display order
    pub const APPLICATIONS: [Column; 7] = [
        Column::SocialMediaVolume,
        Column::GoogleVolume,
        Column::EmailVolume,
        Column::YoutubeVolume,
        Column::NetflixVolume,
        Column::GamingVolume,
        Column::OtherVolume,
    ];

    /// Canonical header used in exports and API responses
    pub fn name(self) -> &'static str {
        match self {
            Column::BearerId => "BearerId",
            Column::DurationMs => "Duration(ms)",
            Column::Imsi => "IMSI",
            Column::Msisdn => "MSISDN",
            Column::Imei => "IMEI",
            Column::TotalAvgRttMs => "TotalAvgRTT(ms)",
            Column::TotalAvgBearerTpKbps => "TotalAvgBearerTP(kbps)",
            Column::TotalTcpRetransVolBytes => "TotalTCPRetransVol(Bytes)",
            Column::HandsetManufacturer => "HandsetManufacturer",
            Column::HandsetType => "HandsetType",
            Column::SocialMediaVolume => "SocialMediaVolume",
            Column::GoogleVolume => "GoogleVolume",
            Column::EmailVolume => "EmailVolume",
            Column::YoutubeVolume => "YoutubeVolume",
            Column::NetflixVolume => "NetflixVolume",
            Column::GamingVolume => "GamingVolume",
            Column::OtherVolume => "OtherVolume",
            Column::TotalDataVolume => "TotalDataVolume",
        }
    }

    /// Human label in the vocabulary of the xDR dataset
    pub fn label(self) -> &'static str {
        match self {
            Column::BearerId => "Bearer Id",
            Column::DurationMs => "Dur. (ms)",
            Column::Imsi => "IMSI",
            Column::Msisdn => "MSISDN/Number",
            Column::Imei => "IMEI",
            Column::TotalAvgRttMs => "Total Avg RTT (ms)",
            Column::TotalAvgBearerTpKbps => "Total Avg Bearer TP (kbps)",
            Column::TotalTcpRetransVolBytes => "Total TCP Retrans. Vol (Bytes)",
            Column::HandsetManufacturer => "Handset Manufacturer",
            Column::HandsetType => "Handset Type",
            Column::SocialMediaVolume => "Social Media Data Volume (Bytes)",
            Column::GoogleVolume => "Google Data Volume (Bytes)",
            Column::EmailVolume => "Email Data Volume (Bytes)",
            Column::YoutubeVolume => "Youtube Data Volume (Bytes)",
            Column::NetflixVolume => "Netflix Data Volume (Bytes)",
            Column::GamingVolume => "Gaming Data Volume (Bytes)",
            Column::OtherVolume => "Other Data Volume (Bytes)",
            Column::TotalDataVolume => "Total Data Volume (Bytes)",
        }
    }

    pub fn is_text(self) -> bool {
        matches!(
            self,
            Column::BearerId
                | Column::Imsi
                | Column::Msisdn
                | Column::Imei
                | Column::HandsetManufacturer
                | Column::HandsetType
        )
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::ALL
            .into_iter()
            .find(|c| c.name() == s || c.label() == s)
            .ok_or_else(|| ParseError::UnknownColumn(s.to_string()))
    }
}

/// A borrowed cell of the session table
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Number(f64),
    Text(&'a str),
    Missing,
}

impl Cell<'_> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

impl fmt::Display for Cell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
            Cell::Missing => Ok(()),
        }
    }
}

/// One bearer (session) after derivation and projection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionRecord {
    pub bearer_id: Option<String>,
    pub duration_ms: Option<f64>,
    pub imsi: Option<String>,
    pub msisdn: Option<String>,
    pub imei: Option<String>,
    pub total_avg_rtt_ms: Option<f64>,
    pub total_avg_bearer_tp_kbps: Option<f64>,
    pub total_tcp_retrans_vol_bytes: Option<f64>,
    pub handset_manufacturer: Option<String>,
    pub handset_type: Option<String>,
    pub social_media_volume: Option<f64>,
    pub google_volume: Option<f64>,
    pub email_volume: Option<f64>,
    pub youtube_volume: Option<f64>,
    pub netflix_volume: Option<f64>,
    pub gaming_volume: Option<f64>,
    pub other_volume: Option<f64>,
    pub total_data_volume: Option<f64>,
}

impl SessionRecord {
    pub fn get(&self, column: Column) -> Cell<'_> {
        fn text(v: &Option<String>) -> Cell<'_> {
            v.as_deref().map_or(Cell::Missing, Cell::Text)
        }
        fn number(v: Option<f64>) -> Cell<'static> {
            v.map_or(Cell::Missing, Cell::Number)
        }

        match column {
            Column::BearerId => text(&self.bearer_id),
            Column::DurationMs => number(self.duration_ms),
            Column::Imsi => text(&self.imsi),
            Column::Msisdn => text(&self.msisdn),
            Column::Imei => text(&self.imei),
            Column::TotalAvgRttMs => number(self.total_avg_rtt_ms),
            Column::TotalAvgBearerTpKbps => number(self.total_avg_bearer_tp_kbps),
            Column::TotalTcpRetransVolBytes => number(self.total_tcp_retrans_vol_bytes),
            Column::HandsetManufacturer => text(&self.handset_manufacturer),
            Column::HandsetType => text(&self.handset_type),
            Column::SocialMediaVolume => number(self.social_media_volume),
            Column::GoogleVolume => number(self.google_volume),
            Column::EmailVolume => number(self.email_volume),
            Column::YoutubeVolume => number(self.youtube_volume),
            Column::NetflixVolume => number(self.netflix_volume),
            Column::GamingVolume => number(self.gaming_volume),
            Column::OtherVolume => number(self.other_volume),
            Column::TotalDataVolume => number(self.total_data_volume),
        }
    }
}

/// The loaded session table. Immutable once built by the loader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionTable {
    records: Vec<SessionRecord>,
}

impl SessionTable {
    pub fn new(records: Vec<SessionRecord>) -> Self {
        Self { records }
    }

    pub fn headers(&self) -> Vec<&'static str> {
        Column::ALL.iter().map(|c| c.name()).collect()
    }

    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column(&self, column: Column) -> impl Iterator<Item = Cell<'_>> + '_ {
        self.records.iter().map(move |r| r.get(column))
    }

    /// Sum of the non-missing numeric cells of a column
    pub fn column_total(&self, column: Column) -> f64 {
        self.column(column)
            .filter_map(|c| match c {
                Cell::Number(n) => Some(n),
                _ => None,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_parses_name_and_label() {
        assert_eq!("HandsetType".parse::<Column>().unwrap(), Column::HandsetType);
        assert_eq!("Handset Type".parse::<Column>().unwrap(), Column::HandsetType);
        assert_eq!("Duration(ms)".parse::<Column>().unwrap(), Column::DurationMs);
        assert!("handsettype".parse::<Column>().is_err());
    }

    #[test]
    fn test_eighteen_unique_headers() {
        let table = SessionTable::default();
        let mut headers = table.headers();
        assert_eq!(headers.len(), 18);
        headers.sort();
        headers.dedup();
        assert_eq!(headers.len(), 18);
    }

    #[test]
    fn test_cells_follow_column_kind() {
        let record = SessionRecord {
            handset_type: Some("Apple iPhone 6S (A1688)".into()),
            gaming_volume: Some(42.0),
            ..Default::default()
        };
        assert_eq!(record.get(Column::HandsetType), Cell::Text("Apple iPhone 6S (A1688)"));
        assert_eq!(record.get(Column::GamingVolume), Cell::Number(42.0));
        assert!(record.get(Column::Imei).is_missing());
        for column in Column::ALL {
            if !column.is_text() {
                assert!(!matches!(record.get(column), Cell::Text(_)));
            }
        }
    }

    #[test]
    fn test_column_total_skips_missing() {
        let table = SessionTable::new(vec![
            SessionRecord { email_volume: Some(5.0), ..Default::default() },
            SessionRecord::default(),
            SessionRecord { email_volume: Some(2.5), ..Default::default() },
        ]);
        assert_eq!(table.column_total(Column::EmailVolume), 7.5);
    }
}
