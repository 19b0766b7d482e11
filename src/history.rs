//! Session history of completed measurement cycles.

use chrono::NaiveDateTime;
use log::warn;

use crate::record::MeasurementRecord;

/// One point of a chart series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// Download and upload rates over time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThroughputSeries {
    pub download: Vec<SeriesPoint>,
    pub upload: Vec<SeriesPoint>,
}

/// Append-only, chronologically ordered log of records.
///
/// Lives for the process lifetime; nothing is removed or edited once stored.
#[derive(Debug, Clone, Default)]
pub struct History {
    records: Vec<MeasurementRecord>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a completed record.
    ///
    /// A record stamped earlier than the latest entry (the wall clock was set
    /// back) is stored with the latest entry's timestamp so order holds.
    pub fn append(&mut self, mut record: MeasurementRecord) {
        if let Some(last) = self.records.last() {
            if record.timestamp < last.timestamp {
                warn!(
                    "Record at {} precedes {}; clamping to keep history ordered",
                    record.timestamp_text(),
                    last.timestamp_text()
                );
                record.timestamp = last.timestamp;
            }
        }
        self.records.push(record);
    }

    pub fn all(&self) -> &[MeasurementRecord] {
        &self.records
    }

    pub fn latest(&self) -> Option<&MeasurementRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Average ping over time; cycles without an average are skipped.
    pub fn latency_series(&self) -> Vec<SeriesPoint> {
        self.records
            .iter()
            .filter_map(|record| {
                record.latency.avg_time.map(|value| SeriesPoint {
                    timestamp: record.timestamp,
                    value,
                })
            })
            .collect()
    }

    pub fn throughput_series(&self) -> ThroughputSeries {
        let point = |record: &MeasurementRecord, value: f64| SeriesPoint {
            timestamp: record.timestamp,
            value,
        };
        ThroughputSeries {
            download: self.records.iter().map(|r| point(r, r.throughput.download)).collect(),
            upload: self.records.iter().map(|r| point(r, r.throughput.upload)).collect(),
        }
    }
}
