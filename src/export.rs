//! Writers that turn a history snapshot into files.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use log::info;

use crate::error::ExportError;
use crate::record::MeasurementRecord;

pub const CSV_HEADER: [&str; 6] = [
    "Timestamp",
    "Ping (ms)",
    "DNS Lookup",
    "Download Speed (Mbps)",
    "Upload Speed (Mbps)",
    "Speedtest Ping (ms)",
];

pub trait RecordWriter {
    fn write(&self, records: &[MeasurementRecord], out: &mut dyn Write) -> Result<(), ExportError>;
}

/// Tabular export, one row per record.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvWriter;

impl CsvWriter {
    fn escape(field: &str) -> String {
        if field.contains([',', '"', '\n', '\r']) {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn row(record: &MeasurementRecord) -> [String; 6] {
        [
            record.timestamp_text(),
            record.latency.avg_time.map(|t| t.to_string()).unwrap_or_default(),
            if record.resolution.success { "Success" } else { "Failure" }.to_string(),
            record.throughput.download.to_string(),
            record.throughput.upload.to_string(),
            record.throughput.ping.to_string(),
        ]
    }
}

impl RecordWriter for CsvWriter {
    fn write(&self, records: &[MeasurementRecord], out: &mut dyn Write) -> Result<(), ExportError> {
        writeln!(out, "{}", CSV_HEADER.join(","))?;
        for record in records {
            let fields: Vec<String> = Self::row(record).iter().map(|f| Self::escape(f)).collect();
            writeln!(out, "{}", fields.join(","))?;
        }
        Ok(())
    }
}

/// Nested export mirroring the record structure, readable by [`read_json`].
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonWriter;

impl RecordWriter for JsonWriter {
    fn write(&self, records: &[MeasurementRecord], out: &mut dyn Write) -> Result<(), ExportError> {
        serde_json::to_writer_pretty(&mut *out, records)?;
        writeln!(out)?;
        Ok(())
    }
}

pub fn read_json(input: impl Read) -> Result<Vec<MeasurementRecord>, ExportError> {
    Ok(serde_json::from_reader(input)?)
}

/// Write a snapshot of records to `path`.
pub fn export_to_path(
    writer: &dyn RecordWriter,
    records: &[MeasurementRecord],
    path: &Path,
) -> Result<(), ExportError> {
    let mut out = BufWriter::new(File::create(path)?);
    writer.write(records, &mut out)?;
    out.flush()?;
    info!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}
