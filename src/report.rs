use std::fmt::Write as _;

use crate::interpret::{interpret_latency, interpret_resolution, interpret_throughput};
use crate::record::MeasurementRecord;

/// Text block shown in the results pane after a cycle.
pub fn render_record(record: &MeasurementRecord) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "Test Time: {}\n", record.timestamp_text());

    let _ = writeln!(text, "Ping Test Results:");
    let _ = writeln!(text, "{}", record.latency.output.trim_end());
    let _ = writeln!(text, "Interpretation: {}\n", interpret_latency(&record.latency));

    let _ = writeln!(text, "DNS Lookup Results:");
    let _ = writeln!(text, "{}", record.resolution.output);
    let _ = writeln!(text, "Interpretation: {}\n", interpret_resolution(&record.resolution));

    let throughput = &record.throughput;
    let _ = writeln!(text, "Speed Test Results:");
    let _ = writeln!(text, "Download Speed: {:.2} Mbps", throughput.download);
    let _ = writeln!(text, "Upload Speed: {:.2} Mbps", throughput.upload);
    let _ = writeln!(text, "Ping: {:.2} ms", throughput.ping);
    let _ = writeln!(text, "Interpretation: {}", interpret_throughput(throughput));
    text
}
