//! CSV export for node snapshots.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::grid::NodeSnapshot;

/// Column header for node snapshot export.
const HEADER: &str = "node_id,region,load_mw,capacity_mw,utilization_pct,available_mw";

/// Exports a node snapshot to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(nodes: &[NodeSnapshot], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_csv(nodes, io::BufWriter::new(file))
}

/// Writes a node snapshot as CSV to any writer, one row per node in grid order.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(nodes: &[NodeSnapshot], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER.split(','))?;

    for n in nodes {
        wtr.write_record(&[
            n.node_id.clone(),
            n.region.clone(),
            format!("{:.4}", n.load),
            format!("{:.4}", n.capacity),
            format!("{:.2}", n.utilization),
            format!("{:.4}", n.available),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
