use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes serializable rows as CSV, one row per record
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    rows: u64,
}

impl CsvSink<BufWriter<File>> {
    /// Create (or truncate) a CSV file, creating parent directories
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let file = File::create(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;
        Ok(CsvSink::new(BufWriter::new(file)))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        CsvSink {
            writer: csv::Writer::from_writer(writer),
            rows: 0,
        }
    }

    pub fn write_row<T: Serialize>(&mut self, row: &T) -> Result<()> {
        self.writer.serialize(row).context("Failed to write CSV row")?;
        self.rows += 1;
        Ok(())
    }

    pub fn write_rows<'a, T, I>(&mut self, rows: I) -> Result<()>
    where
        T: Serialize + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush CSV writer")
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))
    }
}

/// Write one JSON document to a file
pub fn write_json_document<T: Serialize, P: AsRef<Path>>(path: P, doc: &T, pretty: bool) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    let written = if pretty {
        serde_json::to_writer_pretty(&mut writer, doc)
    } else {
        serde_json::to_writer(&mut writer, doc)
    };
    written.context("Failed to serialize JSON document")?;

    writer.flush().context("Failed to flush JSON document")
}

/// Read a headed CSV file as loosely typed records.
///
/// Every cell becomes a JSON string, so the same coercion helpers work on
/// CSV rows and decoded dump objects.
pub fn read_csv_records<P: AsRef<Path>>(path: P) -> Result<Vec<Map<String, Value>>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV: {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("CSV has no header row: {}", path.display()))?
        .clone();

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("Bad CSV row {} in {}", line + 2, path.display()))?;
        let record: Map<String, Value> = headers
            .iter()
            .zip(row.iter())
            .map(|(h, cell)| (h.to_string(), Value::String(cell.to_string())))
            .collect();
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Row {
        name: &'static str,
        id: Option<i64>,
    }

    #[test]
    fn test_csv_sink_writes_header_and_blanks() {
        let mut sink = CsvSink::new(Vec::new());
        sink.write_rows(&[Row { name: "Sol", id: Some(27) }, Row { name: "Lost", id: None }])
            .unwrap();
        assert_eq!(sink.rows(), 2);

        let output = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(output, "name,id\nSol,27\nLost,\n");
    }

    #[test]
    fn test_read_csv_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        std::fs::write(&path, "systemName,systemId\nSol,27\nPolaris,\n").unwrap();

        let records = read_csv_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["systemId"], "27");
        assert_eq!(records[1]["systemId"], "");
    }

    #[test]
    fn test_write_json_document_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.json");

        write_json_document(&path, &serde_json::json!({"sources": []}), false).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"{"sources":[]}"#);
    }
}
