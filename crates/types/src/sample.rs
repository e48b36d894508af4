//! Dataset sampling helpers.
//!
//! Row data is streamed from the platform as Excel-dialect TSV without a
//! header line. [`TsvRowDecoder`] consumes arbitrary byte chunks and yields
//! complete records, so callers can stop reading as soon as enough rows have
//! been collected.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_SAMPLE_ROWS: i64 = 50;
pub const MAX_SAMPLE_ROWS: i64 = 1000;

/// Clamp a requested sample size into `1..=MAX_SAMPLE_ROWS`.
pub fn clamp_sample_rows(requested: i64) -> usize {
    // Bounded to 1..=1000, so the cast cannot truncate.
    requested.clamp(1, MAX_SAMPLE_ROWS) as usize
}

/// Split a comma-separated partition list, trimming each entry.
///
/// Returns `None` for an absent or blank partition list.
pub fn parse_partitions(partitions: Option<&str>) -> Option<Vec<String>> {
    let raw = partitions?;
    if raw.trim().is_empty() {
        return None;
    }
    Some(raw.split(',').map(|partition| partition.trim().to_string()).collect())
}

/// Sample returned by `get_dataset_sample`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSample {
    pub project_key: String,
    pub dataset_name: String,
    pub num_rows_requested: usize,
    pub num_rows_returned: usize,
    pub columns: Vec<String>,
    pub rows: Vec<IndexMap<String, Value>>,
}

/// Pair a record's values with column names.
///
/// Values beyond the schema width are dropped, matching how positional
/// zipping behaves; missing trailing values are simply absent from the row.
pub fn zip_row(columns: &[String], values: Vec<String>) -> IndexMap<String, Value> {
    columns.iter().cloned().zip(values.into_iter().map(Value::String)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldState {
    Start,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

/// Incremental decoder for tab-separated, double-quote escaped records.
#[derive(Debug)]
pub struct TsvRowDecoder {
    state: FieldState,
    field: Vec<u8>,
    record: Vec<String>,
    pending_carriage_return: bool,
}

impl Default for TsvRowDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TsvRowDecoder {
    pub fn new() -> Self {
        Self {
            state: FieldState::Start,
            field: Vec::new(),
            record: Vec::new(),
            pending_carriage_return: false,
        }
    }

    /// Feed a chunk of bytes and return every record completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Vec<String>> {
        let mut completed = Vec::new();
        for &byte in chunk {
            if self.pending_carriage_return {
                self.pending_carriage_return = false;
                if byte == b'\n' {
                    continue;
                }
            }
            match self.state {
                FieldState::Quoted => {
                    if byte == b'"' {
                        self.state = FieldState::QuoteInQuoted;
                    } else {
                        self.field.push(byte);
                    }
                }
                FieldState::QuoteInQuoted if byte == b'"' => {
                    self.field.push(b'"');
                    self.state = FieldState::Quoted;
                }
                FieldState::Start if byte == b'"' => {
                    self.state = FieldState::Quoted;
                }
                _ => match byte {
                    b'\t' => self.end_field(),
                    b'\n' | b'\r' => {
                        self.pending_carriage_return = byte == b'\r';
                        if let Some(record) = self.end_record() {
                            completed.push(record);
                        }
                    }
                    other => {
                        self.field.push(other);
                        self.state = FieldState::Unquoted;
                    }
                },
            }
        }
        completed
    }

    /// Flush a final record that was not terminated by a newline.
    pub fn finish(mut self) -> Option<Vec<String>> {
        if self.state == FieldState::Start && self.field.is_empty() && self.record.is_empty() {
            return None;
        }
        self.end_record()
    }

    fn end_field(&mut self) {
        let bytes = std::mem::take(&mut self.field);
        self.record.push(String::from_utf8_lossy(&bytes).into_owned());
        self.state = FieldState::Start;
    }

    fn end_record(&mut self) -> Option<Vec<String>> {
        if self.state == FieldState::Start && self.field.is_empty() && self.record.is_empty() {
            // blank line
            return None;
        }
        self.end_field();
        Some(std::mem::take(&mut self.record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_requested_rows() {
        assert_eq!(clamp_sample_rows(5000), 1000);
        assert_eq!(clamp_sample_rows(0), 1);
        assert_eq!(clamp_sample_rows(-7), 1);
        assert_eq!(clamp_sample_rows(50), 50);
    }

    #[test]
    fn parses_partition_lists() {
        assert_eq!(parse_partitions(None), None);
        assert_eq!(parse_partitions(Some("  ")), None);
        assert_eq!(
            parse_partitions(Some("2024-01-01, 2024-01-02")),
            Some(vec!["2024-01-01".to_string(), "2024-01-02".to_string()])
        );
    }

    #[test]
    fn decodes_plain_records() {
        let mut decoder = TsvRowDecoder::new();
        let records = decoder.feed(b"1\talice\n2\tbob\n");
        assert_eq!(records, vec![vec!["1", "alice"], vec!["2", "bob"]]);
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn decodes_quoted_fields_across_chunks() {
        let mut decoder = TsvRowDecoder::new();
        let mut records = decoder.feed(b"1\t\"tab\there\"\t\"say \"\"hi");
        assert!(records.is_empty());
        records.extend(decoder.feed(b"\"\"\"\n2\t\"multi\nline\"\r\n"));
        assert_eq!(
            records,
            vec![
                vec!["1".to_string(), "tab\there".to_string(), "say \"hi\"".to_string()],
                vec!["2".to_string(), "multi\nline".to_string()],
            ]
        );
    }

    #[test]
    fn keeps_empty_fields_and_flushes_unterminated_record() {
        let mut decoder = TsvRowDecoder::new();
        assert_eq!(decoder.feed(b"a\t\tc\n"), vec![vec!["a", "", "c"]]);
        assert!(decoder.feed(b"last\tline").is_empty());
        assert_eq!(decoder.finish(), Some(vec!["last".to_string(), "line".to_string()]));
    }

    #[test]
    fn zips_values_to_columns() {
        let columns = vec!["id".to_string(), "name".to_string()];
        let row = zip_row(&columns, vec!["1".into(), "alice".into(), "extra".into()]);
        assert_eq!(row.len(), 2);
        assert_eq!(row["name"], "alice");
        let keys: Vec<&String> = row.keys().collect();
        assert_eq!(keys, vec!["id", "name"]);
    }
}
