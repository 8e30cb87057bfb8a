//! Tabular parser for uploaded CSV files
//!
//! Turns raw file bytes into an ordered header list and one [`RawRow`] per
//! data line. This is the only place that deals with text decoding and CSV
//! syntax; everything after it works on header-keyed rows.

use std::collections::HashMap;

/// The file could not be read as delimited text at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct ParseFailure {
    pub reason: String,
}

impl ParseFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// One parsed input line, keyed by normalized header.
///
/// Empty or missing cells are absent from the map, so `get` returns `None`
/// for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    values: HashMap<String, String>,
}

impl RawRow {
    pub fn get(&self, header: &str) -> Option<&str> {
        self.values.get(header).map(|s| s.as_str())
    }
}

impl<K, V> FromIterator<(K, V)> for RawRow
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let values = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v): &(String, String)| !v.is_empty())
            .collect();
        Self { values }
    }
}

/// Result of parsing a file: headers (when the file has a header row) and rows
/// in file order, each paired with the 1-based file line it starts on.
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub headers: Option<Vec<String>>,
    pub rows: Vec<(usize, RawRow)>,
}

/// Comma-delimited parser with an optional header row
#[derive(Debug, Clone, Copy)]
pub struct CsvParser {
    pub has_headers: bool,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self { has_headers: true }
    }
}

impl CsvParser {
    /// Parse the whole input eagerly, preserving row order.
    ///
    /// Blank lines are skipped but still counted, so each row keeps the line
    /// number a spreadsheet or editor would show for it. Without a header row,
    /// cells are keyed `COLUMN_1`, `COLUMN_2`, ...
    pub fn parse(&self, bytes: &[u8]) -> Result<ParsedFile, ParseFailure> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            ParseFailure::new(format!(
                "The file is not valid UTF-8 text (invalid data at byte {}). Save it as CSV (UTF-8) and try again.",
                e.valid_up_to()
            ))
        })?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        if text.contains('\0') {
            return Err(ParseFailure::new(
                "The file appears to be binary, not CSV text.",
            ));
        }

        if text.trim().is_empty() {
            log::debug!("Parsed empty file");
            return Ok(ParsedFile::default());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(self.has_headers)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = if self.has_headers {
            let record = reader
                .headers()
                .map_err(|e| ParseFailure::new(format!("Could not read the header row: {}", e)))?;
            Some(record.iter().map(normalize_header).collect::<Vec<_>>())
        } else {
            None
        };

        let mut rows = Vec::new();
        let mut last_line = usize::from(self.has_headers);
        for result in reader.records() {
            let record = result.map_err(|e| {
                let line = e
                    .position()
                    .map(|p| p.line().to_string())
                    .unwrap_or_else(|| "?".to_string());
                ParseFailure::new(format!("Could not read line {}: {}", line, e))
            })?;

            let line = record
                .position()
                .map(|pos| record_start_line(text, pos))
                .unwrap_or(last_line + 1);
            last_line = line;

            if record.iter().all(|cell| cell.is_empty()) {
                continue;
            }

            let row: RawRow = match &headers {
                Some(headers) => headers
                    .iter()
                    .zip(record.iter())
                    .map(|(h, v)| (h.clone(), v.to_string()))
                    .collect(),
                None => record
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (format!("COLUMN_{}", i + 1), v.to_string()))
                    .collect(),
            };
            rows.push((line, row));
        }

        log::debug!(
            "Parsed {} data rows ({} headers)",
            rows.len(),
            headers.as_ref().map(|h| h.len()).unwrap_or(0)
        );

        Ok(ParsedFile { headers, rows })
    }
}

/// Line on which a record's first cell sits.
///
/// The reader positions a record just past the previous record's terminator,
/// before any empty lines it skips, so those are added back here.
fn record_start_line(text: &str, pos: &csv::Position) -> usize {
    let rest = usize::try_from(pos.byte())
        .ok()
        .and_then(|start| text.as_bytes().get(start..))
        .unwrap_or_default();
    let skipped = rest
        .iter()
        .take_while(|b| matches!(b, b'\r' | b'\n'))
        .filter(|b| **b == b'\n')
        .count();
    usize::try_from(pos.line()).unwrap_or(usize::MAX).saturating_add(skipped)
}

/// Trim and upper-case a header cell
fn normalize_header(cell: &str) -> String {
    cell.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(parsed: &ParsedFile) -> Vec<usize> {
        parsed.rows.iter().map(|(line, _)| *line).collect()
    }

    #[test]
    fn test_parse_headers_and_rows() {
        let parsed = CsvParser::default()
            .parse(b"LOGIN_ID,ROLE\nstudentone,student\nteachone,teacher\n")
            .unwrap();

        assert_eq!(
            parsed.headers,
            Some(vec!["LOGIN_ID".to_string(), "ROLE".to_string()])
        );
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].1.get("LOGIN_ID"), Some("studentone"));
        assert_eq!(parsed.rows[1].1.get("ROLE"), Some("teacher"));
        assert_eq!(lines(&parsed), vec![2, 3]);
    }

    #[test]
    fn test_headers_are_normalized_and_cells_trimmed() {
        let parsed = CsvParser::default()
            .parse(b" login_id , Role \n  studentone ,  student \n")
            .unwrap();

        assert_eq!(parsed.rows[0].1.get("LOGIN_ID"), Some("studentone"));
        assert_eq!(parsed.rows[0].1.get("ROLE"), Some("student"));
    }

    #[test]
    fn test_empty_and_missing_cells_are_absent() {
        let parsed = CsvParser::default()
            .parse(b"LOGIN_ID,ROLE\nstudentone,\nteachone\n")
            .unwrap();

        assert_eq!(parsed.rows[0].1.get("ROLE"), None);
        assert_eq!(parsed.rows[1].1.get("ROLE"), None);
        assert_eq!(parsed.rows[1].1.get("LOGIN_ID"), Some("teachone"));
    }

    #[test]
    fn test_blank_lines_are_skipped_but_counted() {
        let parsed = CsvParser::default()
            .parse(b"SECTION_NAME\nA\n\n,\n\n\nB\n")
            .unwrap();

        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[1].1.get("SECTION_NAME"), Some("B"));
        assert_eq!(lines(&parsed), vec![2, 7]);
    }

    #[test]
    fn test_multiline_value_keeps_file_lines() {
        let parsed = CsvParser::default()
            .parse(b"LOGIN_ID,ROLE\nok,\"stu\ndent\"\nbad id,student\n")
            .unwrap();

        assert_eq!(parsed.rows[0].1.get("ROLE"), Some("stu\ndent"));
        assert_eq!(lines(&parsed), vec![2, 4]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let parsed = CsvParser::default()
            .parse(b"SECTION_NAME\r\nA\r\n\r\nB\r\n")
            .unwrap();

        assert_eq!(lines(&parsed), vec![2, 4]);
    }

    #[test]
    fn test_quoted_values_and_bom() {
        let parsed = CsvParser::default()
            .parse("\u{feff}SECTION_NAME\n\"Lab, Tuesday\"\n".as_bytes())
            .unwrap();

        assert_eq!(parsed.headers, Some(vec!["SECTION_NAME".to_string()]));
        assert_eq!(parsed.rows[0].1.get("SECTION_NAME"), Some("Lab, Tuesday"));
    }

    #[test]
    fn test_empty_file_has_no_headers() {
        let parsed = CsvParser::default().parse(b"  \n").unwrap();
        assert!(parsed.headers.is_none());
        assert!(parsed.rows.is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_parse_failure() {
        let err = CsvParser::default()
            .parse(&[0x53, 0x45, 0xff, 0xfe, 0x0a])
            .unwrap_err();
        assert!(err.reason.contains("UTF-8"));
    }

    #[test]
    fn test_binary_content_is_parse_failure() {
        let err = CsvParser::default().parse(b"PK\0\x03\x04").unwrap_err();
        assert!(err.reason.contains("binary"));
    }

    #[test]
    fn test_without_header_row() {
        let parser = CsvParser { has_headers: false };
        let parsed = parser.parse(b"a,b\nc,d\n").unwrap();
        assert!(parsed.headers.is_none());
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].1.get("COLUMN_2"), Some("b"));
        assert_eq!(lines(&parsed), vec![1, 2]);
    }
}
