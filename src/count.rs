//! Record counting for uploaded CSV bytes.
//!
//! Uploaded files are untrusted input, so malformed content is a normal case,
//! not an exceptional one: counting never fails, it reports `valid = false`.

use csv::ReaderBuilder;

/// Result of scanning one CSV payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvSummary {
    /// Number of data rows, excluding the header row.
    pub records: u64,
    /// False when the payload is empty or the parser reports an error
    /// (invalid UTF-8, malformed quoting).
    pub valid: bool,
}

/// Count the data rows in a CSV payload.
///
/// The first row is treated as the header and excluded. Ragged rows are
/// tolerated; scraped exports routinely have them.
pub fn count_records(bytes: &[u8]) -> CsvSummary {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return CsvSummary {
            records: 0,
            valid: false,
        };
    }

    let mut reader = ReaderBuilder::new().flexible(true).from_reader(bytes);

    let mut records = 0u64;
    for result in reader.records() {
        match result {
            Ok(_) => records += 1,
            Err(_) => {
                return CsvSummary {
                    records,
                    valid: false,
                }
            }
        }
    }

    CsvSummary {
        records,
        valid: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_rows_excluding_header() {
        let csv = b"name,phone,city\nAlpi Electric LLC,555-0101,Austin\nR Plumbing Co,555-0102,Dallas\n";
        assert_eq!(
            count_records(csv),
            CsvSummary {
                records: 2,
                valid: true
            }
        );
    }

    #[test]
    fn header_only_is_valid_and_empty() {
        let summary = count_records(b"name,phone,city\n");
        assert!(summary.valid);
        assert_eq!(summary.records, 0);
    }

    #[test]
    fn empty_input_is_invalid() {
        assert!(!count_records(b"").valid);
        assert!(!count_records(b"  \n\t ").valid);
    }

    #[test]
    fn invalid_utf8_is_invalid_not_a_panic() {
        let summary = count_records(b"name,city\n\xff\xfe\x00garbage,\x80\n");
        assert!(!summary.valid);
    }

    #[test]
    fn ragged_rows_are_tolerated() {
        let csv = b"name,phone,city\nshort row\nfull,row,here\n";
        let summary = count_records(csv);
        assert!(summary.valid);
        assert_eq!(summary.records, 2);
    }

    #[test]
    fn quoted_fields_with_embedded_delimiters() {
        let csv = b"name,notes\n\"Sons & Co, Inc.\",\"line one\nline two\"\n";
        let summary = count_records(csv);
        assert!(summary.valid);
        assert_eq!(summary.records, 1);
    }
}
