//src/report.rs

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use flate2::read::MultiGzDecoder;

use crate::error::IngestError;
use crate::types::TaxonRecord;

/// Number of columns in a standard Kraken report.
pub const REPORT_COLUMNS: usize = 6;

/// Reads a Kraken report from disk. Files ending in ".gz" are decompressed on the fly.
pub fn read_report<P: AsRef<Path>>(path: P) -> Result<Vec<TaxonRecord>, IngestError> {
    let path = path.as_ref();
    let f = File::open(path)?;

    let is_gz = path
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let reader: Box<dyn BufRead> = if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(f)))
    } else {
        Box::new(BufReader::new(f))
    };

    let records = parse_report(reader)?;
    log::info!("Read {} report rows from {}", records.len(), path.display());
    Ok(records)
}

/// Parses a headerless, tab-separated Kraken report.
///
/// Any row without exactly six columns, or with a non-numeric value in the
/// percentage, read count or taxonomy ID columns, rejects the whole report.
pub fn parse_report<R: Read>(reader: R) -> Result<Vec<TaxonRecord>, IngestError> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quoting(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut row = StringRecord::new();

    while rdr.read_record(&mut row)? {
        let line = row.position().map(|p| p.line()).unwrap_or(0);

        // A lone empty field is a blank line
        if row.len() == 1 && row[0].trim().is_empty() {
            continue;
        }
        if row.len() != REPORT_COLUMNS {
            return Err(IngestError::ColumnCount {
                line,
                found: row.len(),
            });
        }

        records.push(TaxonRecord {
            percentage: parse_field(&row[0], "percentage", line)?,
            clade_reads: parse_field(&row[1], "clade reads", line)?,
            direct_reads: parse_field(&row[2], "direct reads", line)?,
            rank_code: row[3].trim().to_string(),
            tax_id: parse_field(&row[4], "taxonomy ID", line)?,
            name: row[5].trim_start().to_string(),
            lineage: None,
        });
    }

    Ok(records)
}

fn parse_field<T: std::str::FromStr>(
    raw: &str,
    field: &'static str,
    line: u64,
) -> Result<T, IngestError> {
    raw.trim().parse().map_err(|_| IngestError::InvalidNumber {
        line,
        field,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const REPORT: &str = "  5.00\t50\t50\tU\t0\tunclassified\n\
                          95.00\t950\t10\tR\t1\troot\n\
                          12.50\t100\t80\tS\t562\t      Escherichia coli\n";

    #[test]
    fn parses_typed_rows() {
        let rows = parse_report(REPORT.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].percentage, 5.0);
        assert_eq!(rows[0].tax_id, 0);
        assert!(rows[0].is_unclassified());

        let ecoli = &rows[2];
        assert_eq!(ecoli.percentage, 12.5);
        assert_eq!(ecoli.clade_reads, 100);
        assert_eq!(ecoli.direct_reads, 80);
        assert_eq!(ecoli.rank_code, "S");
        assert_eq!(ecoli.tax_id, 562);
        assert_eq!(ecoli.name, "Escherichia coli");
        assert_eq!(ecoli.lineage, None);
    }

    #[test]
    fn skips_blank_lines() {
        let input = format!("{REPORT}\n\n");
        assert_eq!(parse_report(input.as_bytes()).unwrap().len(), 3);
    }

    #[test]
    fn rejects_wrong_column_count() {
        let input = "5.00\t50\t50\tU\t0\n";
        match parse_report(input.as_bytes()) {
            Err(IngestError::ColumnCount { line, found }) => {
                assert_eq!(line, 1);
                assert_eq!(found, 5);
            }
            other => panic!("expected column count error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_numeric_fields() {
        let input = "5.00\t50\t50\tU\t0\tunclassified\n1.0\t10\tten\tS\t9\tfoo\n";
        match parse_report(input.as_bytes()) {
            Err(IngestError::InvalidNumber { line, field, value }) => {
                assert_eq!(line, 2);
                assert_eq!(field, "direct reads");
                assert_eq!(value, "ten");
            }
            other => panic!("expected invalid number error, got {other:?}"),
        }

        let input = "abc\t50\t50\tU\t0\tunclassified\n";
        assert!(matches!(
            parse_report(input.as_bytes()),
            Err(IngestError::InvalidNumber { field: "percentage", .. })
        ));
    }

    #[test]
    fn reads_gzipped_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.kreport.gz");

        let mut enc = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        enc.write_all(REPORT.as_bytes()).unwrap();
        enc.finish().unwrap();

        let rows = read_report(&path).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].tax_id, 562);
    }
}
