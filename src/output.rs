//src/output.rs
//! Tabular sinks: a directory of CSV files and, optionally, one workbook with a
//! sheet per table.

use std::fs;
use std::path::{Path, PathBuf};

use csv::Writer;
use rust_xlsxwriter::Workbook;

use crate::enrich::UNCLASSIFIED_LINEAGE;
use crate::error::PipelineError;
use crate::types::{EnrichedRecord, RankSubset};

/// Excel refuses longer sheet names.
const MAX_SHEET_NAME: usize = 31;
/// Widest a workbook column is allowed to grow, in characters.
const MAX_COLUMN_WIDTH: usize = 50;
/// Second column (lineage or taxid) is hidden in every sheet.
const HIDDEN_COLUMN: usize = 1;

/// Which optional tables to write next to the per-rank files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    /// `all.csv`: the whole merged set.
    pub include_combined: bool,
    /// `Unclassified.csv`: merged rows with the literal "unclassified" lineage.
    pub include_unclassified: bool,
    /// Workbook holding every table as a sheet.
    pub workbook: Option<PathBuf>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            include_combined: true,
            include_unclassified: true,
            workbook: None,
        }
    }
}

const COMBINED_HEADER: [&str; 4] = ["lineage", "ncbi_tax_id", "reads_direct", "percentage"];

enum Cell<'a> {
    Text(&'a str),
    Int(u64),
    Float(f64),
}

impl Cell<'_> {
    fn render(&self) -> String {
        match self {
            Cell::Text(s) => s.to_string(),
            Cell::Int(n) => n.to_string(),
            Cell::Float(x) => format_percentage(*x),
        }
    }
}

/// One output table; `name` is the CSV file stem and the sheet name.
struct Table<'a> {
    name: &'a str,
    header: Vec<&'a str>,
    rows: Vec<Vec<Cell<'a>>>,
}

fn rank_table(subset: &RankSubset) -> Table<'_> {
    Table {
        name: subset.rank.label,
        header: vec![
            subset.rank.label,
            "lineage",
            "ncbi_tax_id",
            "percentage",
            "reads_direct",
        ],
        rows: subset
            .records
            .iter()
            .map(|rec| {
                vec![
                    Cell::Text(&rec.name),
                    Cell::Text(&rec.lineage),
                    Cell::Int(rec.tax_id.into()),
                    Cell::Float(rec.percentage),
                    Cell::Int(rec.direct_reads),
                ]
            })
            .collect(),
    }
}

fn combined_table<'a, I>(name: &'a str, records: I) -> Table<'a>
where
    I: Iterator<Item = &'a EnrichedRecord>,
{
    Table {
        name,
        header: COMBINED_HEADER.to_vec(),
        rows: records
            .map(|rec| {
                vec![
                    Cell::Text(&rec.lineage),
                    Cell::Int(rec.tax_id.into()),
                    Cell::Int(rec.direct_reads),
                    Cell::Float(rec.percentage),
                ]
            })
            .collect(),
    }
}

/// Writes one CSV per rank plus the optional combined tables into `outdir`,
/// creating it if needed, then the workbook if one was requested.
/// Returns the paths written, in order.
pub fn write_outputs(
    rank_subsets: &[RankSubset],
    combined: &[EnrichedRecord],
    outdir: &Path,
    options: &OutputOptions,
) -> Result<Vec<PathBuf>, PipelineError> {
    let mut tables: Vec<Table> = rank_subsets.iter().map(rank_table).collect();
    if options.include_combined {
        tables.push(combined_table("all", combined.iter()));
    }
    if options.include_unclassified {
        let unclassified = combined.iter().filter(|r| r.lineage == UNCLASSIFIED_LINEAGE);
        tables.push(combined_table("Unclassified", unclassified));
    }

    fs::create_dir_all(outdir)?;
    let mut written = Vec::with_capacity(tables.len() + 1);

    for table in &tables {
        let path = outdir.join(format!("{}.csv", table.name));
        write_csv(table, &path)?;
        written.push(path);
    }
    log::info!("Wrote {} tables to {}", tables.len(), outdir.display());

    if let Some(path) = &options.workbook {
        write_workbook(&tables, path)?;
        log::info!("Wrote workbook {}", path.display());
        written.push(path.clone());
    }

    Ok(written)
}

fn write_csv(table: &Table, path: &Path) -> Result<(), PipelineError> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(&table.header)?;

    for row in &table.rows {
        wtr.write_record(row.iter().map(Cell::render))?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_workbook(tables: &[Table], path: &Path) -> Result<(), PipelineError> {
    let mut workbook = Workbook::new();

    for table in tables {
        let sheet = workbook.add_worksheet();
        let name: String = table.name.chars().take(MAX_SHEET_NAME).collect();
        sheet.set_name(name)?;

        let mut widths: Vec<usize> = table.header.iter().map(|h| h.chars().count()).collect();
        for (col, title) in table.header.iter().enumerate() {
            sheet.write_string(0, col as u16, *title)?;
        }

        for (idx, row) in table.rows.iter().enumerate() {
            let r = idx as u32 + 1;
            for (col, cell) in row.iter().enumerate() {
                let c = col as u16;
                match cell {
                    Cell::Text(s) => sheet.write_string(r, c, *s)?,
                    Cell::Int(n) => sheet.write_number(r, c, *n as f64)?,
                    Cell::Float(x) => sheet.write_number(r, c, *x)?,
                };
                widths[col] = widths[col].max(cell.render().chars().count());
            }
        }

        for (col, width) in widths.iter().enumerate() {
            if col == HIDDEN_COLUMN {
                sheet.set_column_hidden(col as u16)?;
            } else {
                sheet.set_column_width(col as u16, (width + 2).min(MAX_COLUMN_WIDTH) as f64)?;
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Percentages always keep a decimal point ("5.0", not "5").
fn format_percentage(pct: f64) -> String {
    format!("{pct:?}")
}
