//! Row-oriented interchange files.
//!
//! One row per segment, identity ascending: integer centroid, the full
//! measurement vector, and the status byte (empty cell for default).
//! The file is keyed to one analysis run; import matches rows back to
//! live segments by exact centroid coordinates, scanning forward only.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::info;
use synseg_core::{MeasureColumns, SegmentBatch, SegmentStatus, VoxelCoord};

use crate::{Error, Result};

/// Writer for segment interchange files.
pub struct SegmentTableWriter {
    writer: BufWriter<File>,
}

impl SegmentTableWriter {
    /// Creates a new interchange file writer.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self { writer })
    }

    /// Writes every segment as one row, identity ascending, with the
    /// status byte in the override column (empty for default).
    ///
    /// # Errors
    /// Returns an error on write failure.
    ///
    /// # Panics
    /// Panics when the status array length disagrees with the batch;
    /// both are sized once at load.
    pub fn write_overrides(
        &mut self,
        batch: &SegmentBatch,
        statuses: &[SegmentStatus],
    ) -> Result<()> {
        assert_eq!(
            batch.len(),
            statuses.len(),
            "status array must cover every segment"
        );
        writeln!(self.writer, "{}", header_for(batch.columns()))?;

        for index in 0..batch.len() {
            let c = batch.centroid(index);
            write!(self.writer, "{},{},{}", c.z, c.y, c.x)?;
            for value in batch.measures_row(index) {
                write!(self.writer, ",{value}")?;
            }
            match statuses[index] {
                SegmentStatus::Default => writeln!(self.writer, ",")?,
                status => writeln!(self.writer, ",{}", status.as_byte())?,
            }
        }

        self.writer.flush()?;
        Ok(())
    }

    /// Flushes the writer.
    ///
    /// # Errors
    /// Returns an error on flush failure.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Reads a full segment table: the upstream input contract plus any
/// status bytes already present in the override column.
///
/// # Errors
/// Returns [`Error::BadHeader`] or [`Error::Parse`] on malformed input.
pub fn read_segment_table<P: AsRef<Path>>(path: P) -> Result<(SegmentBatch, Vec<SegmentStatus>)> {
    let path = path.as_ref();
    let mut rows = RowReader::open(path)?;

    let mut batch = SegmentBatch::new(rows.columns);
    let mut statuses = Vec::new();
    let mut measures = Vec::with_capacity(rows.columns.len());
    while let Some(row) = rows.next_row()? {
        measures.clear();
        for cell in &row.measure_cells {
            measures.push(rows.parse_cell::<f32>(cell, row.line, "measurement")?);
        }
        batch.push(row.centroid, &measures)?;
        statuses.push(rows.parse_status(row.status_cell.as_deref(), row.line)?);
    }
    info!(
        "{}: loaded {} segments ({:?} layout)",
        path.display(),
        batch.len(),
        batch.columns()
    );
    Ok((batch, statuses))
}

/// Reads manual overrides from an interchange file, matching each row
/// to the live segment table by exact centroid coordinates.
///
/// Matching scans forward only: the file must be an order-preserving
/// subset of the live segment list. Returned statuses are translated to
/// their clickable form; the caller applies them in one step after the
/// whole file has matched, so a failed import mutates nothing.
///
/// # Errors
/// Returns [`Error::CoordinateMismatch`] when a row cannot be matched
/// before the live list is exhausted, [`Error::BadHeader`] when the
/// file's column layout disagrees with the live table, or
/// [`Error::Parse`] on malformed input.
pub fn read_overrides<P: AsRef<Path>>(
    path: P,
    batch: &SegmentBatch,
) -> Result<Vec<(usize, SegmentStatus)>> {
    let path = path.as_ref();
    let mut rows = RowReader::open(path)?;
    if rows.columns != batch.columns() {
        return Err(Error::BadHeader {
            path: path.to_path_buf(),
            reason: format!(
                "column layout {:?} does not match the live table layout {:?}",
                rows.columns,
                batch.columns()
            ),
        });
    }

    let mut matches = Vec::new();
    let mut cursor = 0usize;
    let mut rows_matched = 0usize;
    while let Some(row) = rows.next_row()? {
        let Some(index) = (cursor..batch.len()).find(|&i| batch.centroid(i) == row.centroid)
        else {
            return Err(Error::CoordinateMismatch {
                path: path.to_path_buf(),
                line: row.line,
                z: row.centroid.z,
                y: row.centroid.y,
                x: row.centroid.x,
            });
        };
        cursor = index + 1;
        rows_matched += 1;

        let status = rows.parse_status(row.status_cell.as_deref(), row.line)?;
        if status != SegmentStatus::Default {
            matches.push((index, status.reloaded()));
        }
    }
    info!(
        "{}: matched {rows_matched} rows, {} carrying overrides",
        path.display(),
        matches.len()
    );
    Ok(matches)
}

fn header_for(columns: MeasureColumns) -> String {
    let mut header = String::from("Z,Y,X,raw core,raw hollow");
    if columns.has_filtered() {
        header.push_str(",DoG core,DoG hollow");
    }
    if columns.has_red() {
        header.push_str(",red");
    }
    header.push_str(",override");
    header
}

struct ParsedRow {
    line: usize,
    centroid: VoxelCoord,
    measure_cells: Vec<String>,
    status_cell: Option<String>,
}

/// Line-by-line interchange reader with header-derived layout.
struct RowReader {
    path: PathBuf,
    lines: std::io::Lines<BufReader<File>>,
    line: usize,
    columns: MeasureColumns,
    has_override: bool,
}

impl RowReader {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut lines = BufReader::new(file).lines();
        let header = lines.next().transpose()?.ok_or_else(|| Error::BadHeader {
            path: path.to_path_buf(),
            reason: "empty file".into(),
        })?;
        let (columns, has_override) = Self::parse_header(path, &header)?;
        Ok(Self {
            path: path.to_path_buf(),
            lines,
            line: 1,
            columns,
            has_override,
        })
    }

    fn parse_header(path: &Path, header: &str) -> Result<(MeasureColumns, bool)> {
        let bad = |reason: String| Error::BadHeader {
            path: path.to_path_buf(),
            reason,
        };
        let cells: Vec<&str> = header.split(',').map(str::trim).collect();
        let expected = ["Z", "Y", "X", "raw core", "raw hollow"];
        if cells.len() < expected.len() || cells[..expected.len()] != expected {
            return Err(bad(format!("expected columns to start with {expected:?}")));
        }

        let mut rest = &cells[expected.len()..];
        let filtered = rest.starts_with(&["DoG core", "DoG hollow"]);
        if filtered {
            rest = &rest[2..];
        }
        let red = rest.first() == Some(&"red");
        if red {
            rest = &rest[1..];
        }
        let has_override = rest.first() == Some(&"override");
        if has_override {
            rest = &rest[1..];
        }
        if !rest.is_empty() {
            return Err(bad(format!("unexpected trailing columns {rest:?}")));
        }

        let columns = match (filtered, red) {
            (false, false) => MeasureColumns::Two,
            (true, false) => MeasureColumns::Four,
            (true, true) => MeasureColumns::Five,
            (false, true) => {
                return Err(bad("red channel requires the DoG column pair".into()));
            }
        };
        Ok((columns, has_override))
    }

    fn next_row(&mut self) -> Result<Option<ParsedRow>> {
        loop {
            let Some(line) = self.lines.next().transpose()? else {
                return Ok(None);
            };
            self.line += 1;
            if line.trim().is_empty() {
                continue;
            }

            let cells: Vec<&str> = line.split(',').map(str::trim).collect();
            let expected = 3 + self.columns.len() + usize::from(self.has_override);
            if cells.len() != expected {
                return Err(Error::Parse {
                    path: self.path.clone(),
                    line: self.line,
                    reason: format!("expected {expected} cells, found {}", cells.len()),
                });
            }

            let z = self.parse_cell::<i32>(cells[0], self.line, "Z coordinate")?;
            let y = self.parse_cell::<i32>(cells[1], self.line, "Y coordinate")?;
            let x = self.parse_cell::<i32>(cells[2], self.line, "X coordinate")?;
            return Ok(Some(ParsedRow {
                line: self.line,
                centroid: VoxelCoord::new(z, y, x),
                measure_cells: cells[3..3 + self.columns.len()]
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
                status_cell: self
                    .has_override
                    .then(|| cells[expected - 1].to_string()),
            }));
        }
    }

    fn parse_cell<T: FromStr>(&self, cell: &str, line: usize, what: &str) -> Result<T> {
        cell.parse().map_err(|_| Error::Parse {
            path: self.path.clone(),
            line,
            reason: format!("bad {what} value '{cell}'"),
        })
    }

    fn parse_status(&self, cell: Option<&str>, line: usize) -> Result<SegmentStatus> {
        let Some(cell) = cell else {
            return Ok(SegmentStatus::Default);
        };
        if cell.is_empty() {
            return Ok(SegmentStatus::Default);
        }
        let byte = self.parse_cell::<u8>(cell, line, "override")?;
        SegmentStatus::from_byte(byte).map_err(|_| Error::Parse {
            path: self.path.clone(),
            line,
            reason: format!("invalid override status byte '{cell}'"),
        })
    }
}
