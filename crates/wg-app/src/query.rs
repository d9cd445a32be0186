//! Query helpers over resolved device output.

use std::io::{Read, Write};

use chrono::NaiveDateTime;
use wg_results::{ExtraColumn, OutputColumn, OutputSample, OutputTable};

use crate::error::{AppError, AppResult};
use crate::wec::WecOutput;

/// Timestamp format used for the snapshot column in CSV exports.
const SNAPSHOT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SNAPSHOT_COLUMN: &str = "snapshot";

/// Summary of a device's resolved output.
#[derive(Debug, Clone)]
pub struct OutputSummary {
    pub row_count: usize,
    pub time_range: (f64, f64),
    pub snapshot_range: (NaiveDateTime, NaiveDateTime),
    pub pg_range: (f64, f64),
}

/// Summarize resolved output. Empty output has nothing to summarize.
pub fn get_output_summary(output: &WecOutput) -> AppResult<OutputSummary> {
    let (Some(first), Some(last)) = (output.samples().first(), output.samples().last()) else {
        return Err(AppError::InvalidInput("No rows in device output".to_string()));
    };
    let (Some(t0), Some(t1)) = (output.snapshots().first(), output.snapshots().last()) else {
        return Err(AppError::InvalidInput("No rows in device output".to_string()));
    };

    let pg_range = output
        .samples()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
            (lo.min(s.pg), hi.max(s.pg))
        });

    Ok(OutputSummary {
        row_count: output.len(),
        time_range: (first.time, last.time),
        snapshot_range: (*t0, *t1),
        pg_range,
    })
}

/// Extract one stored column paired with the snapshot timeline.
///
/// Known columns match case-insensitively, as do columns the formatter
/// added beyond them.
pub fn extract_series(output: &WecOutput, column: &str) -> AppResult<Vec<(NaiveDateTime, f64)>> {
    let values = output.table().column_values(column).ok_or_else(|| {
        AppError::InvalidInput(format!("Unknown output column: {}", column))
    })?;
    Ok(output.snapshots().iter().copied().zip(values).collect())
}

/// Write the full output table with its snapshot column as CSV.
pub fn write_csv<W: Write>(output: &WecOutput, writer: W) -> AppResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut header = vec![SNAPSHOT_COLUMN];
    header.extend(output.column_names());
    csv_writer.write_record(&header)?;

    for (row, (snapshot, sample)) in output.rows().enumerate() {
        let mut record = vec![snapshot.format(SNAPSHOT_FORMAT).to_string()];
        record.extend(OutputColumn::ALL.iter().map(|c| sample.value(*c).to_string()));
        record.extend(output.extra_columns().iter().map(|c| c.values[row].to_string()));
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Read an output table from CSV with a header naming its columns.
///
/// The known columns are required. Other columns are kept as extra
/// columns, except `snapshot`: the timeline is always derived again on
/// resolution. Empty cells in extra columns read as NaN.
pub fn read_output_csv<R: Read>(reader: R) -> AppResult<OutputTable> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut known = [None; 6];
    let mut extra_idx = Vec::new();
    for (idx, name) in headers.iter().enumerate() {
        if name.eq_ignore_ascii_case(SNAPSHOT_COLUMN) {
            continue;
        }
        match OutputColumn::from_name(name) {
            Some(column) => known[column as usize] = Some(idx),
            None => extra_idx.push((idx, name.to_string())),
        }
    }
    let mut known_idx = [0usize; 6];
    let mut missing = Vec::new();
    for column in OutputColumn::ALL {
        match known[column as usize] {
            Some(idx) => known_idx[column as usize] = idx,
            None => missing.push(column.as_str()),
        }
    }
    if !missing.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "CSV is missing output columns: {}",
            missing.join(", ")
        )));
    }

    let mut samples = Vec::new();
    let mut extra: Vec<ExtraColumn> = extra_idx
        .iter()
        .map(|(_, name)| ExtraColumn {
            name: name.clone(),
            values: Vec::new(),
        })
        .collect();
    for (line, record) in csv_reader.records().enumerate() {
        let record = record?;
        let cell = |idx: usize| -> AppResult<f64> {
            let raw = record.get(idx).unwrap_or("");
            raw.parse::<f64>().map_err(|_| {
                AppError::InvalidInput(format!(
                    "Row {}: `{}` in column {} is not a number",
                    line + 1,
                    raw,
                    headers.get(idx).unwrap_or("?")
                ))
            })
        };
        let known_cell = |column: OutputColumn| cell(known_idx[column as usize]);
        samples.push(OutputSample {
            time: known_cell(OutputColumn::Time)?,
            pg: known_cell(OutputColumn::Pg)?,
            pmax: known_cell(OutputColumn::Pmax)?,
            pmin: known_cell(OutputColumn::Pmin)?,
            qmax: known_cell(OutputColumn::Qmax)?,
            qmin: known_cell(OutputColumn::Qmin)?,
        });
        for (column, (idx, _)) in extra.iter_mut().zip(extra_idx.iter()) {
            let blank = record.get(*idx).is_none_or(str::is_empty);
            column.values.push(if blank { f64::NAN } else { cell(*idx)? });
        }
    }
    Ok(OutputTable::new(samples, extra)?)
}
