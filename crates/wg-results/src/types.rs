//! Output table data types.

use diesel::QueryableByName;
use diesel::sql_types::Double;
use serde::{Deserialize, Serialize};
use wg_core::DeviceId;

use crate::{ResultsError, ResultsResult};

/// One row of a device output table, as written by the engine's formatter.
///
/// `time` is simulation time in seconds; power values are in the device's
/// per-unit base.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, QueryableByName)]
pub struct OutputSample {
    #[diesel(sql_type = Double)]
    pub time: f64,
    #[diesel(sql_type = Double)]
    pub pg: f64,
    #[diesel(sql_type = Double)]
    pub pmax: f64,
    #[diesel(sql_type = Double)]
    pub pmin: f64,
    #[diesel(sql_type = Double)]
    pub qmax: f64,
    #[diesel(sql_type = Double)]
    pub qmin: f64,
}

impl OutputSample {
    pub fn value(&self, column: OutputColumn) -> f64 {
        match column {
            OutputColumn::Time => self.time,
            OutputColumn::Pg => self.pg,
            OutputColumn::Pmax => self.pmax,
            OutputColumn::Pmin => self.pmin,
            OutputColumn::Qmax => self.qmax,
            OutputColumn::Qmin => self.qmin,
        }
    }
}

/// Stored columns of an output table, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputColumn {
    Time,
    Pg,
    Pmax,
    Pmin,
    Qmax,
    Qmin,
}

impl OutputColumn {
    pub const ALL: [OutputColumn; 6] = [
        OutputColumn::Time,
        OutputColumn::Pg,
        OutputColumn::Pmax,
        OutputColumn::Pmin,
        OutputColumn::Qmax,
        OutputColumn::Qmin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OutputColumn::Time => "time",
            OutputColumn::Pg => "pg",
            OutputColumn::Pmax => "pmax",
            OutputColumn::Pmin => "pmin",
            OutputColumn::Qmax => "qmax",
            OutputColumn::Qmin => "qmin",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == lowered)
    }
}

/// A column the formatter wrote beyond the known [`OutputColumn`]s.
///
/// Non-finite cells are stored as SQL `NULL` and read back as NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraColumn {
    pub name: String,
    pub values: Vec<f64>,
}

/// A whole device output table: the known columns as typed rows, plus
/// every other column the engine's formatter wrote, in table order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputTable {
    samples: Vec<OutputSample>,
    extra: Vec<ExtraColumn>,
}

impl OutputTable {
    /// Every extra column must have one value per row and a name distinct
    /// (ignoring ASCII case, as SQLite does) from the known columns and
    /// from each other.
    pub fn new(samples: Vec<OutputSample>, extra: Vec<ExtraColumn>) -> ResultsResult<Self> {
        for (i, column) in extra.iter().enumerate() {
            if column.values.len() != samples.len() {
                return Err(ResultsError::ColumnLength {
                    column: column.name.clone(),
                    expected: samples.len(),
                    actual: column.values.len(),
                });
            }
            let clashes_known = OutputColumn::from_name(&column.name).is_some();
            let clashes_extra = extra[..i]
                .iter()
                .any(|other| other.name.eq_ignore_ascii_case(&column.name));
            if clashes_known || clashes_extra {
                return Err(ResultsError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(Self { samples, extra })
    }

    pub fn from_samples(samples: Vec<OutputSample>) -> Self {
        Self {
            samples,
            extra: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[OutputSample] {
        &self.samples
    }

    pub fn extra_columns(&self) -> &[ExtraColumn] {
        &self.extra
    }

    pub fn extra_column(&self, name: &str) -> Option<&[f64]> {
        self.extra
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
            .map(|c| c.values.as_slice())
    }

    /// Known column names followed by the extra ones.
    pub fn column_names(&self) -> Vec<&str> {
        OutputColumn::ALL
            .iter()
            .map(|c| c.as_str())
            .chain(self.extra.iter().map(|c| c.name.as_str()))
            .collect()
    }

    /// Values of any column, known or extra, by name.
    pub fn column_values(&self, name: &str) -> Option<Vec<f64>> {
        match OutputColumn::from_name(name) {
            Some(column) => Some(self.samples.iter().map(|s| s.value(column)).collect()),
            None => self.extra_column(name).map(<[f64]>::to_vec),
        }
    }

    pub fn into_parts(self) -> (Vec<OutputSample>, Vec<ExtraColumn>) {
        (self.samples, self.extra)
    }
}

impl From<Vec<OutputSample>> for OutputTable {
    fn from(samples: Vec<OutputSample>) -> Self {
        Self::from_samples(samples)
    }
}

/// Informational record of a computed output table.
///
/// The cache key is the device id alone; the manifest only reports what
/// produced the table that is currently stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub device_id: DeviceId,
    pub model: String,
    pub table_name: String,
    pub params_hash: String,
    pub completed_at: String,
    pub row_count: usize,
}
