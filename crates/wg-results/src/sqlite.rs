//! SQLite-backed output store.

use std::fs;
use std::path::{Path, PathBuf};

use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Double, Nullable, Text};
use diesel::sqlite::SqliteConnection;
use wg_core::DeviceId;

use crate::naming::{OUTPUT_TABLE_PREFIX, ensure_identifier, parse_output_table_name};
use crate::store::OutputStore;
use crate::types::{ExtraColumn, OutputColumn, OutputSample, OutputTable, RunManifest};
use crate::{ResultsError, ResultsResult};

const MANIFEST_TABLE: &str = "wec_run_manifest";

#[derive(QueryableByName)]
struct TableNameRow {
    #[diesel(sql_type = Text)]
    name: String,
}

#[derive(QueryableByName)]
struct CellRow {
    #[diesel(sql_type = Nullable<Double>)]
    value: Option<f64>,
}

#[derive(QueryableByName)]
struct ManifestRow {
    #[diesel(sql_type = BigInt)]
    device_id: i64,
    #[diesel(sql_type = Text)]
    model: String,
    #[diesel(sql_type = Text)]
    table_name: String,
    #[diesel(sql_type = Text)]
    params_hash: String,
    #[diesel(sql_type = Text)]
    completed_at: String,
    #[diesel(sql_type = BigInt)]
    row_count: i64,
}

impl ManifestRow {
    fn into_manifest(self) -> ResultsResult<RunManifest> {
        let device_id =
            u32::try_from(self.device_id).map_err(|_| ResultsError::CorruptManifest {
                message: format!("out-of-range device id {}", self.device_id),
            })?;
        Ok(RunManifest {
            device_id: DeviceId::new(device_id),
            model: self.model,
            table_name: self.table_name,
            params_hash: self.params_hash,
            completed_at: self.completed_at,
            row_count: usize::try_from(self.row_count).unwrap_or(0),
        })
    }
}

/// Output store backed by a single SQLite database file.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    pub fn open(db_path: PathBuf) -> ResultsResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let store = Self { db_path };
        // Fail fast on an unusable path instead of at first query.
        store.connect()?;
        Ok(store)
    }

    fn connect(&self) -> ResultsResult<SqliteConnection> {
        let url = self
            .db_path
            .to_str()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: format!("non UTF-8 database path: {}", self.db_path.display()),
            })?;
        Ok(SqliteConnection::establish(url)?)
    }

    fn ensure_manifest_table(conn: &mut SqliteConnection) -> ResultsResult<()> {
        sql_query(format!(
            "CREATE TABLE IF NOT EXISTS {MANIFEST_TABLE} (\
             device_id INTEGER PRIMARY KEY, \
             model TEXT NOT NULL, \
             table_name TEXT NOT NULL, \
             params_hash TEXT NOT NULL, \
             completed_at TEXT NOT NULL, \
             row_count INTEGER NOT NULL)"
        ))
        .execute(conn)?;
        Ok(())
    }

    /// Column names of `table` in declaration order.
    fn table_columns(conn: &mut SqliteConnection, table: &str) -> ResultsResult<Vec<String>> {
        let rows = sql_query("SELECT name FROM pragma_table_info(?)")
            .bind::<Text, _>(table)
            .load::<TableNameRow>(conn)?;
        Ok(rows.into_iter().map(|row| row.name).collect())
    }

    fn column_list() -> String {
        OutputColumn::ALL
            .iter()
            .map(|c| format!("\"{}\"", c.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Known columns aliased to their canonical names, so a formatter that
    /// declared `PG` still maps onto `OutputSample::pg`.
    fn select_list() -> String {
        OutputColumn::ALL
            .iter()
            .map(|c| format!("\"{0}\" AS \"{0}\"", c.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl OutputStore for SqliteStore {
    fn location(&self) -> &Path {
        &self.db_path
    }

    fn table_exists(&self, table: &str) -> ResultsResult<bool> {
        let mut conn = self.connect()?;
        let rows = sql_query("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind::<Text, _>(table)
            .load::<TableNameRow>(&mut conn)?;
        Ok(rows.first().is_some_and(|row| row.name == table))
    }

    fn drop_table(&self, table: &str) -> ResultsResult<()> {
        let table = ensure_identifier(table)?;
        let mut conn = self.connect()?;
        sql_query(format!("DROP TABLE IF EXISTS \"{table}\"")).execute(&mut conn)?;
        tracing::debug!(table, "dropped output table");
        Ok(())
    }

    fn load_table(&self, table: &str) -> ResultsResult<OutputTable> {
        let table = ensure_identifier(table)?;
        if !self.table_exists(table)? {
            return Err(ResultsError::TableNotFound {
                table: table.to_string(),
            });
        }
        let mut conn = self.connect()?;
        let columns = Self::table_columns(&mut conn, table)?;

        let missing: Vec<&str> = OutputColumn::ALL
            .iter()
            .map(|c| c.as_str())
            .filter(|known| !columns.iter().any(|c| c.eq_ignore_ascii_case(known)))
            .collect();
        if !missing.is_empty() {
            return Err(ResultsError::MissingColumns {
                table: table.to_string(),
                columns: missing.join(", "),
            });
        }

        let samples = sql_query(format!(
            "SELECT {} FROM \"{table}\" ORDER BY rowid",
            Self::select_list()
        ))
        .load::<OutputSample>(&mut conn)?;

        let mut extra = Vec::new();
        for name in columns
            .into_iter()
            .filter(|c| OutputColumn::from_name(c).is_none())
        {
            let values = sql_query(format!(
                "SELECT CAST({} AS REAL) AS value FROM \"{table}\" ORDER BY rowid",
                quote_identifier(&name)
            ))
            .load::<CellRow>(&mut conn)?
            .into_iter()
            .map(|cell| cell.value.unwrap_or(f64::NAN))
            .collect();
            extra.push(ExtraColumn { name, values });
        }
        if !extra.is_empty() {
            tracing::debug!(table, extra_columns = extra.len(), "loaded extra formatter columns");
        }
        OutputTable::new(samples, extra)
    }

    fn save_output(&self, table: &str, output: &OutputTable) -> ResultsResult<()> {
        let table = ensure_identifier(table)?;
        let mut conn = self.connect()?;
        let columns = Self::column_list();
        let column_defs = OutputColumn::ALL
            .iter()
            .map(|c| format!("\"{}\" REAL NOT NULL", c.as_str()))
            .chain(
                output
                    .extra_columns()
                    .iter()
                    .map(|c| format!("{} REAL", quote_identifier(&c.name))),
            )
            .collect::<Vec<_>>()
            .join(", ");

        conn.transaction::<_, ResultsError, _>(|conn| {
            sql_query(format!("DROP TABLE IF EXISTS \"{table}\"")).execute(conn)?;
            sql_query(format!("CREATE TABLE \"{table}\" ({column_defs})")).execute(conn)?;
            let insert = format!("INSERT INTO \"{table}\" ({columns}) VALUES (?, ?, ?, ?, ?, ?)");
            for s in output.samples() {
                sql_query(insert.as_str())
                    .bind::<Double, _>(s.time)
                    .bind::<Double, _>(s.pg)
                    .bind::<Double, _>(s.pmax)
                    .bind::<Double, _>(s.pmin)
                    .bind::<Double, _>(s.qmax)
                    .bind::<Double, _>(s.qmin)
                    .execute(conn)?;
            }
            // Rows of a freshly created table are numbered 1..=n in
            // insertion order.
            for column in output.extra_columns() {
                let update = format!(
                    "UPDATE \"{table}\" SET {} = ? WHERE rowid = ?",
                    quote_identifier(&column.name)
                );
                for (row, value) in column.values.iter().enumerate() {
                    sql_query(update.as_str())
                        .bind::<Nullable<Double>, _>((!value.is_nan()).then_some(*value))
                        .bind::<BigInt, _>(row as i64 + 1)
                        .execute(conn)?;
                }
            }
            Ok(())
        })?;
        tracing::debug!(
            table,
            rows = output.len(),
            extra_columns = output.extra_columns().len(),
            "saved output table"
        );
        Ok(())
    }

    fn list_output_tables(&self) -> ResultsResult<Vec<DeviceId>> {
        let mut conn = self.connect()?;
        let rows = sql_query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND substr(name, 1, ?) = ?",
        )
        .bind::<BigInt, _>(OUTPUT_TABLE_PREFIX.len() as i64)
        .bind::<Text, _>(OUTPUT_TABLE_PREFIX)
        .load::<TableNameRow>(&mut conn)?;

        let mut ids: Vec<DeviceId> = rows
            .iter()
            .filter_map(|row| parse_output_table_name(&row.name))
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn record_manifest(&self, manifest: &RunManifest) -> ResultsResult<()> {
        let mut conn = self.connect()?;
        Self::ensure_manifest_table(&mut conn)?;
        sql_query(format!(
            "INSERT OR REPLACE INTO {MANIFEST_TABLE} \
             (device_id, model, table_name, params_hash, completed_at, row_count) \
             VALUES (?, ?, ?, ?, ?, ?)"
        ))
        .bind::<BigInt, _>(i64::from(manifest.device_id.get()))
        .bind::<Text, _>(manifest.model.as_str())
        .bind::<Text, _>(manifest.table_name.as_str())
        .bind::<Text, _>(manifest.params_hash.as_str())
        .bind::<Text, _>(manifest.completed_at.as_str())
        .bind::<BigInt, _>(manifest.row_count as i64)
        .execute(&mut conn)?;
        Ok(())
    }

    fn load_manifest(&self, device_id: DeviceId) -> ResultsResult<Option<RunManifest>> {
        let mut conn = self.connect()?;
        Self::ensure_manifest_table(&mut conn)?;
        let rows = sql_query(format!(
            "SELECT device_id, model, table_name, params_hash, completed_at, row_count \
             FROM {MANIFEST_TABLE} WHERE device_id = ?"
        ))
        .bind::<BigInt, _>(i64::from(device_id.get()))
        .load::<ManifestRow>(&mut conn)?;
        rows.into_iter().next().map(ManifestRow::into_manifest).transpose()
    }

    fn delete_manifest(&self, device_id: DeviceId) -> ResultsResult<()> {
        let mut conn = self.connect()?;
        Self::ensure_manifest_table(&mut conn)?;
        sql_query(format!("DELETE FROM {MANIFEST_TABLE} WHERE device_id = ?"))
            .bind::<BigInt, _>(i64::from(device_id.get()))
            .execute(&mut conn)?;
        Ok(())
    }
}

/// Quote a column name written by an external formatter.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
