//! SQLite-backed bar store on an r2d2 connection pool.

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};

use indilab_core::schema::{
    daily_columns, validate_columns, IndicatorColumn, DAILY_TABLE, INSTRUMENT_COLUMNS,
    INSTRUMENT_TABLE,
};
use indilab_core::{DailyBar, IndicatorRow, Instrument, InstrumentId};

use super::{sql, BarStore, StoreError, StorePool};
use crate::config::StoreConfig;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Pool of SQLite connections, one per concurrently running task.
///
/// Every connection runs in WAL mode with a busy timeout so parallel writers
/// queue instead of failing.
#[derive(Clone)]
pub struct SqlitePool {
    pool: DbPool,
}

impl SqlitePool {
    pub fn open(config: &StoreConfig, max_size: u32) -> Result<Self, StoreError> {
        Self::open_path(&config.path, max_size, config.busy_timeout_ms)
    }

    pub fn open_path(path: &Path, max_size: u32, busy_timeout_ms: u64) -> Result<Self, StoreError> {
        let timeout = Duration::from_millis(busy_timeout_ms);
        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            conn.busy_timeout(timeout)?;
            let _mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |r| r.get(0))?;
            conn.execute_batch("PRAGMA foreign_keys = ON")
        });
        let pool = Pool::builder()
            .max_size(max_size.max(1))
            .build(manager)
            .map_err(|e| {
                tracing::error!(path = %path.display(), "failed to create DB pool: {e}");
                StoreError::Pool(e)
            })?;
        tracing::debug!(path = %path.display(), max_size, "opened store pool");
        Ok(Self { pool })
    }
}

impl StorePool for SqlitePool {
    type Handle = SqliteBarStore;

    fn acquire(&self) -> Result<SqliteBarStore, StoreError> {
        Ok(SqliteBarStore::new(self.pool.get()?))
    }
}

/// One pooled connection. Dropping it with an open batch rolls the batch back.
pub struct SqliteBarStore {
    conn: PooledConnection<SqliteConnectionManager>,
    in_batch: bool,
}

impl SqliteBarStore {
    fn new(conn: PooledConnection<SqliteConnectionManager>) -> Self {
        Self {
            conn,
            in_batch: false,
        }
    }

    /// Create missing tables, then add any indicator columns an older table
    /// lacks. A table with incompatible column types is an error.
    pub fn ensure_schema(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch(&format!(
            "{};\n{};",
            sql::create_instrument_table(),
            sql::create_daily_table()
        ))?;

        let check = validate_columns(INSTRUMENT_COLUMNS, &self.declared_columns(INSTRUMENT_TABLE)?);
        if !check.is_valid() {
            return Err(StoreError::Schema(format!(
                "table {INSTRUMENT_TABLE}: {}",
                describe(&check.errors, &check.missing)
            )));
        }

        let expected = daily_columns();
        let check = validate_columns(&expected, &self.declared_columns(DAILY_TABLE)?);
        if check.is_valid() {
            return Ok(());
        }
        if !check.is_migratable() {
            return Err(StoreError::Schema(format!(
                "table {DAILY_TABLE}: {}",
                describe(&check.errors, &check.missing)
            )));
        }

        let tx = self.conn.transaction()?;
        for spec in &check.missing {
            tx.execute_batch(&sql::add_column(DAILY_TABLE, spec))?;
        }
        tx.commit()?;
        tracing::info!(
            table = DAILY_TABLE,
            added = check.missing.len(),
            "migrated indicator columns"
        );
        Ok(())
    }

    fn declared_columns(&self, table: &str) -> Result<Vec<(String, String)>, StoreError> {
        let mut stmt = self.conn.prepare(&sql::table_info(table))?;
        let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(1)?, r.get::<_, String>(2)?)))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Insert the instrument if its code is new; return the stored record.
    pub fn upsert_instrument(&mut self, code: &str, name: &str) -> Result<Instrument, StoreError> {
        self.conn
            .prepare_cached(&sql::insert_instrument_or_ignore())?
            .execute(params![code, name])?;
        let instrument = self
            .conn
            .prepare_cached(&sql::select_instrument_by_code())?
            .query_row(params![code], instrument_from_row)?;
        Ok(instrument)
    }

    /// Insert bars whose key is not yet present. Returns how many were new.
    pub fn insert_bars(&mut self, bars: &[DailyBar]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached(&sql::insert_bar_or_ignore())?;
            for bar in bars {
                let volume = bar
                    .volume
                    .map(|v| {
                        i64::try_from(v).map_err(|_| {
                            StoreError::Corrupt(format!("volume {v} on {} out of range", bar.date))
                        })
                    })
                    .transpose()?;
                inserted += stmt.execute(params![
                    bar.instrument_id.0,
                    bar.date,
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    volume
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Stored indicator fields for one instrument, ordered by date.
    pub fn indicator_rows(&mut self, instrument: InstrumentId) -> Result<Vec<IndicatorRow>, StoreError> {
        let names: Vec<&str> = IndicatorColumn::ALL.iter().map(|c| c.name()).collect();
        let query = format!(
            "SELECT date, {} FROM {DAILY_TABLE} WHERE instrument_id = ?1 ORDER BY date",
            names.join(", ")
        );
        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map(params![instrument.0], |r| {
            let mut row = IndicatorRow::empty(instrument, r.get(0)?);
            for (i, column) in IndicatorColumn::ALL.iter().enumerate() {
                if let Some(v) = r.get::<_, Option<f64>>(i + 1)? {
                    row.set(*column, v);
                }
            }
            Ok(row)
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn row_count(&mut self) -> Result<u64, StoreError> {
        let n: i64 = self
            .conn
            .query_row(&sql::count_rows(DAILY_TABLE), [], |r| r.get(0))?;
        Ok(u64::try_from(n).unwrap_or(0))
    }
}

fn describe(errors: &[String], missing: &[indilab_core::schema::ColumnSpec]) -> String {
    let mut parts = errors.to_vec();
    parts.extend(missing.iter().map(|m| format!("missing column '{}'", m.name)));
    parts.join("; ")
}

fn instrument_from_row(r: &Row<'_>) -> rusqlite::Result<Instrument> {
    Ok(Instrument {
        id: InstrumentId(r.get(0)?),
        code: r.get(1)?,
        name: r.get(2)?,
    })
}

fn optional_price(value: Option<f64>) -> f64 {
    value.unwrap_or(f64::NAN)
}

impl BarStore for SqliteBarStore {
    fn instruments(&mut self) -> Result<Vec<Instrument>, StoreError> {
        let mut stmt = self.conn.prepare_cached(&sql::select_instruments())?;
        let rows = stmt.query_map([], instrument_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn load_bars(&mut self, instrument: InstrumentId) -> Result<Vec<DailyBar>, StoreError> {
        let mut stmt = self.conn.prepare_cached(&sql::select_bars())?;
        let rows = stmt.query_map(params![instrument.0], |r| {
            let date: NaiveDate = r.get(1)?;
            let volume: Option<i64> = r.get(6)?;
            Ok((
                DailyBar {
                    instrument_id: InstrumentId(r.get(0)?),
                    date,
                    open: optional_price(r.get(2)?),
                    high: optional_price(r.get(3)?),
                    low: optional_price(r.get(4)?),
                    close: optional_price(r.get(5)?),
                    volume: None,
                },
                volume,
            ))
        })?;

        let mut bars = Vec::new();
        for row in rows {
            let (mut bar, volume) = row?;
            bar.volume = volume
                .map(|v| {
                    u64::try_from(v).map_err(|_| {
                        StoreError::Corrupt(format!(
                            "negative volume {v} for instrument {instrument} on {}",
                            bar.date
                        ))
                    })
                })
                .transpose()?;
            bars.push(bar);
        }
        Ok(bars)
    }

    fn begin_batch(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        self.in_batch = true;
        Ok(())
    }

    fn update_indicators(&mut self, row: &IndicatorRow) -> Result<bool, StoreError> {
        let mut values: Vec<Value> = row
            .values()
            .iter()
            .map(|v| v.map_or(Value::Null, Value::Real))
            .collect();
        values.push(Value::Integer(row.instrument_id.0));
        values.push(Value::Text(row.date.format("%Y-%m-%d").to_string()));

        let changed = self
            .conn
            .prepare_cached(&sql::update_indicators())?
            .execute(params_from_iter(values.iter()))?;
        Ok(changed > 0)
    }

    fn commit_batch(&mut self) -> Result<(), StoreError> {
        if !self.in_batch {
            return Err(StoreError::NoBatch("commit_batch"));
        }
        self.conn.execute_batch("COMMIT")?;
        self.in_batch = false;
        Ok(())
    }
}

impl Drop for SqliteBarStore {
    fn drop(&mut self) {
        if self.in_batch {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                tracing::warn!("rollback of abandoned batch failed: {e}");
            }
        }
    }
}
