//! SQL statement text, generated from the schema description.
//!
//! Values always travel as positional parameters; only identifiers from
//! [`indilab_core::schema`] are interpolated.

use indilab_core::schema::{
    daily_columns, ColumnSpec, IndicatorColumn, BAR_COLUMNS, DAILY_TABLE, INSTRUMENT_TABLE,
    KEY_COLUMNS,
};

fn column_def(spec: &ColumnSpec) -> String {
    if spec.nullable {
        format!("{} {}", spec.name, spec.dtype.sql())
    } else {
        format!("{} {} NOT NULL", spec.name, spec.dtype.sql())
    }
}

pub fn create_instrument_table() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {INSTRUMENT_TABLE} (\
         id INTEGER PRIMARY KEY, code TEXT NOT NULL UNIQUE, name TEXT NOT NULL)"
    )
}

pub fn create_daily_table() -> String {
    let columns: Vec<String> = daily_columns().iter().map(column_def).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {DAILY_TABLE} ({}, UNIQUE({}), \
         FOREIGN KEY(instrument_id) REFERENCES {INSTRUMENT_TABLE}(id))",
        columns.join(", "),
        KEY_COLUMNS.join(", ")
    )
}

pub fn table_info(table: &str) -> String {
    format!("PRAGMA table_info({table})")
}

pub fn add_column(table: &str, spec: &ColumnSpec) -> String {
    format!("ALTER TABLE {table} ADD COLUMN {}", column_def(spec))
}

pub fn select_instruments() -> String {
    format!("SELECT id, code, name FROM {INSTRUMENT_TABLE} ORDER BY id")
}

pub fn insert_instrument_or_ignore() -> String {
    format!("INSERT OR IGNORE INTO {INSTRUMENT_TABLE} (code, name) VALUES (?1, ?2)")
}

pub fn select_instrument_by_code() -> String {
    format!("SELECT id, code, name FROM {INSTRUMENT_TABLE} WHERE code = ?1")
}

pub fn select_bars() -> String {
    let names: Vec<&str> = BAR_COLUMNS.iter().map(|c| c.name).collect();
    format!(
        "SELECT {} FROM {DAILY_TABLE} WHERE instrument_id = ?1 ORDER BY date",
        names.join(", ")
    )
}

pub fn insert_bar_or_ignore() -> String {
    let names: Vec<&str> = BAR_COLUMNS.iter().map(|c| c.name).collect();
    let params: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT OR IGNORE INTO {DAILY_TABLE} ({}) VALUES ({})",
        names.join(", "),
        params.join(", ")
    )
}

/// Update of every indicator column for one key.
///
/// Parameters: the indicator values in [`IndicatorColumn::ALL`] order, then
/// instrument_id, then date.
pub fn update_indicators() -> String {
    let sets: Vec<String> = IndicatorColumn::ALL
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = ?{}", c.name(), i + 1))
        .collect();
    let n = IndicatorColumn::ALL.len();
    format!(
        "UPDATE {DAILY_TABLE} SET {} WHERE instrument_id = ?{} AND date = ?{}",
        sets.join(", "),
        n + 1,
        n + 2
    )
}

pub fn count_rows(table: &str) -> String {
    format!("SELECT COUNT(*) FROM {table}")
}
