//! Storage schema contract: the boundary between the engine and any bar store.
//!
//! Defines the table names, column names, column types and the fixed order of
//! indicator columns. Stores build every statement from this description, so a
//! column is added or renamed in exactly one place.

use std::fmt;

/// Fixed moving-average periods (sma_k / ema_k columns).
pub const MA_PERIODS: [usize; 7] = [8, 10, 21, 50, 55, 100, 200];

/// Fixed rolling-extreme windows (high_w / low_w columns).
pub const EXTREME_WINDOWS: [usize; 3] = [21, 55, 100];

pub const INSTRUMENT_TABLE: &str = "instrument";
pub const DAILY_TABLE: &str = "daily";

/// Storage types used by the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    /// Calendar date stored as ISO-8601 text (`YYYY-MM-DD`).
    Date,
}

impl ColumnType {
    /// Declared SQL type.
    pub fn sql(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text | ColumnType::Date => "TEXT",
        }
    }
}

/// A single column in a table description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub dtype: ColumnType,
    pub nullable: bool,
}

const fn col(name: &'static str, dtype: ColumnType, nullable: bool) -> ColumnSpec {
    ColumnSpec {
        name,
        dtype,
        nullable,
    }
}

pub const INSTRUMENT_COLUMNS: &[ColumnSpec] = &[
    col("id", ColumnType::Integer, false),
    col("code", ColumnType::Text, false),
    col("name", ColumnType::Text, false),
];

/// Key columns of the daily table. `(instrument_id, date)` is unique.
pub const KEY_COLUMNS: [&str; 2] = ["instrument_id", "date"];

/// Bar columns of the daily table, key first.
pub const BAR_COLUMNS: &[ColumnSpec] = &[
    col("instrument_id", ColumnType::Integer, false),
    col("date", ColumnType::Date, false),
    col("open", ColumnType::Real, true),
    col("high", ColumnType::Real, true),
    col("low", ColumnType::Real, true),
    col("close", ColumnType::Real, true),
    col("volume", ColumnType::Integer, true),
];

/// One computed indicator field, in persisted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorColumn {
    Sma8,
    Sma10,
    Sma21,
    Sma50,
    Sma55,
    Sma100,
    Sma200,
    Ema8,
    Ema10,
    Ema21,
    Ema50,
    Ema55,
    Ema100,
    Ema200,
    High21,
    Low21,
    High55,
    Low55,
    High100,
    Low100,
    PlusDi,
    MinusDi,
    Adx,
    Cci,
    Rsi,
    Kama,
    DcUpper,
    DcLower,
    Vwap,
    Atr,
    BbMiddle,
    BbUpper,
    BbLower,
    Mfi,
}

pub const INDICATOR_COLUMN_COUNT: usize = 34;

impl IndicatorColumn {
    pub const ALL: [IndicatorColumn; INDICATOR_COLUMN_COUNT] = [
        IndicatorColumn::Sma8,
        IndicatorColumn::Sma10,
        IndicatorColumn::Sma21,
        IndicatorColumn::Sma50,
        IndicatorColumn::Sma55,
        IndicatorColumn::Sma100,
        IndicatorColumn::Sma200,
        IndicatorColumn::Ema8,
        IndicatorColumn::Ema10,
        IndicatorColumn::Ema21,
        IndicatorColumn::Ema50,
        IndicatorColumn::Ema55,
        IndicatorColumn::Ema100,
        IndicatorColumn::Ema200,
        IndicatorColumn::High21,
        IndicatorColumn::Low21,
        IndicatorColumn::High55,
        IndicatorColumn::Low55,
        IndicatorColumn::High100,
        IndicatorColumn::Low100,
        IndicatorColumn::PlusDi,
        IndicatorColumn::MinusDi,
        IndicatorColumn::Adx,
        IndicatorColumn::Cci,
        IndicatorColumn::Rsi,
        IndicatorColumn::Kama,
        IndicatorColumn::DcUpper,
        IndicatorColumn::DcLower,
        IndicatorColumn::Vwap,
        IndicatorColumn::Atr,
        IndicatorColumn::BbMiddle,
        IndicatorColumn::BbUpper,
        IndicatorColumn::BbLower,
        IndicatorColumn::Mfi,
    ];

    /// A row is persisted only if at least one of these is defined.
    pub const MINIMAL_PRESENCE: [IndicatorColumn; 5] = [
        IndicatorColumn::Sma21,
        IndicatorColumn::Ema21,
        IndicatorColumn::Rsi,
        IndicatorColumn::Kama,
        IndicatorColumn::Adx,
    ];

    /// Position in [`IndicatorColumn::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            IndicatorColumn::Sma8 => "sma_8",
            IndicatorColumn::Sma10 => "sma_10",
            IndicatorColumn::Sma21 => "sma_21",
            IndicatorColumn::Sma50 => "sma_50",
            IndicatorColumn::Sma55 => "sma_55",
            IndicatorColumn::Sma100 => "sma_100",
            IndicatorColumn::Sma200 => "sma_200",
            IndicatorColumn::Ema8 => "ema_8",
            IndicatorColumn::Ema10 => "ema_10",
            IndicatorColumn::Ema21 => "ema_21",
            IndicatorColumn::Ema50 => "ema_50",
            IndicatorColumn::Ema55 => "ema_55",
            IndicatorColumn::Ema100 => "ema_100",
            IndicatorColumn::Ema200 => "ema_200",
            IndicatorColumn::High21 => "high_21",
            IndicatorColumn::Low21 => "low_21",
            IndicatorColumn::High55 => "high_55",
            IndicatorColumn::Low55 => "low_55",
            IndicatorColumn::High100 => "high_100",
            IndicatorColumn::Low100 => "low_100",
            IndicatorColumn::PlusDi => "plus_di",
            IndicatorColumn::MinusDi => "minus_di",
            IndicatorColumn::Adx => "adx",
            IndicatorColumn::Cci => "cci",
            IndicatorColumn::Rsi => "rsi",
            IndicatorColumn::Kama => "kama",
            IndicatorColumn::DcUpper => "dc_upper",
            IndicatorColumn::DcLower => "dc_lower",
            IndicatorColumn::Vwap => "vwap",
            IndicatorColumn::Atr => "atr",
            IndicatorColumn::BbMiddle => "bb_middle",
            IndicatorColumn::BbUpper => "bb_upper",
            IndicatorColumn::BbLower => "bb_lower",
            IndicatorColumn::Mfi => "mfi",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }

    /// The sma_k column for one of [`MA_PERIODS`].
    pub fn sma(period: usize) -> Option<Self> {
        Self::from_name(&format!("sma_{period}"))
    }

    /// The ema_k column for one of [`MA_PERIODS`].
    pub fn ema(period: usize) -> Option<Self> {
        Self::from_name(&format!("ema_{period}"))
    }

    /// The high_w column for one of [`EXTREME_WINDOWS`].
    pub fn rolling_high(window: usize) -> Option<Self> {
        Self::from_name(&format!("high_{window}"))
    }

    /// The low_w column for one of [`EXTREME_WINDOWS`].
    pub fn rolling_low(window: usize) -> Option<Self> {
        Self::from_name(&format!("low_{window}"))
    }

    pub fn spec(self) -> ColumnSpec {
        col(self.name(), ColumnType::Real, true)
    }
}

impl fmt::Display for IndicatorColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every column of the daily table: bar columns followed by indicator columns.
pub fn daily_columns() -> Vec<ColumnSpec> {
    BAR_COLUMNS
        .iter()
        .copied()
        .chain(IndicatorColumn::ALL.iter().map(|c| c.spec()))
        .collect()
}

/// Result of validating an existing table against its description.
#[derive(Debug, Clone, Default)]
pub struct SchemaValidation {
    /// Columns the table lacks.
    pub missing: Vec<ColumnSpec>,
    /// Type mismatches on present columns.
    pub errors: Vec<String>,
    /// Columns present in the table but not described (not an error).
    pub extra: Vec<String>,
}

impl SchemaValidation {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty() && self.errors.is_empty()
    }

    /// True when the only problem is missing indicator columns, which a store
    /// may add in place.
    pub fn is_migratable(&self) -> bool {
        self.errors.is_empty()
            && self
                .missing
                .iter()
                .all(|m| IndicatorColumn::from_name(m.name).is_some())
    }
}

/// Validate `(column_name, declared_type)` pairs against a table description.
///
/// Declared types are compared case-insensitively against [`ColumnType::sql`].
pub fn validate_columns(expected: &[ColumnSpec], present: &[(String, String)]) -> SchemaValidation {
    let mut validation = SchemaValidation::default();

    for spec in expected {
        match present.iter().find(|(name, _)| name == spec.name) {
            Some((_, declared)) if declared.eq_ignore_ascii_case(spec.dtype.sql()) => {}
            Some((_, declared)) => validation.errors.push(format!(
                "column '{}': expected {}, got {}",
                spec.name,
                spec.dtype.sql(),
                declared
            )),
            None => validation.missing.push(*spec),
        }
    }

    for (name, _) in present {
        if !expected.iter().any(|s| s.name == name) {
            validation.extra.push(name.clone());
        }
    }

    validation
}
