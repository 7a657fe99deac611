//! Domain types: instruments, daily bars, indicator rows.

pub mod bar;
pub mod instrument;
pub mod row;

pub use bar::{first_unordered, DailyBar, PriceDefect};
pub use instrument::{Instrument, InstrumentId};
pub use row::IndicatorRow;
