//! In-memory bar store, for tests and dry runs.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;

use indilab_core::{DailyBar, IndicatorRow, Instrument, InstrumentId};

use super::{BarStore, StoreError, StorePool};

#[derive(Debug, Default)]
struct Tables {
    instruments: BTreeMap<InstrumentId, Instrument>,
    daily: BTreeMap<(InstrumentId, NaiveDate), (DailyBar, IndicatorRow)>,
}

fn lock(tables: &Mutex<Tables>) -> Result<MutexGuard<'_, Tables>, StoreError> {
    tables.lock().map_err(|_| StoreError::Poisoned)
}

/// Shared tables; every handle sees the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryPool {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instrument, replacing any with the same id.
    pub fn add_instrument(&self, instrument: Instrument) -> Result<(), StoreError> {
        lock(&self.tables)?
            .instruments
            .insert(instrument.id, instrument);
        Ok(())
    }

    /// Insert bars whose key is not yet present. Returns how many were new.
    pub fn insert_bars(&self, bars: &[DailyBar]) -> Result<usize, StoreError> {
        let mut tables = lock(&self.tables)?;
        let mut inserted = 0;
        for bar in bars {
            let key = (bar.instrument_id, bar.date);
            if !tables.daily.contains_key(&key) {
                let row = IndicatorRow::empty(bar.instrument_id, bar.date);
                tables.daily.insert(key, (bar.clone(), row));
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    pub fn indicator_rows(&self, instrument: InstrumentId) -> Result<Vec<IndicatorRow>, StoreError> {
        Ok(lock(&self.tables)?
            .daily
            .range((instrument, NaiveDate::MIN)..=(instrument, NaiveDate::MAX))
            .map(|(_, (_, row))| row.clone())
            .collect())
    }

    pub fn row_count(&self) -> Result<usize, StoreError> {
        Ok(lock(&self.tables)?.daily.len())
    }
}

impl StorePool for MemoryPool {
    type Handle = MemoryStore;

    fn acquire(&self) -> Result<MemoryStore, StoreError> {
        Ok(MemoryStore {
            tables: Arc::clone(&self.tables),
            pending: None,
        })
    }
}

/// Handle onto a [`MemoryPool`]. Batched writes are held back until commit and
/// discarded if the handle is dropped first.
#[derive(Debug)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    pending: Option<Vec<IndicatorRow>>,
}

impl BarStore for MemoryStore {
    fn instruments(&mut self) -> Result<Vec<Instrument>, StoreError> {
        Ok(lock(&self.tables)?.instruments.values().cloned().collect())
    }

    fn load_bars(&mut self, instrument: InstrumentId) -> Result<Vec<DailyBar>, StoreError> {
        Ok(lock(&self.tables)?
            .daily
            .range((instrument, NaiveDate::MIN)..=(instrument, NaiveDate::MAX))
            .map(|(_, (bar, _))| bar.clone())
            .collect())
    }

    fn begin_batch(&mut self) -> Result<(), StoreError> {
        self.pending = Some(Vec::new());
        Ok(())
    }

    fn update_indicators(&mut self, row: &IndicatorRow) -> Result<bool, StoreError> {
        let mut tables = lock(&self.tables)?;
        let Some((_, stored)) = tables.daily.get_mut(&(row.instrument_id, row.date)) else {
            return Ok(false);
        };
        match self.pending.as_mut() {
            Some(pending) => pending.push(row.clone()),
            None => *stored = row.clone(),
        }
        Ok(true)
    }

    fn commit_batch(&mut self) -> Result<(), StoreError> {
        let pending = self.pending.take().ok_or(StoreError::NoBatch("commit_batch"))?;
        let mut tables = lock(&self.tables)?;
        for row in pending {
            if let Some((_, stored)) = tables.daily.get_mut(&(row.instrument_id, row.date)) {
                *stored = row;
            }
        }
        Ok(())
    }
}
