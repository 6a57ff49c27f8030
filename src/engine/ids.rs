use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use crate::model::Reservation;
use crate::store::{ReservationStore, ID_COUNTER_CELL, META_SHEET};

/// Hands out reservation ids as `max(existing) + 1`, but never at or
/// below an id it has already issued, so deleting the newest row does
/// not free its id for reuse. An id is reserved as soon as `next`
/// returns it; concurrent callers never see the same value.
///
/// The high-water mark lives in process and, best effort, in the
/// `Meta!A1` cell so it survives restarts. A missing or unreadable
/// counter cell counts as zero.
#[derive(Debug, Default)]
pub struct IdAllocator {
    high_water: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest numeric id among `existing`, ignoring rows without one.
    pub fn max_id<'a>(existing: impl IntoIterator<Item = &'a Reservation>) -> Option<u64> {
        existing.into_iter().filter_map(|r| r.id).max()
    }

    pub async fn next(&self, store: &dyn ReservationStore, existing_max: Option<u64>) -> u64 {
        let floor = existing_max.unwrap_or(0).max(read_counter(store).await);
        let reserve = |hw: u64| hw.max(floor) + 1;
        match self
            .high_water
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |hw| Some(reserve(hw)))
        {
            Ok(prev) | Err(prev) => reserve(prev),
        }
    }

    /// Persist the high-water mark once `id` has been appended. An id
    /// whose append failed stays reserved and is skipped.
    pub async fn commit(&self, store: &dyn ReservationStore, id: u64) {
        let mark = self.high_water.fetch_max(id, Ordering::SeqCst).max(id);
        if let Err(e) = store.update_cell(META_SHEET, 1, 1, mark.to_string()).await {
            warn!("could not persist id counter {mark}: {e}");
        }
    }
}

async fn read_counter(store: &dyn ReservationStore) -> u64 {
    match store.read_range(META_SHEET, ID_COUNTER_CELL).await {
        Ok(rows) => rows
            .first()
            .and_then(|row| row.first())
            .and_then(|cell| cell.trim().parse().ok())
            .unwrap_or(0),
        Err(e) => {
            warn!("could not read id counter: {e}");
            0
        }
    }
}
