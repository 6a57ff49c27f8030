use std::sync::Arc;

use chrono::NaiveDate;
use tracing::warn;

use crate::model::*;
use crate::store::{ReservationStore, StoreError, FIRST_DATA_ROW, RESERVATIONS_RANGE, RESERVATIONS_SHEET};

use super::availability::free_slots;
use super::catalog::SlotCatalog;
use super::DATE_FORMAT;

/// Read side shared by booking and display. Every call is a fresh
/// snapshot of the store; only the catalog is cached.
pub struct ReservationQueryService {
    store: Arc<dyn ReservationStore>,
    catalog: Arc<SlotCatalog>,
}

impl ReservationQueryService {
    pub fn new(store: Arc<dyn ReservationStore>, catalog: Arc<SlotCatalog>) -> Self {
        Self { store, catalog }
    }

    /// Every reservation row with its sheet row number. Blank rows are
    /// skipped silently, incomplete rows with a warning.
    pub(crate) async fn read_rows(&self) -> Result<Vec<StoredReservation>, StoreError> {
        let rows = self
            .store
            .read_range(RESERVATIONS_SHEET, RESERVATIONS_RANGE)
            .await?;
        let mut out = Vec::with_capacity(rows.len());
        for (i, cells) in rows.iter().enumerate() {
            let row = FIRST_DATA_ROW + i;
            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            match Reservation::from_row(cells) {
                Some(reservation) => out.push(StoredReservation { row, reservation }),
                None => {
                    warn!("skipping incomplete reservation row {row}: {cells:?}");
                    metrics::counter!(crate::observability::INTEGRITY_WARNINGS_TOTAL).increment(1);
                }
            }
        }
        Ok(out)
    }

    pub async fn list_all(&self) -> Result<Vec<Reservation>, StoreError> {
        Ok(self
            .read_rows()
            .await?
            .into_iter()
            .map(|s| s.reservation)
            .collect())
    }

    pub async fn list_by_room(&self, room: &str) -> Result<Vec<Reservation>, StoreError> {
        let mut out: Vec<_> = self
            .list_all()
            .await?
            .into_iter()
            .filter(|r| r.room == room)
            .collect();
        sort_by_date_and_start(&mut out);
        Ok(out)
    }

    pub async fn list_by_room_and_date(
        &self,
        room: &str,
        date: &str,
    ) -> Result<Vec<Reservation>, StoreError> {
        let mut out: Vec<_> = self
            .list_all()
            .await?
            .into_iter()
            .filter(|r| r.room == room && same_date(&r.date, date))
            .collect();
        sort_by_date_and_start(&mut out);
        Ok(out)
    }

    /// Reservations for `room` dated `from..=to`. Rows whose date does
    /// not parse are left out.
    pub async fn list_by_room_between(
        &self,
        room: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Reservation>, StoreError> {
        let mut out: Vec<_> = self
            .list_all()
            .await?
            .into_iter()
            .filter(|r| r.room == room)
            .filter(|r| {
                NaiveDate::parse_from_str(&r.date, DATE_FORMAT)
                    .is_ok_and(|d| from <= d && d <= to)
            })
            .collect();
        sort_by_date_and_start(&mut out);
        Ok(out)
    }

    /// Catalog slots still open for `room` on `date`.
    pub async fn available_slots(&self, room: &str, date: &str) -> Result<Vec<Slot>, StoreError> {
        let booked = self.list_by_room_and_date(room, date).await?;
        Ok(free_slots(self.catalog.slots(), &booked))
    }

    pub fn list_rooms(&self) -> &[Room] {
        self.catalog.rooms()
    }

    pub fn list_slots(&self) -> &[Slot] {
        self.catalog.slots()
    }

    pub fn catalog(&self) -> &SlotCatalog {
        &self.catalog
    }
}

/// Rows narrowed to one room and date, in store order. Stored dates
/// match by calendar day, so unpadded legacy dates stay in scope.
pub(crate) fn scoped<'a>(
    rows: &'a [StoredReservation],
    room: &'a str,
    date: &'a str,
) -> impl Iterator<Item = &'a Reservation> {
    rows.iter()
        .map(|s| &s.reservation)
        .filter(move |r| r.room == room && same_date(&r.date, date))
}

/// Unparseable dates sort last, malformed times last within their day.
fn sort_by_date_and_start(reservations: &mut [Reservation]) {
    reservations.sort_by_key(|r| {
        let day = NaiveDate::parse_from_str(&r.date, DATE_FORMAT).ok();
        (
            day.is_none(),
            day,
            r.date.clone(),
            r.time_range().map_or(u16::MAX, |t| t.start.minutes()),
        )
    });
}
