use std::time::Instant;

use chrono::{Days, NaiveDate};
use tracing::{debug, info, warn};

use crate::limits::*;
use crate::model::*;
use crate::store::{RESERVATIONS_RANGE, RESERVATIONS_SHEET};

use super::conflict::find_conflict;
use super::ids::IdAllocator;
use super::queries::scoped;
use super::{BookingEngine, BookingError, DATE_FORMAT};

/// Outcome of one week in a repeating booking.
#[derive(Debug)]
pub struct Occurrence {
    pub date: String,
    pub outcome: Result<Reservation, BookingError>,
}

impl Occurrence {
    pub fn is_created(&self) -> bool {
        self.outcome.is_ok()
    }

    /// One report line, e.g. `2024-03-11: conflict, skipped`.
    pub fn summary(&self) -> String {
        match &self.outcome {
            Ok(_) => format!("{}: created", self.date),
            Err(BookingError::Conflict(_)) => format!("{}: conflict, skipped", self.date),
            Err(e) => format!("{}: {}", self.date, e.short_label()),
        }
    }
}

/// A request that passed validation, in canonical form.
struct ValidatedBooking {
    room: String,
    date: NaiveDate,
    range: TimeRange,
    reserved_by: String,
    note: String,
}

impl ValidatedBooking {
    fn into_reservation(self, id: u64) -> Reservation {
        Reservation {
            id: Some(id),
            date: self.date.format(DATE_FORMAT).to_string(),
            room: self.room,
            start: self.range.start.to_string(),
            end: self.range.end.to_string(),
            reserved_by: self.reserved_by,
            note: self.note,
        }
    }
}

fn parse_date(date: &str) -> Result<NaiveDate, BookingError> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map_err(|_| BookingError::Validation(format!("date {date:?} is not YYYY-MM-DD")))
}

fn record(op: &'static str, started: Instant, result: &Result<impl Sized, BookingError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    metrics::counter!(crate::observability::BOOKING_REQUESTS_TOTAL, "op" => op, "outcome" => outcome)
        .increment(1);
    metrics::histogram!(crate::observability::BOOKING_DURATION_SECONDS, "op" => op)
        .record(started.elapsed().as_secs_f64());
}

impl BookingEngine {
    /// Checks that never touch the store.
    fn validate(&self, req: &BookingRequest) -> Result<ValidatedBooking, BookingError> {
        let catalog = self.queries.catalog();
        if catalog.rooms().is_empty() {
            return Err(BookingError::Validation("room catalog is empty".into()));
        }
        if catalog.slots().is_empty() {
            return Err(BookingError::Validation("slot catalog is empty".into()));
        }
        let room = req.room.trim();
        if catalog.find_room(room).is_none() {
            return Err(BookingError::Validation(format!("unknown room {room:?}")));
        }
        let date = parse_date(&req.date)?;
        let range = TimeRange::parse(&req.start, &req.end).ok_or_else(|| {
            BookingError::Validation(format!(
                "invalid time range {:?}-{:?}",
                req.start, req.end
            ))
        })?;
        let reserved_by = req.reserved_by.trim();
        if reserved_by.is_empty() {
            return Err(BookingError::Validation("reservedBy is required".into()));
        }
        if reserved_by.chars().count() > MAX_RESERVED_BY_LEN {
            return Err(BookingError::Validation(format!(
                "reservedBy longer than {MAX_RESERVED_BY_LEN} characters"
            )));
        }
        let note = req.note.trim();
        if note.chars().count() > MAX_NOTE_LEN {
            return Err(BookingError::Validation(format!(
                "note longer than {MAX_NOTE_LEN} characters"
            )));
        }
        Ok(ValidatedBooking {
            room: room.to_string(),
            date,
            range,
            reserved_by: reserved_by.to_string(),
            note: note.to_string(),
        })
    }

    /// Validate, authorize, check for overlap against a fresh read, then
    /// append. Nothing is written when any step before the append fails.
    pub async fn create(&self, req: &BookingRequest) -> Result<Reservation, BookingError> {
        let started = Instant::now();
        let result = self.create_inner(req).await;
        record("create", started, &result);
        result
    }

    async fn create_inner(&self, req: &BookingRequest) -> Result<Reservation, BookingError> {
        let booking = self.validate(req).inspect_err(|e| debug!("create rejected: {e}"))?;
        self.authorize(&req.secret)?;

        let rows = self.queries.read_rows().await?;
        let date = booking.date.format(DATE_FORMAT).to_string();
        if let Some(existing) = find_conflict(&booking.range, scoped(&rows, &booking.room, &date)) {
            debug!(
                "create {} {} {} rejected: overlaps {:?}",
                booking.room, date, booking.range.start, existing.id
            );
            return Err(BookingError::Conflict(Box::new(existing.clone())));
        }

        let max = IdAllocator::max_id(rows.iter().map(|s| &s.reservation));
        let id = self.ids.next(&*self.store, max).await;
        let reservation = booking.into_reservation(id);
        self.store
            .append_row(RESERVATIONS_SHEET, RESERVATIONS_RANGE, reservation.to_row())
            .await?;
        self.ids.commit(&*self.store, id).await;

        info!(
            "created reservation {id}: {} {} {}-{} by {}",
            reservation.room, reservation.date, reservation.start, reservation.end, reservation.reserved_by
        );
        Ok(reservation)
    }

    /// Book the same room and time on `weeks` consecutive weeks starting
    /// at `req.date`. Occurrences run in order and each sees the rows
    /// appended by the ones before it; a failed week is reported and
    /// skipped, nothing is rolled back.
    ///
    /// The whole call fails when the base request does not validate, no
    /// dates can be derived, or the secret is wrong.
    pub async fn create_repeating(
        &self,
        req: &BookingRequest,
        weeks: u32,
    ) -> Result<Vec<Occurrence>, BookingError> {
        if weeks == 0 || weeks > MAX_REPEAT_WEEKS {
            return Err(BookingError::Validation(format!(
                "weeks must be between 1 and {MAX_REPEAT_WEEKS}, got {weeks}"
            )));
        }
        let base = self
            .validate(req)
            .inspect_err(|e| debug!("repeating booking rejected: {e}"))?
            .date;
        self.authorize(&req.secret)?;

        let mut report = Vec::with_capacity(weeks as usize);
        for week in 0..weeks {
            let Some(day) = base.checked_add_days(Days::new(7 * u64::from(week))) else {
                return Err(BookingError::Validation(format!("{base} plus {weeks} weeks is out of range")));
            };
            let date = day.format(DATE_FORMAT).to_string();
            let occurrence = BookingRequest {
                date: date.clone(),
                ..req.clone()
            };
            let outcome = self.create(&occurrence).await;
            report.push(Occurrence { date, outcome });
        }

        let created = report.iter().filter(|o| o.is_created()).count();
        info!(
            "repeating booking for {} from {base}: {created}/{weeks} created",
            req.room.trim()
        );
        Ok(report)
    }

    /// Remove one reservation, located from a fresh read: by id when one
    /// is given and matches, otherwise by exact match of the six
    /// descriptive fields.
    pub async fn delete(&self, criteria: &DeleteCriteria) -> Result<Reservation, BookingError> {
        let started = Instant::now();
        let result = self.delete_inner(criteria).await;
        record("delete", started, &result);
        result
    }

    async fn delete_inner(&self, criteria: &DeleteCriteria) -> Result<Reservation, BookingError> {
        self.authorize(&criteria.secret)?;
        let rows = self.queries.read_rows().await?;

        let by_id: Vec<_> = match criteria.requested_id().and_then(|id| id.parse::<u64>().ok()) {
            Some(id) => rows.iter().filter(|s| s.reservation.id == Some(id)).collect(),
            None => Vec::new(),
        };
        let matches = if by_id.is_empty() {
            rows.iter()
                .filter(|s| s.reservation.matches_fields(criteria))
                .collect()
        } else {
            by_id
        };

        let Some(target) = matches.first() else {
            debug!(
                "delete found no match (id {:?}, {} {} {}-{})",
                criteria.requested_id(),
                criteria.room,
                criteria.date,
                criteria.start,
                criteria.end
            );
            return Err(BookingError::NotFound);
        };
        if matches.len() > 1 {
            warn!(
                "{} rows match delete criteria; removing row {} only",
                matches.len(),
                target.row
            );
        }

        self.store.delete_row(RESERVATIONS_SHEET, target.row).await?;
        info!(
            "deleted reservation {:?} at row {}: {} {} {}-{}",
            target.reservation.id,
            target.row,
            target.reservation.room,
            target.reservation.date,
            target.reservation.start,
            target.reservation.end
        );
        Ok(target.reservation.clone())
    }
}
