mod availability;
mod catalog;
mod conflict;
mod error;
mod ids;
mod mutations;
mod queries;

pub use availability::free_slots;
pub use catalog::SlotCatalog;
pub use conflict::{find_conflict, has_conflict};
pub use error::BookingError;
pub use ids::IdAllocator;
pub use mutations::Occurrence;
pub use queries::ReservationQueryService;

use std::sync::Arc;

use crate::auth::SharedSecret;
use crate::store::ReservationStore;

/// Calendar dates are stored and compared as `YYYY-MM-DD`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Creates and deletes reservations.
///
/// Every call runs read → check → write against the store with no
/// locking in between. Two concurrent creates for the same slot can both
/// pass the conflict check; callers that need stronger guarantees must
/// serialize their writes. Ids are reserved in process, so such rows
/// still get distinct ids.
pub struct BookingEngine {
    store: Arc<dyn ReservationStore>,
    queries: ReservationQueryService,
    secret: SharedSecret,
    ids: IdAllocator,
}

impl BookingEngine {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        catalog: Arc<SlotCatalog>,
        secret: SharedSecret,
    ) -> Self {
        Self {
            queries: ReservationQueryService::new(store.clone(), catalog),
            store,
            secret,
            ids: IdAllocator::new(),
        }
    }

    pub fn queries(&self) -> &ReservationQueryService {
        &self.queries
    }

    fn authorize(&self, supplied: &str) -> Result<(), BookingError> {
        if self.secret.verify(supplied) {
            Ok(())
        } else {
            metrics::counter!(crate::observability::AUTH_FAILURES_TOTAL).increment(1);
            Err(BookingError::Unauthorized)
        }
    }
}
